// src/storage/mod.rs
use crate::chart::ArtifactKind;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

pub mod filesystem;

pub use filesystem::FilesystemArtifacts;

/// URL prefix under which chart artifacts are served.
pub const ARTIFACT_URL_PREFIX: &str = "/static/images";

/// Public URL for an artifact file name.
pub fn artifact_url(file_name: &str) -> String {
    format!("{}/{}", ARTIFACT_URL_PREFIX, file_name)
}

/// True for plain `.png` file names that cannot escape the artifact directory.
pub fn is_valid_artifact_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && !file_name.starts_with('.')
        && !file_name.contains(['/', '\\', '\0'])
        && !file_name.contains("..")
        && file_name.ends_with(".png")
}

#[async_trait]
pub trait ArtifactStorage: Debug + Send + Sync {
    /// Returns a local path to render a new artifact to.
    /// The path is unique per call so concurrent writers never share a file.
    fn prepare_artifact_write(&self, session_id: &str, kind: ArtifactKind) -> Result<PathBuf>;

    /// Moves a fully written file over the artifact for (session, kind) and
    /// returns its public URL. Replaces any previous artifact atomically.
    fn finalize_artifact_write(
        &self,
        written_path: &Path,
        session_id: &str,
        kind: ArtifactKind,
    ) -> Result<String>;

    /// Removes whatever a failed render left at `written_path`.
    fn abort_artifact_write(&self, written_path: &Path);

    /// Deletes every artifact of a session, returning how many existed.
    fn remove_session_artifacts(&self, session_id: &str) -> Result<usize>;

    /// Reads an artifact by file name; `None` when it does not exist.
    async fn read(&self, file_name: &str) -> Result<Option<Vec<u8>>>;
}
