// src/storage/filesystem.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use super::{artifact_url, is_valid_artifact_name, ArtifactStorage};
use crate::chart::ArtifactKind;

/// Chart artifacts stored as files in a single local directory.
#[derive(Debug)]
pub struct FilesystemArtifacts {
    images_dir: PathBuf,
}

impl FilesystemArtifacts {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Final location of the artifact for (session, kind).
    pub fn artifact_path(&self, session_id: &str, kind: ArtifactKind) -> PathBuf {
        self.images_dir.join(kind.file_name(session_id))
    }
}

#[async_trait]
impl ArtifactStorage for FilesystemArtifacts {
    fn prepare_artifact_write(&self, session_id: &str, kind: ArtifactKind) -> Result<PathBuf> {
        fs::create_dir_all(&self.images_dir).with_context(|| {
            format!(
                "Failed to create images directory {}",
                self.images_dir.display()
            )
        })?;
        // Hidden temp file in the same directory so the final rename stays on one
        // filesystem; keeps the .png extension the bitmap encoder keys on
        Ok(self.images_dir.join(format!(
            ".{}{}.{}.png",
            session_id,
            kind.suffix(),
            nanoid::nanoid!(10)
        )))
    }

    fn finalize_artifact_write(
        &self,
        written_path: &Path,
        session_id: &str,
        kind: ArtifactKind,
    ) -> Result<String> {
        let target = self.artifact_path(session_id, kind);
        if let Err(e) = fs::rename(written_path, &target) {
            self.abort_artifact_write(written_path);
            return Err(e).with_context(|| format!("Failed to publish {}", target.display()));
        }
        Ok(artifact_url(&kind.file_name(session_id)))
    }

    fn abort_artifact_write(&self, written_path: &Path) {
        if written_path.exists() {
            if let Err(e) = fs::remove_file(written_path) {
                tracing::warn!(
                    path = %written_path.display(),
                    error = %e,
                    "Failed to remove partial chart artifact"
                );
            }
        }
    }

    fn remove_session_artifacts(&self, session_id: &str) -> Result<usize> {
        let mut removed = 0;
        for kind in ArtifactKind::ALL {
            let path = self.artifact_path(session_id, kind);
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to remove {}", path.display()))
                }
            }
        }
        Ok(removed)
    }

    async fn read(&self, file_name: &str) -> Result<Option<Vec<u8>>> {
        if !is_valid_artifact_name(file_name) {
            anyhow::bail!("Invalid artifact name: {}", file_name);
        }
        match tokio::fs::read(self.images_dir.join(file_name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read artifact {}", file_name)),
        }
    }
}
