pub mod analysis_controller;
pub mod artifacts_controller;
pub mod health_controller;
pub mod uploads_controller;

pub use analysis_controller::analyze_handler;
pub use artifacts_controller::get_artifact;
pub use health_controller::health_handler;
pub use uploads_controller::{upload_file, MAX_UPLOAD_SIZE};
