pub mod access;
pub mod analysis;
pub mod chart;
pub mod config;
pub mod datasets;
mod engine;
pub mod http;
pub mod id;
pub mod storage;
pub mod store;
pub mod telemetry;

pub use engine::{AnalysisEngine, AnalysisEngineBuilder};
