pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod types;

// Validated and derived record shapes shared across stages
pub mod domain;

pub use config::Config;
pub use error::{EtlError, Result};
pub use pipeline::{Pipeline, PipelineOutput, PipelineRun};
pub use report::Report;
pub use types::RawDatasets;
