//! Metrics for the sales ETL pipeline
//!
//! Recording goes through the `metrics` facade, so it is a no-op until a recorder
//! is installed with [`init`]. Names live in [`MetricName`] to avoid magic strings.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::METRICS_FILE;
use crate::error::{EtlError, Result};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Validation
    ValidationRowsIn,
    ValidationRowsAccepted,
    ValidationRowsRejected,
    ValidationRejections,

    // Enrichment
    EnrichSalesMatched,
    EnrichSalesUnmatched,

    // Outliers
    OutliersDetected,
    OutlierUpperFence,

    // Pipeline
    PipelineRuns,
    PipelineDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ValidationRowsIn => "sales_etl_validation_rows_in_total",
            MetricName::ValidationRowsAccepted => "sales_etl_validation_rows_accepted_total",
            MetricName::ValidationRowsRejected => "sales_etl_validation_rows_rejected_total",
            MetricName::ValidationRejections => "sales_etl_validation_rejections_total",
            MetricName::EnrichSalesMatched => "sales_etl_enrich_sales_matched_total",
            MetricName::EnrichSalesUnmatched => "sales_etl_enrich_sales_unmatched_total",
            MetricName::OutliersDetected => "sales_etl_outliers_detected_total",
            MetricName::OutlierUpperFence => "sales_etl_outlier_upper_fence",
            MetricName::PipelineRuns => "sales_etl_pipeline_runs_total",
            MetricName::PipelineDuration => "sales_etl_pipeline_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init() -> Result<()> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| EtlError::Config(format!("Failed to install Prometheus recorder: {}", e)))?;
    PROMETHEUS_HANDLE.set(handle).ok();
    info!("Metrics recorder installed");
    Ok(())
}

/// Prometheus text snapshot, if the recorder was installed
pub fn render() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Write the Prometheus snapshot into `dir`. `None` when no recorder is installed.
pub fn write_snapshot(dir: &Path) -> Result<Option<PathBuf>> {
    let Some(rendered) = render() else {
        return Ok(None);
    };
    fs::create_dir_all(dir)?;
    let path = dir.join(METRICS_FILE);
    fs::write(&path, rendered)?;
    info!("📈 Wrote metrics snapshot to {}", path.display());
    Ok(Some(path))
}

pub mod validation {
    use super::MetricName;

    pub fn dataset_validated(dataset: &'static str, rows_in: usize, accepted: usize, rejected: usize) {
        ::metrics::counter!(MetricName::ValidationRowsIn.as_str(), "dataset" => dataset)
            .increment(rows_in as u64);
        ::metrics::counter!(MetricName::ValidationRowsAccepted.as_str(), "dataset" => dataset)
            .increment(accepted as u64);
        ::metrics::counter!(MetricName::ValidationRowsRejected.as_str(), "dataset" => dataset)
            .increment(rejected as u64);
    }

    pub fn row_rejected(dataset: &'static str, reason: String) {
        ::metrics::counter!(
            MetricName::ValidationRejections.as_str(),
            "dataset" => dataset,
            "reason" => reason
        )
        .increment(1);
    }
}

pub mod enrich {
    use super::MetricName;

    pub fn batch_enriched(matched: usize, unmatched: usize) {
        ::metrics::counter!(MetricName::EnrichSalesMatched.as_str()).increment(matched as u64);
        ::metrics::counter!(MetricName::EnrichSalesUnmatched.as_str()).increment(unmatched as u64);
    }
}

pub mod outliers {
    use super::MetricName;

    pub fn detected(kind: &'static str, count: usize) {
        ::metrics::counter!(MetricName::OutliersDetected.as_str(), "kind" => kind)
            .increment(count as u64);
    }

    pub fn upper_fence(value: f64) {
        ::metrics::gauge!(MetricName::OutlierUpperFence.as_str()).set(value);
    }
}

pub mod pipeline {
    use super::MetricName;

    pub fn run_completed(duration_secs: f64) {
        ::metrics::counter!(MetricName::PipelineRuns.as_str()).increment(1);
        ::metrics::histogram!(MetricName::PipelineDuration.as_str()).record(duration_secs);
    }
}
