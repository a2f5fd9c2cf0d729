// Pipeline processing: validation, enrichment, aggregation and outlier detection

pub mod aggregate;
pub mod enrich;
pub mod outliers;
pub mod validate;

pub use aggregate::{AggregatedMetrics, BranchMetrics, GroupMetrics, MetricsAggregator, PeriodKey};
pub use enrich::SalesEnricher;
pub use outliers::{Fences, OutlierDetector};
pub use validate::{
    ProductValidator, RejectionReason, SaleValidator, StockValidator, ValidatedDataset,
    ValidationReport, Validator,
};
