//! Pipeline orchestration.
//!
//! Stages run in dependency order: products, stock and sales are validated
//! independently, sales are enriched against products, then metrics and outliers
//! are computed from the enriched sales. Each stage is a pure function of the
//! previous stage's output; a run owns all of its state and shares nothing with
//! other runs.

pub mod processing;

use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::AnalysisConfig;
use crate::domain::{EnrichedSale, OutlierRecord, Product, SaleRecord, StockRecord};
use crate::error::{EtlError, Result};
use crate::types::{RawDatasets, RawProduct, RawSale, RawStock};
use processing::{
    AggregatedMetrics, Fences, MetricsAggregator, OutlierDetector, ProductValidator,
    SaleValidator, SalesEnricher, StockValidator, ValidatedDataset, ValidationReport, Validator,
};

/// Everything a run produces, handed to report writers
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub products: ValidatedDataset<Product>,
    pub stock: ValidatedDataset<StockRecord>,
    pub sales: ValidatedDataset<SaleRecord>,
    pub enriched_sales: Vec<EnrichedSale>,
    pub metrics: AggregatedMetrics,
    pub outliers: Vec<OutlierRecord>,
    /// `None` when there were no sales to measure
    pub fences: Option<Fences>,
}

/// Row counts of a run, for logs and the command line
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub products: ValidationReport,
    pub stock: ValidationReport,
    pub sales: ValidationReport,
    pub enriched_sales: usize,
    pub unmatched_sales: usize,
    pub metric_groups: usize,
    pub outliers: usize,
}

impl PipelineOutput {
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            products: self.products.report().clone(),
            stock: self.stock.report().clone(),
            sales: self.sales.report().clone(),
            enriched_sales: self.enriched_sales.len(),
            unmatched_sales: self.enriched_sales.iter().filter(|s| !s.is_matched()).count(),
            metric_groups: self.metrics.group_count(),
            outliers: self.outliers.len(),
        }
    }
}

/// Validated datasets of a run in progress. Enrichment can only be requested
/// once both products and sales have been validated.
#[derive(Debug, Default)]
pub struct PipelineRun {
    products: Option<ValidatedDataset<Product>>,
    stock: Option<ValidatedDataset<StockRecord>>,
    sales: Option<ValidatedDataset<SaleRecord>>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate_products(&mut self, raw: &[RawProduct]) -> &ValidatedDataset<Product> {
        self.products.insert(ProductValidator.validate(raw))
    }

    pub fn validate_stock(&mut self, raw: &[RawStock]) -> &ValidatedDataset<StockRecord> {
        self.stock.insert(StockValidator.validate(raw))
    }

    pub fn validate_sales(&mut self, raw: &[RawSale]) -> &ValidatedDataset<SaleRecord> {
        self.sales.insert(SaleValidator.validate(raw))
    }

    /// Left-join the validated sales onto the validated products
    pub fn enrich_sales(&self, enricher: &SalesEnricher) -> Result<Vec<EnrichedSale>> {
        match (&self.products, &self.sales) {
            (Some(products), Some(sales)) => Ok(enricher.enrich(products, sales)),
            (None, _) => Err(EtlError::Precondition(
                "products must be validated before sales can be enriched".to_string(),
            )),
            (_, None) => Err(EtlError::Precondition(
                "sales must be validated before they can be enriched".to_string(),
            )),
        }
    }

    fn into_datasets(
        self,
    ) -> Result<(
        ValidatedDataset<Product>,
        ValidatedDataset<StockRecord>,
        ValidatedDataset<SaleRecord>,
    )> {
        let missing = |stage: &str| EtlError::Precondition(format!("{} were never validated", stage));
        Ok((
            self.products.ok_or_else(|| missing("products"))?,
            self.stock.ok_or_else(|| missing("stock positions"))?,
            self.sales.ok_or_else(|| missing("sales"))?,
        ))
    }
}

pub struct Pipeline {
    enricher: SalesEnricher,
    aggregator: MetricsAggregator,
    detector: OutlierDetector,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            enricher: SalesEnricher::new(),
            aggregator: MetricsAggregator::new(),
            detector: OutlierDetector::new(),
        }
    }

    pub fn with_config(config: &AnalysisConfig) -> Self {
        Self {
            detector: OutlierDetector::with_multiplier(config.iqr_multiplier),
            ..Self::new()
        }
    }

    /// Run every stage over one snapshot of raw data.
    /// Either all stages complete or the run aborts with the first error.
    #[instrument(skip_all, fields(
        products = raw.products.len(),
        stock = raw.stock.len(),
        sales = raw.sales.len()
    ))]
    pub fn run(&self, raw: &RawDatasets) -> Result<PipelineOutput> {
        let started = Instant::now();
        info!("🚀 Starting sales ETL pipeline");

        let mut run = PipelineRun::new();
        run.validate_products(&raw.products);
        run.validate_stock(&raw.stock);
        run.validate_sales(&raw.sales);

        let enriched_sales = run.enrich_sales(&self.enricher)?;

        // Zero surviving sales is degenerate data, not a caller error
        let metrics = if enriched_sales.is_empty() {
            warn!("No enriched sales, metric groupings will be empty");
            AggregatedMetrics::default()
        } else {
            self.aggregator.aggregate(&enriched_sales)?
        };

        let (fences, outliers) = self.detector.detect(&enriched_sales);

        let (products, stock, sales) = run.into_datasets()?;
        let output = PipelineOutput {
            products,
            stock,
            sales,
            enriched_sales,
            metrics,
            outliers,
            fences,
        };

        let elapsed = started.elapsed().as_secs_f64();
        crate::metrics::pipeline::run_completed(elapsed);
        info!(
            "✅ Pipeline finished in {:.3}s: {} enriched sales, {} outliers",
            elapsed,
            output.enriched_sales.len(),
            output.outliers.len()
        );

        Ok(output)
    }
}
