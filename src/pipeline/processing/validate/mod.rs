//! Dataset validation: the row-level filter in front of the pipeline.
//!
//! Each validator checks one raw row at a time and either produces a cleaned,
//! derived record or a [`RejectionReason`]. Rejected rows are routine data noise:
//! they are counted and logged, never raised. A dataset that validates to zero
//! rows is a valid outcome.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

pub mod products;
pub mod sales;
pub mod stock;

pub use products::ProductValidator;
pub use sales::SaleValidator;
pub use stock::StockValidator;

/// Why a raw row was excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RejectionReason {
    /// A required field is absent or blank
    MissingField(&'static str),
    NonPositivePrice,
    NonPositiveCost,
    NegativeQuantity,
    NonPositiveQuantity,
    NonPositiveTotal,
    /// Date text did not parse as a calendar date
    InvalidDate,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MissingField(field) => write!(f, "missing_{}", field),
            RejectionReason::NonPositivePrice => f.write_str("non_positive_price"),
            RejectionReason::NonPositiveCost => f.write_str("non_positive_cost"),
            RejectionReason::NegativeQuantity => f.write_str("negative_quantity"),
            RejectionReason::NonPositiveQuantity => f.write_str("non_positive_quantity"),
            RejectionReason::NonPositiveTotal => f.write_str("non_positive_total"),
            RejectionReason::InvalidDate => f.write_str("invalid_date"),
        }
    }
}

/// Counts produced by one validation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub dataset: String,
    pub rows_in: usize,
    pub rows_accepted: usize,
    /// Rejection counts keyed by reason label
    pub rejections: BTreeMap<String, usize>,
}

impl ValidationReport {
    pub fn rows_rejected(&self) -> usize {
        self.rows_in - self.rows_accepted
    }

    /// The reason that excluded the most rows, if any
    pub fn primary_rejection(&self) -> Option<(&str, usize)> {
        self.rejections
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(reason, count)| (reason.as_str(), *count))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} rows valid",
            self.dataset, self.rows_accepted, self.rows_in
        )?;
        if let Some((reason, count)) = self.primary_rejection() {
            write!(f, " (most rejected: {} x{})", reason, count)?;
        }
        Ok(())
    }
}

/// Rows that survived validation. Only validators construct this, so holding
/// one is proof the rows were validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDataset<T> {
    rows: Vec<T>,
    report: ValidationReport,
}

impl<T> ValidatedDataset<T> {
    pub(crate) fn new(rows: Vec<T>, report: ValidationReport) -> Self {
        Self { rows, report }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}

/// Row-wise validator for one dataset
pub trait Validator {
    type Raw;
    type Clean;

    /// Dataset name used in reports, logs and metric labels
    const DATASET: &'static str;

    /// Check and clean a single row
    fn validate_row(&self, row: &Self::Raw) -> Result<Self::Clean, RejectionReason>;

    /// Filter a whole dataset. The input is never mutated.
    fn validate(&self, rows: &[Self::Raw]) -> ValidatedDataset<Self::Clean> {
        let mut accepted = Vec::with_capacity(rows.len());
        let mut rejections: BTreeMap<String, usize> = BTreeMap::new();

        for (i, row) in rows.iter().enumerate() {
            match self.validate_row(row) {
                Ok(clean) => accepted.push(clean),
                Err(reason) => {
                    debug!(dataset = Self::DATASET, row = i, %reason, "Row rejected");
                    crate::metrics::validation::row_rejected(Self::DATASET, reason.to_string());
                    *rejections.entry(reason.to_string()).or_insert(0) += 1;
                }
            }
        }

        let report = ValidationReport {
            dataset: Self::DATASET.to_string(),
            rows_in: rows.len(),
            rows_accepted: accepted.len(),
            rejections,
        };

        crate::metrics::validation::dataset_validated(
            Self::DATASET,
            report.rows_in,
            report.rows_accepted,
            report.rows_rejected(),
        );
        if accepted.is_empty() && !rows.is_empty() {
            warn!(dataset = Self::DATASET, "No rows survived validation");
        }
        info!("{}", report);

        ValidatedDataset::new(accepted, report)
    }
}
