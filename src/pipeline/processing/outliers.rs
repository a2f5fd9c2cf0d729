//! Interquartile-fence outlier detection on sale total value.

use serde::Serialize;
use tracing::{info, instrument};

use crate::constants::{FIRST_QUARTILE, IQR_FENCE_MULTIPLIER, MIN_ROWS_FOR_FENCE, THIRD_QUARTILE};
use crate::domain::{EnrichedSale, OutlierKind, OutlierRecord};

/// Quantile of already sorted values using linear interpolation between
/// order statistics (position = (n - 1) * q).
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Quartiles and the resulting fence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fences {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    /// Compute fences over unsorted values. `None` for an empty input.
    pub fn from_values(values: &[f64], multiplier: f64) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&sorted, FIRST_QUARTILE)?;
        let q3 = quantile(&sorted, THIRD_QUARTILE)?;
        let iqr = q3 - q1;

        // Too few points for a spread estimate: the fence is the quartile range itself
        let reach = if sorted.len() < MIN_ROWS_FOR_FENCE {
            0.0
        } else {
            multiplier * iqr
        };

        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1 - reach,
            upper: q3 + reach,
        })
    }

    /// Strictly outside the fence only
    pub fn classify(&self, value: f64) -> Option<OutlierKind> {
        if value > self.upper {
            Some(OutlierKind::HighSale)
        } else if value < self.lower {
            Some(OutlierKind::LowSale)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OutlierDetector {
    multiplier: f64,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self {
            multiplier: IQR_FENCE_MULTIPLIER,
        }
    }
}

impl OutlierDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_multiplier(multiplier: f64) -> Self {
        Self { multiplier }
    }

    pub fn fences(&self, sales: &[EnrichedSale]) -> Option<Fences> {
        let values: Vec<f64> = sales.iter().map(|s| s.sale.total_value).collect();
        Fences::from_values(&values, self.multiplier)
    }

    /// Flag sales whose total value lies strictly outside the fence, in input order.
    /// Returns the fences used alongside the flagged sales.
    #[instrument(skip_all, fields(sales = sales.len()))]
    pub fn detect(&self, sales: &[EnrichedSale]) -> (Option<Fences>, Vec<OutlierRecord>) {
        let Some(fences) = self.fences(sales) else {
            return (None, Vec::new());
        };

        let outliers: Vec<OutlierRecord> = sales
            .iter()
            .filter_map(|sale| {
                fences.classify(sale.sale.total_value).map(|kind| OutlierRecord {
                    sale: sale.clone(),
                    kind,
                })
            })
            .collect();

        let high = outliers.iter().filter(|o| o.kind == OutlierKind::HighSale).count();
        let low = outliers.len() - high;
        crate::metrics::outliers::detected(OutlierKind::HighSale.label(), high);
        crate::metrics::outliers::detected(OutlierKind::LowSale.label(), low);
        crate::metrics::outliers::upper_fence(fences.upper);
        info!(
            q1 = fences.q1,
            q3 = fences.q3,
            lower = fences.lower,
            upper = fences.upper,
            "Detected {} outliers ({} high, {} low)",
            outliers.len(),
            high,
            low
        );

        (Some(fences), outliers)
    }
}
