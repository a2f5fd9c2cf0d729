//! Grouped business metrics over enriched sales.
//!
//! Four independent views: by product code, by branch, by category and by
//! (year, month). Profit sums skip sales with unknown profit (no matching
//! product); a group where no sale has a known profit reports `None` rather
//! than a misleading zero.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::constants::round2;
use crate::domain::EnrichedSale;
use crate::error::{EtlError, Result};

/// Sums and counts for one group
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMetrics {
    pub quantity: i64,
    pub total_value: f64,
    /// Sum over sales with a known profit
    pub profit: Option<f64>,
    pub transactions: usize,
    /// Sales counted above whose profit is unknown
    pub unmatched_transactions: usize,
}

impl GroupMetrics {
    fn add(&mut self, sale: &EnrichedSale) {
        self.quantity += sale.sale.quantity;
        self.total_value += sale.sale.total_value;
        self.transactions += 1;
        match sale.sale_profit {
            Some(profit) => *self.profit.get_or_insert(0.0) += profit,
            None => self.unmatched_transactions += 1,
        }
    }

    fn rounded(mut self) -> Self {
        self.total_value = round2(self.total_value);
        self.profit = self.profit.map(round2);
        self
    }

    /// Mean total value per transaction
    pub fn mean_total_value(&self) -> f64 {
        if self.transactions == 0 {
            0.0
        } else {
            self.total_value / self.transactions as f64
        }
    }
}

/// Branch view: the group sums plus the mean ticket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BranchMetrics {
    #[serde(flatten)]
    pub totals: GroupMetrics,
    pub mean_total_value: f64,
}

/// Calendar month key. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedMetrics {
    pub by_product: BTreeMap<String, GroupMetrics>,
    pub by_branch: BTreeMap<String, BranchMetrics>,
    pub by_category: BTreeMap<String, GroupMetrics>,
    pub by_period: BTreeMap<PeriodKey, GroupMetrics>,
}

impl AggregatedMetrics {
    pub fn group_count(&self) -> usize {
        self.by_product.len() + self.by_branch.len() + self.by_category.len() + self.by_period.len()
    }
}

fn group_by<K, F>(sales: &[EnrichedSale], key: F) -> BTreeMap<K, GroupMetrics>
where
    K: Ord,
    F: Fn(&EnrichedSale) -> K,
{
    let mut groups: BTreeMap<K, GroupMetrics> = BTreeMap::new();
    for sale in sales {
        groups.entry(key(sale)).or_default().add(sale);
    }
    groups.into_iter().map(|(k, m)| (k, m.rounded())).collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsAggregator;

impl MetricsAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Compute all four groupings. An empty input is a caller error.
    #[instrument(skip_all, fields(sales = sales.len()))]
    pub fn aggregate(&self, sales: &[EnrichedSale]) -> Result<AggregatedMetrics> {
        if sales.is_empty() {
            return Err(EtlError::Precondition(
                "aggregation requires at least one enriched sale".to_string(),
            ));
        }

        let by_branch = group_by(sales, |s| s.sale.branch.clone())
            .into_iter()
            .map(|(branch, totals)| {
                let mean_total_value = round2(totals.mean_total_value());
                (branch, BranchMetrics { totals, mean_total_value })
            })
            .collect();

        let metrics = AggregatedMetrics {
            by_product: group_by(sales, |s| s.sale.product_code.clone()),
            by_branch,
            by_category: group_by(sales, |s| s.sale.category.clone()),
            by_period: group_by(sales, |s| PeriodKey {
                year: s.sale.year,
                month: s.sale.month,
            }),
        };

        info!(
            "Aggregated {} products, {} branches, {} categories, {} periods",
            metrics.by_product.len(),
            metrics.by_branch.len(),
            metrics.by_category.len(),
            metrics.by_period.len()
        );
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SaleRecord;
    use chrono::NaiveDate;

    fn enriched(code: &str, branch: &str, month: u32, quantity: i64, total: f64, profit: Option<f64>) -> EnrichedSale {
        let date = NaiveDate::from_ymd_opt(2024, month, 1).unwrap();
        EnrichedSale {
            sale: SaleRecord {
                transaction_id: format!("{}-{}", code, total),
                product_code: code.to_string(),
                product_name: String::new(),
                category: "Geral".to_string(),
                branch: branch.to_string(),
                date,
                quantity,
                unit_price: None,
                discount_percent: 0.0,
                total_value: total,
                time: None,
                year: 2024,
                month,
                quarter: 1,
                weekday: 0,
                weekday_name: "Monday".to_string(),
                iso_week: 1,
                discounted_unit_price: None,
                day_period: None,
            },
            acquisition_cost: profit.map(|_| 1.0),
            product_margin_percent: None,
            supplier: None,
            sale_profit: profit,
            sale_margin_percent: None,
        }
    }

    #[test]
    fn test_empty_input_is_precondition_error() {
        let err = MetricsAggregator.aggregate(&[]).unwrap_err();
        assert!(matches!(err, EtlError::Precondition(_)));
    }

    #[test]
    fn test_groupings() {
        let sales = vec![
            enriched("P1", "Centro", 1, 2, 100.0, Some(40.0)),
            enriched("P1", "Norte", 1, 1, 50.0, Some(20.0)),
            enriched("P2", "Centro", 2, 5, 250.0, Some(75.5)),
        ];
        let metrics = MetricsAggregator.aggregate(&sales).unwrap();

        let p1 = &metrics.by_product["P1"];
        assert_eq!(p1.quantity, 3);
        assert_eq!(p1.total_value, 150.0);
        assert_eq!(p1.profit, Some(60.0));
        assert_eq!(p1.transactions, 2);

        let centro = &metrics.by_branch["Centro"];
        assert_eq!(centro.totals.total_value, 350.0);
        assert_eq!(centro.mean_total_value, 175.0);

        assert_eq!(metrics.by_category["Geral"].transactions, 3);

        let jan = &metrics.by_period[&PeriodKey { year: 2024, month: 1 }];
        assert_eq!(jan.total_value, 150.0);
        let feb = &metrics.by_period[&PeriodKey { year: 2024, month: 2 }];
        assert_eq!(feb.profit, Some(75.5));
    }

    #[test]
    fn test_null_profit_is_skipped_not_zeroed() {
        let sales = vec![
            enriched("P1", "Centro", 1, 1, 100.0, Some(30.0)),
            enriched("P9", "Centro", 1, 4, 60.0, None),
        ];
        let metrics = MetricsAggregator.aggregate(&sales).unwrap();

        let centro = &metrics.by_branch["Centro"].totals;
        assert_eq!(centro.total_value, 160.0);
        assert_eq!(centro.quantity, 5);
        assert_eq!(centro.transactions, 2);
        assert_eq!(centro.profit, Some(30.0));
        assert_eq!(centro.unmatched_transactions, 1);

        // A group with no known profit has no profit figure at all
        assert_eq!(metrics.by_product["P9"].profit, None);
    }

    #[test]
    fn test_product_totals_match_overall_total() {
        let sales = vec![
            enriched("P1", "A", 1, 1, 10.25, None),
            enriched("P2", "B", 2, 1, 20.10, Some(1.0)),
            enriched("P3", "A", 3, 1, 30.33, Some(2.0)),
            enriched("P1", "C", 3, 1, 5.07, Some(3.0)),
        ];
        let metrics = MetricsAggregator.aggregate(&sales).unwrap();

        let grouped: f64 = metrics.by_product.values().map(|m| m.total_value).sum();
        let overall: f64 = sales.iter().map(|s| s.sale.total_value).sum();
        assert!((grouped - overall).abs() < 1e-6);
    }
}
