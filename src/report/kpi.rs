//! Business summaries computed from a finished pipeline run.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{round2, round_to};
use crate::domain::{EnrichedSale, StockLevel, StockRecord};
use crate::pipeline::processing::{AggregatedMetrics, GroupMetrics};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesKpis {
    pub total_revenue: f64,
    pub transactions: usize,
    pub average_ticket: f64,
    pub units_sold: i64,
    /// Sum over sales matched to a product
    pub total_profit: f64,
    pub unmatched_sales: usize,
    pub outliers: usize,
}

impl SalesKpis {
    pub fn compute(sales: &[EnrichedSale], outliers: usize) -> Self {
        let revenue: f64 = sales.iter().map(|s| s.sale.total_value).sum();
        let transactions = sales.len();
        let average_ticket = if transactions == 0 {
            0.0
        } else {
            revenue / transactions as f64
        };

        Self {
            total_revenue: round2(revenue),
            transactions,
            average_ticket: round2(average_ticket),
            units_sold: sales.iter().map(|s| s.sale.quantity).sum(),
            total_profit: round2(sales.iter().filter_map(|s| s.sale_profit).sum()),
            unmatched_sales: sales.iter().filter(|s| !s.is_matched()).count(),
            outliers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueShare {
    pub key: String,
    pub revenue: f64,
    pub share_percent: f64,
}

/// Percentage of the grand total held by each group. Empty when there is no revenue.
pub fn revenue_shares<'a, I>(groups: I) -> Vec<RevenueShare>
where
    I: IntoIterator<Item = (&'a String, &'a GroupMetrics)>,
{
    let groups: Vec<(&String, &GroupMetrics)> = groups.into_iter().collect();
    let total: f64 = groups.iter().map(|(_, m)| m.total_value).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    groups
        .into_iter()
        .map(|(key, m)| RevenueShare {
            key: key.clone(),
            revenue: m.total_value,
            share_percent: round2(m.total_value / total * 100.0),
        })
        .collect()
}

pub fn branch_shares(metrics: &AggregatedMetrics) -> Vec<RevenueShare> {
    revenue_shares(metrics.by_branch.iter().map(|(k, m)| (k, &m.totals)))
}

pub fn category_shares(metrics: &AggregatedMetrics) -> Vec<RevenueShare> {
    revenue_shares(metrics.by_category.iter())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyEvolution {
    pub year: i32,
    pub month: u32,
    pub revenue: f64,
    pub transactions: usize,
    pub units: i64,
    /// Month over month, `None` without a comparable previous month
    pub growth_percent: Option<f64>,
}

pub fn monthly_evolution(metrics: &AggregatedMetrics) -> Vec<MonthlyEvolution> {
    let mut previous: Option<f64> = None;
    metrics
        .by_period
        .iter()
        .map(|(period, m)| {
            let growth_percent = previous
                .filter(|prev| *prev != 0.0)
                .map(|prev| round2((m.total_value - prev) / prev * 100.0));
            previous = Some(m.total_value);
            MonthlyEvolution {
                year: period.year,
                month: period.month,
                revenue: m.total_value,
                transactions: m.transactions,
                units: m.quantity,
                growth_percent,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub product_code: String,
    pub product_name: String,
    pub revenue: f64,
    pub quantity: i64,
    pub profit: Option<f64>,
}

pub fn top_products(metrics: &AggregatedMetrics, sales: &[EnrichedSale], limit: usize) -> Vec<TopProduct> {
    let mut names: BTreeMap<&str, &str> = BTreeMap::new();
    for sale in sales {
        if !sale.sale.product_name.is_empty() {
            names
                .entry(sale.sale.product_code.as_str())
                .or_insert(sale.sale.product_name.as_str());
        }
    }

    let mut ranked: Vec<(&String, &GroupMetrics)> = metrics.by_product.iter().collect();
    ranked.sort_by(|(code_a, a), (code_b, b)| {
        b.total_value
            .total_cmp(&a.total_value)
            .then_with(|| code_a.cmp(code_b))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(code, m)| TopProduct {
            product_code: code.clone(),
            product_name: names.get(code.as_str()).copied().unwrap_or_default().to_string(),
            revenue: m.total_value,
            quantity: m.quantity,
            profit: m.profit,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockAlert {
    pub product_code: String,
    pub product_name: String,
    pub branch: String,
    pub quantity_available: i64,
    pub minimum_quantity: i64,
    pub stock_level: StockLevel,
    pub replenishment_need: i64,
    /// Quantity as a percentage of the minimum, 1 dp
    pub percent_of_minimum: Option<f64>,
}

/// Critical and Low positions, lowest ratio first. Positions without a usable
/// minimum have no ratio and sort after every quantified alert.
pub fn stock_alerts(stock: &[StockRecord], limit: usize) -> Vec<StockAlert> {
    let mut alerts: Vec<(&StockRecord, Option<f64>)> = stock
        .iter()
        .filter(|s| s.stock_level.needs_attention())
        .map(|s| (s, s.ratio_to_minimum()))
        .collect();

    alerts.sort_by(|(a, ra), (b, rb)| {
        let by_ratio = match (ra, rb) {
            (Some(x), Some(y)) => x.total_cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_ratio
            .then_with(|| a.branch.cmp(&b.branch))
            .then_with(|| a.product_code.cmp(&b.product_code))
    });

    alerts
        .into_iter()
        .take(limit)
        .map(|(s, ratio)| StockAlert {
            product_code: s.product_code.clone(),
            product_name: s.product_name.clone(),
            branch: s.branch.clone(),
            quantity_available: s.quantity_available,
            minimum_quantity: s.minimum_quantity,
            stock_level: s.stock_level,
            replenishment_need: s.replenishment_need,
            percent_of_minimum: ratio.map(|r| round_to(r * 100.0, 1)),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BranchStock {
    pub branch: String,
    pub units: i64,
    pub skus: usize,
    pub alerts: usize,
}

pub fn stock_by_branch(stock: &[StockRecord]) -> Vec<BranchStock> {
    let mut branches: BTreeMap<&str, (i64, BTreeSet<&str>, usize)> = BTreeMap::new();
    for s in stock {
        let entry = branches.entry(s.branch.as_str()).or_default();
        entry.0 += s.quantity_available;
        entry.1.insert(s.product_code.as_str());
        if s.stock_level.needs_attention() {
            entry.2 += 1;
        }
    }

    branches
        .into_iter()
        .map(|(branch, (units, skus, alerts))| BranchStock {
            branch: branch.to_string(),
            units,
            skus: skus.len(),
            alerts,
        })
        .collect()
}
