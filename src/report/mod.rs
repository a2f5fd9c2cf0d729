//! Output sheets and KPI summaries built from a pipeline run.

pub mod kpi;
pub mod table;

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::constants::*;
use crate::pipeline::PipelineOutput;
pub use kpi::{
    BranchStock, MonthlyEvolution, RevenueShare, SalesKpis, StockAlert, TopProduct,
};
pub use table::Table;
use table::{money, opt_money};

/// Everything derived for dashboards; serialized as the KPI document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kpis: SalesKpis,
    pub branch_share: Vec<RevenueShare>,
    pub category_share: Vec<RevenueShare>,
    pub monthly: Vec<MonthlyEvolution>,
    pub top_products: Vec<TopProduct>,
    pub stock_alerts: Vec<StockAlert>,
    pub stock_by_branch: Vec<BranchStock>,
}

impl Report {
    pub fn build(output: &PipelineOutput, config: &AnalysisConfig) -> Self {
        Self {
            kpis: SalesKpis::compute(&output.enriched_sales, output.outliers.len()),
            branch_share: kpi::branch_shares(&output.metrics),
            category_share: kpi::category_shares(&output.metrics),
            monthly: kpi::monthly_evolution(&output.metrics),
            top_products: kpi::top_products(
                &output.metrics,
                &output.enriched_sales,
                config.top_products,
            ),
            stock_alerts: kpi::stock_alerts(output.stock.rows(), config.stock_alert_limit),
            stock_by_branch: kpi::stock_by_branch(output.stock.rows()),
        }
    }

    fn monthly_table(&self) -> Table {
        let mut table = Table::new(
            TABLE_MONTHLY,
            &["year", "month", "revenue", "transactions", "units", "growth_percent"],
        );
        for m in &self.monthly {
            table.push(vec![
                m.year.to_string(),
                m.month.to_string(),
                money(m.revenue),
                m.transactions.to_string(),
                m.units.to_string(),
                opt_money(m.growth_percent),
            ]);
        }
        table
    }

    fn top_products_table(&self) -> Table {
        let mut table = Table::new(
            TABLE_TOP_PRODUCTS,
            &["rank", "product_code", "product_name", "revenue", "quantity", "profit"],
        );
        for (rank, p) in self.top_products.iter().enumerate() {
            table.push(vec![
                (rank + 1).to_string(),
                p.product_code.clone(),
                p.product_name.clone(),
                money(p.revenue),
                p.quantity.to_string(),
                opt_money(p.profit),
            ]);
        }
        table
    }

    fn stock_alerts_table(&self) -> Table {
        let mut table = Table::new(
            TABLE_STOCK_ALERTS,
            &[
                "product_code",
                "product_name",
                "branch",
                "quantity_available",
                "minimum_quantity",
                "stock_level",
                "replenishment_need",
                "percent_of_minimum",
            ],
        );
        for a in &self.stock_alerts {
            table.push(vec![
                a.product_code.clone(),
                a.product_name.clone(),
                a.branch.clone(),
                a.quantity_available.to_string(),
                a.minimum_quantity.to_string(),
                a.stock_level.label().to_string(),
                a.replenishment_need.to_string(),
                a.percent_of_minimum
                    .map(|p| format!("{:.1}", p))
                    .unwrap_or_default(),
            ]);
        }
        table
    }

    fn stock_by_branch_table(&self) -> Table {
        let mut table = Table::new(TABLE_STOCK_BY_BRANCH, &["branch", "units", "skus", "alerts"]);
        for b in &self.stock_by_branch {
            table.push(vec![
                b.branch.clone(),
                b.units.to_string(),
                b.skus.to_string(),
                b.alerts.to_string(),
            ]);
        }
        table
    }
}

/// Every sheet of a run, in write order
pub fn all_tables(output: &PipelineOutput, report: &Report) -> Vec<Table> {
    let mut tables = vec![
        table::enriched_sales_table(&output.enriched_sales),
        table::products_table(output.products.rows()),
        table::stock_table(output.stock.rows()),
    ];
    tables.extend(table::metrics_tables(&output.metrics));
    tables.push(table::outliers_table(&output.outliers));
    tables.push(report.monthly_table());
    tables.push(report.top_products_table());
    tables.push(report.stock_alerts_table());
    tables.push(report.stock_by_branch_table());
    tables
}
