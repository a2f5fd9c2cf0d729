//! Flat string tables, the shape every output sheet is written in.

use crate::constants::*;
use crate::domain::{EnrichedSale, OutlierRecord, Product, StockRecord};
use crate::pipeline::processing::{AggregatedMetrics, GroupMetrics};

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width for {}", self.name);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, for assertions and lookups
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }
}

pub(crate) fn money(value: f64) -> String {
    format!("{:.2}", value)
}

pub(crate) fn opt_money(value: Option<f64>) -> String {
    value.map(money).unwrap_or_default()
}

pub(crate) fn opt_text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

const SALE_COLUMNS: &[&str] = &[
    "transaction_id",
    "date",
    "time",
    "product_code",
    "product_name",
    "category",
    "branch",
    "quantity",
    "unit_price",
    "discount_percent",
    "discounted_unit_price",
    "total_value",
    "year",
    "month",
    "quarter",
    "weekday",
    "weekday_name",
    "iso_week",
    "day_period",
    "acquisition_cost",
    "product_margin_percent",
    "supplier",
    "sale_profit",
    "sale_margin_percent",
];

fn sale_row(sale: &EnrichedSale) -> Vec<String> {
    let s = &sale.sale;
    vec![
        s.transaction_id.clone(),
        s.date.format(SALE_DATE_FORMAT).to_string(),
        opt_text(s.time.as_deref()),
        s.product_code.clone(),
        s.product_name.clone(),
        s.category.clone(),
        s.branch.clone(),
        s.quantity.to_string(),
        opt_money(s.unit_price),
        money(s.discount_percent),
        opt_money(s.discounted_unit_price),
        money(s.total_value),
        s.year.to_string(),
        s.month.to_string(),
        s.quarter.to_string(),
        s.weekday.to_string(),
        s.weekday_name.clone(),
        s.iso_week.to_string(),
        opt_text(s.day_period.map(|p| p.label())),
        opt_money(sale.acquisition_cost),
        opt_money(sale.product_margin_percent),
        opt_text(sale.supplier.as_deref()),
        opt_money(sale.sale_profit),
        opt_money(sale.sale_margin_percent),
    ]
}

pub fn enriched_sales_table(sales: &[EnrichedSale]) -> Table {
    let mut table = Table::new(TABLE_ENRICHED_SALES, SALE_COLUMNS);
    for sale in sales {
        table.push(sale_row(sale));
    }
    table
}

pub fn outliers_table(outliers: &[OutlierRecord]) -> Table {
    let mut columns = SALE_COLUMNS.to_vec();
    columns.push("outlier_kind");
    let mut table = Table::new(TABLE_OUTLIERS, &columns);
    for outlier in outliers {
        let mut row = sale_row(&outlier.sale);
        row.push(outlier.kind.label().to_string());
        table.push(row);
    }
    table
}

pub fn products_table(products: &[Product]) -> Table {
    let mut table = Table::new(
        TABLE_PRODUCTS,
        &[
            "code",
            "description",
            "category",
            "sale_price",
            "acquisition_cost",
            "supplier",
            "margin_percent",
            "unit_profit",
        ],
    );
    for p in products {
        table.push(vec![
            p.code.clone(),
            p.description.clone(),
            p.category.clone(),
            money(p.sale_price),
            money(p.acquisition_cost),
            p.supplier.clone(),
            money(p.margin_percent),
            money(p.unit_profit),
        ]);
    }
    table
}

pub fn stock_table(stock: &[StockRecord]) -> Table {
    let mut table = Table::new(
        TABLE_STOCK,
        &[
            "product_code",
            "product_name",
            "branch",
            "quantity_available",
            "minimum_quantity",
            "last_restock",
            "lot",
            "stock_level",
            "replenishment_need",
        ],
    );
    for s in stock {
        table.push(vec![
            s.product_code.clone(),
            s.product_name.clone(),
            s.branch.clone(),
            s.quantity_available.to_string(),
            s.minimum_quantity.to_string(),
            s.last_restock.clone(),
            s.lot.clone(),
            s.stock_level.label().to_string(),
            s.replenishment_need.to_string(),
        ]);
    }
    table
}

const GROUP_COLUMNS: &[&str] = &[
    "quantity",
    "total_value",
    "profit",
    "transactions",
    "unmatched_transactions",
];

fn group_cells(m: &GroupMetrics) -> Vec<String> {
    vec![
        m.quantity.to_string(),
        money(m.total_value),
        opt_money(m.profit),
        m.transactions.to_string(),
        m.unmatched_transactions.to_string(),
    ]
}

fn keyed_columns(keys: &[&'static str], extra: &[&'static str]) -> Vec<&'static str> {
    keys.iter()
        .chain(GROUP_COLUMNS)
        .chain(extra)
        .copied()
        .collect()
}

/// The four metric sheets: product, branch, category, period
pub fn metrics_tables(metrics: &AggregatedMetrics) -> Vec<Table> {
    let mut by_product = Table::new(TABLE_BY_PRODUCT, &keyed_columns(&["product_code"], &[]));
    for (code, m) in &metrics.by_product {
        let mut row = vec![code.clone()];
        row.extend(group_cells(m));
        by_product.push(row);
    }

    let mut by_branch = Table::new(
        TABLE_BY_BRANCH,
        &keyed_columns(&["branch"], &["mean_total_value"]),
    );
    for (branch, m) in &metrics.by_branch {
        let mut row = vec![branch.clone()];
        row.extend(group_cells(&m.totals));
        row.push(money(m.mean_total_value));
        by_branch.push(row);
    }

    let mut by_category = Table::new(TABLE_BY_CATEGORY, &keyed_columns(&["category"], &[]));
    for (category, m) in &metrics.by_category {
        let mut row = vec![category.clone()];
        row.extend(group_cells(m));
        by_category.push(row);
    }

    let mut by_period = Table::new(TABLE_BY_PERIOD, &keyed_columns(&["year", "month"], &[]));
    for (period, m) in &metrics.by_period {
        let mut row = vec![period.year.to_string(), period.month.to_string()];
        row.extend(group_cells(m));
        by_period.push(row);
    }

    vec![by_product, by_branch, by_category, by_period]
}
