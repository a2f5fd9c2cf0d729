//! Validated and derived records flowing through the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::*;
use crate::types::{RawProduct, RawSale, RawStock};

/// A validated catalogue product. Price and cost are strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    pub description: String,
    pub category: String,
    pub sale_price: f64,
    pub acquisition_cost: f64,
    pub supplier: String,
    /// (price - cost) / price * 100, 2 dp
    pub margin_percent: f64,
    /// price - cost, 2 dp
    pub unit_profit: f64,
}

impl Product {
    pub fn to_raw(&self) -> RawProduct {
        RawProduct {
            code: Some(self.code.clone()),
            description: Some(self.description.clone()),
            category: Some(self.category.clone()),
            sale_price: Some(self.sale_price),
            acquisition_cost: Some(self.acquisition_cost),
            supplier: Some(self.supplier.clone()),
        }
    }
}

/// Stock level relative to the branch minimum threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StockLevel {
    Critical,
    Low,
    Adequate,
}

/// Ordered classification rules: first upper bound (inclusive) that the ratio fits wins.
const STOCK_LEVEL_RULES: [(f64, StockLevel); 2] = [
    (CRITICAL_STOCK_RATIO, StockLevel::Critical),
    (LOW_STOCK_RATIO, StockLevel::Low),
];

impl StockLevel {
    /// Classify a stock position. A missing or non-positive minimum has no
    /// meaningful ratio and is classified as Critical.
    pub fn classify(quantity: i64, minimum: i64) -> Self {
        if minimum <= 0 {
            return StockLevel::Critical;
        }
        let ratio = quantity as f64 / minimum as f64;
        STOCK_LEVEL_RULES
            .iter()
            .find(|(upper, _)| ratio <= *upper)
            .map(|(_, level)| *level)
            .unwrap_or(StockLevel::Adequate)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockLevel::Critical => "Critical",
            StockLevel::Low => "Low",
            StockLevel::Adequate => "Adequate",
        }
    }

    pub fn needs_attention(&self) -> bool {
        matches!(self, StockLevel::Critical | StockLevel::Low)
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A validated branch stock position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_code: String,
    pub product_name: String,
    pub branch: String,
    pub quantity_available: i64,
    pub minimum_quantity: i64,
    pub last_restock: String,
    pub lot: String,
    pub stock_level: StockLevel,
    /// max(0, minimum - quantity)
    pub replenishment_need: i64,
}

impl StockRecord {
    /// quantity / minimum, undefined for a non-positive minimum
    pub fn ratio_to_minimum(&self) -> Option<f64> {
        (self.minimum_quantity > 0)
            .then(|| self.quantity_available as f64 / self.minimum_quantity as f64)
    }

    pub fn to_raw(&self) -> RawStock {
        RawStock {
            product_code: Some(self.product_code.clone()),
            product_name: Some(self.product_name.clone()),
            branch: Some(self.branch.clone()),
            quantity_available: Some(self.quantity_available),
            minimum_quantity: Some(self.minimum_quantity),
            last_restock: Some(self.last_restock.clone()),
            lot: Some(self.lot.clone()),
        }
    }
}

/// Time-of-day bucket of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Night,
}

impl DayPeriod {
    /// [0,12) Morning, [12,18) Afternoon, [18,24] Night; anything else has no bucket
    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            h if (MORNING_START_HOUR..AFTERNOON_START_HOUR).contains(&h) => Some(DayPeriod::Morning),
            h if (AFTERNOON_START_HOUR..NIGHT_START_HOUR).contains(&h) => Some(DayPeriod::Afternoon),
            h if (NIGHT_START_HOUR..=DAY_END_HOUR).contains(&h) => Some(DayPeriod::Night),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "Morning",
            DayPeriod::Afternoon => "Afternoon",
            DayPeriod::Night => "Night",
        }
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A validated sale with its calendar and pricing derivations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub transaction_id: String,
    pub product_code: String,
    pub product_name: String,
    pub category: String,
    pub branch: String,
    pub date: NaiveDate,
    pub quantity: i64,
    pub unit_price: Option<f64>,
    pub discount_percent: f64,
    pub total_value: f64,
    pub time: Option<String>,

    pub year: i32,
    pub month: u32,
    pub quarter: u32,
    /// Monday = 0
    pub weekday: u32,
    pub weekday_name: String,
    pub iso_week: u32,
    pub discounted_unit_price: Option<f64>,
    pub day_period: Option<DayPeriod>,
}

impl SaleRecord {
    pub fn to_raw(&self) -> RawSale {
        RawSale {
            transaction_id: Some(self.transaction_id.clone()),
            product_code: Some(self.product_code.clone()),
            product_name: Some(self.product_name.clone()),
            category: Some(self.category.clone()),
            branch: Some(self.branch.clone()),
            date: Some(self.date.format(SALE_DATE_FORMAT).to_string()),
            quantity: Some(self.quantity),
            unit_price: self.unit_price,
            discount_percent: Some(self.discount_percent),
            total_value: Some(self.total_value),
            time: self.time.clone(),
        }
    }
}

/// A sale joined with its product's economics. Product fields are `None`
/// when the product code had no match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSale {
    pub sale: SaleRecord,
    pub acquisition_cost: Option<f64>,
    pub product_margin_percent: Option<f64>,
    pub supplier: Option<String>,
    /// total value - cost * quantity, 2 dp
    pub sale_profit: Option<f64>,
    /// profit / total value * 100, 2 dp
    pub sale_margin_percent: Option<f64>,
}

impl EnrichedSale {
    pub fn is_matched(&self) -> bool {
        self.acquisition_cost.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutlierKind {
    HighSale,
    LowSale,
}

impl OutlierKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutlierKind::HighSale => "High Sale",
            OutlierKind::LowSale => "Low Sale",
        }
    }
}

impl fmt::Display for OutlierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An enriched sale whose total value falls outside the interquartile fence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRecord {
    pub sale: EnrichedSale,
    pub kind: OutlierKind,
}
