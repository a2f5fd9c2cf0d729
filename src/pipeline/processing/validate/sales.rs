use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::SALE_DATE_FORMAT;
use crate::domain::{DayPeriod, SaleRecord};
use crate::types::{non_blank, RawSale};

use super::{RejectionReason, Validator};

/// Leading hour digits of a time cell such as "09:45" or "18:00:00"
static HOUR_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2})").expect("hour prefix pattern"));

/// DD/MM/YYYY shape with a four digit year
static SALE_DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("sale date pattern"));

/// Drops sales with an unparseable date or non-positive total/quantity and
/// derives the calendar, pricing and time-of-day fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaleValidator;

impl SaleValidator {
    pub fn new() -> Self {
        Self
    }
}

/// Parse a DD/MM/YYYY date; invalid calendar dates (31/02) and short years fail
pub fn parse_sale_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if !SALE_DATE_SHAPE.is_match(text) {
        return None;
    }
    NaiveDate::parse_from_str(text, SALE_DATE_FORMAT).ok()
}

/// Hour component of a time cell
pub fn parse_hour(time: &str) -> Option<u32> {
    HOUR_PREFIX
        .captures(time)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Unit price after a percentage discount; unchanged when there is no discount
fn discounted_price(unit_price: Option<f64>, discount_percent: f64) -> Option<f64> {
    if discount_percent > 0.0 {
        unit_price.map(|price| price - price * discount_percent / 100.0)
    } else {
        unit_price
    }
}

impl Validator for SaleValidator {
    type Raw = RawSale;
    type Clean = SaleRecord;
    const DATASET: &'static str = "sales";

    fn validate_row(&self, row: &RawSale) -> Result<SaleRecord, RejectionReason> {
        let date_text = non_blank(&row.date).ok_or(RejectionReason::MissingField("date"))?;
        let date = parse_sale_date(date_text).ok_or(RejectionReason::InvalidDate)?;

        let total_value = row
            .total_value
            .ok_or(RejectionReason::MissingField("total_value"))?;
        if !(total_value.is_finite() && total_value > 0.0) {
            return Err(RejectionReason::NonPositiveTotal);
        }
        let quantity = row.quantity.ok_or(RejectionReason::MissingField("quantity"))?;
        if quantity <= 0 {
            return Err(RejectionReason::NonPositiveQuantity);
        }

        let discount_percent = row.discount_percent.unwrap_or(0.0);
        let time = non_blank(&row.time).map(str::to_string);
        let day_period = time
            .as_deref()
            .and_then(parse_hour)
            .and_then(DayPeriod::from_hour);

        Ok(SaleRecord {
            transaction_id: non_blank(&row.transaction_id).unwrap_or_default().to_string(),
            product_code: non_blank(&row.product_code).unwrap_or_default().to_string(),
            product_name: non_blank(&row.product_name).unwrap_or_default().to_string(),
            category: non_blank(&row.category).unwrap_or_default().to_string(),
            branch: non_blank(&row.branch).unwrap_or_default().to_string(),
            date,
            quantity,
            unit_price: row.unit_price,
            discount_percent,
            total_value,
            time,
            year: date.year(),
            month: date.month(),
            quarter: (date.month() - 1) / 3 + 1,
            weekday: date.weekday().num_days_from_monday(),
            weekday_name: weekday_name(date.weekday()).to_string(),
            iso_week: date.iso_week().week(),
            discounted_unit_price: discounted_price(row.unit_price, discount_percent),
            day_period,
        })
    }
}
