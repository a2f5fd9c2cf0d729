use crate::constants::round2;
use crate::domain::Product;
use crate::types::{non_blank, RawProduct};

use super::{RejectionReason, Validator};

/// Drops products without code/description/price or with non-positive economics,
/// trims text fields and derives margin and unit profit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductValidator;

impl ProductValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Validator for ProductValidator {
    type Raw = RawProduct;
    type Clean = Product;
    const DATASET: &'static str = "products";

    fn validate_row(&self, row: &RawProduct) -> Result<Product, RejectionReason> {
        let code = non_blank(&row.code).ok_or(RejectionReason::MissingField("code"))?;
        let description =
            non_blank(&row.description).ok_or(RejectionReason::MissingField("description"))?;
        let sale_price = row
            .sale_price
            .ok_or(RejectionReason::MissingField("sale_price"))?;

        if !(sale_price.is_finite() && sale_price > 0.0) {
            return Err(RejectionReason::NonPositivePrice);
        }
        let acquisition_cost = row
            .acquisition_cost
            .ok_or(RejectionReason::MissingField("acquisition_cost"))?;
        if !(acquisition_cost.is_finite() && acquisition_cost > 0.0) {
            return Err(RejectionReason::NonPositiveCost);
        }

        Ok(Product {
            code: code.to_string(),
            description: description.to_string(),
            category: non_blank(&row.category).unwrap_or_default().to_string(),
            sale_price,
            acquisition_cost,
            supplier: non_blank(&row.supplier).unwrap_or_default().to_string(),
            margin_percent: round2((sale_price - acquisition_cost) / sale_price * 100.0),
            unit_profit: round2(sale_price - acquisition_cost),
        })
    }
}
