use crate::constants::{NO_LOT, NO_RESTOCK_RECORD};
use crate::domain::{StockLevel, StockRecord};
use crate::types::{non_blank, RawStock};

use super::{RejectionReason, Validator};

/// Drops stock rows without product/branch/quantity or with negative quantity,
/// defaults the nullable columns and classifies the stock level.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockValidator;

impl StockValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Validator for StockValidator {
    type Raw = RawStock;
    type Clean = StockRecord;
    const DATASET: &'static str = "stock";

    fn validate_row(&self, row: &RawStock) -> Result<StockRecord, RejectionReason> {
        let product_code =
            non_blank(&row.product_code).ok_or(RejectionReason::MissingField("product_code"))?;
        let branch = non_blank(&row.branch).ok_or(RejectionReason::MissingField("branch"))?;
        let quantity_available = row
            .quantity_available
            .ok_or(RejectionReason::MissingField("quantity_available"))?;
        if quantity_available < 0 {
            return Err(RejectionReason::NegativeQuantity);
        }

        // A missing or non-positive minimum has no threshold to compare against
        let minimum_quantity = row.minimum_quantity.unwrap_or(0).max(0);

        Ok(StockRecord {
            product_code: product_code.to_string(),
            product_name: non_blank(&row.product_name).unwrap_or_default().to_string(),
            branch: branch.to_string(),
            quantity_available,
            minimum_quantity,
            last_restock: non_blank(&row.last_restock)
                .unwrap_or(NO_RESTOCK_RECORD)
                .to_string(),
            lot: non_blank(&row.lot).unwrap_or(NO_LOT).to_string(),
            stock_level: StockLevel::classify(quantity_available, minimum_quantity),
            replenishment_need: (minimum_quantity - quantity_available).max(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(quantity: Option<i64>, minimum: Option<i64>) -> RawStock {
        RawStock {
            product_code: Some("P001".to_string()),
            product_name: Some("Mouse sem fio".to_string()),
            branch: Some("Filial Centro".to_string()),
            quantity_available: quantity,
            minimum_quantity: minimum,
            last_restock: None,
            lot: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_defaults_nullable_fields() {
        let record = StockValidator.validate_row(&raw(Some(30), Some(20))).unwrap();
        assert_eq!(record.last_restock, NO_RESTOCK_RECORD);
        assert_eq!(record.lot, NO_LOT);
        assert_eq!(record.stock_level, StockLevel::Adequate);
        assert_eq!(record.replenishment_need, 0);
    }

    #[test]
    fn test_replenishment_need() {
        let record = StockValidator.validate_row(&raw(Some(4), Some(20))).unwrap();
        assert_eq!(record.stock_level, StockLevel::Critical);
        assert_eq!(record.replenishment_need, 16);

        let record = StockValidator.validate_row(&raw(Some(15), Some(20))).unwrap();
        assert_eq!(record.stock_level, StockLevel::Low);
        assert_eq!(record.replenishment_need, 5);
    }

    #[test]
    fn test_quantity_equal_to_minimum_is_low_with_no_need() {
        let record = StockValidator.validate_row(&raw(Some(20), Some(20))).unwrap();
        assert_eq!(record.stock_level, StockLevel::Low);
        assert_eq!(record.replenishment_need, 0);
    }

    #[test]
    fn test_negative_or_missing_quantity_is_dropped() {
        assert_eq!(
            StockValidator.validate_row(&raw(Some(-1), Some(20))),
            Err(RejectionReason::NegativeQuantity)
        );
        assert_eq!(
            StockValidator.validate_row(&raw(None, Some(20))),
            Err(RejectionReason::MissingField("quantity_available"))
        );
    }

    #[test]
    fn test_missing_minimum_is_critical() {
        let record = StockValidator.validate_row(&raw(Some(8), None)).unwrap();
        assert_eq!(record.minimum_quantity, 0);
        assert_eq!(record.stock_level, StockLevel::Critical);
        assert_eq!(record.replenishment_need, 0);
        assert!(record.ratio_to_minimum().is_none());
    }

    #[test]
    fn test_extreme_negative_minimum_is_clamped() {
        let record = StockValidator.validate_row(&raw(Some(8), Some(i64::MIN))).unwrap();
        assert_eq!(record.minimum_quantity, 0);
        assert_eq!(record.stock_level, StockLevel::Critical);
        assert_eq!(record.replenishment_need, 0);
    }

    #[test]
    fn test_revalidation_is_identity() {
        let rows = vec![raw(Some(0), Some(10)), raw(Some(12), Some(10)), raw(Some(-5), Some(1))];
        let first = StockValidator.validate(&rows);
        let again: Vec<RawStock> = first.rows().iter().map(StockRecord::to_raw).collect();
        let second = StockValidator.validate(&again);

        assert_eq!(first.len(), 2);
        assert_eq!(first.rows(), second.rows());
    }
}
