use std::collections::HashMap;
use tracing::{info, instrument, warn};

use crate::constants::round2;
use crate::domain::{EnrichedSale, Product, SaleRecord};
use crate::pipeline::processing::validate::ValidatedDataset;

/// Product economics looked up for a sale
#[derive(Debug, Clone, Copy)]
struct ProductEconomics<'a> {
    acquisition_cost: f64,
    margin_percent: f64,
    supplier: &'a str,
}

/// Left-joins validated sales onto validated products by product code.
///
/// Output has exactly one row per input sale, in input order. Sales whose code has
/// no product keep `None` cost, margin, supplier and profit; they are never dropped
/// and never given a zero profit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalesEnricher;

impl SalesEnricher {
    pub fn new() -> Self {
        Self
    }

    /// Index products by code. The first occurrence of a repeated code wins so the
    /// join can never fan out.
    fn index_products(products: &[Product]) -> HashMap<&str, ProductEconomics<'_>> {
        let mut index = HashMap::with_capacity(products.len());
        for product in products {
            if index.contains_key(product.code.as_str()) {
                warn!(code = %product.code, "Duplicate product code, keeping first occurrence");
                continue;
            }
            index.insert(
                product.code.as_str(),
                ProductEconomics {
                    acquisition_cost: product.acquisition_cost,
                    margin_percent: product.margin_percent,
                    supplier: product.supplier.as_str(),
                },
            );
        }
        index
    }

    fn enrich_sale(sale: &SaleRecord, economics: Option<&ProductEconomics<'_>>) -> EnrichedSale {
        let Some(economics) = economics else {
            return EnrichedSale {
                sale: sale.clone(),
                acquisition_cost: None,
                product_margin_percent: None,
                supplier: None,
                sale_profit: None,
                sale_margin_percent: None,
            };
        };

        let profit = round2(sale.total_value - economics.acquisition_cost * sale.quantity as f64);
        let margin = round2(profit / sale.total_value * 100.0);

        EnrichedSale {
            sale: sale.clone(),
            acquisition_cost: Some(economics.acquisition_cost),
            product_margin_percent: Some(economics.margin_percent),
            supplier: Some(economics.supplier.to_string()),
            sale_profit: Some(profit),
            sale_margin_percent: Some(margin),
        }
    }

    #[instrument(skip_all, fields(products = products.len(), sales = sales.len()))]
    pub fn enrich(
        &self,
        products: &ValidatedDataset<Product>,
        sales: &ValidatedDataset<SaleRecord>,
    ) -> Vec<EnrichedSale> {
        let index = Self::index_products(products.rows());

        let enriched: Vec<EnrichedSale> = sales
            .rows()
            .iter()
            .map(|sale| Self::enrich_sale(sale, index.get(sale.product_code.as_str())))
            .collect();

        let matched = enriched.iter().filter(|s| s.is_matched()).count();
        let unmatched = enriched.len() - matched;
        crate::metrics::enrich::batch_enriched(matched, unmatched);
        if unmatched > 0 {
            warn!("{} sales have no matching product", unmatched);
        }
        info!("Enriched {} sales ({} matched)", enriched.len(), matched);

        enriched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::validate::{ProductValidator, SaleValidator, Validator};
    use crate::types::{RawProduct, RawSale};

    fn product(code: &str, price: f64, cost: f64, supplier: &str) -> RawProduct {
        RawProduct {
            code: Some(code.to_string()),
            description: Some(format!("Produto {}", code)),
            category: Some("Geral".to_string()),
            sale_price: Some(price),
            acquisition_cost: Some(cost),
            supplier: Some(supplier.to_string()),
        }
    }

    fn sale(id: &str, code: &str, quantity: i64, total: f64) -> RawSale {
        RawSale {
            transaction_id: Some(id.to_string()),
            product_code: Some(code.to_string()),
            date: Some("10/02/2024".to_string()),
            quantity: Some(quantity),
            unit_price: Some(total / quantity as f64),
            total_value: Some(total),
            time: Some("10:00".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_enrich_matched_sale() {
        let products = ProductValidator.validate(&[product("P1", 100.0, 60.0, "Acme")]);
        let sales = SaleValidator.validate(&[sale("V1", "P1", 3, 270.0)]);

        let enriched = SalesEnricher.enrich(&products, &sales);

        assert_eq!(enriched.len(), 1);
        let row = &enriched[0];
        assert_eq!(row.acquisition_cost, Some(60.0));
        assert_eq!(row.product_margin_percent, Some(40.0));
        assert_eq!(row.supplier.as_deref(), Some("Acme"));
        assert_eq!(row.sale_profit, Some(90.0));
        assert_eq!(row.sale_margin_percent, Some(33.33));
    }

    #[test]
    fn test_unmatched_sale_keeps_null_economics() {
        let products = ProductValidator.validate(&[product("P1", 100.0, 60.0, "Acme")]);
        let sales = SaleValidator.validate(&[sale("V1", "P1", 1, 100.0), sale("V2", "P404", 1, 80.0)]);

        let enriched = SalesEnricher.enrich(&products, &sales);

        assert_eq!(enriched.len(), 2);
        let orphan = &enriched[1];
        assert_eq!(orphan.sale.transaction_id, "V2");
        assert!(!orphan.is_matched());
        assert_eq!(orphan.sale_profit, None);
        assert_eq!(orphan.sale_margin_percent, None);
        assert_eq!(orphan.supplier, None);
    }

    #[test]
    fn test_duplicate_product_codes_do_not_fan_out() {
        let products = ProductValidator.validate(&[
            product("P1", 100.0, 60.0, "First"),
            product("P1", 100.0, 10.0, "Second"),
        ]);
        let sales = SaleValidator.validate(&[sale("V1", "P1", 1, 100.0)]);

        let enriched = SalesEnricher.enrich(&products, &sales);

        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].supplier.as_deref(), Some("First"));
    }

    #[test]
    fn test_enrich_empty_sales() {
        let products = ProductValidator.validate(&[product("P1", 100.0, 60.0, "Acme")]);
        let sales = SaleValidator.validate(&[]);
        assert!(SalesEnricher.enrich(&products, &sales).is_empty());
    }
}
