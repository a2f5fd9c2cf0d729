//! Raw input rows, one shape per dataset.
//!
//! Every field is optional and unparseable numeric cells deserialize to `None`,
//! so malformed rows always reach the validators (which drop or default them)
//! instead of failing the read. Column names are accepted in English or with the
//! original spreadsheet headers.

use serde::{Deserialize, Serialize};

/// Raw product catalogue row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProduct {
    #[serde(alias = "Código")]
    pub code: Option<String>,
    #[serde(alias = "Descrição")]
    pub description: Option<String>,
    #[serde(alias = "Categoria")]
    pub category: Option<String>,
    #[serde(alias = "Preço Venda", deserialize_with = "csv::invalid_option")]
    pub sale_price: Option<f64>,
    #[serde(alias = "Custo Aquisição", deserialize_with = "csv::invalid_option")]
    pub acquisition_cost: Option<f64>,
    #[serde(alias = "Fornecedor")]
    pub supplier: Option<String>,
}

/// Raw branch stock position row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawStock {
    #[serde(alias = "Código Produto")]
    pub product_code: Option<String>,
    #[serde(alias = "Produto")]
    pub product_name: Option<String>,
    #[serde(alias = "Filial")]
    pub branch: Option<String>,
    #[serde(alias = "Quantidade Disponível", deserialize_with = "csv::invalid_option")]
    pub quantity_available: Option<i64>,
    #[serde(alias = "Estoque Mínimo", deserialize_with = "csv::invalid_option")]
    pub minimum_quantity: Option<i64>,
    #[serde(alias = "Última Entrada")]
    pub last_restock: Option<String>,
    #[serde(alias = "Lote")]
    pub lot: Option<String>,
}

/// Raw point-of-sale transaction row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSale {
    #[serde(alias = "ID Venda")]
    pub transaction_id: Option<String>,
    #[serde(alias = "Cód. Produto")]
    pub product_code: Option<String>,
    #[serde(alias = "Produto")]
    pub product_name: Option<String>,
    #[serde(alias = "Categoria")]
    pub category: Option<String>,
    #[serde(alias = "Filial")]
    pub branch: Option<String>,
    /// DD/MM/YYYY
    #[serde(alias = "Data")]
    pub date: Option<String>,
    #[serde(alias = "Qtd", deserialize_with = "csv::invalid_option")]
    pub quantity: Option<i64>,
    #[serde(alias = "Preço Unit.", deserialize_with = "csv::invalid_option")]
    pub unit_price: Option<f64>,
    /// Percent, 0-100
    #[serde(alias = "Desconto", deserialize_with = "csv::invalid_option")]
    pub discount_percent: Option<f64>,
    #[serde(alias = "Valor Total", deserialize_with = "csv::invalid_option")]
    pub total_value: Option<f64>,
    /// HH:MM[:SS]
    #[serde(alias = "Hora")]
    pub time: Option<String>,
}

/// The three raw datasets consumed by one pipeline run
#[derive(Debug, Clone, Default)]
pub struct RawDatasets {
    pub products: Vec<RawProduct>,
    pub stock: Vec<RawStock>,
    pub sales: Vec<RawSale>,
}

/// Treat blank cells the same as absent ones
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
