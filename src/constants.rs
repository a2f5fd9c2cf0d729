/// Business thresholds and sentinels shared across the pipeline.
/// Keeping them here avoids magic literals inside the classifiers.

// Stock level classification (ratio = quantity available / minimum threshold)
pub const CRITICAL_STOCK_RATIO: f64 = 0.5;
pub const LOW_STOCK_RATIO: f64 = 1.0;

// Outlier fence: Q1 - k*IQR .. Q3 + k*IQR
pub const IQR_FENCE_MULTIPLIER: f64 = 1.5;
pub const FIRST_QUARTILE: f64 = 0.25;
pub const THIRD_QUARTILE: f64 = 0.75;
/// Below this many values the fences are the quartiles themselves
pub const MIN_ROWS_FOR_FENCE: usize = 4;

// Time-of-day buckets, hour boundaries
pub const MORNING_START_HOUR: u32 = 0;
pub const AFTERNOON_START_HOUR: u32 = 12;
pub const NIGHT_START_HOUR: u32 = 18;
pub const DAY_END_HOUR: u32 = 24;

// Defaults for nullable stock fields
pub const NO_RESTOCK_RECORD: &str = "Sem registro";
pub const NO_LOT: &str = "N/A";

/// Textual sale date format (DD/MM/YYYY)
pub const SALE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Decimal places kept on money and percentage columns
pub const MONEY_DECIMALS: i32 = 2;

// Output table names
pub const TABLE_ENRICHED_SALES: &str = "vendas_processadas";
pub const TABLE_PRODUCTS: &str = "produtos_validados";
pub const TABLE_STOCK: &str = "estoque_validado";
pub const TABLE_BY_PRODUCT: &str = "metricas_por_produto";
pub const TABLE_BY_BRANCH: &str = "metricas_por_filial";
pub const TABLE_BY_CATEGORY: &str = "metricas_por_categoria";
pub const TABLE_BY_PERIOD: &str = "metricas_por_periodo";
pub const TABLE_OUTLIERS: &str = "outliers";
pub const TABLE_MONTHLY: &str = "evolucao_mensal";
pub const TABLE_TOP_PRODUCTS: &str = "top_produtos";
pub const TABLE_STOCK_ALERTS: &str = "alertas_estoque";
pub const TABLE_STOCK_BY_BRANCH: &str = "estoque_por_filial";
pub const KPIS_FILE: &str = "kpis.json";
pub const METRICS_FILE: &str = "metrics.prom";

/// Round to a fixed number of decimal places (half away from zero)
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round a money or percentage value to two decimals
pub fn round2(value: f64) -> f64 {
    round_to(value, MONEY_DECIMALS)
}
