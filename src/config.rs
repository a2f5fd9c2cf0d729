use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::IQR_FENCE_MULTIPLIER;
use crate::error::{EtlError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub products: PathBuf,
    pub stock: PathBuf,
    pub sales: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            products: PathBuf::from("data/produtos.csv"),
            stock: PathBuf::from("data/estoque_filiais.csv"),
            sales: PathBuf::from("data/vendas.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub write_kpis_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            write_kpis_json: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fence reach in interquartile ranges
    pub iqr_multiplier: f64,
    pub top_products: usize,
    pub stock_alert_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: IQR_FENCE_MULTIPLIER,
            top_products: 10,
            stock_alert_limit: 10,
        }
    }
}

impl Config {
    /// Load from a TOML file. A missing file at the default path falls back to
    /// defaults; a missing file anywhere else is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
            tracing::info!("No {} found, using default configuration", DEFAULT_CONFIG_PATH);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let multiplier = self.analysis.iqr_multiplier;
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(EtlError::Config(format!(
                "analysis.iqr_multiplier must be positive, got {}",
                multiplier
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.input.sales, PathBuf::from("data/vendas.csv"));
        assert_eq!(config.output.dir, PathBuf::from("output"));
        assert!(config.output.write_kpis_json);
        assert_eq!(config.analysis.iqr_multiplier, 1.5);
        assert_eq!(config.analysis.top_products, 10);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [input]
            sales = "/tmp/sales.csv"

            [analysis]
            iqr_multiplier = 3.0
            "#,
        )
        .unwrap();
        assert_eq!(config.input.sales, PathBuf::from("/tmp/sales.csv"));
        assert_eq!(config.input.products, PathBuf::from("data/produtos.csv"));
        assert_eq!(config.analysis.iqr_multiplier, 3.0);
        assert_eq!(config.analysis.stock_alert_limit, 10);
    }

    #[test]
    fn test_rejects_non_positive_multiplier() {
        let err = Config::from_toml("[analysis]\niqr_multiplier = 0.0").unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = Config::load(Path::new("/nonexistent/sales_etl.toml")).unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
    }
}
