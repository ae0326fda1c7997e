//! Runtime configuration from the environment (`.env` is honoured by the binary).

use rust_decimal::Decimal;
use std::str::FromStr;
use crate::domain::aggregates::{Catalog, CatalogLoadError};
use crate::supplier::{InvalidRatio, SupplierConfig};

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub nats_subject_prefix: String,
    pub catalog_path: Option<String>,
    pub supplier: SupplierConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => 8083,
        };
        let ratio = match var("WHOLESALE_RATIO") {
            Some(raw) => Decimal::from_str(&raw).map_err(|_| ConfigError::Invalid { key: "WHOLESALE_RATIO", value: raw })?,
            None => SupplierConfig::default().wholesale_ratio,
        };
        let prefix = var("SUPPLIER_SKU_PREFIX").unwrap_or_else(|| SupplierConfig::default().sku_prefix);
        Ok(Self {
            port,
            database_url: var("DATABASE_URL"),
            nats_url: var("NATS_URL"),
            nats_subject_prefix: var("NATS_SUBJECT_PREFIX").unwrap_or_else(|| "dropship".to_string()),
            catalog_path: var("CATALOG_PATH"),
            supplier: SupplierConfig::new(prefix, ratio)?,
        })
    }

    pub fn load_catalog(&self) -> Result<Catalog, CatalogLoadError> {
        match &self.catalog_path {
            Some(path) => Catalog::load(path),
            None => Catalog::embedded(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: `{value}`")]
    Invalid { key: &'static str, value: String },
    #[error("WHOLESALE_RATIO: {0}")]
    Ratio(#[from] InvalidRatio),
}
