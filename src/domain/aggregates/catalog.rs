//! Catalog Mapping Table
//!
//! Maps internal product ids to supplier listings, base prices and variants.
//! Built once at startup and shared read-only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const DEFAULT_CATALOG: &str = include_str!("../../../config/catalog.json");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationScheme {
    #[default]
    None,
    Color,
    SizeColor,
    Type,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSelection {
    pub variant_key: String,
    pub display_label: String,
    #[serde(rename = "priceOverrideUSD", default, skip_serializing_if = "Option::is_none")]
    pub price_override_usd: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub product_id: String,
    pub supplier_id: String,
    pub display_name: String,
    #[serde(rename = "basePriceUSD")]
    pub base_price_usd: Decimal,
    #[serde(default)]
    pub variation_scheme: VariationScheme,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantSelection>,
}

impl CatalogEntry {
    pub fn variant(&self, key: &str) -> Option<&VariantSelection> {
        self.variants.iter().find(|v| v.variant_key == key)
    }

    fn validate(&self) -> Result<(), CatalogLoadError> {
        let invalid = |reason: &str| CatalogLoadError::InvalidEntry { product_id: self.product_id.clone(), reason: reason.to_string() };
        if self.product_id.trim().is_empty() { return Err(invalid("empty productId")); }
        if self.supplier_id.trim().is_empty() { return Err(invalid("empty supplierId")); }
        if self.base_price_usd <= Decimal::ZERO { return Err(invalid("basePriceUSD must be positive")); }
        match self.variation_scheme {
            VariationScheme::None if !self.variants.is_empty() => return Err(invalid("scheme `none` cannot declare variants")),
            VariationScheme::None => {}
            _ if self.variants.is_empty() => return Err(invalid("scheme requires at least one variant")),
            _ => {}
        }
        let mut keys = HashSet::new();
        for v in &self.variants {
            if v.variant_key.trim().is_empty() { return Err(invalid("empty variantKey")); }
            if !keys.insert(v.variant_key.as_str()) {
                return Err(invalid(&format!("duplicate variantKey `{}`", v.variant_key)));
            }
            if v.price_override_usd.is_some_and(|p| p <= Decimal::ZERO) {
                return Err(invalid(&format!("priceOverrideUSD of `{}` must be positive", v.variant_key)));
            }
        }
        Ok(())
    }
}

/// Outcome of a catalog lookup: the entry, the chosen variant and the unit price to charge.
#[derive(Clone, Debug)]
pub struct Resolved<'a> {
    pub entry: &'a CatalogEntry,
    pub variant: Option<&'a VariantSelection>,
    pub unit_price_usd: Decimal,
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogLoadError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            entry.validate()?;
            if map.contains_key(&entry.product_id) {
                return Err(CatalogLoadError::DuplicateProduct(entry.product_id));
            }
            map.insert(entry.product_id.clone(), entry);
        }
        Ok(Self { entries: map })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogLoadError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogLoadError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io { path: path.display().to_string(), source })?;
        Self::from_json(&raw)
    }

    /// The catalog shipped with the binary.
    pub fn embedded() -> Result<Self, CatalogLoadError> { Self::from_json(DEFAULT_CATALOG) }

    pub fn get(&self, product_id: &str) -> Option<&CatalogEntry> { self.entries.get(product_id) }
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> { self.entries.values() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Resolves a product and optional variant to a concrete unit price.
    /// A variant override always wins over the base price.
    pub fn resolve(&self, product_id: &str, variant_key: Option<&str>) -> Result<Resolved<'_>, CatalogError> {
        let entry = self.entries.get(product_id).ok_or_else(|| CatalogError::UnknownProduct(product_id.to_string()))?;
        let variant = match (entry.variation_scheme, variant_key) {
            (VariationScheme::None, None) => None,
            (_, Some(key)) => Some(entry.variant(key).ok_or_else(|| CatalogError::UnknownVariant {
                product_id: product_id.to_string(),
                variant_key: key.to_string(),
            })?),
            (_, None) => return Err(CatalogError::VariantRequired(product_id.to_string())),
        };
        let unit_price_usd = variant.and_then(|v| v.price_override_usd).unwrap_or(entry.base_price_usd);
        Ok(Resolved { entry, variant, unit_price_usd })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown product `{0}`")]
    UnknownProduct(String),
    #[error("unknown variant `{variant_key}` for product `{product_id}`")]
    UnknownVariant { product_id: String, variant_key: String },
    #[error("product `{0}` requires a variant selection")]
    VariantRequired(String),
}

impl CatalogError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownProduct(_) => "unknown_product",
            Self::UnknownVariant { .. } => "unknown_variant",
            Self::VariantRequired(_) => "variant_required",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate productId `{0}`")]
    DuplicateProduct(String),
    #[error("invalid catalog entry `{product_id}`: {reason}")]
    InvalidEntry { product_id: String, reason: String },
}
