//! Value Objects for the dropship pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supplier-facing SKU, derived from a supplier listing id and an optional variant key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierSku(String);

impl SupplierSku {
    /// `prefix + supplier_id`, followed by `-VARIANT_KEY` when a variant is present.
    /// The variant key is uppercased and `-` becomes `_`.
    pub fn compose(prefix: &str, supplier_id: &str, variant_key: Option<&str>) -> Self {
        let mut sku = format!("{prefix}{supplier_id}");
        if let Some(key) = variant_key {
            sku.push('-');
            sku.push_str(&normalize_variant_key(key));
        }
        Self(sku)
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SupplierSku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

fn normalize_variant_key(key: &str) -> String { key.to_uppercase().replace('-', "_") }

/// Customer email, shape-checked on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(value: &str) -> Result<Self, EmailError> {
        let value = value.trim();
        if !validator::validate_email(value) { return Err(EmailError); }
        Ok(Self(value.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid email address")]
pub struct EmailError;

/// Line-item quantity; always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Option<Self> { (value >= 1).then_some(Self(value)) }
    pub fn value(&self) -> u32 { self.0 }
}

impl TryFrom<u32> for Quantity {
    type Error = String;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("quantity must be at least 1, got {value}"))
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self { q.0 }
}

/// Fresh order identifier: `ORD-<utc timestamp>-<random hex>`.
pub fn generate_order_id(now: DateTime<Utc>) -> String {
    format!("ORD-{}-{:08X}", now.format("%Y%m%d%H%M%S"), rand::random::<u32>())
}
