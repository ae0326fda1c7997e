//! Product extraction from marketplace JSON.
//!
//! Marketplace payloads put the same field under different keys depending on
//! the page version. Each field has an ordered list of strategies; the first
//! one that finds a usable value wins, and each strategy reports "not found"
//! with `None` instead of failing.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use crate::domain::aggregates::{CatalogEntry, VariationScheme};

/// A single way of locating a value inside a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// JSON pointer to a scalar.
    Pointer(&'static str),
    /// JSON pointer to an array; take the first element's `key` (or the element itself when `key` is empty).
    FirstOf { array: &'static str, key: &'static str },
}

impl Strategy {
    fn locate<'a>(&self, payload: &'a Value) -> Option<&'a Value> {
        match self {
            Self::Pointer(ptr) => payload.pointer(ptr),
            Self::FirstOf { array, key } => {
                let first = payload.pointer(array)?.as_array()?.first()?;
                if key.is_empty() { Some(first) } else { first.get(*key) }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedProduct {
    pub title: String,
    #[serde(rename = "priceUSD")]
    pub price_usd: Decimal,
    pub supplier_id: Option<String>,
    pub images: Vec<String>,
}

impl ExtractedProduct {
    /// Draft catalog entry with no variants. Fails when the extraction has no supplier id.
    pub fn into_catalog_entry(self, product_id: impl Into<String>) -> Result<CatalogEntry, ExtractError> {
        let supplier_id = self.supplier_id.ok_or(ExtractError::MissingField("supplierId"))?;
        Ok(CatalogEntry {
            product_id: product_id.into(),
            supplier_id,
            display_name: self.title,
            base_price_usd: self.price_usd,
            variation_scheme: VariationScheme::None,
            variants: vec![],
        })
    }
}

#[derive(Clone, Debug)]
pub struct Extractor {
    title: Vec<Strategy>,
    price: Vec<Strategy>,
    supplier_id: Vec<Strategy>,
    images: Vec<Strategy>,
}

impl Default for Extractor {
    fn default() -> Self {
        use Strategy::{FirstOf, Pointer};
        Self {
            title: vec![
                Pointer("/title"), Pointer("/subject"), Pointer("/name"),
                Pointer("/productInfo/subject"), Pointer("/data/title"), Pointer("/product/title"),
            ],
            price: vec![
                Pointer("/price"), Pointer("/salePrice"), Pointer("/priceInfo/salePrice/value"),
                Pointer("/data/price"), Pointer("/product/price"),
                FirstOf { array: "/skus", key: "price" }, FirstOf { array: "/variants", key: "price" },
            ],
            supplier_id: vec![
                Pointer("/productId"), Pointer("/itemId"), Pointer("/id"), Pointer("/data/productId"), Pointer("/product/id"),
            ],
            images: vec![Pointer("/images"), Pointer("/imagePathList"), Pointer("/data/images"), Pointer("/product/images")],
        }
    }
}

impl Extractor {
    pub fn new() -> Self { Self::default() }

    /// Adds a strategy that is tried before the built-in ones for `field`.
    pub fn prefer(mut self, field: Field, strategy: Strategy) -> Self {
        let list = match field {
            Field::Title => &mut self.title,
            Field::Price => &mut self.price,
            Field::SupplierId => &mut self.supplier_id,
            Field::Images => &mut self.images,
        };
        list.insert(0, strategy);
        self
    }

    pub fn extract(&self, payload: &Value) -> Result<ExtractedProduct, ExtractError> {
        let title = first_match(&self.title, payload, as_text).ok_or(ExtractError::MissingField("title"))?;
        let price_usd = first_match(&self.price, payload, as_price).ok_or(ExtractError::MissingField("price"))?;
        let supplier_id = first_match(&self.supplier_id, payload, as_text);
        let images = first_match(&self.images, payload, as_urls).unwrap_or_default();
        Ok(ExtractedProduct { title, price_usd, supplier_id, images })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Title,
    Price,
    SupplierId,
    Images,
}

fn first_match<T>(strategies: &[Strategy], payload: &Value, convert: fn(&Value) -> Option<T>) -> Option<T> {
    strategies.iter().find_map(|s| s.locate(payload).and_then(convert))
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts numbers and strings such as `"US $1,299.00"` or `"12,34"`.
fn as_price(v: &Value) -> Option<Decimal> {
    let text = match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            let kept: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',').collect();
            // `,` is a thousands separator once a `.` is present.
            if kept.contains('.') { kept.replace(',', "") } else { kept.replace(',', ".") }
        }
        Value::Object(map) => return map.get("value").or_else(|| map.get("amount")).and_then(as_price),
        _ => return None,
    };
    Decimal::from_str(&text).ok().filter(|p| *p > Decimal::ZERO)
}

fn as_urls(v: &Value) -> Option<Vec<String>> {
    let urls: Vec<String> = v
        .as_array()?
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect();
    (!urls.is_empty()).then_some(urls)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no strategy found field `{0}`")]
    MissingField(&'static str),
}
