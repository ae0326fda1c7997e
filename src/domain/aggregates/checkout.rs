//! Checkout normalization
//!
//! Turns a raw checkout submission into a validated, priced [`Order`].
//! Validation is fail-fast and always runs in the same order: customer
//! fields, email, non-empty selection list, catalog resolution, quantities.
//! Nothing here touches storage.

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use crate::domain::aggregates::catalog::{Catalog, CatalogError, Resolved};
use crate::domain::aggregates::order::{CustomerInfo, LineItem, Order, OrderError};
use crate::domain::value_objects::{generate_order_id, Email, Quantity};

/// Customer fields exactly as submitted; any of them may be missing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCustomerFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// A product pick from the storefront. Quantity arrives as a plain number and
/// is checked for integrality here.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSelection {
    pub product_id: String,
    #[serde(default)]
    pub variant_key: Option<String>,
    pub quantity: Decimal,
}

impl RawSelection {
    pub fn new(product_id: impl Into<String>, variant_key: Option<&str>, quantity: u32) -> Self {
        Self { product_id: product_id.into(), variant_key: variant_key.map(str::to_string), quantity: Decimal::from(quantity) }
    }

    fn variant_key(&self) -> Option<&str> {
        self.variant_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSubmission {
    pub customer: RawCustomerFields,
    #[serde(default)]
    pub selections: Vec<RawSelection>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub fn normalize(catalog: &Catalog, customer: &RawCustomerFields, selections: &[RawSelection]) -> Result<Order, CheckoutError> {
    normalize_with_notes(catalog, customer, selections, None)
}

pub fn normalize_submission(catalog: &Catalog, submission: &CheckoutSubmission) -> Result<Order, CheckoutError> {
    normalize_with_notes(catalog, &submission.customer, &submission.selections, submission.notes.as_deref())
}

fn normalize_with_notes(catalog: &Catalog, customer: &RawCustomerFields, selections: &[RawSelection], notes: Option<&str>) -> Result<Order, CheckoutError> {
    let customer = validate_customer(customer)?;
    let line_items = price_selections(catalog, selections)?;
    let now = Utc::now();
    let order = Order::place(generate_order_id(now), customer, line_items, notes.unwrap_or_default().trim(), now)?;
    Ok(order)
}

/// Checks required customer fields, then the email shape.
pub fn validate_customer(raw: &RawCustomerFields) -> Result<CustomerInfo, CheckoutError> {
    let required = |value: &Option<String>, field: &'static str| -> Result<String, CheckoutError> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
            .ok_or(CheckoutError::MissingCustomerField(field))
    };
    let first_name = required(&raw.first_name, "firstName")?;
    let last_name = required(&raw.last_name, "lastName")?;
    let email = required(&raw.email, "email")?;
    let address = required(&raw.address, "address")?;
    let city = required(&raw.city, "city")?;
    let state = required(&raw.state, "state")?;
    let zip_code = required(&raw.zip_code, "zipCode")?;
    let country = required(&raw.country, "country")?;
    let email = Email::parse(&email).map_err(|_| CheckoutError::InvalidEmail)?;
    Ok(CustomerInfo {
        first_name, last_name, email,
        phone: raw.phone.as_deref().map(str::trim).unwrap_or_default().to_string(),
        address, city, state, zip_code, country,
    })
}

/// Resolves every selection against the catalog, then checks every quantity.
/// Unit prices are frozen into the returned line items.
pub fn price_selections(catalog: &Catalog, selections: &[RawSelection]) -> Result<Vec<LineItem>, CheckoutError> {
    if selections.is_empty() { return Err(CheckoutError::EmptyOrder); }
    let resolved = selections
        .iter()
        .map(|s| catalog.resolve(&s.product_id, s.variant_key()))
        .collect::<Result<Vec<Resolved<'_>>, _>>()?;
    selections
        .iter()
        .zip(&resolved)
        .map(|(selection, resolved)| {
            let quantity = whole_quantity(selection.quantity).ok_or_else(|| CheckoutError::InvalidQuantity(selection.product_id.clone()))?;
            Ok(LineItem::from_resolved(resolved, quantity))
        })
        .collect()
}

fn whole_quantity(raw: Decimal) -> Option<Quantity> {
    if !raw.fract().is_zero() { return None; }
    raw.to_u32().and_then(Quantity::new)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("missing customer field `{0}`")]
    MissingCustomerField(&'static str),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("order has no selections")]
    EmptyOrder,
    #[error("invalid quantity for product `{0}`")]
    InvalidQuantity(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Order(OrderError),
}

impl CheckoutError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCustomerField(_) => "missing_customer_field",
            Self::InvalidEmail => "invalid_email",
            Self::EmptyOrder => "empty_order",
            Self::InvalidQuantity(_) => "invalid_quantity",
            Self::Catalog(e) => e.kind(),
            Self::Order(e) => e.kind(),
        }
    }
}

impl From<OrderError> for CheckoutError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::EmptyOrder => Self::EmptyOrder,
            OrderError::InvalidTransition(_) | OrderError::OrderClosed(_) => Self::Order(e),
        }
    }
}
