//! Order Aggregate

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::catalog::{Resolved, VariantSelection};
use crate::domain::lifecycle::{OrderStatus, PaymentStatus, TransitionError};
use crate::domain::value_objects::{Email, Quantity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl CustomerInfo {
    pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }
}

/// One product/variant/quantity unit. The catalog link and the unit price are
/// snapshotted when the item is created and never re-read from the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub supplier_id: String,
    pub display_name: String,
    pub variant: Option<VariantSelection>,
    pub quantity: Quantity,
    #[serde(rename = "unitPriceUSD")]
    pub unit_price_usd: Decimal,
}

impl LineItem {
    pub fn from_resolved(resolved: &Resolved<'_>, quantity: Quantity) -> Self {
        Self {
            product_id: resolved.entry.product_id.clone(),
            supplier_id: resolved.entry.supplier_id.clone(),
            display_name: resolved.entry.display_name.clone(),
            variant: resolved.variant.cloned(),
            quantity,
            unit_price_usd: resolved.unit_price_usd,
        }
    }
    pub fn variant_key(&self) -> Option<&str> { self.variant.as_ref().map(|v| v.variant_key.as_str()) }
    pub fn line_total(&self) -> Decimal { self.unit_price_usd * Decimal::from(self.quantity.value()) }
}

/// Field-level changes applied through the order store.
#[derive(Clone, Debug, Default)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub customer: Option<CustomerInfo>,
    pub line_items: Option<Vec<LineItem>>,
    pub notes: Option<String>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self { Self { status: Some(status), ..Self::default() } }
    fn edits_content(&self) -> bool { self.customer.is_some() || self.line_items.is_some() || self.notes.is_some() }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: String,
    customer: CustomerInfo,
    line_items: Vec<LineItem>,
    #[serde(rename = "totalUSD")]
    total_usd: Decimal,
    status: OrderStatus,
    payment_status: PaymentStatus,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// New pending order. Fails when there are no line items.
    pub fn place(id: impl Into<String>, customer: CustomerInfo, line_items: Vec<LineItem>, notes: impl Into<String>, now: DateTime<Utc>) -> Result<Self, OrderError> {
        if line_items.is_empty() { return Err(OrderError::EmptyOrder); }
        let now = now.trunc_subsecs(6);
        let mut order = Self {
            id: id.into(), customer, line_items, total_usd: Decimal::ZERO,
            status: OrderStatus::Pending, payment_status: PaymentStatus::Pending,
            notes: notes.into(), created_at: now, updated_at: now,
        };
        order.recalculate();
        Ok(order)
    }

    /// Rebuilds a persisted order. The total is recomputed from the line items.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: String, customer: CustomerInfo, line_items: Vec<LineItem>, status: OrderStatus, payment_status: PaymentStatus,
        notes: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        let mut order = Self { id, customer, line_items, total_usd: Decimal::ZERO, status, payment_status, notes, created_at, updated_at };
        order.recalculate();
        order
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn customer(&self) -> &CustomerInfo { &self.customer }
    pub fn line_items(&self) -> &[LineItem] { &self.line_items }
    pub fn total_usd(&self) -> Decimal { self.total_usd }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn notes(&self) -> &str { &self.notes }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Moves to `target` when it is a legal successor of the current status.
    pub fn transition(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        self.status.check_transition(target)?;
        self.status = target;
        self.touch();
        Ok(())
    }

    /// Applies a patch atomically: on error the order is left unchanged.
    pub fn apply(&mut self, patch: OrderPatch) -> Result<(), OrderError> {
        if patch.edits_content() && self.status.is_terminal() { return Err(OrderError::OrderClosed(self.status)); }
        if patch.line_items.as_ref().is_some_and(Vec::is_empty) { return Err(OrderError::EmptyOrder); }
        if let Some(target) = patch.status { self.status.check_transition(target)?; }

        if let Some(target) = patch.status { self.status = target; }
        if let Some(payment) = patch.payment_status { self.payment_status = payment; }
        if let Some(customer) = patch.customer { self.customer = customer; }
        if let Some(items) = patch.line_items { self.line_items = items; }
        if let Some(notes) = patch.notes { self.notes = notes; }
        self.recalculate();
        self.touch();
        Ok(())
    }

    /// Units across all line items.
    pub fn item_count(&self) -> u32 { self.line_items.iter().map(|i| i.quantity.value()).sum() }

    fn recalculate(&mut self) {
        self.total_usd = self.line_items.iter().map(LineItem::line_total).sum();
    }

    // updated_at must strictly increase at the microsecond precision Postgres stores.
    fn touch(&mut self) {
        let now = Utc::now().trunc_subsecs(6);
        self.updated_at = if now > self.updated_at { now } else { self.updated_at + Duration::microseconds(1) };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error("order must contain at least one line item")]
    EmptyOrder,
    #[error("order is {0} and can no longer be edited")]
    OrderClosed(OrderStatus),
}

impl OrderError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTransition(_) => "invalid_transition",
            Self::EmptyOrder => "empty_order",
            Self::OrderClosed(_) => "order_closed",
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn customer() -> CustomerInfo {
        CustomerInfo {
            first_name: "Ana".into(), last_name: "Silva".into(), email: Email::parse("ana@example.com").unwrap(),
            phone: "555".into(), address: "Rua X".into(), city: "SP".into(), state: "SP".into(),
            zip_code: "01000".into(), country: "BR".into(),
        }
    }

    pub(crate) fn item(product_id: &str, qty: u32, price: Decimal) -> LineItem {
        LineItem {
            product_id: product_id.into(), supplier_id: format!("S{product_id}"), display_name: product_id.into(),
            variant: None, quantity: Quantity::new(qty).unwrap(), unit_price_usd: price,
        }
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let order = Order::place("ORD-1", customer(), vec![item("a", 2, Decimal::new(229, 2)), item("b", 3, Decimal::new(110, 2))], "", Utc::now()).unwrap();
        assert_eq!(order.total_usd(), Decimal::new(788, 2));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.created_at(), order.updated_at());
    }

    #[test]
    fn test_empty_order_rejected() {
        assert_eq!(Order::place("ORD-1", customer(), vec![], "", Utc::now()).unwrap_err(), OrderError::EmptyOrder);
    }

    #[test]
    fn test_transition_bumps_updated_at() {
        let mut order = Order::place("ORD-1", customer(), vec![item("a", 1, Decimal::ONE)], "", Utc::now()).unwrap();
        let before = order.updated_at();
        order.transition(OrderStatus::Processing).unwrap();
        assert!(order.updated_at() > before);
        let err = order.transition(OrderStatus::Delivered).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition(TransitionError { from: OrderStatus::Processing, to: OrderStatus::Delivered })));
        assert_eq!(order.status(), OrderStatus::Processing);
    }

    #[test]
    fn test_updated_at_increases_at_microsecond_precision() {
        let mut order = Order::place("ORD-1", customer(), vec![item("a", 1, Decimal::ONE)], "", Utc::now()).unwrap();
        assert_eq!(order.created_at().timestamp_subsec_nanos() % 1_000, 0);
        let mut last = order.updated_at();
        for i in 0..50 {
            order.apply(OrderPatch { notes: Some(i.to_string()), ..OrderPatch::default() }).unwrap();
            assert_eq!(order.updated_at().timestamp_subsec_nanos() % 1_000, 0);
            assert!(order.updated_at() > last);
            last = order.updated_at();
        }
    }

    #[test]
    fn test_patch_recomputes_total() {
        let mut order = Order::place("ORD-1", customer(), vec![item("a", 1, Decimal::ONE)], "", Utc::now()).unwrap();
        order.apply(OrderPatch { line_items: Some(vec![item("a", 4, Decimal::new(250, 2))]), ..OrderPatch::default() }).unwrap();
        assert_eq!(order.total_usd(), Decimal::new(1000, 2));
    }

    #[test]
    fn test_failed_patch_leaves_order_untouched() {
        let mut order = Order::place("ORD-1", customer(), vec![item("a", 1, Decimal::ONE)], "", Utc::now()).unwrap();
        let snapshot = order.clone();
        let patch = OrderPatch { notes: Some("leave at door".into()), status: Some(OrderStatus::Shipped), ..OrderPatch::default() };
        assert!(order.apply(patch).is_err());
        assert_eq!(order, snapshot);
    }

    #[test]
    fn test_closed_order_rejects_edits_but_not_payment() {
        let mut order = Order::place("ORD-1", customer(), vec![item("a", 1, Decimal::ONE)], "", Utc::now()).unwrap();
        order.transition(OrderStatus::Cancelled).unwrap();
        let err = order.apply(OrderPatch { notes: Some("x".into()), ..OrderPatch::default() }).unwrap_err();
        assert_eq!(err, OrderError::OrderClosed(OrderStatus::Cancelled));
        order.apply(OrderPatch { payment_status: Some(PaymentStatus::Refunded), ..OrderPatch::default() }).unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Refunded);
    }
}
