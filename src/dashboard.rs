//! Order statistics for the review dashboard.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use crate::domain::aggregates::Order;
use crate::domain::lifecycle::{OrderStatus, PaymentStatus};
use crate::supplier::SupplierSpecBuilder;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    pub by_status: BTreeMap<OrderStatus, usize>,
    /// Orders waiting for someone to act: pending or processing.
    pub awaiting_action: usize,
    #[serde(rename = "paidRevenueUSD")]
    pub paid_revenue_usd: Decimal,
    #[serde(rename = "supplierCostUSD")]
    pub supplier_cost_usd: Decimal,
    #[serde(rename = "grossMarginUSD")]
    pub gross_margin_usd: Decimal,
}

/// Revenue and supplier cost only count paid orders that were not cancelled.
pub fn summarize(orders: &[Order], builder: &SupplierSpecBuilder) -> OrderStats {
    let mut stats = OrderStats { total_orders: orders.len(), ..OrderStats::default() };
    for status in OrderStatus::ALL {
        stats.by_status.insert(status, 0);
    }
    for order in orders {
        *stats.by_status.entry(order.status()).or_default() += 1;
        if matches!(order.status(), OrderStatus::Pending | OrderStatus::Processing) {
            stats.awaiting_action += 1;
        }
        if order.payment_status() == PaymentStatus::Paid && order.status() != OrderStatus::Cancelled {
            stats.paid_revenue_usd += order.total_usd();
            stats.supplier_cost_usd += builder.build(order).supplier_total_usd;
        }
    }
    stats.gross_margin_usd = stats.paid_revenue_usd - stats.supplier_cost_usd;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::aggregates::order::tests::{customer, item};
    use crate::domain::aggregates::OrderPatch;

    #[test]
    fn test_summarize() {
        let mut paid = Order::place("A", customer(), vec![item("a", 2, Decimal::new(1000, 2))], "", Utc::now()).unwrap();
        paid.apply(OrderPatch { payment_status: Some(PaymentStatus::Paid), status: Some(OrderStatus::Processing), ..OrderPatch::default() }).unwrap();
        let mut cancelled = Order::place("B", customer(), vec![item("b", 1, Decimal::new(700, 2))], "", Utc::now()).unwrap();
        cancelled.apply(OrderPatch { payment_status: Some(PaymentStatus::Paid), status: Some(OrderStatus::Cancelled), ..OrderPatch::default() }).unwrap();
        let pending = Order::place("C", customer(), vec![item("c", 1, Decimal::ONE)], "", Utc::now()).unwrap();

        let stats = summarize(&[paid, cancelled, pending], &SupplierSpecBuilder::default());
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.by_status[&OrderStatus::Processing], 1);
        assert_eq!(stats.by_status[&OrderStatus::Cancelled], 1);
        assert_eq!(stats.by_status[&OrderStatus::Delivered], 0);
        assert_eq!(stats.awaiting_action, 2);
        assert_eq!(stats.paid_revenue_usd, Decimal::new(2000, 2));
        assert_eq!(stats.supplier_cost_usd, Decimal::new(1000, 2));
        assert_eq!(stats.gross_margin_usd, Decimal::new(1000, 2));
    }
}
