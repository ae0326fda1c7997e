//! End-to-end checks of checkout -> store -> lifecycle -> supplier request.

use chrono::Utc;
use dropship_orders::domain::aggregates::{normalize, Catalog, CatalogError, CheckoutError, CustomerInfo, OrderError, RawCustomerFields, RawSelection};
use dropship_orders::domain::lifecycle::TransitionError;
use dropship_orders::domain::value_objects::Email;
use dropship_orders::store::StoreError;
use dropship_orders::{InMemoryOrderStore, Order, OrderPatch, OrderStatus, OrderStore, SupplierSpecBuilder};
use rust_decimal::Decimal;

fn ana() -> RawCustomerFields {
    RawCustomerFields {
        first_name: Some("Ana".into()), last_name: Some("Silva".into()), email: Some("ana@example.com".into()),
        phone: Some("555".into()), address: Some("Rua X".into()), city: Some("SP".into()), state: Some("SP".into()),
        zip_code: Some("01000".into()), country: Some("BR".into()),
    }
}

fn catalog() -> Catalog {
    Catalog::from_json(r#"[
        {"productId": "heat_resistant_mat", "supplierId": "1005006127331690", "displayName": "Heat Resistant Mat",
         "basePriceUSD": "3.49", "variationScheme": "size_color",
         "variants": [{"variantKey": "small-pink", "displayLabel": "Small / Pink", "priceOverrideUSD": "2.29"},
                      {"variantKey": "large-pink", "displayLabel": "Large / Pink"}]}
    ]"#).unwrap()
}

fn checkout(qty: u32) -> Result<Order, CheckoutError> {
    normalize(&catalog(), &ana(), &[RawSelection::new("heat_resistant_mat", Some("small-pink"), qty)])
}

#[test]
fn checkout_is_priced_from_variant_override() {
    let order = checkout(2).unwrap();
    assert_eq!(order.total_usd(), Decimal::new(458, 2));
    assert_eq!(order.status(), OrderStatus::Pending);
    let json = serde_json::to_value(&order).unwrap();
    assert_eq!(json["status"], "pending");
    assert_eq!(json["totalUSD"], "4.58");
    assert_eq!(json["lineItems"][0]["unitPriceUSD"], "2.29");
}

#[test]
fn zero_quantity_is_rejected() {
    assert_eq!(checkout(0).unwrap_err(), CheckoutError::InvalidQuantity("heat_resistant_mat".into()));
}

#[test]
fn pending_order_cannot_ship() {
    let mut order = checkout(1).unwrap();
    let err = order.transition(OrderStatus::Shipped).unwrap_err();
    assert_eq!(err, OrderError::InvalidTransition(TransitionError { from: OrderStatus::Pending, to: OrderStatus::Shipped }));
    assert_eq!(order.status(), OrderStatus::Pending);
}

#[tokio::test]
async fn duplicate_create_keeps_first_record() {
    let store = InMemoryOrderStore::new();
    let customer = CustomerInfo {
        first_name: "Ana".into(), last_name: "Silva".into(), email: Email::parse("ana@example.com").unwrap(),
        phone: "555".into(), address: "Rua X".into(), city: "SP".into(), state: "SP".into(), zip_code: "01000".into(), country: "BR".into(),
    };
    let items = checkout(2).unwrap().line_items().to_vec();
    let original = Order::place("ORD-1", customer.clone(), items.clone(), "first", Utc::now()).unwrap();
    store.create(original.clone()).await.unwrap();

    let mut other_items = items;
    other_items[0].quantity = dropship_orders::domain::value_objects::Quantity::new(7).unwrap();
    let imposter = Order::place("ORD-1", customer, other_items, "second", Utc::now()).unwrap();
    assert!(matches!(store.create(imposter).await, Err(StoreError::DuplicateOrderId(_))));

    assert_eq!(store.get("ORD-1").await.unwrap(), original);
    assert_eq!(store.len().await, 1);
}

#[test]
fn price_changes_do_not_touch_existing_orders() {
    let order = checkout(2).unwrap();
    let repriced = Catalog::from_json(r#"[
        {"productId": "heat_resistant_mat", "supplierId": "1005006127331690", "displayName": "Heat Resistant Mat",
         "basePriceUSD": "9.99", "variationScheme": "size_color",
         "variants": [{"variantKey": "small-pink", "displayLabel": "Small / Pink", "priceOverrideUSD": "5.00"}]}
    ]"#).unwrap();
    let fresh = normalize(&repriced, &ana(), &[RawSelection::new("heat_resistant_mat", Some("small-pink"), 2)]).unwrap();
    assert_eq!(fresh.total_usd(), Decimal::new(1000, 2));
    assert_eq!(order.total_usd(), Decimal::new(458, 2));
    assert_eq!(order.line_items()[0].unit_price_usd, Decimal::new(229, 2));
}

#[tokio::test]
async fn total_tracks_line_item_edits_through_store() {
    let store = InMemoryOrderStore::new();
    let order = store.create(checkout(1).unwrap()).await.unwrap();
    let more = normalize(&catalog(), &ana(), &[
        RawSelection::new("heat_resistant_mat", Some("small-pink"), 3),
        RawSelection::new("heat_resistant_mat", Some("large-pink"), 1),
    ]).unwrap();
    let patch = OrderPatch { line_items: Some(more.line_items().to_vec()), ..OrderPatch::default() };
    let updated = store.update(order.id(), patch).await.unwrap();
    let expected: Decimal = updated.line_items().iter().map(|i| i.unit_price_usd * Decimal::from(i.quantity.value())).sum();
    assert_eq!(updated.total_usd(), expected);
    assert_eq!(updated.total_usd(), Decimal::new(1036, 2));

    let empty = OrderPatch { line_items: Some(vec![]), ..OrderPatch::default() };
    assert!(matches!(store.update(order.id(), empty).await, Err(StoreError::Order(OrderError::EmptyOrder))));
}

#[tokio::test]
async fn full_lifecycle_and_supplier_request() {
    let store = InMemoryOrderStore::new();
    let order = store.create(checkout(2).unwrap()).await.unwrap();
    let id = order.id().to_string();
    for status in [OrderStatus::Processing, OrderStatus::SentToSupplier, OrderStatus::ConfirmedBySupplier, OrderStatus::Shipped, OrderStatus::Delivered] {
        store.update(&id, OrderPatch::status(status)).await.unwrap();
    }
    let delivered = store.get(&id).await.unwrap();
    assert_eq!(delivered.status(), OrderStatus::Delivered);
    assert!(store.update(&id, OrderPatch::status(OrderStatus::Cancelled)).await.is_err());

    let spec = SupplierSpecBuilder::default().build(&delivered);
    let again = SupplierSpecBuilder::default().build(&delivered);
    assert_eq!(spec.line_items[0].supplier_sku.as_str(), "DS-1005006127331690-SMALL_PINK");
    assert_eq!(spec.line_items[0].supplier_sku, again.line_items[0].supplier_sku);
    assert_eq!(spec.line_items[0].supplier_unit_price_usd, Decimal::new(115, 2));
}

#[test]
fn unknown_variant_surfaces_catalog_error() {
    let err = normalize(&catalog(), &ana(), &[RawSelection::new("heat_resistant_mat", Some("xl-gold"), 1)]).unwrap_err();
    assert!(matches!(err, CheckoutError::Catalog(CatalogError::UnknownVariant { ref variant_key, .. }) if variant_key == "xl-gold"));
}
