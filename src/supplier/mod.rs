//! Supplier request building.
//!
//! Translates an [`Order`] into the record a fulfillment supplier receives.
//! Pure: the transport lives in [`gateway`].

pub mod gateway;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Order;
use crate::domain::value_objects::SupplierSku;

pub use gateway::{EventPublisher, GatewayError, LoggingPublisher, NatsPublisher, SupplierGateway};

/// SKU prefix and the wholesale-cost ratio applied to customer prices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupplierConfig {
    pub sku_prefix: String,
    pub wholesale_ratio: Decimal,
}

impl SupplierConfig {
    pub fn new(sku_prefix: impl Into<String>, wholesale_ratio: Decimal) -> Result<Self, InvalidRatio> {
        if wholesale_ratio <= Decimal::ZERO || wholesale_ratio > Decimal::ONE { return Err(InvalidRatio(wholesale_ratio)); }
        Ok(Self { sku_prefix: sku_prefix.into(), wholesale_ratio })
    }
}

impl Default for SupplierConfig {
    fn default() -> Self { Self { sku_prefix: "DS-".to_string(), wholesale_ratio: Decimal::new(5, 1) } }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("wholesale ratio must be in (0, 1], got {0}")]
pub struct InvalidRatio(pub Decimal);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierLineItem {
    #[serde(rename = "supplierSKU")]
    pub supplier_sku: SupplierSku,
    pub quantity: u32,
    #[serde(rename = "supplierUnitPriceUSD")]
    pub supplier_unit_price_usd: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSpec {
    pub order_id: String,
    pub customer_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub shipping_address: ShippingAddress,
    pub line_items: Vec<SupplierLineItem>,
    #[serde(rename = "totalUSD")]
    pub total_usd: Decimal,
    #[serde(rename = "supplierTotalUSD")]
    pub supplier_total_usd: Decimal,
    pub special_instructions: String,
}

#[derive(Clone, Debug, Default)]
pub struct SupplierSpecBuilder {
    config: SupplierConfig,
}

impl SupplierSpecBuilder {
    pub fn new(config: SupplierConfig) -> Self { Self { config } }
    pub fn config(&self) -> &SupplierConfig { &self.config }

    pub fn build(&self, order: &Order) -> SupplierSpec {
        let customer = order.customer();
        let line_items: Vec<SupplierLineItem> = order
            .line_items()
            .iter()
            .map(|item| SupplierLineItem {
                supplier_sku: SupplierSku::compose(&self.config.sku_prefix, &item.supplier_id, item.variant_key()),
                quantity: item.quantity.value(),
                supplier_unit_price_usd: self.wholesale_price(item.unit_price_usd),
            })
            .collect();
        let supplier_total_usd = line_items.iter().map(|l| l.supplier_unit_price_usd * Decimal::from(l.quantity)).sum();
        SupplierSpec {
            order_id: order.id().to_string(),
            customer_name: customer.full_name(),
            contact_email: customer.email.to_string(),
            contact_phone: customer.phone.clone(),
            shipping_address: ShippingAddress {
                address: customer.address.clone(),
                city: customer.city.clone(),
                state: customer.state.clone(),
                zip_code: customer.zip_code.clone(),
                country: customer.country.clone(),
            },
            line_items,
            total_usd: order.total_usd(),
            supplier_total_usd,
            special_instructions: order.notes().to_string(),
        }
    }

    /// Customer price scaled by the wholesale ratio, rounded to cents.
    pub fn wholesale_price(&self, unit_price_usd: Decimal) -> Decimal {
        (unit_price_usd * self.config.wholesale_ratio).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{normalize, Catalog, RawCustomerFields, RawSelection};

    fn order() -> Order {
        let raw = RawCustomerFields {
            first_name: Some("Ana".into()), last_name: Some("Silva".into()), email: Some("ana@example.com".into()),
            phone: Some("555".into()), address: Some("Rua X".into()), city: Some("SP".into()), state: Some("SP".into()),
            zip_code: Some("01000".into()), country: Some("BR".into()),
        };
        let selections = [RawSelection::new("heat_resistant_mat", Some("small-pink"), 2), RawSelection::new("cable_organizer", None, 1)];
        normalize(&Catalog::embedded().unwrap(), &raw, &selections).unwrap()
    }

    #[test]
    fn test_build_spec() {
        let builder = SupplierSpecBuilder::new(SupplierConfig::new("AE-", Decimal::new(7, 1)).unwrap());
        let spec = builder.build(&order());
        assert_eq!(spec.customer_name, "Ana Silva");
        assert_eq!(spec.shipping_address.zip_code, "01000");
        assert_eq!(spec.line_items[0].supplier_sku.as_str(), "AE-1005006127331690-SMALL_PINK");
        assert_eq!(spec.line_items[1].supplier_sku.as_str(), "AE-1005003301958876");
        // 2.29 * 0.7 = 1.603 -> 1.60; 4.99 * 0.7 = 3.493 -> 3.49
        assert_eq!(spec.line_items[0].supplier_unit_price_usd, Decimal::new(160, 2));
        assert_eq!(spec.line_items[1].supplier_unit_price_usd, Decimal::new(349, 2));
        assert_eq!(spec.supplier_total_usd, Decimal::new(669, 2));
        assert_eq!(spec.total_usd, Decimal::new(957, 2));
    }

    #[test]
    fn test_skus_are_deterministic() {
        let builder = SupplierSpecBuilder::default();
        let order = order();
        let first: Vec<_> = builder.build(&order).line_items.into_iter().map(|l| l.supplier_sku).collect();
        let second: Vec<_> = builder.build(&order.clone()).line_items.into_iter().map(|l| l.supplier_sku).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        let builder = SupplierSpecBuilder::default();
        assert_eq!(builder.wholesale_price(Decimal::new(5, 2)), Decimal::new(3, 2));
    }

    #[test]
    fn test_ratio_bounds() {
        assert!(SupplierConfig::new("X", Decimal::ZERO).is_err());
        assert!(SupplierConfig::new("X", Decimal::new(11, 1)).is_err());
        assert!(SupplierConfig::new("X", Decimal::ONE).is_ok());
    }

    #[test]
    fn test_spec_json_field_names() {
        let json = serde_json::to_value(SupplierSpecBuilder::default().build(&order())).unwrap();
        assert!(json["lineItems"][0]["supplierSKU"].is_string());
        assert!(json["lineItems"][0]["supplierUnitPriceUSD"].is_string());
        assert_eq!(json["shippingAddress"]["zipCode"], "01000");
    }
}
