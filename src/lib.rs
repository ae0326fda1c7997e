//! Dropship Orders
//!
//! Order pipeline behind a dropshipping storefront.
//!
//! ## Features
//! - Catalog mapping from storefront products to supplier listings
//! - Checkout normalization into priced, validated orders
//! - Supplier request building (SKU mapping, wholesale pricing)
//! - Order lifecycle state machine and idempotent order store
//! - Review dashboard API

pub mod api;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod extract;
pub mod store;
pub mod supplier;

use thiserror::Error;

pub use domain::aggregates::{Catalog, CheckoutSubmission, Order, OrderPatch};
pub use domain::lifecycle::{OrderStatus, PaymentStatus};
pub use store::{InMemoryOrderStore, OrderFilter, OrderStore};
pub use supplier::{SupplierConfig, SupplierSpec, SupplierSpecBuilder};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum DropshipError {
    #[error(transparent)]
    Checkout(#[from] domain::aggregates::CheckoutError),

    #[error(transparent)]
    Order(#[from] domain::aggregates::OrderError),

    #[error(transparent)]
    Store(#[from] store::StoreError),

    #[error(transparent)]
    Gateway(#[from] supplier::GatewayError),

    #[error(transparent)]
    Extract(#[from] extract::ExtractError),

    #[error(transparent)]
    JsonBody(#[from] axum::extract::rejection::JsonRejection),

    #[error(transparent)]
    QueryString(#[from] axum::extract::rejection::QueryRejection),
}

/// Broad class of a failure, used to pick a response status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Conflict,
    NotFound,
    Upstream,
    Internal,
}

impl DropshipError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Checkout(e) => e.kind(),
            Self::Order(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Gateway(_) => "supplier_gateway",
            Self::Extract(_) => "extraction_failed",
            Self::JsonBody(_) | Self::QueryString(_) => "invalid_request",
        }
    }

    pub fn class(&self) -> ErrorClass {
        use domain::aggregates::{CheckoutError, OrderError};
        use store::StoreError;
        match self {
            Self::Checkout(CheckoutError::Order(e)) | Self::Order(e) | Self::Store(StoreError::Order(e)) => match e {
                OrderError::EmptyOrder => ErrorClass::Validation,
                OrderError::InvalidTransition(_) | OrderError::OrderClosed(_) => ErrorClass::Conflict,
            },
            Self::Checkout(_) | Self::Extract(_) | Self::JsonBody(_) | Self::QueryString(_) => ErrorClass::Validation,
            Self::Store(StoreError::DuplicateOrderId(_)) => ErrorClass::Conflict,
            Self::Store(StoreError::OrderNotFound(_)) => ErrorClass::NotFound,
            Self::Store(StoreError::Database(_) | StoreError::Corrupt { .. }) => ErrorClass::Internal,
            Self::Gateway(_) => ErrorClass::Upstream,
        }
    }
}

pub type Result<T> = std::result::Result<T, DropshipError>;
