//! Aggregates module
pub mod catalog;
pub mod checkout;
pub mod order;

pub use catalog::{Catalog, CatalogEntry, CatalogError, CatalogLoadError, Resolved, VariantSelection, VariationScheme};
pub use checkout::{normalize, normalize_submission, price_selections, CheckoutError, CheckoutSubmission, RawCustomerFields, RawSelection};
pub use order::{CustomerInfo, LineItem, Order, OrderError, OrderPatch};
