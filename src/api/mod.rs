//! HTTP surface for the storefront checkout and the order review dashboard.

pub mod guard;

use axum::{extract::{FromRequest, FromRequestParts, Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use crate::dashboard::{summarize, OrderStats};
use crate::domain::aggregates::{normalize_submission, price_selections, Catalog, CatalogEntry, CheckoutSubmission, Order, OrderError, OrderPatch, RawCustomerFields, RawSelection};
use crate::domain::aggregates::checkout::validate_customer;
use crate::domain::events::OrderEvent;
use crate::domain::lifecycle::{OrderStatus, PaymentStatus};
use crate::extract::{ExtractedProduct, Extractor};
use crate::store::{OrderFilter, OrderStore, Revision};
use crate::supplier::{EventPublisher, SupplierGateway, SupplierSpec, SupplierSpecBuilder};
use crate::{DropshipError, ErrorClass};

pub use guard::OrderLocks;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn OrderStore>,
    pub builder: SupplierSpecBuilder,
    pub gateway: Arc<dyn SupplierGateway>,
    pub events: Arc<dyn EventPublisher>,
    pub extractor: Arc<Extractor>,
    pub locks: Arc<OrderLocks>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "dropship-orders"})) }))
        .route("/api/v1/catalog", get(list_catalog))
        .route("/api/v1/checkout", post(checkout))
        .route("/api/v1/orders", get(list_orders))
        .route("/api/v1/orders/:id", get(get_order).patch(update_order))
        .route("/api/v1/orders/:id/transition", post(transition_order))
        .route("/api/v1/orders/:id/supplier-spec", get(supplier_spec))
        .route("/api/v1/orders/:id/dispatch", post(dispatch_order))
        .route("/api/v1/dashboard/stats", get(stats))
        .route("/api/v1/products/extract", post(extract_product))
        .with_state(state)
}

impl IntoResponse for DropshipError {
    fn into_response(self) -> Response {
        let status = match self.class() {
            ErrorClass::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Upstream => StatusCode::BAD_GATEWAY,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "request failed");
        }
        (status, Json(serde_json::json!({"error": self.kind(), "message": self.to_string()}))).into_response()
    }
}

type ApiResult<T> = Result<T, DropshipError>;

/// `Json` whose rejections answer with the crate's error body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(DropshipError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections answer with the crate's error body.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(DropshipError))]
pub struct ApiQuery<T>(pub T);

// Publish failures are logged only; the order change is already committed.
async fn emit(state: &AppState, events: Vec<OrderEvent>) {
    for event in events {
        if let Err(e) = state.events.publish(event).await {
            tracing::warn!(error = %e, "failed to publish order event");
        }
    }
}

async fn list_catalog(State(s): State<AppState>) -> Json<Vec<CatalogEntry>> {
    Json(s.catalog.entries().cloned().collect())
}

async fn checkout(State(s): State<AppState>, ApiJson(r): ApiJson<CheckoutSubmission>) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = normalize_submission(&s.catalog, &r)?;
    let order = s.store.create(order).await?;
    emit(&s, vec![OrderEvent::placed(&order)]).await;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams { pub status: Option<OrderStatus>, pub from: Option<DateTime<Utc>>, pub to: Option<DateTime<Utc>> }

async fn list_orders(State(s): State<AppState>, ApiQuery(p): ApiQuery<ListParams>) -> ApiResult<Json<Vec<Order>>> {
    let filter = OrderFilter { status: p.status, created_from: p.from, created_to: p.to };
    Ok(Json(s.store.list(&filter).await?))
}

async fn get_order(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Order>> {
    Ok(Json(s.store.get(&id).await?))
}

/// Dashboard edit. Line items arrive as selections and are priced against the current catalog.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub customer: Option<RawCustomerFields>,
    pub selections: Option<Vec<RawSelection>>,
    pub notes: Option<String>,
}

async fn update_order(State(s): State<AppState>, Path(id): Path<String>, ApiJson(r): ApiJson<UpdateOrderRequest>) -> ApiResult<Json<Order>> {
    let patch = OrderPatch {
        status: r.status,
        payment_status: r.payment_status,
        customer: r.customer.as_ref().map(validate_customer).transpose()?,
        line_items: r.selections.as_deref().map(|sel| price_selections(&s.catalog, sel)).transpose()?,
        notes: r.notes.map(|n| n.trim().to_string()),
    };
    let _guard = s.locks.acquire(&id).await;
    let Revision { before, after } = s.store.revise(&id, patch).await?;
    emit(&s, OrderEvent::diff(&before, &after)).await;
    Ok(Json(after))
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest { pub status: OrderStatus }

async fn transition_order(State(s): State<AppState>, Path(id): Path<String>, ApiJson(r): ApiJson<TransitionRequest>) -> ApiResult<Json<Order>> {
    let _guard = s.locks.acquire(&id).await;
    let Revision { before, after } = s.store.revise(&id, OrderPatch::status(r.status)).await?;
    emit(&s, OrderEvent::diff(&before, &after)).await;
    Ok(Json(after))
}

async fn supplier_spec(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<SupplierSpec>> {
    let order = s.store.get(&id).await?;
    Ok(Json(s.builder.build(&order)))
}

/// Submits the supplier request, then records `sent_to_supplier`. The order's
/// guard is held throughout, so a second dispatch finds it already sent.
async fn dispatch_order(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Order>> {
    let _guard = s.locks.acquire(&id).await;
    let order = s.store.get(&id).await?;
    order.status().check_transition(OrderStatus::SentToSupplier).map_err(OrderError::from)?;
    let spec = s.builder.build(&order);
    s.gateway.submit(&spec).await?;
    let Revision { before, after } = s.store.revise(&id, OrderPatch::status(OrderStatus::SentToSupplier)).await?;
    let mut events = OrderEvent::diff(&before, &after);
    events.push(OrderEvent::SentToSupplier { order_id: id, line_count: spec.line_items.len() });
    emit(&s, events).await;
    Ok(Json(after))
}

async fn stats(State(s): State<AppState>) -> ApiResult<Json<OrderStats>> {
    let orders = s.store.list(&OrderFilter::default()).await?;
    Ok(Json(summarize(&orders, &s.builder)))
}

async fn extract_product(State(s): State<AppState>, ApiJson(payload): ApiJson<serde_json::Value>) -> ApiResult<Json<ExtractedProduct>> {
    Ok(Json(s.extractor.extract(&payload)?))
}
