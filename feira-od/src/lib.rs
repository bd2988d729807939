//! feira-od library - Order Dispatch module
//!
//! Backend for the order panel of a grocery-delivery operation: order
//! listing and status transitions, payment-receipt ingestion, and WhatsApp
//! customer notifications.

use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod notify;
pub mod receipts;

use notify::WhatsAppClient;
use receipts::ReceiptStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Receipt decoder/writer rooted at the configured upload directory
    pub receipts: ReceiptStore,
    /// WhatsApp gateway client
    pub whatsapp: WhatsAppClient,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, receipts: ReceiptStore, whatsapp: WhatsAppClient) -> Self {
        Self {
            db,
            receipts,
            whatsapp,
        }
    }
}

/// Build application router
///
/// Stored receipts are served read-only under `/uploads`, mirroring the
/// relative URLs the receipt store hands out.
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.receipts.upload_root().to_path_buf());

    Router::new()
        .route("/api/pedidos", get(api::orders::list_orders))
        .route("/api/pedidos/:id/status", post(api::orders::update_order_status))
        .route("/api/pedidos/:id/comprovante", post(api::orders::attach_receipt))
        .merge(api::health_routes())
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
