//! Order panel endpoints
//!
//! Listing, status transitions (which notify the customer over WhatsApp),
//! and receipt attachment. Notification and storage problems are logged and
//! degrade to an unchanged or null value; they never fail the request.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::api::ApiError;
use crate::db::{self, Order};
use crate::receipts::RECEIPTS_SUBFOLDER;
use crate::AppState;

/// Body of POST /api/pedidos/:id/status
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Body of POST /api/pedidos/:id/comprovante
#[derive(Debug, Deserialize)]
pub struct ReceiptUpload {
    pub comprovante: String,
}

/// GET /api/pedidos
///
/// All orders, newest first.
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = db::list_orders(&state.db).await?;
    Ok(Json(orders))
}

/// POST /api/pedidos/:id/status
///
/// Updates the order status. The statuses customers care about trigger a
/// WhatsApp message; a failed or skipped notification leaves the status
/// update intact.
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Order>, ApiError> {
    let order = db::get_order(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", id)))?;

    db::update_status(&state.db, id, &update.status).await?;

    if let Some(message) = status_message(&order, &update.status) {
        let phone = order.telefone.as_deref().unwrap_or("");
        let token = db::instance_token(&state.db, &order).await?;

        if let Err(e) = state.whatsapp.send_text(phone, &message, &token).await {
            warn!(order_id = id, error = %e, "Status notification failed");
        }
    }

    let updated = db::get_order(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", id)))?;
    Ok(Json(updated))
}

/// POST /api/pedidos/:id/comprovante
///
/// Runs the payload through the receipt store. URLs and opaque values are
/// recorded as-is; decodable base64 is written to disk and its generated URL
/// recorded; an undecodable payload records null.
pub async fn attach_receipt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(upload): Json<ReceiptUpload>,
) -> Result<Json<Value>, ApiError> {
    db::get_order(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", id)))?;

    let stored: Option<String> = if upload.comprovante.is_empty() {
        None
    } else {
        match state
            .receipts
            .store(&upload.comprovante, RECEIPTS_SUBFOLDER)
            .await
        {
            Ok(outcome) => Some(outcome.stored_value().to_string()),
            Err(e) => {
                warn!(order_id = id, error = %e, "Receipt payload rejected");
                None
            }
        }
    };

    db::set_receipt(&state.db, id, stored.as_deref()).await?;

    Ok(Json(json!({
        "id": id,
        "comprovante_pix": stored,
    })))
}

/// Customer-facing message for a status transition, or None when the status
/// is internal and sends nothing
fn status_message(order: &Order, status: &str) -> Option<String> {
    let customer = order.nome_cliente.as_deref().unwrap_or("Cliente");
    let order_number = order
        .numero_pedido
        .clone()
        .unwrap_or_else(|| order.id.to_string());

    match status {
        "separado" => Some(format!(
            "📦 Olá {}! Seu pedido #{} está sendo separado e logo estará pronto para entrega!",
            customer, order_number
        )),
        "entregue" => Some(format!(
            "🚚 Boa notícia {}! Seu pedido #{} saiu para entrega! Aguarde nosso entregador.",
            customer, order_number
        )),
        _ => None,
    }
}
