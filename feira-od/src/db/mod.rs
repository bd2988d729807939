//! Order queries for the dispatch service
//!
//! Column and JSON field names stay in Portuguese: they are the wire
//! contract of the order panel and must round-trip unchanged.

use feira_common::Result;
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::notify::phone::COUNTRY_CODE;

/// An order as the panel sees it
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: i64,
    pub numero_pedido: Option<String>,
    pub nome_cliente: Option<String>,
    pub telefone: Option<String>,
    pub endereco: Option<String>,
    pub status: String,
    pub valor_total: Option<f64>,
    pub criado_em: Option<String>,
    pub comprovante_pix: Option<String>,
    pub supermercado_id: Option<i64>,
}

const ORDER_COLUMNS: &str = "id, numero_pedido, nome_cliente, telefone, endereco, status, \
                             valor_total, criado_em, comprovante_pix, supermercado_id";

fn order_from_row(row: &SqliteRow) -> Order {
    Order {
        id: row.get("id"),
        numero_pedido: row.get("numero_pedido"),
        nome_cliente: row.get("nome_cliente"),
        telefone: row.get("telefone"),
        endereco: row.get("endereco"),
        status: row.get("status"),
        valor_total: row.get("valor_total"),
        criado_em: row.get("criado_em"),
        comprovante_pix: row.get("comprovante_pix"),
        supermercado_id: row.get("supermercado_id"),
    }
}

/// All orders, newest first
pub async fn list_orders(pool: &SqlitePool) -> Result<Vec<Order>> {
    let rows = sqlx::query(&format!("SELECT {} FROM pedidos ORDER BY id DESC", ORDER_COLUMNS))
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(order_from_row).collect())
}

/// Single order by id
pub async fn get_order(pool: &SqlitePool, id: i64) -> Result<Option<Order>> {
    let row = sqlx::query(&format!("SELECT {} FROM pedidos WHERE id = ?", ORDER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(order_from_row))
}

/// Most recent order for a phone number.
///
/// Stored numbers are inconsistent about the country prefix, so the lookup
/// tries the number as given and then the other spelling (prefix stripped or
/// added).
pub async fn latest_order_by_phone(pool: &SqlitePool, phone: &str) -> Result<Option<Order>> {
    if let Some(order) = latest_by_exact_phone(pool, phone).await? {
        return Ok(Some(order));
    }

    let alternative = if let Some(stripped) = phone.strip_prefix(COUNTRY_CODE) {
        stripped.to_string()
    } else {
        format!("{}{}", COUNTRY_CODE, phone)
    };

    latest_by_exact_phone(pool, &alternative).await
}

async fn latest_by_exact_phone(pool: &SqlitePool, phone: &str) -> Result<Option<Order>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM pedidos WHERE telefone = ? ORDER BY id DESC LIMIT 1",
        ORDER_COLUMNS
    ))
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(order_from_row))
}

/// Update an order's status; returns whether a row was touched
pub async fn update_status(pool: &SqlitePool, id: i64, status: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE pedidos SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Set (or clear) an order's stored receipt value
pub async fn set_receipt(pool: &SqlitePool, id: i64, value: Option<&str>) -> Result<bool> {
    let result = sqlx::query("UPDATE pedidos SET comprovante_pix = ? WHERE id = ?")
        .bind(value)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Set an order's delivery address
pub async fn update_address(pool: &SqlitePool, id: i64, endereco: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE pedidos SET endereco = ? WHERE id = ?")
        .bind(endereco)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// WhatsApp instance token for an order's supermarket.
///
/// Orders predating the tenant column fall back to the first supermarket
/// row (the single-tenant deployment default). Returns an empty string when
/// nothing is configured, which the notification client treats as "skip".
pub async fn instance_token(pool: &SqlitePool, order: &Order) -> Result<String> {
    let token: Option<String> = match order.supermercado_id {
        Some(supermercado_id) => {
            sqlx::query_scalar("SELECT whatsapp_instance_token FROM supermercados WHERE id = ?")
                .bind(supermercado_id)
                .fetch_optional(pool)
                .await?
        }
        None => {
            sqlx::query_scalar(
                "SELECT whatsapp_instance_token FROM supermercados ORDER BY id LIMIT 1",
            )
            .fetch_optional(pool)
            .await?
        }
    };

    Ok(token.unwrap_or_default())
}
