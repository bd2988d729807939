//! Database initialization
//!
//! Opens (creating if necessary) the SQLite database, applies connection
//! pragmas, creates the baseline tables, and brings the schema current via
//! migrations. Safe to call on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_connection(&pool).await?;
    create_baseline_schema(&pool).await?;

    // Idempotent - safe to run on every startup
    crate::db::migrations::run_migrations(&pool).await?;

    init_default_supermercado(&pool).await?;

    Ok(pool)
}

/// Apply connection pragmas
async fn configure_connection(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

/// Create the baseline tables
///
/// The `pedidos` table is created in its pre-migration shape; columns added
/// over the project's lifetime (`comprovante_pix`, `supermercado_id`) are
/// applied by the migration runner so old and new databases converge on the
/// same schema.
pub async fn create_baseline_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS supermercados (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nome TEXT NOT NULL,
            whatsapp_instance_token TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pedidos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            numero_pedido TEXT,
            nome_cliente TEXT,
            telefone TEXT,
            endereco TEXT,
            status TEXT NOT NULL DEFAULT 'recebido',
            valor_total REAL,
            criado_em TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed a default supermarket row when the table is empty
///
/// The instance token starts empty, which makes the notification path a
/// logged no-op until an operator fills it in.
async fn init_default_supermercado(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM supermercados")
        .fetch_one(pool)
        .await?;

    if count == 0 {
        sqlx::query("INSERT INTO supermercados (nome, whatsapp_instance_token) VALUES (?, '')")
            .bind("Feira")
            .execute(pool)
            .await?;
        info!("Seeded default supermercado (no WhatsApp token configured)");
    }

    Ok(())
}
