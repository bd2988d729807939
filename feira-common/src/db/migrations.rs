//! Database schema migrations
//!
//! Versioned, idempotent migrations so existing databases upgrade in place
//! without manual intervention or data loss.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - they must remain stable for
//!    databases created by older builds
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Use ALTER TABLE** - prefer ALTER TABLE over DROP/CREATE to preserve data
//! 4. **Guard with pragma_table_info** - every migration checks for its own
//!    column before issuing DDL, so re-runs are no-ops
//!
//! A migration failure is logged and the runner moves on to the next
//! migration rather than aborting startup. The recorded schema version only
//! advances across a contiguous prefix of successful migrations, so anything
//! skipped runs again on the next start.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> = sqlx::query_scalar(
        "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(version.unwrap_or(0))
}

/// Set schema version in database
async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    // Version advances only while every earlier migration has succeeded;
    // a skipped migration re-runs on the next startup.
    let mut prefix_ok = true;

    if current_version < 1 {
        match migrate_v1(pool).await {
            Ok(()) => {
                if prefix_ok {
                    set_schema_version(pool, 1).await?;
                }
                info!("✓ Migration v1 completed");
            }
            Err(e) => {
                warn!("Migration v1 failed, continuing with startup: {}", e);
                prefix_ok = false;
            }
        }
    }

    if current_version < 2 {
        match migrate_v2(pool).await {
            Ok(()) => {
                if prefix_ok {
                    set_schema_version(pool, 2).await?;
                }
                info!("✓ Migration v2 completed");
            }
            Err(e) => {
                warn!("Migration v2 failed, continuing with startup: {}", e);
                prefix_ok = false;
            }
        }
    }

    if prefix_ok {
        info!("All migrations completed successfully");
    } else {
        warn!("One or more migrations failed and will be retried on next startup");
    }

    Ok(())
}

/// Migration v1: Add comprovante_pix column to pedidos
///
/// **Background:** orders gained an attached payment receipt (a URL into the
/// uploads area). Databases created before that need the column added.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: Add comprovante_pix column to pedidos");

    // Check if pedidos table exists
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='pedidos'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        // Table doesn't exist yet - will be created with correct schema
        info!("  pedidos table doesn't exist yet - skipping migration");
        return Ok(());
    }

    // Check if comprovante_pix column already exists
    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('pedidos') WHERE name = 'comprovante_pix'",
    )
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  comprovante_pix column already exists - skipping");
        return Ok(());
    }

    // Catch duplicate column error for concurrent initialization races
    match sqlx::query("ALTER TABLE pedidos ADD COLUMN comprovante_pix TEXT")
        .execute(pool)
        .await
    {
        Ok(_) => {
            info!("  ✓ Added comprovante_pix column to pedidos table");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            // Another connection beat us to it - that's fine
            info!("  comprovante_pix column added concurrently - skipping");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Migration v2: Add supermercado_id column to pedidos
///
/// **Background:** orders are scoped to the supermarket (tenant) they belong
/// to; the supermarket row carries the WhatsApp instance token used for
/// customer notifications. SQLite cannot ADD CONSTRAINT after the fact, so
/// the foreign key is declared inline on the new column.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: Add supermercado_id column to pedidos");

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='pedidos'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        info!("  pedidos table doesn't exist yet - skipping migration");
        return Ok(());
    }

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('pedidos') WHERE name = 'supermercado_id'",
    )
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  supermercado_id column already exists - skipping");
        return Ok(());
    }

    match sqlx::query(
        "ALTER TABLE pedidos ADD COLUMN supermercado_id INTEGER REFERENCES supermercados(id)",
    )
    .execute(pool)
    .await
    {
        Ok(_) => {
            info!("  ✓ Added supermercado_id column to pedidos table");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            info!("  supermercado_id column added concurrently - skipping");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn create_old_pedidos_table(pool: &SqlitePool) {
        sqlx::query(
            r#"
            CREATE TABLE pedidos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                numero_pedido TEXT,
                nome_cliente TEXT,
                telefone TEXT,
                endereco TEXT,
                status TEXT NOT NULL DEFAULT 'recebido',
                valor_total REAL
            )
            "#,
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_get_schema_version_no_table() {
        let pool = setup_test_db().await;
        let version = get_schema_version(&pool).await.unwrap();
        assert_eq!(version, 0);
    }

    #[tokio::test]
    async fn test_get_schema_version_empty_table() {
        let pool = setup_test_db().await;

        sqlx::query(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY, applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)"
        )
        .execute(&pool)
        .await
        .unwrap();

        let version = get_schema_version(&pool).await.unwrap();
        assert_eq!(version, 0);
    }

    #[tokio::test]
    async fn test_set_and_get_schema_version() {
        let pool = setup_test_db().await;

        sqlx::query(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY, applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)"
        )
        .execute(&pool)
        .await
        .unwrap();

        set_schema_version(&pool, 1).await.unwrap();
        let version = get_schema_version(&pool).await.unwrap();
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn test_migrate_v1_no_table() {
        let pool = setup_test_db().await;

        // Should succeed even if pedidos table doesn't exist
        migrate_v1(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_migrate_v1_adds_column() {
        let pool = setup_test_db().await;
        create_old_pedidos_table(&pool).await;

        migrate_v1(&pool).await.unwrap();

        let has_column: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('pedidos') WHERE name = 'comprovante_pix'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(has_column, 1);
    }

    #[tokio::test]
    async fn test_migrate_v1_idempotent() {
        let pool = setup_test_db().await;
        create_old_pedidos_table(&pool).await;

        // Run migration twice - should not fail
        migrate_v1(&pool).await.unwrap();
        migrate_v1(&pool).await.unwrap();

        // Column exists exactly once
        let column_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('pedidos') WHERE name = 'comprovante_pix'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(column_count, 1);
    }

    #[tokio::test]
    async fn test_migrate_v2_adds_foreign_key_column() {
        let pool = setup_test_db().await;
        create_old_pedidos_table(&pool).await;

        sqlx::query(
            "CREATE TABLE supermercados (id INTEGER PRIMARY KEY AUTOINCREMENT, nome TEXT NOT NULL, whatsapp_instance_token TEXT NOT NULL DEFAULT '')"
        )
        .execute(&pool)
        .await
        .unwrap();

        migrate_v2(&pool).await.unwrap();
        migrate_v2(&pool).await.unwrap();

        let column_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('pedidos') WHERE name = 'supermercado_id'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(column_count, 1);
    }

    #[tokio::test]
    async fn test_run_migrations_complete_flow() {
        let pool = setup_test_db().await;

        sqlx::query(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY, applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)"
        )
        .execute(&pool)
        .await
        .unwrap();

        create_old_pedidos_table(&pool).await;

        sqlx::query(
            "CREATE TABLE supermercados (id INTEGER PRIMARY KEY AUTOINCREMENT, nome TEXT NOT NULL, whatsapp_instance_token TEXT NOT NULL DEFAULT '')"
        )
        .execute(&pool)
        .await
        .unwrap();

        run_migrations(&pool).await.unwrap();

        let version = get_schema_version(&pool).await.unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        let has_column: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('pedidos') WHERE name = 'comprovante_pix'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(has_column, 1);
    }

    #[tokio::test]
    async fn test_run_migrations_twice_leaves_schema_unchanged() {
        let pool = setup_test_db().await;

        sqlx::query(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY, applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)"
        )
        .execute(&pool)
        .await
        .unwrap();

        create_old_pedidos_table(&pool).await;

        sqlx::query(
            "CREATE TABLE supermercados (id INTEGER PRIMARY KEY AUTOINCREMENT, nome TEXT NOT NULL, whatsapp_instance_token TEXT NOT NULL DEFAULT '')"
        )
        .execute(&pool)
        .await
        .unwrap();

        run_migrations(&pool).await.unwrap();
        let columns_after_first: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info('pedidos')")
                .fetch_one(&pool)
                .await
                .unwrap();

        // Second run is a no-op
        run_migrations(&pool).await.unwrap();
        let columns_after_second: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info('pedidos')")
                .fetch_one(&pool)
                .await
                .unwrap();

        assert_eq!(columns_after_first, columns_after_second);
        assert_eq!(
            get_schema_version(&pool).await.unwrap(),
            CURRENT_SCHEMA_VERSION
        );
    }
}
