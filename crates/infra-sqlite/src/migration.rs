// Migration Runner

use sqlx::SqlitePool;
use tracing::info;
use ytflow_core::error::AppError;

const MIGRATIONS: &[(i64, &str, &str)] = &[
    (
        1,
        "Initial key/value schema",
        include_str!("../migrations/001_initial_schema.sql"),
    ),
    (
        2,
        "Job state index",
        include_str!("../migrations/002_add_state_index.sql"),
    ),
    (
        3,
        "createdAt index for reconciliation",
        include_str!("../migrations/003_created_at_index.sql"),
    ),
];

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    info!("Running database migrations...");

    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(db_err)?;

    let current_version: i64 = if table_exists > 0 {
        sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await
            .map_err(db_err)?
            .unwrap_or(0)
    } else {
        0
    };

    info!("Current schema version: {}", current_version);

    for (version, name, sql) in MIGRATIONS {
        if current_version < *version {
            info!("Applying migration {:03}: {}", version, name);
            apply_migration(pool, sql).await?;
        }
    }

    info!("All migrations applied successfully");
    Ok(())
}

/// Apply one migration script inside a transaction
///
/// Each script inserts its own `schema_version` row, so a partially applied
/// script rolls back together with its version bump.
async fn apply_migration(pool: &SqlitePool, sql: &str) -> Result<(), AppError> {
    let mut tx = pool.begin().await.map_err(db_err)?;
    sqlx::raw_sql(sql).execute(&mut *tx).await.map_err(db_err)?;
    tx.commit().await.map_err(db_err)?;
    Ok(())
}

fn db_err(err: sqlx::Error) -> AppError {
    AppError::Persistence(format!("migration failed: {}", err))
}
