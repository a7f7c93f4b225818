use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id UUID PRIMARY KEY,
            owner_id VARCHAR(128) NOT NULL,
            kind VARCHAR(32) NOT NULL,
            title TEXT NOT NULL,
            source_name TEXT NOT NULL,
            source_key TEXT NOT NULL,
            source_url TEXT NOT NULL,
            parameters JSONB NOT NULL DEFAULT '{}',
            status VARCHAR(32) NOT NULL,
            result_key TEXT,
            result_url TEXT,
            result_size BIGINT,
            duration VARCHAR(32),
            slides VARCHAR(32),
            diagnostic TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Listing is always by owner, newest first
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_jobs_owner_created ON jobs(owner_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
