use crate::core::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use std::time::Duration;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let set_timezone = format!("SET TIME ZONE '{}'", config.timezone.replace('\'', "''"));

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .after_connect(move |conn, _meta| {
            let set_timezone = set_timezone.clone();
            Box::pin(async move {
                conn.execute(set_timezone.as_str()).await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await
}

/// Apply pending migrations from `./migrations`
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
