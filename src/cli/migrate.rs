//! `migrate` command

use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::storage::{connect, run_user_migrations, PostgresMigrator, StorageConfig};

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let pg_config = match config.storage.storage_config()? {
        StorageConfig::Postgres(pg_config) => pg_config,
        StorageConfig::InMemory => {
            info!("In-memory backend selected; nothing to migrate");
            return Ok(());
        }
    };

    let pool = connect(&pg_config).await?;
    let applied = run_user_migrations(&pool).await?;
    let version = PostgresMigrator::new(pool).current_version().await?;

    println!(
        "Applied {} migration(s); schema version {}",
        applied,
        version.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}
