use std::path::PathBuf;

use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::{migrations, DatabaseManager};

/// Apply every .sql file in `dir`, in name order
pub async fn handle(dir: PathBuf, output_format: OutputFormat) -> anyhow::Result<()> {
    let database = DatabaseManager::new(config().database.clone());
    let pool = database.pool().await?;

    let applied = migrations::apply_dir(&pool, &dir).await?;
    database.close().await;

    output_success(
        &output_format,
        &format!("Applied {} migration(s) from {}", applied.len(), dir.display()),
        Some(json!({ "applied": applied })),
    )
}
