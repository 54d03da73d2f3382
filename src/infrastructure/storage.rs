use crate::config::AppConfig;
use crate::services::storage::LocalStorage;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> anyhow::Result<Arc<LocalStorage>> {
    info!("💾 Storage root: {}", config.storage_path);

    let storage = LocalStorage::new(&config.storage_path);
    storage.ensure_root().await?;

    Ok(Arc::new(storage))
}
