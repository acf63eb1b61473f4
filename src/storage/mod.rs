pub mod sqlite;

use std::sync::Arc;

use crate::{
    config::StorageConfig,
    models::{ChatRecord, ChatRecordFilter},
};
use async_trait::async_trait;
use eyre::{Context, Result};
use sqlite::Sqlite;

#[async_trait]
pub trait Storage {
    /// Inserts all records in one transaction. Either every record is
    /// written or none is.
    async fn insert_chat_messages(&self, records: &[ChatRecord]) -> Result<()>;
    async fn get_chat_messages(&self, filter: ChatRecordFilter) -> Result<Vec<ChatRecord>>;
    async fn delete_chat_messages(&self, user_id: &str) -> Result<usize>;
}

pub type ArcStorage = Arc<dyn Storage + Send + Sync>;

pub async fn new_storage(config: &StorageConfig) -> Result<ArcStorage> {
    let storage = match config {
        StorageConfig::Sqlite(sqlite_config) => {
            let path = match sqlite_config.path() {
                Some(path) => {
                    let path = crate::config::resolve_path(path)
                        .wrap_err(format!("resolving database path {}", path))?;
                    crate::config::init_parent_dir(&path)?;
                    Some(path)
                }
                None => None,
            };
            Arc::new(Sqlite::new(path.as_deref()).await?)
        }
    };
    Ok(storage)
}
