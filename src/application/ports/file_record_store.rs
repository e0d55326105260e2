use async_trait::async_trait;

use crate::domain::{FileRecord, NewFileRecord};

use super::RepositoryError;

#[async_trait]
pub trait FileRecordStore: Send + Sync {
    async fn create_record(&self, record: &NewFileRecord) -> Result<FileRecord, RepositoryError>;
}
