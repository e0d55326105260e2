use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{FileRecordStore, RepositoryError};
use crate::domain::{FileRecord, NewFileRecord};

pub struct PgFileRecordStore {
    pool: PgPool,
}

impl PgFileRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRecordStore for PgFileRecordStore {
    #[instrument(skip(self, record), fields(filename = %record.filename))]
    async fn create_record(&self, record: &NewFileRecord) -> Result<FileRecord, RepositoryError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO files (
                id, project_id, task_id, uploader_id, conversation_id,
                storage_provider, storage_path, public_url, filename,
                content_type, size, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(id)
        .bind(record.project_id.as_uuid())
        .bind(&record.task_id)
        .bind(record.uploader_id.as_uuid())
        .bind(record.conversation_id.as_uuid())
        .bind(&record.storage_provider)
        .bind(&record.storage_path)
        .bind(&record.public_url)
        .bind(&record.filename)
        .bind(&record.content_type)
        .bind(record.size)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(FileRecord {
            id,
            project_id: record.project_id,
            task_id: record.task_id.clone(),
            uploader_id: record.uploader_id,
            conversation_id: record.conversation_id,
            storage_provider: record.storage_provider.clone(),
            storage_path: record.storage_path.clone(),
            public_url: record.public_url.clone(),
            filename: record.filename.clone(),
            content_type: record.content_type.clone(),
            size: record.size,
            created_at,
        })
    }
}
