use std::sync::Arc;

use crate::application::ports::{
    DirectoryError, FileRecordStore, ProjectDirectory, RetrievalClient, SessionUser,
};
use crate::domain::{
    ConversationId, MembershipLookup, NewFileRecord, ProjectId, StagedFileMetadata, TaskSummary,
    UserId,
};

/// Task context is enrichment; anything beyond this count is noise.
pub const MAX_ACTIVE_TASKS: usize = 10;

/// Per-turn aggregate handed to prompt assembly. Lives for one turn and is
/// never persisted.
#[derive(Debug, Clone)]
pub struct ContextBundle {
    pub role: String,
    pub tasks: Vec<TaskSummary>,
    pub staged_filenames: Vec<String>,
    pub snippets: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("user is not a member of the project")]
    NotAMember,
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

pub struct ContextAggregator {
    directory: Arc<dyn ProjectDirectory>,
    file_records: Arc<dyn FileRecordStore>,
    retrieval: Option<Arc<dyn RetrievalClient>>,
    storage_provider: String,
}

impl ContextAggregator {
    pub fn new(
        directory: Arc<dyn ProjectDirectory>,
        file_records: Arc<dyn FileRecordStore>,
        retrieval: Option<Arc<dyn RetrievalClient>>,
        storage_provider: String,
    ) -> Self {
        Self {
            directory,
            file_records,
            retrieval,
            storage_provider,
        }
    }

    /// Builds the turn's context. Membership is the gate: a caller with no
    /// role in the project has no right to chat in it, and nothing else is
    /// fetched on their behalf. Task lookup, file persistence and retrieval
    /// only degrade the bundle when they fail.
    #[tracing::instrument(
        skip(self, caller, staged_files, latest_message),
        fields(project_id = %project.as_uuid(), user_id = %caller.user_id.as_uuid())
    )]
    pub async fn gather(
        &self,
        project: ProjectId,
        caller: &SessionUser,
        conversation: ConversationId,
        staged_files: &[StagedFileMetadata],
        latest_message: &str,
    ) -> Result<ContextBundle, ContextError> {
        let role = match self.directory.membership(project, caller.user_id).await? {
            MembershipLookup::Member { role } => role,
            MembershipLookup::NotFound => return Err(ContextError::NotAMember),
        };

        let (tasks, snippets) = tokio::join!(
            self.directory
                .active_tasks(project, caller.user_id, MAX_ACTIVE_TASKS),
            self.retrieve_snippets(latest_message, project, caller.user_id),
        );

        let tasks = tasks.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Active task lookup failed, continuing without tasks");
            Vec::new()
        });

        let staged_filenames = self
            .persist_staged_files(project, caller, conversation, staged_files)
            .await;

        Ok(ContextBundle {
            role,
            tasks,
            staged_filenames,
            snippets,
        })
    }

    async fn persist_staged_files(
        &self,
        project: ProjectId,
        caller: &SessionUser,
        conversation: ConversationId,
        staged_files: &[StagedFileMetadata],
    ) -> Vec<String> {
        let mut filenames = Vec::with_capacity(staged_files.len());
        for file in staged_files {
            let record = NewFileRecord {
                project_id: project,
                task_id: None,
                uploader_id: caller.user_id,
                conversation_id: conversation,
                storage_provider: self.storage_provider.clone(),
                storage_path: file.path.clone(),
                public_url: file.url.clone(),
                filename: file.name.clone(),
                content_type: file.content_type.clone(),
                size: file.size,
            };
            match self.file_records.create_record(&record).await {
                Ok(_) => filenames.push(file.name.clone()),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        filename = %file.name,
                        "Failed to persist staged file record, excluding from context"
                    );
                }
            }
        }
        filenames
    }

    async fn retrieve_snippets(
        &self,
        latest_message: &str,
        project: ProjectId,
        user: UserId,
    ) -> Vec<String> {
        let Some(retrieval) = &self.retrieval else {
            return Vec::new();
        };
        match retrieval.retrieve(latest_message, project, user).await {
            Ok(snippets) => snippets,
            Err(e) => {
                tracing::warn!(error = %e, "Retrieval augmentation failed, continuing without it");
                Vec::new()
            }
        }
    }
}
