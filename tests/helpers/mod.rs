use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use futures::stream;

use kuching::application::ports::{
    ChatModel, ChatModelError, ChatRequest, CompletionStream, ConversationRepository,
    DirectoryError, FileRecordStore, ModelOptions, ProjectDirectory, RepositoryError,
    RetrievalClient, RetrievalError, SessionUser, SessionVerifier, StreamEvent,
};
use kuching::application::services::{ChatTurnService, ContextAggregator};
use kuching::domain::{
    CompletionResult, Conversation, ConversationId, FileRecord, FinishReason, MembershipLookup,
    Message, NewFileRecord, ProjectId, TaskSummary, TokenUsage, UserId,
};
use kuching::presentation::{create_router, AppState};

pub const VALID_TOKEN: &str = "valid-token";

pub struct InMemoryConversationRepository {
    pub conversations: Mutex<HashMap<ConversationId, Conversation>>,
    pub title_set_calls: AtomicUsize,
    pub fail_appends: AtomicBool,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            title_set_calls: AtomicUsize::new(0),
            fail_appends: AtomicBool::new(false),
        }
    }

    pub fn seed(&self, conversation: Conversation) {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id, conversation);
    }

    pub fn message_count(&self, id: ConversationId) -> usize {
        self.conversations
            .lock()
            .unwrap()
            .get(&id)
            .map(|c| c.messages.len())
            .unwrap_or(0)
    }

    pub fn title_of(&self, id: ConversationId) -> Option<String> {
        self.conversations
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|c| c.title.clone())
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        self.seed(conversation.clone());
        Ok(())
    }

    async fn fetch_for_owner(
        &self,
        id: ConversationId,
        owner: UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .get(&id)
            .filter(|c| c.user_id == owner)
            .cloned())
    }

    async fn append_messages(
        &self,
        id: ConversationId,
        messages: &[Message],
    ) -> Result<(), RepositoryError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(RepositoryError::QueryFailed("insert failed".to_string()));
        }
        let mut guard = self.conversations.lock().unwrap();
        let conversation = guard
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("{:?}", id)))?;
        conversation.messages.extend_from_slice(messages);
        Ok(())
    }

    async fn set_title_if_absent(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<bool, RepositoryError> {
        self.title_set_calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.conversations.lock().unwrap();
        let conversation = guard
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("{:?}", id)))?;
        if conversation.title.is_some() {
            return Ok(false);
        }
        conversation.title = Some(title.to_string());
        Ok(true)
    }

    async fn list_for_owner_in_project(
        &self,
        owner: UserId,
        project: ProjectId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id == owner && c.project_id == project)
            .cloned()
            .collect())
    }
}

pub struct MockDirectory {
    pub membership: MembershipLookup,
    pub tasks: Vec<TaskSummary>,
    pub fail_tasks: bool,
    pub task_calls: AtomicUsize,
}

impl MockDirectory {
    pub fn member(role: &str, tasks: Vec<TaskSummary>) -> Self {
        Self {
            membership: MembershipLookup::Member {
                role: role.to_string(),
            },
            tasks,
            fail_tasks: false,
            task_calls: AtomicUsize::new(0),
        }
    }

    pub fn not_a_member() -> Self {
        Self {
            membership: MembershipLookup::NotFound,
            tasks: Vec::new(),
            fail_tasks: false,
            task_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProjectDirectory for MockDirectory {
    async fn membership(
        &self,
        _project: ProjectId,
        _user: UserId,
    ) -> Result<MembershipLookup, DirectoryError> {
        Ok(self.membership.clone())
    }

    async fn active_tasks(
        &self,
        _project: ProjectId,
        _user: UserId,
        limit: usize,
    ) -> Result<Vec<TaskSummary>, DirectoryError> {
        self.task_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_tasks {
            return Err(DirectoryError::LookupFailed("boom".to_string()));
        }
        Ok(self.tasks.iter().take(limit).cloned().collect())
    }
}

pub struct MockChatModel {
    pub reply: String,
    pub title: String,
    pub requests: Mutex<Vec<ChatRequest>>,
    pub title_calls: AtomicUsize,
    pub fail_stream: Mutex<Option<ChatModelError>>,
    pub fail_title: Mutex<Option<ChatModelError>>,
}

impl MockChatModel {
    pub fn replying(reply: &str, title: &str) -> Self {
        Self {
            reply: reply.to_string(),
            title: title.to_string(),
            requests: Mutex::new(Vec::new()),
            title_calls: AtomicUsize::new(0),
            fail_stream: Mutex::new(None),
            fail_title: Mutex::new(None),
        }
    }

    pub fn failing(error: ChatModelError) -> Self {
        let model = Self::replying("", "");
        *model.fail_stream.lock().unwrap() = Some(error);
        model
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn first_request_contents(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .first()
            .map(|r| r.messages.iter().map(|m| m.content.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn stream_chat(&self, request: ChatRequest) -> Result<CompletionStream, ChatModelError> {
        if let Some(error) = self.fail_stream.lock().unwrap().take() {
            return Err(error);
        }
        self.requests.lock().unwrap().push(request);

        let midpoint = self.reply.len() / 2;
        let (head, tail) = self.reply.split_at(midpoint);
        let events = vec![
            Ok(StreamEvent::Token(head.to_string())),
            Ok(StreamEvent::Token(tail.to_string())),
            Ok(StreamEvent::Done(CompletionResult {
                text: self.reply.clone(),
                usage: TokenUsage {
                    prompt_tokens: 12,
                    completion_tokens: 34,
                    total_tokens: 46,
                },
                finish_reason: FinishReason::Stop,
            })),
        ];
        Ok(Box::pin(stream::iter(events)))
    }

    async fn generate_title(
        &self,
        _first_message: &str,
        _options: &ModelOptions,
    ) -> Result<String, ChatModelError> {
        self.title_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fail_title.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.title.clone())
    }
}

pub struct MockRetrieval {
    pub snippets: Option<Vec<String>>,
}

#[async_trait]
impl RetrievalClient for MockRetrieval {
    async fn retrieve(
        &self,
        _message: &str,
        _project: ProjectId,
        _user: UserId,
    ) -> Result<Vec<String>, RetrievalError> {
        match &self.snippets {
            Some(snippets) => Ok(snippets.clone()),
            None => Err(RetrievalError::RequestFailed("connection refused".to_string())),
        }
    }
}

pub struct MockFileRecordStore {
    pub created: Mutex<Vec<NewFileRecord>>,
    pub fail_for: Option<String>,
}

impl MockFileRecordStore {
    pub fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            fail_for: None,
        }
    }
}

#[async_trait]
impl FileRecordStore for MockFileRecordStore {
    async fn create_record(&self, record: &NewFileRecord) -> Result<FileRecord, RepositoryError> {
        if self.fail_for.as_deref() == Some(record.filename.as_str()) {
            return Err(RepositoryError::QueryFailed("insert failed".to_string()));
        }
        self.created.lock().unwrap().push(record.clone());
        Ok(FileRecord {
            id: uuid::Uuid::new_v4(),
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
            created_at: chrono::Utc::now(),
        })
    }
}

pub struct MockSessionVerifier {
    pub user: SessionUser,
}

#[async_trait]
impl SessionVerifier for MockSessionVerifier {
    async fn verify(&self, token: &str) -> Result<Option<SessionUser>, RepositoryError> {
        if token == VALID_TOKEN {
            Ok(Some(self.user.clone()))
        } else {
            Ok(None)
        }
    }
}

pub struct TestEnv {
    pub router: Router,
    pub conversations: Arc<InMemoryConversationRepository>,
    pub directory: Arc<MockDirectory>,
    pub model: Arc<MockChatModel>,
    pub files: Arc<MockFileRecordStore>,
    pub caller: SessionUser,
    pub project_id: ProjectId,
}

impl TestEnv {
    pub fn seed_conversation(&self, title: Option<&str>) -> ConversationId {
        let mut conversation = Conversation::new(self.caller.user_id, self.project_id);
        conversation.title = title.map(String::from);
        let id = conversation.id;
        self.conversations.seed(conversation);
        id
    }
}

pub fn test_caller() -> SessionUser {
    SessionUser {
        user_id: UserId::new(),
        display_name: "Ada Lovelace".to_string(),
    }
}

pub fn test_options() -> ModelOptions {
    ModelOptions {
        chat_model: "gemini-test".to_string(),
        title_model: "gemini-test-lite".to_string(),
        temperature: 0.7,
        max_output_tokens: 256,
    }
}

pub fn build_env(
    directory: MockDirectory,
    model: MockChatModel,
    retrieval: Option<MockRetrieval>,
) -> TestEnv {
    let conversations = Arc::new(InMemoryConversationRepository::new());
    let directory = Arc::new(directory);
    let model = Arc::new(model);
    let files = Arc::new(MockFileRecordStore::new());
    let caller = test_caller();

    let retrieval_client: Option<Arc<dyn RetrievalClient>> = match retrieval {
        Some(retrieval) => Some(Arc::new(retrieval)),
        None => None,
    };

    let aggregator = ContextAggregator::new(
        directory.clone(),
        files.clone(),
        retrieval_client,
        "supabase".to_string(),
    );

    let chat_turns = Arc::new(ChatTurnService::new(
        conversations.clone(),
        aggregator,
        model.clone(),
        test_options(),
    ));

    let state = AppState {
        chat_turns,
        conversations: conversations.clone(),
        sessions: Arc::new(MockSessionVerifier {
            user: caller.clone(),
        }),
    };

    TestEnv {
        router: create_router(state),
        conversations,
        directory,
        model,
        files,
        caller,
        project_id: ProjectId::new(),
    }
}

/// Polls until the deferred side effects land or the deadline passes.
pub async fn wait_until<F>(condition: F, what: &str)
where
    F: Fn() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for: {}", what);
}
