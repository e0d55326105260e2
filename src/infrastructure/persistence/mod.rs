mod pg_conversation_repository;
mod pg_file_record_store;
mod pg_pool;
mod pg_project_directory;
mod pg_session_store;

pub use pg_conversation_repository::PgConversationRepository;
pub use pg_file_record_store::PgFileRecordStore;
pub use pg_pool::create_pool;
pub use pg_project_directory::PgProjectDirectory;
pub use pg_session_store::PgSessionStore;
