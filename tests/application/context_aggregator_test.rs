use std::sync::atomic::Ordering;
use std::sync::Arc;

use kuching::application::ports::RetrievalClient;
use kuching::application::services::{ContextAggregator, ContextError};
use kuching::domain::{ConversationId, ProjectId, StagedFileMetadata, TaskSummary};

use crate::helpers::{
    test_caller, MockDirectory, MockFileRecordStore, MockRetrieval,
};

fn aggregator(
    directory: Arc<MockDirectory>,
    files: Arc<MockFileRecordStore>,
    retrieval: Option<Arc<dyn RetrievalClient>>,
) -> ContextAggregator {
    ContextAggregator::new(directory, files, retrieval, "supabase".to_string())
}

fn staged(name: &str) -> StagedFileMetadata {
    StagedFileMetadata {
        name: name.to_string(),
        path: format!("uploads/{}", name),
        url: None,
        content_type: "application/pdf".to_string(),
        size: 2048,
    }
}

#[tokio::test]
async fn given_non_member_when_gathering_then_nothing_else_is_fetched() {
    let directory = Arc::new(MockDirectory::not_a_member());
    let files = Arc::new(MockFileRecordStore::new());
    let aggregator = aggregator(directory.clone(), files.clone(), None);

    let result = aggregator
        .gather(
            ProjectId::new(),
            &test_caller(),
            ConversationId::new(),
            &[staged("notes.pdf")],
            "What should I work on?",
        )
        .await;

    assert!(matches!(result, Err(ContextError::NotAMember)));
    assert_eq!(directory.task_calls.load(Ordering::SeqCst), 0);
    assert!(files.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn given_task_lookup_failure_when_gathering_then_bundle_degrades() {
    let mut directory = MockDirectory::member("Designer", vec![]);
    directory.fail_tasks = true;
    let directory = Arc::new(directory);
    let files = Arc::new(MockFileRecordStore::new());
    let aggregator = aggregator(directory, files, None);

    let bundle = aggregator
        .gather(
            ProjectId::new(),
            &test_caller(),
            ConversationId::new(),
            &[],
            "What should I work on?",
        )
        .await
        .unwrap();

    assert_eq!(bundle.role, "Designer");
    assert!(bundle.tasks.is_empty());
}

#[tokio::test]
async fn given_member_with_tasks_when_gathering_then_bundle_carries_them() {
    let directory = Arc::new(MockDirectory::member(
        "Developer",
        vec![
            TaskSummary {
                id: "TASK-1".to_string(),
                title: "Fix login redirect".to_string(),
            },
            TaskSummary {
                id: "TASK-2".to_string(),
                title: "Write release notes".to_string(),
            },
        ],
    ));
    let files = Arc::new(MockFileRecordStore::new());
    let aggregator = aggregator(directory, files, None);

    let bundle = aggregator
        .gather(
            ProjectId::new(),
            &test_caller(),
            ConversationId::new(),
            &[],
            "What should I work on?",
        )
        .await
        .unwrap();

    assert_eq!(bundle.tasks.len(), 2);
    assert_eq!(bundle.tasks[0].id, "TASK-1");
    assert!(bundle.snippets.is_empty());
}

#[tokio::test]
async fn given_file_record_failure_when_gathering_then_filename_is_excluded() {
    let directory = Arc::new(MockDirectory::member("Developer", vec![]));
    let mut files = MockFileRecordStore::new();
    files.fail_for = Some("broken.pdf".to_string());
    let files = Arc::new(files);
    let aggregator = aggregator(directory, files.clone(), None);

    let bundle = aggregator
        .gather(
            ProjectId::new(),
            &test_caller(),
            ConversationId::new(),
            &[staged("notes.pdf"), staged("broken.pdf")],
            "Summarize the attachments",
        )
        .await
        .unwrap();

    assert_eq!(bundle.staged_filenames, vec!["notes.pdf".to_string()]);
    assert_eq!(files.created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn given_retrieval_failure_when_gathering_then_snippets_are_empty() {
    let directory = Arc::new(MockDirectory::member("Developer", vec![]));
    let files = Arc::new(MockFileRecordStore::new());
    let retrieval: Arc<dyn RetrievalClient> = Arc::new(MockRetrieval { snippets: None });
    let aggregator = aggregator(directory, files, Some(retrieval));

    let bundle = aggregator
        .gather(
            ProjectId::new(),
            &test_caller(),
            ConversationId::new(),
            &[],
            "Summarize the project docs",
        )
        .await
        .unwrap();

    assert!(bundle.snippets.is_empty());
}

#[tokio::test]
async fn given_retrieval_snippets_when_gathering_then_bundle_carries_them() {
    let directory = Arc::new(MockDirectory::member("Developer", vec![]));
    let files = Arc::new(MockFileRecordStore::new());
    let retrieval: Arc<dyn RetrievalClient> = Arc::new(MockRetrieval {
        snippets: Some(vec!["The onboarding flow has four steps.".to_string()]),
    });
    let aggregator = aggregator(directory, files, Some(retrieval));

    let bundle = aggregator
        .gather(
            ProjectId::new(),
            &test_caller(),
            ConversationId::new(),
            &[],
            "Summarize the onboarding docs",
        )
        .await
        .unwrap();

    assert_eq!(bundle.snippets.len(), 1);
}
