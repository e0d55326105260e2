use kuching::application::services::{assemble, context_block, retrieval_block, ContextBundle, NO_ACTIVE_TASKS};
use kuching::domain::{ConversationId, Message, MessageRole, TaskSummary};

use crate::helpers::test_caller;

fn bundle() -> ContextBundle {
    ContextBundle {
        role: "Developer".to_string(),
        tasks: Vec::new(),
        staged_filenames: Vec::new(),
        snippets: Vec::new(),
    }
}

fn history() -> Vec<Message> {
    vec![Message::new(
        MessageRole::User,
        "What should I work on?".to_string(),
    )]
}

#[test]
fn given_no_tasks_when_building_context_then_sentinel_replaces_bullets() {
    let block = context_block(&test_caller(), &bundle());

    assert!(block.contains("Ada Lovelace"));
    assert!(block.contains("Developer"));
    assert!(block.contains(NO_ACTIVE_TASKS));
    assert!(!block.contains("- "));
}

#[test]
fn given_tasks_when_building_context_then_each_becomes_a_bullet() {
    let mut bundle = bundle();
    bundle.tasks = vec![
        TaskSummary {
            id: "TASK-1".to_string(),
            title: "Fix login redirect".to_string(),
        },
        TaskSummary {
            id: "TASK-2".to_string(),
            title: "Write release notes".to_string(),
        },
    ];

    let block = context_block(&test_caller(), &bundle);

    assert!(block.contains("- Fix login redirect (TASK-1)"));
    assert!(block.contains("- Write release notes (TASK-2)"));
    assert!(!block.contains(NO_ACTIVE_TASKS));
}

#[test]
fn given_staged_files_when_building_context_then_names_are_quoted_and_comma_separated() {
    let mut bundle = bundle();
    bundle.staged_filenames = vec!["spec.pdf".to_string(), "notes.md".to_string()];

    let block = context_block(&test_caller(), &bundle);

    assert!(block.contains("\"spec.pdf\", \"notes.md\""));
}

#[test]
fn given_no_staged_files_when_building_context_then_attachment_line_is_omitted() {
    let block = context_block(&test_caller(), &bundle());

    assert!(!block.contains("attached"));
}

#[test]
fn given_snippets_when_building_retrieval_block_then_each_gets_an_ordinal() {
    let block = retrieval_block(&[
        "The onboarding flow has four steps.".to_string(),
        "  Step two collects the workspace name.  ".to_string(),
    ]);

    assert!(block.contains("[1] The onboarding flow has four steps."));
    assert!(block.contains("[2] Step two collects the workspace name."));
}

#[test]
fn given_empty_snippets_when_assembling_then_no_retrieval_message() {
    let messages = assemble(ConversationId::new(), &test_caller(), &bundle(), history());

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::System);
    assert!(messages[0].content.contains("Ada Lovelace"));
    assert_eq!(messages[1].content, "What should I work on?");
}

#[test]
fn given_snippets_when_assembling_then_retrieval_precedes_context_and_history() {
    let mut bundle = bundle();
    bundle.snippets = vec!["The onboarding flow has four steps.".to_string()];

    let messages = assemble(ConversationId::new(), &test_caller(), &bundle, history());

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].role, MessageRole::System);
    assert!(messages[0].content.starts_with("Relevant excerpts"));
    assert_eq!(messages[1].role, MessageRole::System);
    assert!(messages[1].content.contains("Developer"));
    assert_eq!(messages[2].role, MessageRole::User);
}
