use std::fmt::Write;

use crate::application::ports::SessionUser;
use crate::domain::{ConversationId, Message};

use super::ContextBundle;

/// Persona and ground rules for the assistant. Supplied to the model call
/// separately, never mixed into the message list.
pub const SYSTEM_INSTRUCTION: &str = "You are a project workspace assistant. \
You help team members reason about their project, their assigned tasks and \
their uploaded documents. Answer in concise markdown, quote filenames and \
task titles exactly as given, and say so plainly when you do not know \
something instead of inventing an answer.";

pub const NO_ACTIVE_TASKS: &str = "No active tasks currently assigned.";

/// Final ordered message list for the model: optional retrieval block,
/// then the role/task/file context block, then the history unchanged.
pub fn assemble(
    conversation_id: ConversationId,
    caller: &SessionUser,
    bundle: &ContextBundle,
    history: Vec<Message>,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if !bundle.snippets.is_empty() {
        messages.push(Message::synthetic(
            conversation_id,
            retrieval_block(&bundle.snippets),
        ));
    }
    messages.push(Message::synthetic(
        conversation_id,
        context_block(caller, bundle),
    ));
    messages.extend(history);
    messages
}

pub fn retrieval_block(snippets: &[String]) -> String {
    let mut block =
        String::from("Relevant excerpts retrieved from this project's documents:\n");
    for (ordinal, snippet) in snippets.iter().enumerate() {
        let _ = write!(block, "\n[{}] {}", ordinal + 1, snippet.trim());
    }
    block
}

pub fn context_block(caller: &SessionUser, bundle: &ContextBundle) -> String {
    let mut block = format!(
        "You are assisting {}, whose role in this project is {}.\n\nActive tasks assigned to them:\n",
        caller.display_name, bundle.role
    );

    if bundle.tasks.is_empty() {
        block.push_str(NO_ACTIVE_TASKS);
    } else {
        for task in &bundle.tasks {
            let _ = writeln!(block, "- {} ({})", task.title, task.id);
        }
    }

    if !bundle.staged_filenames.is_empty() {
        let quoted: Vec<String> = bundle
            .staged_filenames
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect();
        let _ = write!(
            block,
            "\n\nThe user attached the following files to this message: {}.",
            quoted.join(", ")
        );
    }

    block
}
