use std::sync::Arc;

use crate::application::ports::{ConversationRepository, SessionVerifier};
use crate::application::services::ChatTurnService;

#[derive(Clone)]
pub struct AppState {
    pub chat_turns: Arc<ChatTurnService>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub sessions: Arc<dyn SessionVerifier>,
}
