mod chat_turn;
mod context_aggregator;
mod prompt_assembler;

pub use chat_turn::{
    normalize_title, should_generate_title, ChatTurnService, TurnError, TurnRequest,
    TurnTokenStream,
};
pub use context_aggregator::{ContextAggregator, ContextBundle, ContextError, MAX_ACTIVE_TASKS};
pub use prompt_assembler::{assemble, context_block, retrieval_block, NO_ACTIVE_TASKS, SYSTEM_INSTRUCTION};
