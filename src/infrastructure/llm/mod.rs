mod gemini_client;
mod provider_error;

pub use gemini_client::GeminiClient;
pub use provider_error::classify_provider_error;
