use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    ChatModel, ChatModelError, ChatRequest, CompletionStream, ModelOptions, StreamEvent,
};
use crate::domain::{CompletionResult, FinishReason, Message, MessageRole, TokenUsage};
use crate::presentation::config::LlmSettings;

use super::classify_provider_error;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Streaming client for the hosted Gemini-style generation API.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

impl GenerateContentChunk {
    fn text_delta(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

fn finish_reason_from_provider(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "RECITATION" => FinishReason::ContentFilter,
        "TOOL_CALLS" | "MALFORMED_FUNCTION_CALL" => FinishReason::ToolCalls,
        "OTHER" => FinishReason::Other,
        _ => FinishReason::Unknown,
    }
}

impl GeminiClient {
    pub fn new(settings: &LlmSettings) -> Self {
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            client: Client::new(),
            base_url,
            api_key: settings.api_key.clone(),
        }
    }

    fn build_contents(messages: &[Message]) -> Vec<Content> {
        messages
            .iter()
            .map(|m| Content {
                // The generation API only knows user and model turns;
                // synthetic system context rides in as a user turn.
                role: Some(match m.role {
                    MessageRole::Assistant => "model".to_string(),
                    MessageRole::User | MessageRole::System => "user".to_string(),
                }),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect()
    }

    fn build_request(request: &ChatRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: Self::build_contents(&request.messages),
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: request.system_instruction.clone(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: request.options.temperature,
                max_output_tokens: request.options.max_output_tokens,
            },
        }
    }

    async fn post(
        &self,
        model: &str,
        verb: &str,
        body: &GenerateContentRequest,
        stream: bool,
    ) -> Result<reqwest::Response, ChatModelError> {
        let url = if stream {
            format!("{}/models/{}:{}?alt=sse", self.base_url, model, verb)
        } else {
            format!("{}/models/{}:{}", self.base_url, model, verb)
        };

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ChatModelError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_provider_error(Some(status), &body));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<CompletionStream, ChatModelError> {
        let body = Self::build_request(&request);
        let response = self
            .post(
                &request.options.chat_model,
                "streamGenerateContent",
                &body,
                true,
            )
            .await?;

        let stream = Box::pin(async_stream::stream! {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut full_text = String::new();
            let mut usage = TokenUsage::default();
            let mut finish_reason = FinishReason::Unknown;

            while let Some(chunk) = byte_stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(ChatModelError::RequestFailed(e.to_string()));
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let Ok(parsed) = serde_json::from_str::<GenerateContentChunk>(data) else {
                        continue;
                    };

                    if let Some(metadata) = &parsed.usage_metadata {
                        usage = TokenUsage {
                            prompt_tokens: metadata.prompt_token_count.unwrap_or_default(),
                            completion_tokens: metadata.candidates_token_count.unwrap_or_default(),
                            total_tokens: metadata.total_token_count.unwrap_or_default(),
                        };
                    }
                    if let Some(reason) = parsed.finish_reason() {
                        finish_reason = finish_reason_from_provider(reason);
                    }
                    if let Some(text) = parsed.text_delta() {
                        full_text.push_str(&text);
                        yield Ok(StreamEvent::Token(text));
                    }
                }
            }

            yield Ok(StreamEvent::Done(CompletionResult {
                text: full_text,
                usage,
                finish_reason,
            }));
        });

        Ok(stream)
    }

    async fn generate_title(
        &self,
        first_message: &str,
        options: &ModelOptions,
    ) -> Result<String, ChatModelError> {
        let prompt = format!(
            "Generate a concise 3-5 word title for a conversation that starts \
             with the following message. Respond with the title only, no quotes.\n\n{}",
            first_message
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: "You name conversations.".to_string(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 32,
            },
        };

        let response = self
            .post(&options.title_model, "generateContent", &body, false)
            .await?;

        let parsed: GenerateContentChunk = response
            .json()
            .await
            .map_err(|e| ChatModelError::InvalidResponse(e.to_string()))?;

        parsed
            .text_delta()
            .ok_or_else(|| ChatModelError::InvalidResponse("empty candidates".to_string()))
    }
}
