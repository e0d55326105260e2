use config::{Config, File};
use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

impl Settings {
    /// Layered load: optional `appsettings.<env>` file, then `APP__`-prefixed
    /// environment variables on top.
    pub fn load(environment: Environment) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub api_key: String,
    /// Override for the provider endpoint, mainly for tests and proxies.
    pub base_url: Option<String>,
    pub chat_model: String,
    pub title_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalSettings {
    /// Full endpoint URL of the retrieval service. Absent means the chat
    /// runs without retrieval augmentation.
    pub url: Option<String>,
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: default_retrieval_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Tag written on durable file records naming the object store the
    /// client uploaded to.
    pub provider: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: "supabase".to_string(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_retrieval_timeout() -> u64 {
    10
}
