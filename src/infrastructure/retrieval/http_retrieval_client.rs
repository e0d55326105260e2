use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{RetrievalClient, RetrievalError};
use crate::domain::{ProjectId, UserId};

/// Client for the external retrieval service that answers with project
/// document snippets for a given question.
pub struct HttpRetrievalClient {
    client: Client,
    url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalRequest<'a> {
    message: &'a str,
    project_id: String,
    user_id: String,
}

#[derive(Deserialize)]
struct RetrievalResponse {
    #[serde(default)]
    results: Vec<RetrievalResult>,
}

#[derive(Deserialize)]
struct RetrievalResult {
    content: String,
}

impl HttpRetrievalClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::RequestFailed(e.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl RetrievalClient for HttpRetrievalClient {
    async fn retrieve(
        &self,
        message: &str,
        project: ProjectId,
        user: UserId,
    ) -> Result<Vec<String>, RetrievalError> {
        let request = RetrievalRequest {
            message,
            project_id: project.as_uuid().to_string(),
            user_id: user.as_uuid().to_string(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RetrievalError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RetrievalError::BadStatus(response.status().as_u16()));
        }

        let parsed: RetrievalResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;

        Ok(parsed.results.into_iter().map(|r| r.content).collect())
    }
}
