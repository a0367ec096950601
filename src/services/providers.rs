// Agent Platform Service
// Implements the remote verification agent API (conversation create + run)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

const APPBUILDER_DEFAULT_URL: &str = "https://qianfan.baidubce.com";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing answer in response")]
    MissingAnswer,
    #[error("Missing conversation id in response")]
    MissingConversationId,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("API key not configured")]
    MissingApiKey,
}

/// Textual answer produced by one agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAnswer {
    pub answer: String,
}

/// Remote verification agent boundary.
///
/// `None` means the call produced nothing usable (transport failure, API
/// error, or a response without the expected field); callers treat it as a
/// first-class failure case rather than probing response attributes.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn create_conversation(&self) -> Option<String>;
    async fn run(&self, conversation_id: &str, prompt: &str) -> Option<AgentAnswer>;
}

#[derive(Debug, Clone, Serialize)]
struct CreateConversationRequest {
    app_id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateConversationResponse {
    conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct RunRequest {
    app_id: String,
    conversation_id: String,
    query: String,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct RunResponse {
    content: Option<RunContent>,
}

#[derive(Debug, Clone, Deserialize)]
struct RunContent {
    answer: Option<String>,
}

pub struct AppBuilderClient {
    client: Client,
    base_url: String,
    app_id: String,
    token: String,
}

impl AppBuilderClient {
    pub fn new(app_id: &str, token: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(80))
            .build()
            .unwrap_or_default();

        let base_url =
            env::var("APPBUILDER_API_URL").unwrap_or_else(|_| APPBUILDER_DEFAULT_URL.to_string());

        Self {
            client,
            base_url,
            app_id: app_id.to_string(),
            token: token.to_string(),
        }
    }

    pub fn with_base_url(app_id: &str, token: &str, base_url: &str) -> Self {
        let mut client = Self::new(app_id, token);
        client.base_url = base_url.trim_end_matches('/').to_string();
        client
    }

    async fn try_create_conversation(&self) -> Result<String, ProviderError> {
        let request = CreateConversationRequest {
            app_id: self.app_id.clone(),
        };

        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}/v2/app/conversation", self.base_url))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: CreateConversationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let conversation_id = data
            .conversation_id
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingConversationId)?;

        info!("[AGENT] conversation created latency_ms={}", latency_ms);
        Ok(conversation_id)
    }

    async fn try_run(&self, conversation_id: &str, prompt: &str) -> Result<AgentAnswer, ProviderError> {
        let request = RunRequest {
            app_id: self.app_id.clone(),
            conversation_id: conversation_id.to_string(),
            query: prompt.to_string(),
            stream: false,
        };

        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}/v2/app/conversation/runs", self.base_url))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: RunResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let answer = data
            .content
            .and_then(|c| c.answer)
            .ok_or(ProviderError::MissingAnswer)?;

        info!("[AGENT] run ok latency_ms={} answer_chars={}", latency_ms, answer.chars().count());
        Ok(AgentAnswer { answer })
    }
}

#[async_trait]
impl AgentClient for AppBuilderClient {
    async fn create_conversation(&self) -> Option<String> {
        match self.try_create_conversation().await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("[AGENT] create conversation failed: {}", e);
                None
            }
        }
    }

    async fn run(&self, conversation_id: &str, prompt: &str) -> Option<AgentAnswer> {
        match self.try_run(conversation_id, prompt).await {
            Ok(answer) => Some(answer),
            Err(e) => {
                warn!("[AGENT] run failed: {}", e);
                None
            }
        }
    }
}

/// Get agent API token from environment or config file
pub fn get_api_key() -> Option<String> {
    for key in ["APPBUILDER_TOKEN", "RUMORAI_APPBUILDER_TOKEN"] {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    if let Some(config_dir) = super::ConfigStore::default_config_dir() {
        let store = super::ConfigStore::new(config_dir);
        if let Ok(Some(key)) = store.get_api_key("appbuilder") {
            return Some(key);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_response_with_answer() {
        let raw = r#"{"content":{"answer":"ok"},"request_id":"r1"}"#;
        let parsed: RunResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.content.and_then(|c| c.answer).as_deref(), Some("ok"));
    }

    #[test]
    fn test_run_response_missing_answer() {
        let raw = r#"{"content":{}}"#;
        let parsed: RunResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.content.and_then(|c| c.answer).is_none());
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let client = AppBuilderClient::with_base_url("app", "token", "http://localhost:8188/");
        assert_eq!(client.base_url, "http://localhost:8188");
    }
}
