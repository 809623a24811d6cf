use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::backend::AgentBackend;
use crate::config::{normalize_base_url, UnibotConfig};
use crate::error::{UnibotError, UnibotResult};
use crate::models::{
    AgentStatus, QuestionPage, SessionToken, StartBatchBody, StartRequest, StartResponse,
    StartSingleBody, StopBody,
};

/// [`AgentBackend`] over the executor's JSON HTTP API.
pub struct HttpAgentBackend {
    client: Client,
    base_url: String,
}

impl HttpAgentBackend {
    pub fn new(base_url: &str, timeout: Duration, connect_timeout: Duration) -> UnibotResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| UnibotError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(config: &UnibotConfig) -> UnibotResult<Self> {
        Self::new(
            &config.api.base_url,
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") || self.base_url.is_empty()
        {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> UnibotResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| UnibotError::from_reqwest(url, e))?;
        let status = response.status();

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        if !is_json {
            return Err(UnibotError::NonJsonResponse {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UnibotError::from_reqwest(url, e))?;

        if !status.is_success() {
            debug!("{} answered {}", url, status);
            return Err(UnibotError::api(status.as_u16(), extract_detail(&body)));
        }

        serde_json::from_value(body).map_err(|e| UnibotError::Decode(e.to_string()))
    }

    async fn start(&self, path: &str, body: &impl serde::Serialize) -> UnibotResult<SessionToken> {
        let url = self.url(path);
        let response: StartResponse = self.send(self.client.post(&url).json(body), &url).await?;
        SessionToken::new(response.session_id)
            .ok_or_else(|| UnibotError::Decode("executor returned an empty session_id".to_string()))
    }
}

/// Pull a readable message out of an error body. FastAPI validation errors
/// carry a list of `{msg}` objects instead of a string.
fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    async fn start_single(&self, request: &StartRequest) -> UnibotResult<SessionToken> {
        let body = StartSingleBody {
            lesson_id: request.lessons.trim(),
            skip_video: request.skip_video,
            unix_email: request.account.trim(),
            unix_password: request.secret.expose(),
        };
        self.start("/api/agent/start", &body).await
    }

    async fn start_batch(&self, request: &StartRequest) -> UnibotResult<SessionToken> {
        let body = StartBatchBody {
            lesson_ids: request.lessons.trim(),
            skip_video: request.skip_video,
            unix_email: request.account.trim(),
            unix_password: request.secret.expose(),
        };
        self.start("/api/agent/batch", &body).await
    }

    async fn stop(&self, session: &SessionToken) -> UnibotResult<()> {
        let url = self.url("/api/agent/stop");
        let body = StopBody {
            session_id: session.as_str(),
        };
        let _ack: Value = self.send(self.client.post(&url).json(&body), &url).await?;
        Ok(())
    }

    async fn get_status(
        &self,
        session: Option<&SessionToken>,
    ) -> UnibotResult<Option<AgentStatus>> {
        let url = self.url("/api/agent/status");
        let mut request = self.client.get(&url);
        if let Some(token) = session {
            request = request.query(&[("session_id", token.as_str())]);
        }
        self.send(request, &url).await
    }

    async fn get_logs(&self, session: &SessionToken) -> UnibotResult<Vec<String>> {
        let url = self.url("/api/agent/logs");
        let request = self
            .client
            .get(&url)
            .query(&[("session_id", session.as_str())]);
        let lines: Option<Vec<String>> = self.send(request, &url).await?;
        Ok(lines.unwrap_or_default())
    }

    async fn list_questions(&self, limit: u32, offset: u64) -> UnibotResult<QuestionPage> {
        let url = self.url("/api/questions");
        let request = self
            .client
            .get(&url)
            .query(&[("limit", limit as u64), ("offset", offset)]);
        self.send(request, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_joining() {
        let backend = HttpAgentBackend::with_client(Client::new(), "http://host:8000/");
        assert_eq!(backend.base_url(), "http://host:8000");
        assert_eq!(backend.url("/api/agent/status"), "http://host:8000/api/agent/status");
        assert_eq!(backend.url("api/questions"), "http://host:8000/api/questions");
        assert_eq!(backend.url("https://other/api"), "https://other/api");
    }

    #[test]
    fn test_url_without_base_is_relative() {
        let backend = HttpAgentBackend::with_client(Client::new(), "  ");
        assert_eq!(backend.url("/api/agent/logs"), "/api/agent/logs");
    }

    #[test]
    fn test_extract_detail() {
        assert_eq!(
            extract_detail(&json!({"detail": "Agent already running"})),
            Some("Agent already running".to_string())
        );
        assert_eq!(
            extract_detail(&json!({"detail": [{"msg": "field required"}, {"msg": "bad email"}]})),
            Some("field required; bad email".to_string())
        );
        assert_eq!(extract_detail(&json!({"error": "x"})), None);
        assert_eq!(extract_detail(&json!({"detail": null})), None);
    }
}
