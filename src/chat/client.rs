//! HTTP transport for the chat completion endpoint.

use crate::chat::Message;
use crate::config::CompletionConfig;
use crate::error::AdvisorError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends the whole conversation and returns the assistant's reply text.
    async fn complete(&self, messages: &[Message]) -> Result<String, AdvisorError>;
}

#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpCompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, AdvisorError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| AdvisorError::Fetch(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl CompletionService for HttpCompletionClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, AdvisorError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            messages = messages.len(),
            "sending completion request"
        );

        let response = request
            .send()
            .await
            .map_err(|err| AdvisorError::Fetch(format!("completion request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(AdvisorError::remote(
                Some(status.as_u16()),
                error_message(&body_text, status.canonical_reason().unwrap_or("request failed")),
            ));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| AdvisorError::Fetch(format!("failed to parse completion body: {err}")))?;

        extract_reply(payload)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_reply(payload: Value) -> Result<String, AdvisorError> {
    let parsed: ChatCompletionResponse = serde_json::from_value(payload).map_err(|err| {
        AdvisorError::remote(None, format!("unexpected completion payload: {err}"))
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AdvisorError::remote(None, "completion payload has no message content"))
}

fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(wrapper) = serde_json::from_str::<ErrorResponse>(body) {
        return wrapper.error.message;
    }
    let body = body.trim();
    if body.is_empty() {
        fallback.to_string()
    } else {
        body.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> HttpCompletionClient {
        HttpCompletionClient::new(&CompletionConfig {
            endpoint: format!("{}/v1/chat/completions", server.uri()),
            model: "gpt-3.5-turbo".to_string(),
            api_key: api_key.map(str::to_string),
            timeout: None,
        })
        .expect("client should build")
    }

    fn conversation() -> Vec<Message> {
        vec![
            Message::new(Role::System, "be helpful"),
            Message::new(Role::User, "What's good for dry skin?"),
        ]
    }

    #[tokio::test]
    async fn posts_model_and_messages_and_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "Try a ceramide moisturizer." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server, None)
            .complete(&conversation())
            .await
            .expect("completion should succeed");
        assert_eq!(reply, "Try a ceramide moisturizer.");

        let requests = server
            .received_requests()
            .await
            .expect("requests should be recorded");
        let body: Value = requests[0].body_json().expect("body should be json");
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "What's good for dry skin?");
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn sends_bearer_key_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "ok" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server, Some("sk-test"))
            .complete(&conversation())
            .await
            .expect("completion should succeed");
        assert_eq!(reply, "ok");
    }

    #[tokio::test]
    async fn non_success_status_is_a_remote_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "message": "upstream exploded" }
            })))
            .mount(&server)
            .await;

        let error = client_for(&server, None)
            .complete(&conversation())
            .await
            .expect_err("500 should fail");
        assert_eq!(
            error,
            AdvisorError::remote(Some(500), "upstream exploded".to_string())
        );
    }

    #[tokio::test]
    async fn payload_without_content_is_a_remote_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let error = client_for(&server, None)
            .complete(&conversation())
            .await
            .expect_err("empty choices should fail");
        assert!(matches!(error, AdvisorError::RemoteService { status: None, .. }));
    }

    #[tokio::test]
    async fn non_json_body_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let error = client_for(&server, None)
            .complete(&conversation())
            .await
            .expect_err("html should fail");
        assert!(matches!(error, AdvisorError::Fetch(_)));
    }

    #[test]
    fn error_message_falls_back_to_trimmed_body_or_reason() {
        assert_eq!(error_message("  plain failure ", "Bad Gateway"), "plain failure");
        assert_eq!(error_message("", "Bad Gateway"), "Bad Gateway");
    }
}
