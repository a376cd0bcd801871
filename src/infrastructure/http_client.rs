use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::domain::DomainError;

/// JSON-over-HTTP operations the service clients need (mockable)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &Value,
    ) -> Result<Value, DomainError>;

    async fn get_json(&self, url: &str, headers: Vec<(&str, &str)>) -> Result<Value, DomainError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, DomainError> {
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::backend(format!("Request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::backend_status(
                status.as_u16(),
                error_message(status, &body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::backend(format!("Failed to parse response: {}", e)))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &Value,
    ) -> Result<Value, DomainError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        self.send(request.json(body)).await
    }

    async fn get_json(&self, url: &str, headers: Vec<(&str, &str)>) -> Result<Value, DomainError> {
        let mut request = self.client.get(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        self.send(request).await
    }
}

/// User-facing message for a failed response: the server's `error` field
/// (string or `{message}`), else the raw text, else a generic fallback
pub fn error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let message = match json.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(obj)) => obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => json
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
            return message;
        }
    }

    if body.is_empty() {
        return format!("Request failed with status {}", status.as_u16());
    }

    body.to_string()
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error": "Missing model name or features"}"#),
            "Missing model name or features"
        );
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"error": {"message": "bad key"}}"#),
            "bad key"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_text_then_generic() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream exploded"),
            "upstream exploded"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "  "),
            "Request failed with status 500"
        );
    }

    #[tokio::test]
    async fn test_post_json_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(body_json(json!({"hello": "world"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let client = HttpClient::new();
        let response = client
            .post_json(&format!("{}/echo", server.uri()), vec![], &json!({"hello": "world"}))
            .await
            .unwrap();

        assert_eq!(response, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_non_success_carries_status_and_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "No tuned model found"})),
            )
            .mount(&server)
            .await;

        let err = HttpClient::new()
            .get_json(&format!("{}/missing", server.uri()), vec![])
            .await
            .unwrap_err();

        match err {
            DomainError::Backend { status, message } => {
                assert_eq!(status, Some(404));
                assert_eq!(message, "No tuned model found");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
