//! HTTP realization of the remote gateway

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use super::gateway::{GatewayError, GatewayResult, RemoteGateway, SaveResponse};
use super::wire::{ListEnvelope, SaveEnvelope, ServerEntry};
use crate::models::Entry;
use crate::util::{compact_text, is_http_url, normalize_text_option};

pub const PROBE_PATH: &str = "/api/getTS";
pub const LIST_PATH: &str = "/api/get30DaysReleves";
pub const SAVE_PATH: &str = "/api/saveReleve";

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidPayload(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Gateway talking to a releves server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl RemoteGateway for HttpGateway {
    async fn create_or_update_entry(&self, entry: &Entry) -> GatewayResult<SaveResponse> {
        let form = ServerEntry::from_entry(entry).form_fields();
        tracing::debug!(id = entry.id, "POST {SAVE_PATH}");

        let response = self
            .client
            .post(self.url(SAVE_PATH))
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        response.json::<SaveEnvelope>().await?.into_response()
    }

    async fn list_recent_entries(&self, window_days: u32) -> GatewayResult<Vec<ServerEntry>> {
        tracing::debug!(window_days, "GET {LIST_PATH}");

        let response = self
            .client
            .get(self.url(LIST_PATH))
            .header("Accept", "application/json")
            .query(&[("days", window_days)])
            .send()
            .await?;
        let response = ensure_success(response).await?;

        Ok(response.json::<ListEnvelope>().await?.entries)
    }

    async fn check_connectivity(&self) -> bool {
        match self.client.get(self.url(PROBE_PATH)).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::debug!("Connectivity probe failed: {error}");
                false
            }
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> GatewayResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        message: parse_api_error(status, &body),
    })
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return compact_text(&message);
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed
    }
}

fn normalize_base_url(raw: String) -> GatewayResult<String> {
    let url = normalize_text_option(Some(raw))
        .ok_or_else(|| GatewayError::Transport("server URL must not be empty".to_string()))?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(GatewayError::Transport(format!(
            "server URL must include http:// or https://: {url}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn base_url_is_normalized() {
        let gateway = HttpGateway::new(" http://localhost:5000/ ", Duration::from_secs(2)).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:5000");
        assert_eq!(gateway.url(SAVE_PATH), "http://localhost:5000/api/saveReleve");
    }

    #[test]
    fn invalid_base_urls_are_rejected() {
        assert!(HttpGateway::new("", Duration::from_secs(2)).is_err());
        assert!(HttpGateway::new("localhost:5000", Duration::from_secs(2)).is_err());
    }

    #[test]
    fn api_errors_prefer_structured_message() {
        assert_eq!(
            parse_api_error(StatusCode::BAD_REQUEST, r#"{"error":"bad form"}"#),
            "bad form"
        );
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "  boom  "),
            "boom"
        );
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, ""),
            "Bad Gateway"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_reported_offline() {
        // Port 9 (discard) is not expected to run an HTTP server locally.
        let gateway = HttpGateway::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        assert!(!gateway.check_connectivity().await);
    }
}
