// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Freshdesk v2 API.
//!
//! Provides [`FreshdeskClient`] which handles URL construction, basic
//! authentication, ticket pagination and transient error retry.

use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use deskpulse_config::FreshdeskConfig;
use deskpulse_core::{Conversation, DeskError, Ticket, TicketId, TicketQuery, TicketSource};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::ApiErrorResponse;

/// Delay before retrying a transient failure.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// HTTP client for Freshdesk API communication.
///
/// Built from an explicit [`FreshdeskConfig`]; nothing is read from the
/// process environment here.
#[derive(Debug, Clone)]
pub struct FreshdeskClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    per_page: u32,
    max_pages: u32,
    max_retries: u32,
    timeout: Duration,
    retry_delay: Duration,
}

impl FreshdeskClient {
    /// Creates a client for `https://{domain}/api/v2`.
    ///
    /// Fails with [`DeskError::Config`] when the domain or API key is missing.
    pub fn new(config: &FreshdeskConfig) -> Result<Self, DeskError> {
        let domain = config
            .domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| DeskError::Config("freshdesk.domain is not set".into()))?;
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DeskError::Config("freshdesk.api_key is not set".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DeskError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(std::sync::Arc::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: format!("https://{domain}/api/v2"),
            api_key: api_key.to_string(),
            per_page: config.per_page.max(1),
            max_pages: config.max_pages.max(1),
            max_retries: config.max_retries,
            timeout,
            retry_delay: RETRY_DELAY,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Builds the ticket listing URL for one page.
    fn tickets_url(&self, query: &TicketQuery, page: u32) -> String {
        let mut url = format!(
            "{}/tickets?per_page={}&page={page}",
            self.base_url, self.per_page
        );
        if let Some(since) = query.updated_since {
            url.push_str("&updated_since=");
            url.push_str(&since.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        url
    }

    /// GETs `url` and decodes the JSON body.
    ///
    /// On transient errors (429, 500, 502, 503), retries up to `max_retries`
    /// times after a fixed delay.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, endpoint: &str) -> Result<T, DeskError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, endpoint, "retrying request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            metrics::counter!("deskpulse_upstream_requests_total", "endpoint" => endpoint.to_string())
                .increment(1);

            let response = self
                .client
                .get(url)
                .basic_auth(&self.api_key, Some("X"))
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = response.status();
            debug!(status = %status, attempt, endpoint, "response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| self.transport_error(e))?;
                return serde_json::from_str(&body).map_err(|e| DeskError::Decode {
                    message: format!("failed to parse {endpoint} response: {e}"),
                    source: Some(std::sync::Arc::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let error = api_error(status, &body);

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, endpoint, "transient error, will retry");
                last_error = Some(error);
                continue;
            }

            // Non-transient error or exhausted retries.
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| DeskError::Upstream {
            message: format!("{endpoint} request failed after retries"),
            status: None,
            source: None,
        }))
    }

    fn transport_error(&self, e: reqwest::Error) -> DeskError {
        if e.is_timeout() {
            return DeskError::Timeout {
                duration: self.timeout,
            };
        }
        DeskError::Upstream {
            message: format!("HTTP request failed: {e}"),
            status: e.status().map(|s| s.as_u16()),
            source: Some(std::sync::Arc::new(e)),
        }
    }
}

#[async_trait]
impl TicketSource for FreshdeskClient {
    fn name(&self) -> &str {
        "freshdesk"
    }

    /// Walks pages until one comes back short or `max_pages` is reached.
    async fn fetch_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>, DeskError> {
        let mut tickets = Vec::new();

        for page in 1..=self.max_pages {
            let url = self.tickets_url(query, page);
            let batch: Vec<Ticket> = self.get_json(&url, "tickets").await?;
            let short = batch.len() < self.per_page as usize;
            debug!(page, count = batch.len(), "ticket page fetched");
            tickets.extend(batch);
            if short {
                return Ok(tickets);
            }
        }

        warn!(
            max_pages = self.max_pages,
            fetched = tickets.len(),
            "ticket listing truncated at page limit"
        );
        Ok(tickets)
    }

    async fn fetch_conversations(&self, ticket_id: TicketId) -> Result<Vec<Conversation>, DeskError> {
        let url = format!("{}/tickets/{ticket_id}/conversations", self.base_url);
        self.get_json(&url, "conversations").await
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

fn api_error(status: StatusCode, body: &str) -> DeskError {
    let detail = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|e| e.summary());
    let message = match detail {
        Some(detail) => format!("Freshdesk error {}: {detail}", status.as_u16()),
        None => format!("Freshdesk error: {}", status.as_u16()),
    };
    DeskError::Upstream {
        message,
        status: Some(status.as_u16()),
        source: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> FreshdeskConfig {
        FreshdeskConfig {
            domain: Some("acme.freshdesk.com".into()),
            api_key: Some("fd-key".into()),
            per_page: 2,
            max_pages: 3,
            timeout_secs: 5,
            max_retries: 1,
        }
    }

    fn test_client(base_url: &str) -> FreshdeskClient {
        FreshdeskClient::new(&config())
            .unwrap()
            .with_base_url(base_url.to_string())
            .with_retry_delay(Duration::from_millis(10))
    }

    fn ticket_json(id: u64, status: i64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "subject": format!("Ticket {id}"),
            "description": "long html body",
            "status": status,
            "priority": 1,
            "source": 2,
            "created_at": "2025-12-14T10:00:00Z",
            "updated_at": "2025-12-14T11:00:00Z",
            "due_by": null,
            "tags": ["billing"],
            "responder_id": null,
            "requester_id": 7,
            "group_id": 3
        })
    }

    #[test]
    fn new_requires_domain_and_key() {
        let mut missing_domain = config();
        missing_domain.domain = None;
        let err = FreshdeskClient::new(&missing_domain).unwrap_err();
        assert!(err.to_string().contains("freshdesk.domain"), "got: {err}");

        let mut missing_key = config();
        missing_key.api_key = Some(String::new());
        let err = FreshdeskClient::new(&missing_key).unwrap_err();
        assert!(err.to_string().contains("freshdesk.api_key"), "got: {err}");
    }

    #[test]
    fn base_url_uses_domain() {
        let client = FreshdeskClient::new(&config()).unwrap();
        assert_eq!(client.base_url(), "https://acme.freshdesk.com/api/v2");
    }

    #[test]
    fn tickets_url_carries_updated_since() {
        let client = FreshdeskClient::new(&config()).unwrap();
        let query = TicketQuery {
            updated_since: Some("2025-12-01T00:00:00Z".parse().unwrap()),
        };
        assert_eq!(
            client.tickets_url(&query, 2),
            "https://acme.freshdesk.com/api/v2/tickets?per_page=2&page=2&updated_since=2025-12-01T00:00:00Z"
        );
    }

    #[tokio::test]
    async fn fetch_tickets_walks_pages_until_short_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tickets"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([ticket_json(1, 2), ticket_json(2, 4)])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tickets"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([ticket_json(3, 6)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let tickets = client
            .fetch_tickets(&TicketQuery::default())
            .await
            .unwrap();

        let ids: Vec<u64> = tickets.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(tickets[0].tags, vec!["billing".to_string()]);
        assert_eq!(tickets[0].group_id, Some(3));
    }

    #[tokio::test]
    async fn fetch_tickets_stops_at_max_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tickets"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([ticket_json(1, 2), ticket_json(2, 2)])),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let tickets = client
            .fetch_tickets(&TicketQuery::default())
            .await
            .unwrap();
        assert_eq!(tickets.len(), 6);
    }

    #[tokio::test]
    async fn client_sends_basic_auth() {
        let server = MockServer::start().await;

        // base64("fd-key:X")
        Mock::given(method("GET"))
            .and(path("/tickets/42/conversations"))
            .and(header("authorization", "Basic ZmQta2V5Olg="))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": 9,
                    "body": "<p>Hi</p>",
                    "created_at": "2025-12-14T11:30:00Z",
                    "incoming": false,
                    "private": false,
                    "user_id": 5
                }
            ])))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let thread = client.fetch_conversations(TicketId(42)).await;
        let thread = thread.expect("headers should match");
        assert_eq!(thread.len(), 1);
        assert!(!thread[0].incoming);
        assert_eq!(thread[0].private, Some(false));
    }

    #[tokio::test]
    async fn retries_once_on_429() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tickets/1/conversations"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tickets/1/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let thread = client.fetch_conversations(TicketId(1)).await.unwrap();
        assert!(thread.is_empty());
    }

    #[tokio::test]
    async fn exhausts_retries_on_503() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tickets"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .fetch_tickets(&TicketQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("Freshdesk error: 503"), "got: {err}");
    }

    #[tokio::test]
    async fn does_not_retry_authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tickets"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "code": "invalid_credentials",
                "message": "You have to be logged in to perform this action."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .fetch_tickets(&TicketQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("invalid_credentials"), "got: {err}");
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tickets/5/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.fetch_conversations(TicketId(5)).await.unwrap_err();
        assert!(matches!(err, DeskError::Decode { .. }), "got: {err:?}");
    }
}
