//! Webhook broadcaster
//!
//! Forwards every event as a JSON HTTP POST, for dashboards or paging
//! systems that cannot hold a WebSocket open.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::{BroadcastError, BroadcastEvent, BroadcastResult, Broadcaster};

/// Webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Endpoint receiving the POST
    pub url: String,

    /// Optional bearer token
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Extra headers sent with each request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries after the first attempt
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// First backoff delay; doubles on each retry
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1_000
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            headers: HashMap::new(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_ms = backoff_ms;
        self
    }

    /// Longest a delivery can take: every attempt hitting the request
    /// timeout plus every backoff delay
    pub fn retry_budget(&self) -> Duration {
        let attempts = u64::from(self.max_retries) + 1;
        let requests = self.timeout_ms.saturating_mul(attempts);
        let backoff = self
            .backoff_ms
            .saturating_mul(2_u64.saturating_pow(self.max_retries).saturating_sub(1));
        Duration::from_millis(requests.saturating_add(backoff))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Webhook URL cannot be empty".to_string());
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("Webhook URL must start with http:// or https://".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Broadcaster that POSTs each event to a URL.
///
/// Server errors and transport failures are retried with exponential
/// backoff; a 4xx answer ends the attempt immediately.
///
/// ```rust,ignore
/// let hook = WebhookBroadcaster::new(
///     WebhookConfig::new("https://ops.example.org/ventilators").with_auth_token("secret"),
/// )?;
/// hook.publish(BroadcastEvent::ventilator_update(records)).await?;
/// ```
pub struct WebhookBroadcaster {
    config: WebhookConfig,
    client: Client,
}

impl WebhookBroadcaster {
    pub fn new(config: WebhookConfig) -> BroadcastResult<Self> {
        config.validate().map_err(BroadcastError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { config, client })
    }

    /// Create a broadcaster with default settings
    pub fn from_url(url: impl Into<String>) -> BroadcastResult<Self> {
        Self::new(WebhookConfig::new(url))
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn send_with_retry(&self, event: &BroadcastEvent) -> BroadcastResult<()> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self
                    .config
                    .backoff_ms
                    .saturating_mul(2_u64.saturating_pow(attempt - 1));
                tokio::time::sleep(Duration::from_millis(delay)).await;
                tracing::debug!(
                    attempt = attempt + 1,
                    max = self.config.max_retries + 1,
                    "Retrying webhook delivery"
                );
            }

            let mut request = self.client.post(&self.config.url);
            if let Some(token) = &self.config.auth_token {
                request = request.bearer_auth(token);
            }
            for (key, value) in &self.config.headers {
                request = request.header(key, value);
            }

            match request.json(event).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(
                        url = %self.config.url,
                        status = %response.status(),
                        "Webhook delivered"
                    );
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unable to read response body".to_string());
                    last_error = Some(BroadcastError::Rejected {
                        status: status.as_u16(),
                        body,
                    });
                    if status.is_client_error() {
                        break;
                    }
                }
                Err(e) => last_error = Some(BroadcastError::Http(e)),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BroadcastError::InvalidConfig("no delivery attempt was made".to_string())
        }))
    }
}

#[async_trait]
impl Broadcaster for WebhookBroadcaster {
    fn name(&self) -> &str {
        "webhook"
    }

    fn delivery_budget(&self) -> Option<Duration> {
        Some(self.config.retry_budget())
    }

    async fn publish(&self, event: BroadcastEvent) -> BroadcastResult<()> {
        self.send_with_retry(&event).await.inspect_err(|e| {
            tracing::error!(url = %self.config.url, error = %e, "Failed to deliver webhook");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> BroadcastEvent {
        BroadcastEvent::ventilator_update(Vec::new())
    }

    #[test]
    fn test_config_validation() {
        assert!(WebhookConfig::new("https://example.com/hook").validate().is_ok());
        assert!(WebhookConfig::new("").validate().is_err());
        assert!(WebhookConfig::new("example.com/hook").validate().is_err());
        assert!(WebhookConfig::new("https://example.com")
            .with_timeout_ms(0)
            .validate()
            .is_err());
        assert!(WebhookBroadcaster::from_url("not-a-url").is_err());
    }

    #[test]
    fn test_retry_budget_covers_every_attempt() {
        // 4 attempts of 5s plus 1s + 2s + 4s of backoff
        let config = WebhookConfig::new("https://example.com/hook");
        assert_eq!(config.retry_budget(), Duration::from_millis(27_000));

        let config = config.with_retries(0, 1_000).with_timeout_ms(250);
        assert_eq!(config.retry_budget(), Duration::from_millis(250));

        let hook = WebhookBroadcaster::new(config).unwrap();
        assert_eq!(hook.delivery_budget(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_config_from_toml_defaults() {
        let config: WebhookConfig = toml::from_str(r#"url = "https://example.com/hook""#).unwrap();
        assert_eq!(config.timeout_ms, 5_000);
        assert_eq!(config.max_retries, 3);
        assert!(config.headers.is_empty());
    }

    #[tokio::test]
    async fn test_delivers_event_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("authorization", "Bearer s3cret"))
            .and(body_partial_json(serde_json::json!({"event": "ventilatorUpdate"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let hook = WebhookBroadcaster::new(
            WebhookConfig::new(format!("{}/hook", server.uri())).with_auth_token("s3cret"),
        )
        .unwrap();
        assert_eq!(hook.name(), "webhook");

        hook.publish(event()).await.unwrap();
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let hook =
            WebhookBroadcaster::new(WebhookConfig::new(server.uri()).with_retries(2, 1)).unwrap();

        let err = hook.publish(event()).await.unwrap_err();
        assert!(matches!(err, BroadcastError::Rejected { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad payload"))
            .expect(1)
            .mount(&server)
            .await;

        let hook =
            WebhookBroadcaster::new(WebhookConfig::new(server.uri()).with_retries(3, 1)).unwrap();

        match hook.publish(event()).await {
            Err(BroadcastError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad payload");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
