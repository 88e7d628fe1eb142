use crate::config::ApiConfig;
use crate::error::{HestiaError, Result};
use crate::kraken::types::{GraphqlRequest, GraphqlResponse};
use crate::logging::StructuredLogger;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use tokio::sync::Mutex;

/// Extra request headers, e.g. `("Authorization", "JWT ...")`
pub type Headers = Vec<(String, String)>;

/// Posts one GraphQL request to the provider endpoint
///
/// Implementations never fail: every error ends in `None` after whatever
/// retrying the implementation does, with the reason logged.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, request: &GraphqlRequest, headers: &Headers)
    -> Option<GraphqlResponse>;

    /// Release pooled connections; the next request reopens them
    async fn close(&self) {}
}

/// reqwest transport with bounded, linearly backed-off retries
pub struct HttpTransport {
    endpoint: String,
    user_agent: String,
    request_timeout: Duration,
    max_attempts: u32,
    retry_base_delay: Duration,
    client: Mutex<Option<reqwest::Client>>,
    logger: StructuredLogger,
}

impl HttpTransport {
    pub fn new(api: &ApiConfig, logger: StructuredLogger) -> Self {
        Self {
            endpoint: api.endpoint.clone(),
            user_agent: api.user_agent.clone(),
            request_timeout: api.request_timeout(),
            max_attempts: api.max_attempts.max(1),
            retry_base_delay: api.retry_base_delay(),
            client: Mutex::new(None),
            logger,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Shared session, created on first use or after `close`
    async fn session(&self) -> Result<reqwest::Client> {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?;
        self.logger.debug("HTTP session opened");
        *guard = Some(client.clone());
        Ok(client)
    }

    async fn attempt(
        &self,
        client: &reqwest::Client,
        request: &GraphqlRequest,
        headers: &Headers,
    ) -> Result<GraphqlResponse> {
        let mut builder = client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.request_timeout);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder.json(request).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(HestiaError::network(format!("HTTP status {}", status)));
        }

        let body = resp.text().await?;
        serde_json::from_str::<GraphqlResponse>(&body)
            .map_err(|e| HestiaError::serialization(format!("Invalid JSON body: {}", e)))
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn execute(
        &self,
        request: &GraphqlRequest,
        headers: &Headers,
    ) -> Option<GraphqlResponse> {
        let operation = request.operation_name().unwrap_or("anonymous");
        let client = match self.session().await {
            Ok(client) => client,
            Err(e) => {
                self.logger
                    .error(&format!("Cannot open HTTP session: {}", e));
                return None;
            }
        };

        for attempt in 1..=self.max_attempts {
            match self.attempt(&client, request, headers).await {
                Ok(response) => return Some(response),
                Err(e) => self.logger.warn(&format!(
                    "{} attempt {}/{} failed: {}",
                    operation, attempt, self.max_attempts, e
                )),
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_base_delay * attempt).await;
            }
        }

        self.logger.error(&format!(
            "{} failed after {} attempts",
            operation, self.max_attempts
        ));
        None
    }

    async fn close(&self) {
        if self.client.lock().await.take().is_some() {
            self.logger.debug("HTTP session closed");
        }
    }
}
