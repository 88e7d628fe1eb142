use crate::error::{HestiaError, Result};
use crate::kraken::auth::Authenticator;
use crate::kraken::token::SharedToken;
use crate::kraken::transport::{GraphqlTransport, Headers};
use crate::kraken::types::{GraphqlRequest, GraphqlResponse};
use crate::logging::StructuredLogger;
use serde_json::Value;
use std::sync::Arc;

/// Substrings of provider error messages that mean the token was refused
pub const AUTH_ERROR_KEYWORDS: [&str; 4] = ["authentication", "unauthorized", "token", "expired"];

/// Re-authentications allowed per call
const AUTH_RETRIES: u32 = 1;

/// Whether any embedded error reads like a rejected token
pub fn is_auth_error(response: &GraphqlResponse) -> bool {
    response.error_messages().iter().any(|message| {
        let lower = message.to_lowercase();
        AUTH_ERROR_KEYWORDS.iter().any(|k| lower.contains(k))
    })
}

/// Runs queries with a valid bearer token attached
pub struct AuthenticatedExecutor {
    transport: Arc<dyn GraphqlTransport>,
    authenticator: Arc<Authenticator>,
    token: SharedToken,
    auth_scheme: String,
    logger: StructuredLogger,
}

impl AuthenticatedExecutor {
    pub fn new(
        transport: Arc<dyn GraphqlTransport>,
        authenticator: Arc<Authenticator>,
        token: SharedToken,
        auth_scheme: String,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            transport,
            authenticator,
            token,
            auth_scheme,
            logger,
        }
    }

    async fn current_token(&self) -> Option<String> {
        let token = self.token.lock().await;
        token
            .token()
            .filter(|_| token.is_valid())
            .map(str::to_string)
    }

    /// A valid token, logging in when there is none.
    ///
    /// Another caller may clear the fresh token between our login and the
    /// read, so the login is tried once more before giving up.
    async fn bearer(&self) -> Result<String> {
        for _ in 0..=AUTH_RETRIES {
            if let Some(raw) = self.current_token().await {
                return Ok(raw);
            }
            if !self.authenticator.authenticate().await {
                return Err(HestiaError::auth("Unable to obtain a valid token"));
            }
        }
        self.current_token()
            .await
            .ok_or_else(|| HestiaError::auth("Token invalidated right after login"))
    }

    /// Execute with authentication.
    ///
    /// An embedded auth error on the first attempt clears the token, unless a
    /// concurrent caller already replaced it, and retries once; the second
    /// response is returned as is, errors included.
    /// Non-auth embedded errors are left to the caller.
    pub async fn execute_with_auth(&self, query: &str, variables: Value) -> Result<GraphqlResponse> {
        let request = GraphqlRequest::new(query, variables);
        let operation = request.operation_name().unwrap_or("anonymous").to_string();

        for attempt in 0..=AUTH_RETRIES {
            let bearer = self.bearer().await?;
            let headers: Headers = vec![(
                "Authorization".to_string(),
                format!("{} {}", self.auth_scheme, bearer),
            )];

            let Some(response) = self.transport.execute(&request, &headers).await else {
                return Err(HestiaError::empty_response(format!(
                    "No response for {}",
                    operation
                )));
            };

            if attempt < AUTH_RETRIES && is_auth_error(&response) {
                self.logger.warn(&format!(
                    "{} refused the token ({}), re-authenticating",
                    operation,
                    response.error_messages().join("; ")
                ));
                if !self.token.lock().await.clear_if_current(&bearer) {
                    self.logger
                        .debug("Token already renewed by a concurrent call");
                }
                continue;
            }

            return Ok(response);
        }

        Err(HestiaError::auth(format!(
            "{} still unauthenticated after retry",
            operation
        )))
    }
}
