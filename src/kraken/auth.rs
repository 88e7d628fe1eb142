use crate::kraken::token::SharedToken;
use crate::kraken::transport::{GraphqlTransport, Headers};
use crate::kraken::types::{GraphqlRequest, LoginData};
use crate::logging::StructuredLogger;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Credentials used by the login mutation
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Runs the login mutation and stores the resulting token
pub struct Authenticator {
    transport: Arc<dyn GraphqlTransport>,
    token: SharedToken,
    credentials: Credentials,
    login_query: String,
    login_timeout: Duration,
    logger: StructuredLogger,
}

impl Authenticator {
    pub fn new(
        transport: Arc<dyn GraphqlTransport>,
        token: SharedToken,
        credentials: Credentials,
        login_query: String,
        login_timeout: Duration,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            transport,
            token,
            credentials,
            login_query,
            login_timeout,
            logger,
        }
    }

    /// Ensure a valid token is held, logging in if needed.
    ///
    /// The token lock is held for the whole flow, so concurrent callers
    /// observe the outcome of a single login. Never fails: any problem is
    /// logged and reported as `false`.
    pub async fn authenticate(&self) -> bool {
        let mut token = self.token.lock().await;
        if token.is_valid() {
            return true;
        }

        let request = GraphqlRequest::new(
            &self.login_query,
            json!({
                "input": {
                    "email": self.credentials.email,
                    "password": self.credentials.password,
                }
            }),
        );
        let no_auth = Headers::new();

        self.logger.debug("Logging in");
        let response = match tokio::time::timeout(
            self.login_timeout,
            self.transport.execute(&request, &no_auth),
        )
        .await
        {
            Ok(Some(response)) => response,
            Ok(None) => {
                self.logger.error("Login request failed");
                return false;
            }
            Err(_) => {
                self.logger.error(&format!(
                    "Login timed out after {}s",
                    self.login_timeout.as_secs()
                ));
                return false;
            }
        };

        if response.has_errors() {
            for message in response.error_messages() {
                self.logger.error(&format!("Login rejected: {}", message));
            }
            return false;
        }

        let raw = match response.decode::<LoginData>() {
            Ok(data) => data
                .obtain_kraken_token
                .and_then(|payload| payload.token)
                .filter(|t| !t.trim().is_empty()),
            Err(e) => {
                self.logger.error(&format!("Login response unreadable: {}", e));
                return false;
            }
        };

        match raw {
            Some(raw) => {
                token.set_token(&raw);
                self.logger.info("Authenticated");
                true
            }
            None => {
                self.logger.error("Login response carried no token");
                false
            }
        }
    }
}
