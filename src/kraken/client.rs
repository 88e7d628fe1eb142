use crate::assembler::AccountDataAssembler;
use crate::config::Config;
use crate::error::{HestiaError, Result};
use crate::kraken::auth::{Authenticator, Credentials};
use crate::kraken::executor::AuthenticatedExecutor;
use crate::kraken::queries::{QuerySet, ReadingWindow};
use crate::kraken::token::{SharedToken, TokenManager};
use crate::kraken::transport::{GraphqlTransport, HttpTransport};
use crate::kraken::types::{
    AccountData, AccountsData, ElectricityReadingsData, GasReadingsData, PaymentRequestsData,
};
use crate::logging::{StructuredLogger, get_logger};
use crate::model::{
    AccountDataSnapshot, AccountSummary, ElectricityIndex, ElectricityReading, GasReading,
    PaymentRequest,
};
use crate::normalize;
use chrono::Utc;
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;

/// Provider API client for one login
pub struct KrakenClient {
    transport: Arc<dyn GraphqlTransport>,
    token: SharedToken,
    authenticator: Arc<Authenticator>,
    executor: AuthenticatedExecutor,
    queries: QuerySet,
    timezone: Tz,
    logger: StructuredLogger,
}

impl KrakenClient {
    /// Client talking HTTP to the configured endpoint
    pub fn new(config: &Config) -> Self {
        let logger = get_logger("kraken");
        let transport = Arc::new(HttpTransport::new(
            &config.api,
            logger.for_component("transport"),
        ));
        Self::with_transport(config, transport, QuerySet::default(), logger)
    }

    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn GraphqlTransport>,
        queries: QuerySet,
        logger: StructuredLogger,
    ) -> Self {
        let token =
            TokenManager::from_config(&config.api, logger.for_component("token")).shared();
        let authenticator = Arc::new(Authenticator::new(
            transport.clone(),
            token.clone(),
            Credentials {
                email: config.account.email.clone(),
                password: config.account.password.clone(),
            },
            queries.login.clone(),
            config.api.login_timeout(),
            logger.for_component("auth"),
        ));
        let executor = AuthenticatedExecutor::new(
            transport.clone(),
            authenticator.clone(),
            token.clone(),
            config.api.auth_scheme.clone(),
            logger.for_component("executor"),
        );

        Self {
            transport,
            token,
            authenticator,
            executor,
            queries,
            timezone: config.tz(),
            logger,
        }
    }

    pub fn token(&self) -> &SharedToken {
        &self.token
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    pub async fn authenticate(&self) -> bool {
        self.authenticator.authenticate().await
    }

    /// Accounts visible to the login
    pub async fn get_accounts(&self) -> Result<Vec<AccountSummary>> {
        let data: AccountsData = self.query(&self.queries.accounts, json!({})).await?;
        let accounts = normalize::summarize_accounts(&data);
        self.logger
            .debug(&format!("Found {} account(s)", accounts.len()));
        Ok(accounts)
    }

    /// Build a fresh snapshot of one account.
    ///
    /// Authentication failures come back as [`HestiaError::Auth`]; anything
    /// else that fails the cycle comes back as [`HestiaError::Refresh`].
    pub async fn refresh(&self, account_number: &str) -> Result<AccountDataSnapshot> {
        let now = Utc::now();
        let today = now.with_timezone(&self.timezone).date_naive();
        AccountDataAssembler::new(self, self.logger.with_account(account_number))
            .refresh(account_number, today, now)
            .await
    }

    /// Release the HTTP session
    pub async fn close(&self) {
        self.transport.close().await;
    }

    async fn query<T: DeserializeOwned + Default>(&self, query: &str, variables: Value) -> Result<T> {
        let response = self.executor.execute_with_auth(query, variables).await?;
        if response.has_errors() {
            let messages = response.error_messages().join("; ");
            if response.data_is_empty() {
                return Err(HestiaError::api(messages));
            }
            self.logger
                .warn(&format!("Partial data returned: {}", messages));
        }
        response.decode()
    }

    pub async fn fetch_account_data(&self, account_number: &str) -> Result<AccountData> {
        self.query(
            &self.queries.account_data,
            json!({ "accountNumber": account_number }),
        )
        .await
    }

    pub async fn fetch_electricity_readings(
        &self,
        account_number: &str,
        prm_id: &str,
        window: &ReadingWindow,
    ) -> Result<Vec<ElectricityReading>> {
        let data: ElectricityReadingsData = self
            .query(
                &self.queries.electricity_readings,
                json!({
                    "accountNumber": account_number,
                    "prmId": prm_id,
                    "dateFrom": window.date_from(),
                    "dateTo": window.date_to(),
                    "frequency": window.frequency.as_str(),
                }),
            )
            .await?;
        Ok(normalize::extract_electricity_readings(&data))
    }

    pub async fn fetch_gas_readings(
        &self,
        account_number: &str,
        pce_ref: &str,
        window: &ReadingWindow,
    ) -> Result<Vec<GasReading>> {
        let data: GasReadingsData = self
            .query(
                &self.queries.gas_readings,
                json!({
                    "accountNumber": account_number,
                    "pceRef": pce_ref,
                    "dateFrom": window.date_from(),
                    "dateTo": window.date_to(),
                    "frequency": window.frequency.as_str(),
                }),
            )
            .await?;
        Ok(normalize::extract_gas_readings(&data))
    }

    pub async fn fetch_electricity_index(
        &self,
        account_number: &str,
        prm_id: &str,
    ) -> Result<ElectricityIndex> {
        let data: ElectricityReadingsData = self
            .query(
                &self.queries.electricity_index,
                json!({ "accountNumber": account_number, "prmId": prm_id }),
            )
            .await?;
        Ok(normalize::extract_electricity_index(&data))
    }

    pub async fn fetch_payment_request(&self, ledger_number: &str) -> Result<Option<PaymentRequest>> {
        let data: PaymentRequestsData = self
            .query(
                &self.queries.payment_request,
                json!({ "ledgerNumber": ledger_number }),
            )
            .await?;
        Ok(normalize::extract_payment_request(ledger_number, &data))
    }
}

/// Configured account when the login can see it, else the first one
pub fn resolve_account_number(accounts: &[AccountSummary], configured: &str) -> Option<String> {
    let configured = configured.trim();
    if !configured.is_empty() && accounts.iter().any(|a| a.number == configured) {
        return Some(configured.to_string());
    }
    accounts.first().map(|a| a.number.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(number: &str) -> AccountSummary {
        AccountSummary {
            number: number.to_string(),
            status: None,
            ledgers: Vec::new(),
        }
    }

    #[test]
    fn account_resolution() {
        let accounts = vec![summary("A-1"), summary("A-2")];
        assert_eq!(resolve_account_number(&accounts, "A-2").as_deref(), Some("A-2"));
        assert_eq!(resolve_account_number(&accounts, "").as_deref(), Some("A-1"));
        assert_eq!(resolve_account_number(&accounts, "A-9").as_deref(), Some("A-1"));
        assert_eq!(resolve_account_number(&[], "A-1"), None);
    }
}
