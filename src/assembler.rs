//! One refresh cycle: composite account query, then enrichment
//!
//! The cycle fails only when the account itself cannot be fetched or lacks
//! an id or number. Readings, index and payment lookups are each allowed to
//! fail on their own; they are logged and left empty. Authentication
//! failures always abort so the host can ask for new credentials.

use crate::error::{HestiaError, Result};
use crate::kraken::KrakenClient;
use crate::kraken::queries::ReadingWindow;
use crate::kraken::types::{AccountData, RawProperty, present};
use crate::logging::StructuredLogger;
use crate::model::{AccountDataSnapshot, PaymentRequest};
use crate::normalize;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Normalize the composite account response, terminated meters removed.
///
/// Fails when the account id or number is missing.
pub fn build_base_snapshot(data: &AccountData, now: DateTime<Utc>) -> Result<AccountDataSnapshot> {
    let account = data
        .account
        .as_ref()
        .ok_or_else(|| HestiaError::api("Response has no account"))?;
    let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
    let account_id =
        non_empty(&account.id).ok_or_else(|| HestiaError::api("Account id missing"))?;
    let account_number =
        non_empty(&account.number).ok_or_else(|| HestiaError::api("Account number missing"))?;

    let properties: Vec<&RawProperty> = present(&account.properties).collect();
    let supply_points =
        normalize::extract_supply_points(properties.iter().copied()).without_terminated();
    let ledgers = normalize::extract_ledgers(account, &supply_points.identifiers());
    let agreements = data
        .agreements
        .as_ref()
        .map(|a| normalize::extract_agreements(a, &supply_points, now))
        .unwrap_or_default();

    Ok(AccountDataSnapshot {
        account_id,
        account_number,
        address: normalize::extract_address(properties.iter().copied()),
        ledgers,
        prm_id: supply_points.electricity.first().map(|m| m.prm_id.clone()),
        pce_ref: supply_points.gas.first().map(|m| m.pce_ref.clone()),
        supply_points,
        agreements,
        ..Default::default()
    })
}

/// Auth errors pass through; anything else becomes a cycle failure
fn into_cycle_error(account_number: &str, err: HestiaError) -> HestiaError {
    match err {
        HestiaError::Auth { .. } | HestiaError::Refresh { .. } => err,
        other => HestiaError::refresh(format!("account {}: {}", account_number, other)),
    }
}

pub struct AccountDataAssembler<'a> {
    client: &'a KrakenClient,
    logger: StructuredLogger,
}

impl<'a> AccountDataAssembler<'a> {
    pub fn new(client: &'a KrakenClient, logger: StructuredLogger) -> Self {
        Self {
            client,
            logger: logger.for_component("assembler"),
        }
    }

    /// Run a full cycle; `today` anchors the reading windows
    pub async fn refresh(
        &self,
        account_number: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<AccountDataSnapshot> {
        match self.run(account_number, today, now).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                self.logger.error(&format!("Refresh failed: {}", e));
                Err(into_cycle_error(account_number, e))
            }
        }
    }

    /// Swallow a failed enrichment step unless it is an auth failure
    fn recover<T: Default>(&self, what: &str, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if e.requires_reauth() => Err(e),
            Err(e) => {
                self.logger.warn(&format!("{} unavailable: {}", what, e));
                Ok(T::default())
            }
        }
    }

    async fn payment_requests(
        &self,
        ledger_numbers: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, PaymentRequest>> {
        let mut found = BTreeMap::new();
        for number in ledger_numbers {
            match self.client.fetch_payment_request(number).await {
                Ok(Some(request)) => {
                    found.insert(number.clone(), request);
                }
                Ok(None) => self
                    .logger
                    .debug(&format!("No payment request for ledger {}", number)),
                Err(e) if e.requires_reauth() => return Err(e),
                Err(e) => self.logger.warn(&format!(
                    "Payment request for ledger {} unavailable: {}",
                    number, e
                )),
            }
        }
        Ok(found)
    }

    async fn run(
        &self,
        account_number: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<AccountDataSnapshot> {
        self.logger.debug("Fetching account data");
        let data = self.client.fetch_account_data(account_number).await?;
        let mut snapshot = build_base_snapshot(&data, now)?;

        let client = self.client;
        let account = snapshot.account_number.clone();
        let prm_id = snapshot.prm_id.clone();
        let pce_ref = snapshot.pce_ref.clone();
        let ledger_numbers: BTreeSet<String> = snapshot
            .ledgers
            .values()
            .map(|l| l.number.clone())
            .filter(|n| !n.is_empty())
            .collect();
        let electricity_window = ReadingWindow::electricity(today);
        let gas_window = ReadingWindow::gas(today);

        let electricity_readings = async {
            match prm_id.as_deref() {
                Some(prm) => self.recover(
                    "Electricity readings",
                    client
                        .fetch_electricity_readings(&account, prm, &electricity_window)
                        .await,
                ),
                None => Ok(Vec::new()),
            }
        };
        let gas_readings = async {
            match pce_ref.as_deref() {
                Some(pce) => self.recover(
                    "Gas readings",
                    client.fetch_gas_readings(&account, pce, &gas_window).await,
                ),
                None => Ok(Vec::new()),
            }
        };
        let electricity_index = async {
            match prm_id.as_deref() {
                Some(prm) => self.recover(
                    "Electricity index",
                    client.fetch_electricity_index(&account, prm).await,
                ),
                None => Ok(Default::default()),
            }
        };

        let (electricity_readings, gas_readings, electricity_index, payment_requests) = tokio::join!(
            electricity_readings,
            gas_readings,
            electricity_index,
            self.payment_requests(&ledger_numbers)
        );

        snapshot.electricity_readings = electricity_readings?;
        snapshot.gas_readings = gas_readings?;
        snapshot.electricity_index = electricity_index?;
        snapshot.payment_requests = payment_requests?;

        self.logger.info(&format!(
            "Refreshed: {} electricity / {} gas meter(s), {} ledger(s), {} payment request(s)",
            snapshot.supply_points.electricity.len(),
            snapshot.supply_points.gas.len(),
            snapshot.ledgers.len(),
            snapshot.payment_requests.len()
        ));
        Ok(snapshot)
    }
}
