//! Wire types for the provider GraphQL API
//!
//! Every field is optional and every list tolerates `null` entries: the
//! provider omits or nulls fields freely, and a single missing value must not
//! fail the decode of a whole response. Numeric values may arrive either as
//! JSON numbers or as numeric strings.

use crate::error::{HestiaError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Request body posted to the endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: Value,
}

impl GraphqlRequest {
    pub fn new(query: &str, variables: Value) -> Self {
        let variables = if variables.is_null() {
            Value::Object(Default::default())
        } else {
            variables
        };
        Self {
            query: query.to_string(),
            variables,
        }
    }

    /// Operation name declared by the query document, if any
    pub fn operation_name(&self) -> Option<&str> {
        operation_name(&self.query)
    }
}

/// `query Foo(...)` / `mutation foo {` -> `Foo` / `foo`
pub fn operation_name(query: &str) -> Option<&str> {
    let trimmed = query.trim_start();
    let rest = trimmed
        .strip_prefix("query")
        .or_else(|| trimmed.strip_prefix("mutation"))?;
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// One entry of the `errors` list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// Response envelope: `data` and/or `errors`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

impl GraphqlResponse {
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    pub fn error_messages(&self) -> Vec<&str> {
        self.errors
            .iter()
            .flatten()
            .map(|e| e.message.as_str())
            .collect()
    }

    /// True when there is nothing usable in `data`
    pub fn data_is_empty(&self) -> bool {
        self.data.as_ref().is_none_or(Value::is_null)
    }

    /// Decode `data` into a typed envelope; missing data yields the default
    pub fn decode<T: DeserializeOwned + Default>(&self) -> Result<T> {
        match &self.data {
            None | Some(Value::Null) => Ok(T::default()),
            Some(data) => serde_json::from_value(data.clone()).map_err(|e| {
                HestiaError::serialization(format!("Unexpected response shape: {}", e))
            }),
        }
    }
}

/// Drop null list entries
pub fn flatten<T>(items: Option<Vec<Option<T>>>) -> Vec<T> {
    items.into_iter().flatten().flatten().collect()
}

/// Borrowing counterpart of [`flatten`]
pub fn present<T>(items: &Option<Vec<Option<T>>>) -> impl Iterator<Item = &T> {
    items.iter().flatten().flatten()
}

/// Relay-style connection
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Connection<T> {
    #[serde(default)]
    pub edges: Option<Vec<Option<Edge<T>>>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Edge<T> {
    #[serde(default)]
    pub node: Option<T>,
}

impl<T> Connection<T> {
    pub fn into_nodes(self) -> Vec<T> {
        flatten(self.edges).into_iter().filter_map(|e| e.node).collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        present(&self.edges).filter_map(|e| e.node.as_ref())
    }
}

/// Either a single object or a list of them
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<Option<T>>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items.into_iter().flatten().collect(),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            Self::One(item) => Box::new(std::iter::once(item)),
            Self::Many(items) => Box::new(items.iter().flatten()),
        }
    }
}

pub(crate) mod lenient {
    use super::*;

    fn number(value: Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|v| v.is_finite())
    }

    pub fn f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
        Ok(number(Value::deserialize(d)?))
    }

    pub fn i64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
        Ok(number(Value::deserialize(d)?).map(|v| v.round() as i64))
    }

    pub fn bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => Some(b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    /// Strings, but numbers are accepted and printed
    pub fn string<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

// ---- login ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[serde(default)]
    pub obtain_kraken_token: Option<LoginPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub token: Option<String>,
}

// ---- accounts ----

#[derive(Debug, Default, Deserialize)]
pub struct AccountsData {
    #[serde(default)]
    pub viewer: Option<RawViewer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawViewer {
    #[serde(default)]
    pub accounts: Option<Vec<Option<RawAccountSummary>>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAccountSummary {
    #[serde(default, deserialize_with = "lenient::string")]
    pub number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ledgers: Option<Vec<Option<RawLedger>>>,
}

// ---- composite account query ----

#[derive(Debug, Default, Deserialize)]
pub struct AccountData {
    #[serde(default)]
    pub account: Option<RawAccount>,
    #[serde(default)]
    pub agreements: Option<Connection<RawAgreement>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ledgers: Option<Vec<Option<RawLedger>>>,
    #[serde(default)]
    pub credit_storage: Option<RawCreditStorage>,
    #[serde(default)]
    pub properties: Option<Vec<Option<RawProperty>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLedger {
    #[serde(default, deserialize_with = "lenient::string")]
    pub number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ledger_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub balance: Option<i64>,
    /// Credit-storage ledgers report `currentBalance` instead of `balance`
    #[serde(default, deserialize_with = "lenient::i64")]
    pub current_balance: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCreditStorage {
    #[serde(default)]
    pub ledger: Option<OneOrMany<RawLedger>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProperty {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub supply_points: Option<Connection<RawSupplyPoint>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSupplyPoint {
    #[serde(default, deserialize_with = "lenient::string")]
    pub external_identifier: Option<String>,
    #[serde(default)]
    pub meter_point: Option<RawMeterPoint>,
}

/// Union of the electricity and gas meter point fragments
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeterPoint {
    #[serde(default, rename = "__typename")]
    pub typename: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    #[serde(default)]
    pub distributor_status: Option<String>,
    #[serde(default)]
    pub powered_status: Option<String>,
    #[serde(default)]
    pub meter_kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub subscribed_max_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub is_teleoperable: Option<bool>,
    #[serde(default)]
    pub off_peak_label: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub provider_calendar_id: Option<String>,
    #[serde(default)]
    pub provider_calendar_name: Option<String>,
    #[serde(default)]
    pub gas_nature: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub annual_consumption: Option<f64>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub is_smart_meter: Option<bool>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub price_level: Option<String>,
    #[serde(default)]
    pub tariff_option: Option<String>,
    #[serde(default)]
    pub address: Option<RawAddress>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddress {
    #[serde(default)]
    pub full_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAgreement {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_to: Option<String>,
    #[serde(default)]
    pub supply_point: Option<RawSupplyPointRef>,
    #[serde(default)]
    pub charging_ledger: Option<RawLedger>,
    #[serde(default)]
    pub product: Option<RawProduct>,
    #[serde(default)]
    pub energy_supply_rate: Option<RawEnergySupplyRate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSupplyPointRef {
    #[serde(default, deserialize_with = "lenient::string")]
    pub external_identifier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnergySupplyRate {
    #[serde(default)]
    pub standing_charge: Option<RawStandingCharge>,
    #[serde(default)]
    pub consumption_rates: Option<Vec<Option<RawConsumptionRate>>>,
}

/// Prices are in cents
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStandingCharge {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub price_per_unit: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub price_per_unit_with_taxes: Option<f64>,
    /// DAY, MONTH or YEAR; absent means yearly
    #[serde(default)]
    pub period: Option<String>,
}

/// Prices are in cents per kWh
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConsumptionRate {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub price_per_unit: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub price_per_unit_with_taxes: Option<f64>,
    #[serde(default)]
    pub provider_calendar: Option<String>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub price_level: Option<i64>,
}

// ---- readings ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectricityReadingsData {
    #[serde(default)]
    pub electricity_reading: Option<Connection<RawElectricityReading>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElectricityReading {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub index_start_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub index_end_value: Option<f64>,
    #[serde(default)]
    pub calendar_temp_class: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub consumption: Option<f64>,
    #[serde(default)]
    pub consumption_reliability: Option<String>,
    #[serde(default)]
    pub status_processed: Option<String>,
    #[serde(default)]
    pub period_start_at: Option<String>,
    #[serde(default)]
    pub period_end_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasReadingsData {
    #[serde(default)]
    pub gas_reading: Option<Connection<RawGasReading>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGasReading {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub consumption: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub index_start_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub index_end_value: Option<f64>,
    #[serde(default)]
    pub period_start_at: Option<String>,
    #[serde(default)]
    pub period_end_at: Option<String>,
    #[serde(default)]
    pub reading_date: Option<String>,
    #[serde(default)]
    pub reading_type: Option<String>,
    #[serde(default)]
    pub status_processed: Option<String>,
}

// ---- payment requests ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestsData {
    #[serde(default)]
    pub payment_requests: Option<RawPaymentRequests>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaymentRequests {
    #[serde(default)]
    pub payment_request: Option<Connection<RawPaymentRequest>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaymentRequest {
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub total_amount: Option<i64>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub customer_amount: Option<i64>,
    #[serde(default)]
    pub expected_payment_date: Option<String>,
}
