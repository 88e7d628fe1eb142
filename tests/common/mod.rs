#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hestia::Config;
use hestia::kraken::types::operation_name;
use hestia::kraken::{GraphqlRequest, GraphqlResponse, GraphqlTransport, Headers, KrakenClient, QuerySet};
use hestia::logging::get_logger;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = Box<dyn Fn(&Value) -> Option<GraphqlResponse> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: String,
    pub variables: Value,
    pub headers: Headers,
}

impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory transport answering by operation name
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<Option<GraphqlResponse>>>>,
    responders: Mutex<HashMap<String, Responder>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<RecordedCall>>,
    closed: Mutex<u32>,
}

pub fn response(value: Value) -> GraphqlResponse {
    serde_json::from_value(value).unwrap()
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sticky response for every call of `operation`
    pub fn on(&self, operation: &str, value: Value) {
        let resp = response(value);
        self.respond_with(operation, move |_| Some(resp.clone()));
    }

    pub fn respond_with<F>(&self, operation: &str, f: F)
    where
        F: Fn(&Value) -> Option<GraphqlResponse> + Send + Sync + 'static,
    {
        self.responders
            .lock()
            .unwrap()
            .insert(operation.to_string(), Box::new(f));
    }

    /// One-shot response served before the sticky one
    pub fn push(&self, operation: &str, value: Option<Value>) {
        self.queued
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(value.map(response));
    }

    pub fn delay(&self, operation: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(operation.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn calls_of(&self, operation: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }

    pub fn close_count(&self) -> u32 {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl GraphqlTransport for ScriptedTransport {
    async fn execute(&self, request: &GraphqlRequest, headers: &Headers) -> Option<GraphqlResponse> {
        let operation = operation_name(&request.query).unwrap_or("anonymous").to_string();
        self.calls.lock().unwrap().push(RecordedCall {
            operation: operation.clone(),
            variables: request.variables.clone(),
            headers: headers.clone(),
        });

        let delay = self.delays.lock().unwrap().get(&operation).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(queued) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&operation)
            .and_then(|q| q.pop_front())
        {
            return queued;
        }
        self.responders
            .lock()
            .unwrap()
            .get(&operation)
            .and_then(|f| f(&request.variables))
    }

    async fn close(&self) {
        *self.closed.lock().unwrap() += 1;
    }
}

pub const LOGIN: &str = "obtainKrakenToken";
pub const ACCOUNTS: &str = "getAccounts";
pub const ACCOUNT_DATA: &str = "getAccountData";
pub const ELECTRICITY_READINGS: &str = "electricityReadings";
pub const GAS_READINGS: &str = "gasReadings";
pub const ELECTRICITY_INDEX: &str = "electricityIndex";
pub const PAYMENT_REQUEST: &str = "paymentRequest";

/// Unsigned JWT expiring `secs` from now
pub fn jwt(secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + secs;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp));
    format!("{}.{}.signature", header, payload)
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.account.email = "user@example.com".into();
    config.account.password = "hunter2".into();
    config.account.account_number = "A-1".into();
    config
}

pub fn client(transport: Arc<ScriptedTransport>) -> KrakenClient {
    KrakenClient::with_transport(
        &test_config(),
        transport,
        QuerySet::default(),
        get_logger("test"),
    )
}

pub fn login_ok(transport: &ScriptedTransport) {
    transport.on(
        LOGIN,
        json!({"data": {"obtainKrakenToken": {"token": jwt(3600)}}}),
    );
}

fn meter(id: &str, typename: &str, status: &str, powered: &str) -> Value {
    json!({"node": {"externalIdentifier": format!("SP-{}", id), "meterPoint": {
        "__typename": typename,
        "id": id,
        "distributorStatus": status,
        "poweredStatus": powered,
        "offPeakLabel": if typename == "ElectricityMeterPoint" { json!("HC (22H00-6H00)") } else { Value::Null },
    }}})
}

/// Composite account response with one electricity and one gas meter.
///
/// Supply points are linked by `SP-<meter id>` while ledgers name the meter point id.
pub fn account_data(gas_terminated: bool) -> Value {
    let (gas_status, gas_powered) = if gas_terminated {
        ("RESIL", "LIMI")
    } else {
        ("SERVC", "ALIM")
    };
    json!({"data": {
        "account": {
            "id": "1001",
            "number": "A-1",
            "status": "ACTIVE",
            "ledgers": [
                {"ledgerType": "FRA_ELECTRICITY_LEDGER", "name": "Électricité (12345)", "number": "ELEC-001", "balance": -2500},
                {"ledgerType": "FRA_GAS_LEDGER", "name": "Gaz (67890)", "number": "GAS-001", "balance": 1200}
            ],
            "creditStorage": {"ledger": {"ledgerType": "POT_LEDGER", "name": "Cagnotte", "number": "POT-001", "currentBalance": 3000}},
            "properties": [{
                "address": "1 rue de la Paix, 75002 Paris",
                "supplyPoints": {"edges": [
                    meter("12345", "ElectricityMeterPoint", "SERVC", "ALIM"),
                    meter("67890", "GasMeterPoint", gas_status, gas_powered)
                ]}
            }]
        },
        "agreements": {"edges": [
            {"node": {"id": "AG-E", "isActive": true, "supplyPoint": {"externalIdentifier": "SP-12345"},
                      "chargingLedger": {"ledgerType": "FRA_ELECTRICITY_LEDGER", "number": "ELEC-001"},
                      "product": {"displayName": "Heures Creuses"},
                      "energySupplyRate": {
                          "standingCharge": {"pricePerUnit": 50, "pricePerUnitWithTaxes": 60, "period": "MONTH"},
                          "consumptionRates": [{"pricePerUnitWithTaxes": 18}, {"pricePerUnitWithTaxes": 25}]
                      }}},
            {"node": {"id": "AG-G", "isActive": true, "supplyPoint": {"externalIdentifier": "SP-67890"},
                      "chargingLedger": {"ledgerType": "FRA_GAS_LEDGER", "number": "GAS-001"},
                      "energySupplyRate": {"consumptionRates": [{"priceLevel": 1, "pricePerUnit": 10}]}}}
        ]}
    }})
}

/// Login plus a full set of well-formed answers for every refresh query
pub fn happy_path(transport: &ScriptedTransport, gas_terminated: bool) {
    login_ok(transport);
    transport.on(ACCOUNT_DATA, account_data(gas_terminated));
    transport.on(
        ELECTRICITY_READINGS,
        json!({"data": {"electricityReading": {"edges": [
            {"node": {"calendarTempClass": "HP", "consumption": 3.5, "periodEndAt": "2024-03-02T00:00:00+01:00"}},
            {"node": {"calendarTempClass": "HC", "consumption": 2.0, "periodEndAt": "2024-03-02T00:00:00+01:00"}}
        ]}}}),
    );
    transport.on(
        GAS_READINGS,
        json!({"data": {"gasReading": {"edges": [
            {"node": {"consumption": 420.0, "indexEndValue": 1234.0, "readingDate": "2024-02-29"}}
        ]}}}),
    );
    transport.on(
        ELECTRICITY_INDEX,
        json!({"data": {"electricityReading": {"edges": [
            {"node": {"calendarTempClass": "HP", "indexStartValue": 100, "indexEndValue": 110, "periodEndAt": "2024-03-02T00:00:00+01:00"}},
            {"node": {"calendarTempClass": "HC", "indexStartValue": 50, "indexEndValue": 55, "periodEndAt": "2024-03-02T00:00:00+01:00"}}
        ]}}}),
    );
    transport.respond_with(PAYMENT_REQUEST, |vars| {
        let ledger = vars["ledgerNumber"].as_str().unwrap_or_default().to_string();
        Some(response(json!({"data": {"paymentRequests": {"paymentRequest": {"edges": [
            {"node": {"paymentStatus": "PAID", "totalAmount": 5000, "customerAmount": 4500,
                      "expectedPaymentDate": format!("2024-03-05 {}", ledger)}}
        ]}}}})))
    });
}
