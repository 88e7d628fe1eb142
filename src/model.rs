//! Normalized account data
//!
//! These types are what downstream consumers see. Every refresh builds a new
//! [`AccountDataSnapshot`] from scratch; nothing here is patched in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Distributor status of a terminated contract
pub const STATUS_TERMINATED: &str = "RESIL";
/// Distributor status of a meter in service
pub const STATUS_IN_SERVICE: &str = "SERVC";
/// Powered status of a meter limited after termination
pub const POWERED_LIMITED: &str = "LIMI";

/// Ledger kinds tracked per account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LedgerType {
    Electricity,
    Gas,
    Pot,
    Solar,
}

impl LedgerType {
    /// Map a provider ledger type label, `None` for kinds we do not track
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "FRA_ELECTRICITY_LEDGER" | "ELECTRICITY" => Some(Self::Electricity),
            "FRA_GAS_LEDGER" | "GAS" => Some(Self::Gas),
            "POT_LEDGER" | "FRA_POT_LEDGER" | "CREDIT" => Some(Self::Pot),
            "FRA_SOLAR_LEDGER" | "SOLAR_LEDGER" | "SOLAR" => Some(Self::Solar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electricity => "FRA_ELECTRICITY_LEDGER",
            Self::Gas => "FRA_GAS_LEDGER",
            Self::Pot => "POT_LEDGER",
            Self::Solar => "FRA_SOLAR_LEDGER",
        }
    }

    /// Short key used in metric names
    pub fn key(&self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::Gas => "gas",
            Self::Pot => "pot",
            Self::Solar => "solar",
        }
    }
}

/// A running balance held by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub ledger_type: LedgerType,
    pub name: String,
    pub number: String,
    pub balance_cents: i64,
}

impl Ledger {
    pub fn balance(&self) -> f64 {
        self.balance_cents as f64 / 100.0
    }
}

/// Utility served by a supply point or agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Utility {
    Electricity,
    Gas,
}

/// Electricity meter point (PRM)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityMeter {
    /// Meter point id, the PRM used by reading queries and ledger names
    pub prm_id: String,
    /// Supply point `externalIdentifier` when it differs from the meter point id
    pub external_id: Option<String>,
    pub distributor_status: Option<String>,
    pub powered_status: Option<String>,
    pub meter_kind: Option<String>,
    pub subscribed_max_power_kva: Option<f64>,
    pub is_teleoperable: Option<bool>,
    pub off_peak_label: Option<String>,
    pub provider_calendar_id: Option<String>,
    pub provider_calendar_name: Option<String>,
    pub address: Option<String>,
}

/// Gas meter point (PCE)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasMeter {
    pub pce_ref: String,
    pub external_id: Option<String>,
    pub distributor_status: Option<String>,
    pub powered_status: Option<String>,
    pub gas_nature: Option<String>,
    pub annual_consumption_kwh: Option<f64>,
    pub is_smart_meter: Option<bool>,
    pub price_level: Option<String>,
    pub tariff_option: Option<String>,
    pub address: Option<String>,
}

fn terminated(distributor: Option<&str>, powered: Option<&str>) -> bool {
    distributor == Some(STATUS_TERMINATED) && powered == Some(POWERED_LIMITED)
}

impl ElectricityMeter {
    /// Terminated means both RESIL and LIMI; either alone is still active
    pub fn is_terminated(&self) -> bool {
        terminated(
            self.distributor_status.as_deref(),
            self.powered_status.as_deref(),
        )
    }

    /// Human-readable contract status
    pub fn contract_status(&self) -> String {
        match self.distributor_status.as_deref() {
            Some(STATUS_IN_SERVICE) => "In service".to_string(),
            Some(STATUS_TERMINATED) => "Terminated".to_string(),
            Some(other) => other.to_string(),
            None => "Unknown".to_string(),
        }
    }
}

impl GasMeter {
    pub fn is_terminated(&self) -> bool {
        terminated(
            self.distributor_status.as_deref(),
            self.powered_status.as_deref(),
        )
    }

    pub fn contract_status(&self) -> String {
        match self.powered_status.as_deref() {
            Some("non_coupe") => "In service".to_string(),
            Some("coupe") => "Cut off".to_string(),
            Some(other) => other.to_string(),
            None => "Unknown".to_string(),
        }
    }
}

/// Supply points split by utility
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplyPoints {
    pub electricity: Vec<ElectricityMeter>,
    pub gas: Vec<GasMeter>,
}

impl SupplyPoints {
    pub fn is_empty(&self) -> bool {
        self.electricity.is_empty() && self.gas.is_empty()
    }

    /// Drop terminated meters of both kinds
    pub fn without_terminated(self) -> Self {
        Self {
            electricity: self
                .electricity
                .into_iter()
                .filter(|m| !m.is_terminated())
                .collect(),
            gas: self.gas.into_iter().filter(|m| !m.is_terminated()).collect(),
        }
    }

    /// Every identifier a meter is known by, meter point ids and external ids alike
    pub fn identifiers(&self) -> Vec<&str> {
        let electricity = self
            .electricity
            .iter()
            .flat_map(|m| std::iter::once(m.prm_id.as_str()).chain(m.external_id.as_deref()));
        let gas = self
            .gas
            .iter()
            .flat_map(|m| std::iter::once(m.pce_ref.as_str()).chain(m.external_id.as_deref()));
        electricity.chain(gas).collect()
    }

    /// Utility and meter point id of the meter known by `identifier`
    pub fn resolve(&self, identifier: &str) -> Option<(Utility, &str)> {
        let known = |id: &str, external: &Option<String>| {
            id == identifier || external.as_deref() == Some(identifier)
        };
        if let Some(m) = self.electricity.iter().find(|m| known(&m.prm_id, &m.external_id)) {
            return Some((Utility::Electricity, m.prm_id.as_str()));
        }
        self.gas
            .iter()
            .find(|m| known(&m.pce_ref, &m.external_id))
            .map(|m| (Utility::Gas, m.pce_ref.as_str()))
    }
}

/// Tariff calendar class of an electricity reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CalendarClass {
    Peak,
    OffPeak,
    Base,
    Unknown,
}

impl CalendarClass {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_uppercase()).as_deref() {
            Some("HP") | Some("PEAK") => Self::Peak,
            Some("HC") | Some("OFF_PEAK") | Some("OFFPEAK") => Self::OffPeak,
            Some("BASE") | Some("HB") => Self::Base,
            _ => Self::Unknown,
        }
    }
}

/// One electricity measurement over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityReading {
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub calendar_class: CalendarClass,
    pub consumption_kwh: Option<f64>,
    pub index_start: Option<f64>,
    pub index_end: Option<f64>,
    pub reliability: Option<String>,
    pub status_processed: Option<String>,
}

/// One gas measurement over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasReading {
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub reading_date: Option<String>,
    pub reading_type: Option<String>,
    pub consumption_kwh: Option<f64>,
    pub index_start: Option<f64>,
    pub index_end: Option<f64>,
    pub status_processed: Option<String>,
}

/// Counter values of one tariff class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexValue {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub period_end: Option<String>,
}

/// Latest electricity counters split by tariff class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElectricityIndex {
    pub peak: Option<IndexValue>,
    pub off_peak: Option<IndexValue>,
    pub base: Option<IndexValue>,
}

impl ElectricityIndex {
    pub fn is_empty(&self) -> bool {
        self.peak.is_none() && self.off_peak.is_none() && self.base.is_none()
    }
}

/// A unit price in currency units, with and without taxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub price_excl_tax: Option<f64>,
    pub price_incl_tax: Option<f64>,
}

/// Consumption prices; either peak/off-peak or a single flat rate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRates {
    pub peak: Option<Rate>,
    pub off_peak: Option<Rate>,
    pub base: Option<Rate>,
}

/// Subscription plus consumption prices of one agreement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    /// Subscription price per year
    pub subscription: Option<Rate>,
    pub consumption: ConsumptionRates,
}

/// A pricing contract for one supply point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    pub id: String,
    pub utility: Option<Utility>,
    pub active: bool,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
    pub supply_point_id: Option<String>,
    pub ledger_number: Option<String>,
    pub product_name: Option<String>,
    pub tariff: Tariff,
}

/// Latest billing event of a ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub ledger_number: String,
    pub status: Option<String>,
    pub total_amount_cents: Option<i64>,
    pub customer_amount_cents: Option<i64>,
    pub expected_payment_date: Option<String>,
}

/// Account summary as returned by the accounts listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub number: String,
    pub status: Option<String>,
    pub ledgers: Vec<Ledger>,
}

/// Everything one refresh cycle produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountDataSnapshot {
    pub account_id: String,
    pub account_number: String,
    pub address: String,
    pub ledgers: BTreeMap<LedgerType, Ledger>,
    pub supply_points: SupplyPoints,
    pub agreements: Vec<Agreement>,
    pub prm_id: Option<String>,
    pub pce_ref: Option<String>,
    pub electricity_readings: Vec<ElectricityReading>,
    pub gas_readings: Vec<GasReading>,
    pub electricity_index: ElectricityIndex,
    /// Keyed by ledger number
    pub payment_requests: BTreeMap<String, PaymentRequest>,
}

impl AccountDataSnapshot {
    /// Active agreement serving a supply point
    pub fn agreement_for(&self, supply_point_id: &str) -> Option<&Agreement> {
        self.agreements
            .iter()
            .find(|a| a.active && a.supply_point_id.as_deref() == Some(supply_point_id))
    }

    /// Active agreement for a utility when none is linked to a meter
    pub fn agreement_for_utility(&self, utility: Utility) -> Option<&Agreement> {
        self.agreements
            .iter()
            .find(|a| a.active && a.utility == Some(utility))
    }

    pub fn payment_request_for(&self, ledger_type: LedgerType) -> Option<&PaymentRequest> {
        let ledger = self.ledgers.get(&ledger_type)?;
        self.payment_requests.get(&ledger.number)
    }
}
