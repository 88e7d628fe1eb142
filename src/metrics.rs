//! Flatten a snapshot into named metrics for the host's presentation layer

use crate::model::{
    AccountDataSnapshot, Agreement, CalendarClass, ElectricityMeter, GasMeter, Rate, Utility,
};
use crate::normalize::{consumption_by_class, latest_gas_index};
use crate::offpeak::OffPeakSchedule;
use chrono::NaiveTime;
use serde::Serialize;
use std::collections::BTreeMap;

pub const UNIT_ENERGY: &str = "kWh";
pub const UNIT_CURRENCY: &str = "EUR";
pub const UNIT_PRICE: &str = "EUR/kWh";
pub const UNIT_SUBSCRIPTION: &str = "EUR/year";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub value: MetricValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Metric {
    fn number(name: String, value: f64, unit: &'static str) -> Self {
        Self {
            name,
            value: MetricValue::Number(value),
            unit: Some(unit),
            attributes: BTreeMap::new(),
        }
    }

    fn text(name: String, value: String) -> Self {
        Self {
            name,
            value: MetricValue::Text(value),
            unit: None,
            attributes: BTreeMap::new(),
        }
    }

    fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    fn with_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }
}

fn price(rate: Option<&Rate>) -> Option<f64> {
    rate.and_then(|r| r.price_incl_tax.or(r.price_excl_tax))
}

fn agreement_of<'a>(
    snapshot: &'a AccountDataSnapshot,
    id: &str,
    utility: Utility,
) -> Option<&'a Agreement> {
    snapshot
        .agreement_for(id)
        .or_else(|| snapshot.agreement_for_utility(utility))
}

fn electricity_metrics(
    snapshot: &AccountDataSnapshot,
    meter: &ElectricityMeter,
    local_time: NaiveTime,
    out: &mut Vec<Metric>,
) {
    let prefix = format!("electricity_{}", meter.prm_id);
    let primary = snapshot.prm_id.as_deref() == Some(meter.prm_id.as_str());

    if primary {
        for (class, suffix) in [(CalendarClass::Peak, "hp"), (CalendarClass::OffPeak, "hc")] {
            if let Some(kwh) = consumption_by_class(&snapshot.electricity_readings, class) {
                out.push(Metric::number(
                    format!("{}_consumption_{}", prefix, suffix),
                    kwh,
                    UNIT_ENERGY,
                ));
            }
        }

        let index = &snapshot.electricity_index;
        for (value, suffix) in [(&index.peak, "hp"), (&index.off_peak, "hc"), (&index.base, "base")] {
            if let Some(v) = value {
                if let Some(end) = v.end {
                    out.push(
                        Metric::number(format!("{}_index_{}", prefix, suffix), end, UNIT_ENERGY)
                            .with_opt("index_start", v.start)
                            .with_opt("period_end", v.period_end.clone()),
                    );
                }
            }
        }
    }

    let agreement = agreement_of(snapshot, &meter.prm_id, Utility::Electricity);
    if let Some(agreement) = agreement {
        let rates = &agreement.tariff.consumption;
        for (rate, suffix) in [
            (rates.peak.as_ref(), "hp"),
            (rates.off_peak.as_ref(), "hc"),
            (rates.base.as_ref(), "base"),
        ] {
            if let Some(p) = price(rate) {
                out.push(Metric::number(
                    format!("{}_tarif_{}", prefix, suffix),
                    p,
                    UNIT_PRICE,
                ));
            }
        }
        if let Some(p) = price(agreement.tariff.subscription.as_ref()) {
            out.push(Metric::number(
                format!("{}_subscription", prefix),
                p,
                UNIT_SUBSCRIPTION,
            ));
        }
    }

    out.push(
        Metric::text(format!("{}_contract", prefix), meter.contract_status())
            .with_opt("meter_kind", meter.meter_kind.clone())
            .with_opt("subscribed_max_power_kva", meter.subscribed_max_power_kva)
            .with_opt("teleoperable", meter.is_teleoperable)
            .with_opt("off_peak_label", meter.off_peak_label.clone())
            .with_opt("product", agreement.and_then(|a| a.product_name.clone()))
            .with_opt("valid_from", agreement.and_then(|a| a.valid_from.clone())),
    );

    if let Some(label) = meter.off_peak_label.as_deref() {
        let schedule = OffPeakSchedule::parse(label);
        if !schedule.is_empty() {
            let mut metric = Metric {
                name: format!("{}_off_peak_active", prefix),
                value: MetricValue::Flag(schedule.is_off_peak(local_time)),
                unit: None,
                attributes: BTreeMap::new(),
            }
            .with("total_hours", schedule.total_hours())
            .with_opt("type", schedule.kind.clone());
            for (i, range) in schedule.ranges.iter().enumerate() {
                metric = metric.with(
                    &format!("range_{}", i + 1),
                    format!("{}-{}", range.start_label(), range.end_label()),
                );
            }
            out.push(metric);
        }
    }
}

fn gas_metrics(snapshot: &AccountDataSnapshot, meter: &GasMeter, out: &mut Vec<Metric>) {
    let prefix = format!("gas_{}", meter.pce_ref);

    if snapshot.pce_ref.as_deref() == Some(meter.pce_ref.as_str()) {
        let readings = &snapshot.gas_readings;
        let total: Vec<f64> = readings.iter().filter_map(|r| r.consumption_kwh).collect();
        if !total.is_empty() {
            out.push(Metric::number(
                format!("{}_consumption", prefix),
                total.iter().sum(),
                UNIT_ENERGY,
            ));
        }
        if let Some(latest) = latest_gas_index(readings) {
            if let Some(end) = latest.index_end {
                out.push(
                    Metric::number(format!("{}_index", prefix), end, UNIT_ENERGY)
                        .with_opt("reading_date", latest.reading_date.clone())
                        .with_opt("reading_type", latest.reading_type.clone()),
                );
            }
        }
    }

    let agreement = agreement_of(snapshot, &meter.pce_ref, Utility::Gas);
    if let Some(p) = agreement.and_then(|a| price(a.tariff.consumption.base.as_ref())) {
        out.push(Metric::number(format!("{}_tarif", prefix), p, UNIT_PRICE));
    }

    out.push(
        Metric::text(format!("{}_contract", prefix), meter.contract_status())
            .with_opt("gas_nature", meter.gas_nature.clone())
            .with_opt("annual_consumption_kwh", meter.annual_consumption_kwh)
            .with_opt("smart_meter", meter.is_smart_meter)
            .with_opt("price_level", meter.price_level.clone())
            .with_opt("tariff_option", meter.tariff_option.clone()),
    );
}

/// All metrics of a snapshot; `local_time` drives the off-peak flag
pub fn flatten(snapshot: &AccountDataSnapshot, local_time: NaiveTime) -> Vec<Metric> {
    let mut out = Vec::new();

    for meter in &snapshot.supply_points.electricity {
        electricity_metrics(snapshot, meter, local_time, &mut out);
    }
    for meter in &snapshot.supply_points.gas {
        gas_metrics(snapshot, meter, &mut out);
    }

    for (ledger_type, ledger) in &snapshot.ledgers {
        let prefix = format!("ledger_{}", ledger_type.key());
        out.push(
            Metric::number(format!("{}_balance", prefix), ledger.balance(), UNIT_CURRENCY)
                .with("ledger_number", &ledger.number)
                .with("name", &ledger.name),
        );

        if let Some(request) = snapshot.payment_requests.get(&ledger.number) {
            if let Some(amount) = request.customer_amount_cents {
                out.push(
                    Metric::number(
                        format!("{}_last_bill", prefix),
                        amount as f64 / 100.0,
                        UNIT_CURRENCY,
                    )
                    .with_opt("status", request.status.clone())
                    .with_opt(
                        "total_amount",
                        request.total_amount_cents.map(|c| c as f64 / 100.0),
                    )
                    .with_opt("expected_payment_date", request.expected_payment_date.clone()),
                );
            }
        }
    }

    out
}
