use crate::kraken::types::{
    Connection, RawAgreement, RawConsumptionRate, RawEnergySupplyRate, RawStandingCharge, present,
};
use crate::model::{Agreement, ConsumptionRates, LedgerType, Rate, SupplyPoints, Tariff, Utility};
use chrono::{DateTime, NaiveDate, Utc};

fn cents(value: Option<f64>) -> Option<f64> {
    value.map(|v| v / 100.0)
}

fn to_rate(price_excl_cents: Option<f64>, price_incl_cents: Option<f64>, factor: f64) -> Option<Rate> {
    if price_excl_cents.is_none() && price_incl_cents.is_none() {
        return None;
    }
    Some(Rate {
        price_excl_tax: cents(price_excl_cents.map(|p| p * factor)),
        price_incl_tax: cents(price_incl_cents.map(|p| p * factor)),
    })
}

/// Periods per year of a standing charge period label
fn periods_per_year(period: Option<&str>) -> f64 {
    match period.map(|p| p.trim().to_uppercase()).as_deref() {
        Some("DAY") | Some("DAILY") => 365.0,
        Some("MONTH") | Some("MONTHLY") => 12.0,
        _ => 1.0,
    }
}

/// Yearly subscription price
pub fn annual_subscription(charge: &RawStandingCharge) -> Option<Rate> {
    to_rate(
        charge.price_per_unit,
        charge.price_per_unit_with_taxes,
        periods_per_year(charge.period.as_deref()),
    )
}

fn consumption_rate(raw: &RawConsumptionRate) -> Option<Rate> {
    to_rate(raw.price_per_unit, raw.price_per_unit_with_taxes, 1.0)
}

fn sort_key(rate: &Rate) -> f64 {
    rate.price_incl_tax
        .or(rate.price_excl_tax)
        .unwrap_or(f64::NEG_INFINITY)
}

/// Subscription and consumption prices in currency units.
///
/// The provider does not say which consumption rate is peak: rates are
/// ranked by tax-included price, the highest is peak and the next one
/// off-peak. A single rate is a flat base rate. Gas agreements carry one
/// flat rate, price level 1 when levels are given.
pub fn extract_tariffs(rate: &RawEnergySupplyRate, utility: Option<Utility>) -> Tariff {
    let subscription = rate.standing_charge.as_ref().and_then(annual_subscription);
    let raw_rates: Vec<&RawConsumptionRate> = present(&rate.consumption_rates).collect();

    let consumption = if utility == Some(Utility::Gas) {
        let preferred = raw_rates
            .iter()
            .find(|r| r.price_level == Some(1))
            .or_else(|| raw_rates.first());
        ConsumptionRates {
            base: preferred.and_then(|r| consumption_rate(r)),
            ..Default::default()
        }
    } else {
        let mut rates: Vec<Rate> = raw_rates.iter().filter_map(|r| consumption_rate(r)).collect();
        rates.sort_by(|a, b| sort_key(b).total_cmp(&sort_key(a)));
        let mut ranked = rates.into_iter();
        match (ranked.next(), ranked.next()) {
            (Some(peak), Some(off_peak)) => ConsumptionRates {
                peak: Some(peak),
                off_peak: Some(off_peak),
                base: None,
            },
            (base, _) => ConsumptionRates {
                base,
                ..Default::default()
            },
        }
    };

    Tariff {
        subscription,
        consumption,
    }
}

/// RFC 3339 instant or plain date (midnight UTC)
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Validity window check for agreements without an explicit flag
pub fn within_window(valid_from: Option<&str>, valid_to: Option<&str>, now: DateTime<Utc>) -> bool {
    let started = valid_from
        .and_then(parse_instant)
        .is_none_or(|from| from <= now);
    let ended = valid_to.and_then(parse_instant).is_some_and(|to| to <= now);
    started && !ended
}

/// Agreements with their tariffs.
///
/// An agreement pointing at a supply point missing from `supply_points`
/// (terminated or unknown) is dropped; a matched one is keyed by meter point id. Unlinked agreements are kept and take
/// their utility from the charging ledger.
pub fn extract_agreements(
    agreements: &Connection<RawAgreement>,
    supply_points: &SupplyPoints,
    now: DateTime<Utc>,
) -> Vec<Agreement> {
    agreements
        .nodes()
        .filter_map(|raw| {
            let linked = raw
                .supply_point
                .as_ref()
                .and_then(|sp| sp.external_identifier.as_deref());

            let (utility, supply_point_id) = match linked {
                Some(id) => {
                    let (utility, meter_id) = supply_points.resolve(id)?;
                    (Some(utility), Some(meter_id.to_string()))
                }
                None => (
                    raw.charging_ledger
                        .as_ref()
                        .and_then(|l| l.ledger_type.as_deref())
                        .and_then(LedgerType::from_label)
                        .and_then(|t| match t {
                            LedgerType::Electricity => Some(Utility::Electricity),
                            LedgerType::Gas => Some(Utility::Gas),
                            _ => None,
                        }),
                    None,
                ),
            };

            let active = raw.is_active.unwrap_or_else(|| {
                within_window(raw.valid_from.as_deref(), raw.valid_to.as_deref(), now)
            });

            let tariff = raw
                .energy_supply_rate
                .as_ref()
                .map(|rate| extract_tariffs(rate, utility))
                .unwrap_or_default();

            Some(Agreement {
                id: raw.id.clone().unwrap_or_default(),
                utility,
                active,
                valid_from: raw.valid_from.clone(),
                valid_to: raw.valid_to.clone(),
                supply_point_id,
                ledger_number: raw.charging_ledger.as_ref().and_then(|l| l.number.clone()),
                product_name: raw
                    .product
                    .as_ref()
                    .and_then(|p| p.display_name.clone().or_else(|| p.code.clone())),
                tariff,
            })
        })
        .collect()
}
