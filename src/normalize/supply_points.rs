use crate::kraken::types::{RawMeterPoint, RawProperty, RawSupplyPoint};
use crate::model::{ElectricityMeter, GasMeter, SupplyPoints, Utility};

/// Utility of a meter point.
///
/// `__typename` decides when present. Otherwise gas-only fields mark gas and
/// electricity-only fields mark electricity; `distributorStatus` exists on
/// both so it only counts for electricity when no gas field is set.
pub fn classify(meter_point: &RawMeterPoint) -> Option<Utility> {
    match meter_point.typename.as_deref() {
        Some("ElectricityMeterPoint") => return Some(Utility::Electricity),
        Some("GasMeterPoint") => return Some(Utility::Gas),
        _ => {}
    }

    let gas = meter_point.gas_nature.is_some() || meter_point.annual_consumption.is_some();
    let electricity = meter_point.meter_kind.is_some()
        || (meter_point.distributor_status.is_some() && !gas);
    if electricity {
        Some(Utility::Electricity)
    } else if gas {
        Some(Utility::Gas)
    } else {
        None
    }
}

/// Meter point id first, `externalIdentifier` as fallback; the other one,
/// when distinct, is kept as the external id
fn identifiers(node: &RawSupplyPoint, meter_point: &RawMeterPoint) -> Option<(String, Option<String>)> {
    let non_empty = |v: &Option<String>| v.clone().filter(|id| !id.trim().is_empty());
    let meter_id = non_empty(&meter_point.id);
    let external = non_empty(&node.external_identifier);
    match (meter_id, external) {
        (Some(id), external) => {
            let external = external.filter(|e| *e != id);
            Some((id, external))
        }
        (None, Some(external)) => Some((external, None)),
        (None, None) => None,
    }
}

fn electricity(id: String, external_id: Option<String>, mp: &RawMeterPoint) -> ElectricityMeter {
    ElectricityMeter {
        prm_id: id,
        external_id,
        distributor_status: mp.distributor_status.clone(),
        powered_status: mp.powered_status.clone(),
        meter_kind: mp.meter_kind.clone(),
        subscribed_max_power_kva: mp.subscribed_max_power,
        is_teleoperable: mp.is_teleoperable,
        off_peak_label: mp.off_peak_label.clone(),
        provider_calendar_id: mp.provider_calendar_id.clone(),
        provider_calendar_name: mp.provider_calendar_name.clone(),
        address: mp.address.as_ref().and_then(|a| a.full_address.clone()),
    }
}

fn gas(id: String, external_id: Option<String>, mp: &RawMeterPoint) -> GasMeter {
    GasMeter {
        pce_ref: id,
        external_id,
        distributor_status: mp.distributor_status.clone(),
        powered_status: mp.powered_status.clone(),
        gas_nature: mp.gas_nature.clone(),
        annual_consumption_kwh: mp.annual_consumption,
        is_smart_meter: mp.is_smart_meter,
        price_level: mp.price_level.clone(),
        tariff_option: mp.tariff_option.clone(),
        address: mp.address.as_ref().and_then(|a| a.full_address.clone()),
    }
}

/// Walk properties -> supply points -> meter points, split by utility.
/// Terminated meters are kept; see [`SupplyPoints::without_terminated`].
pub fn extract_supply_points<'a>(
    properties: impl IntoIterator<Item = &'a RawProperty>,
) -> SupplyPoints {
    let mut points = SupplyPoints::default();
    let nodes = properties
        .into_iter()
        .filter_map(|p| p.supply_points.as_ref())
        .flat_map(|c| c.nodes());

    for node in nodes {
        let Some(mp) = node.meter_point.as_ref() else {
            continue;
        };
        let Some((id, external_id)) = identifiers(node, mp) else {
            continue;
        };
        match classify(mp) {
            Some(Utility::Electricity) => points.electricity.push(electricity(id, external_id, mp)),
            Some(Utility::Gas) => points.gas.push(gas(id, external_id, mp)),
            None => {}
        }
    }
    points
}

/// Address of the first property, empty when unknown
pub fn extract_address<'a>(properties: impl IntoIterator<Item = &'a RawProperty>) -> String {
    properties
        .into_iter()
        .next()
        .and_then(|p| p.address.as_deref())
        .map(|a| a.trim().to_string())
        .unwrap_or_default()
}
