use crate::kraken::types::{ElectricityReadingsData, GasReadingsData, RawElectricityReading};
use crate::model::{CalendarClass, ElectricityIndex, ElectricityReading, GasReading, IndexValue};
use crate::normalize::tariffs::parse_instant;

fn electricity_reading(raw: &RawElectricityReading) -> ElectricityReading {
    ElectricityReading {
        period_start: raw.period_start_at.clone(),
        period_end: raw.period_end_at.clone(),
        calendar_class: CalendarClass::from_label(raw.calendar_temp_class.as_deref()),
        consumption_kwh: raw.consumption,
        index_start: raw.index_start_value,
        index_end: raw.index_end_value,
        reliability: raw.consumption_reliability.clone(),
        status_processed: raw.status_processed.clone(),
    }
}

pub fn extract_electricity_readings(data: &ElectricityReadingsData) -> Vec<ElectricityReading> {
    data.electricity_reading
        .iter()
        .flat_map(|c| c.nodes())
        .map(electricity_reading)
        .collect()
}

pub fn extract_gas_readings(data: &GasReadingsData) -> Vec<GasReading> {
    data.gas_reading
        .iter()
        .flat_map(|c| c.nodes())
        .map(|raw| GasReading {
            period_start: raw.period_start_at.clone(),
            period_end: raw.period_end_at.clone(),
            reading_date: raw.reading_date.clone(),
            reading_type: raw.reading_type.clone(),
            consumption_kwh: raw.consumption,
            index_start: raw.index_start_value,
            index_end: raw.index_end_value,
            status_processed: raw.status_processed.clone(),
        })
        .collect()
}

/// Latest counters per tariff class; on equal period ends the later entry wins
pub fn extract_electricity_index(data: &ElectricityReadingsData) -> ElectricityIndex {
    let mut index = ElectricityIndex::default();
    for reading in extract_electricity_readings(data) {
        let slot = match reading.calendar_class {
            CalendarClass::Peak => &mut index.peak,
            CalendarClass::OffPeak => &mut index.off_peak,
            CalendarClass::Base => &mut index.base,
            CalendarClass::Unknown => continue,
        };
        let end = reading.period_end.as_deref().and_then(parse_instant);
        let newer = match slot {
            Some(current) => end >= current.period_end.as_deref().and_then(parse_instant),
            None => true,
        };
        if newer {
            *slot = Some(IndexValue {
                start: reading.index_start,
                end: reading.index_end,
                period_end: reading.period_end,
            });
        }
    }
    index
}

/// Gas reading carrying the most recent index, by reading date else period end.
/// Undated readings rank oldest; on equal dates the later entry wins.
pub fn latest_gas_index(readings: &[GasReading]) -> Option<&GasReading> {
    readings
        .iter()
        .filter(|r| r.index_end.is_some())
        .max_by_key(|r| {
            r.reading_date
                .as_deref()
                .or(r.period_end.as_deref())
                .and_then(parse_instant)
        })
}

/// Sum of consumption by class, unclassified readings excluded
pub fn consumption_by_class(readings: &[ElectricityReading], class: CalendarClass) -> Option<f64> {
    let values: Vec<f64> = readings
        .iter()
        .filter(|r| r.calendar_class == class)
        .filter_map(|r| r.consumption_kwh)
        .collect();
    (!values.is_empty()).then(|| values.iter().sum())
}
