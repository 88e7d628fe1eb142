#![no_main]
use hestia::offpeak::OffPeakSchedule;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let label = String::from_utf8_lossy(data);
    let schedule = OffPeakSchedule::parse(&label);
    let _ = schedule.total_hours();
    if let Some(noon) = chrono::NaiveTime::from_hms_opt(12, 0, 0) {
        let _ = schedule.is_off_peak(noon);
    }
});
