#![no_main]
use hestia::assembler::build_base_snapshot;
use hestia::kraken::types::{AccountData, GraphqlResponse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some(now) = chrono::DateTime::from_timestamp(1_717_236_000, 0) else {
        return;
    };

    // Whole response envelope, then the bare data object
    if let Ok(response) = serde_json::from_slice::<GraphqlResponse>(data) {
        if let Ok(account) = response.decode::<AccountData>() {
            let _ = build_base_snapshot(&account, now);
        }
    }
    if let Ok(account) = serde_json::from_slice::<AccountData>(data) {
        if let Ok(snapshot) = build_base_snapshot(&account, now) {
            let _ = hestia::metrics::flatten(&snapshot, now.time());
        }
    }
});
