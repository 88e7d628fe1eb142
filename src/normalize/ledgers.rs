use crate::kraken::types::{AccountsData, RawAccount, RawLedger, present};
use crate::model::{AccountSummary, Ledger, LedgerType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static METER_IN_NAME: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\((\d+)\)").ok());

/// Meter identifier embedded in a ledger name, e.g. `Electricity (12345)`
pub fn meter_id_in_name(name: &str) -> Option<&str> {
    METER_IN_NAME
        .as_ref()?
        .captures(name)?
        .get(1)
        .map(|m| m.as_str())
}

/// Typed ledger, `None` for ledger kinds not tracked
pub fn to_ledger(raw: &RawLedger) -> Option<Ledger> {
    let ledger_type = LedgerType::from_label(raw.ledger_type.as_deref()?)?;
    Some(Ledger {
        ledger_type,
        name: raw.name.clone().unwrap_or_default(),
        number: raw.number.clone().unwrap_or_default(),
        balance_cents: raw.balance.or(raw.current_balance).unwrap_or(0),
    })
}

/// One ledger per type.
///
/// Primary ledgers come first and the first of a type wins; credit storage
/// only fills types still missing. A ledger naming a meter that is not in
/// `active_meter_ids` is dropped.
pub fn extract_ledgers(
    account: &RawAccount,
    active_meter_ids: &[&str],
) -> BTreeMap<LedgerType, Ledger> {
    let primary = present(&account.ledgers);
    let credit = account
        .credit_storage
        .iter()
        .filter_map(|c| c.ledger.as_ref())
        .flat_map(|l| l.iter());

    let mut ledgers = BTreeMap::new();
    for ledger in primary.chain(credit).filter_map(to_ledger) {
        let serves_active_meter = match meter_id_in_name(&ledger.name) {
            Some(id) => active_meter_ids.contains(&id),
            None => true,
        };
        if serves_active_meter {
            ledgers.entry(ledger.ledger_type).or_insert(ledger);
        }
    }
    ledgers
}

/// Accounts of the logged-in user; entries without a number are skipped
pub fn summarize_accounts(data: &AccountsData) -> Vec<AccountSummary> {
    let Some(viewer) = data.viewer.as_ref() else {
        return Vec::new();
    };
    present(&viewer.accounts)
        .filter_map(|account| {
            let number = account.number.clone().filter(|n| !n.trim().is_empty())?;
            Some(AccountSummary {
                number,
                status: account.status.clone(),
                ledgers: present(&account.ledgers).filter_map(to_ledger).collect(),
            })
        })
        .collect()
}
