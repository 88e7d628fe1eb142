//! Raw provider data to the internal schema
//!
//! Everything here is pure and total: malformed or missing input degrades to
//! empty collections and absent values, never to an error.

pub mod ledgers;
pub mod payments;
pub mod readings;
pub mod supply_points;
pub mod tariffs;

pub use ledgers::{extract_ledgers, meter_id_in_name, summarize_accounts};
pub use payments::extract_payment_request;
pub use readings::{
    consumption_by_class, extract_electricity_index, extract_electricity_readings,
    extract_gas_readings, latest_gas_index,
};
pub use supply_points::{extract_address, extract_supply_points};
pub use tariffs::{extract_agreements, extract_tariffs};
