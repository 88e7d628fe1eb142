//! # Hestia - Octopus Energy France account data adapter
//!
//! Authenticates against the provider's Kraken GraphQL API, fetches
//! account, meter and billing data on demand and reshapes it into a stable
//! snapshot a home-automation host can display without poking at raw
//! provider JSON.
//!
//! ## Features
//!
//! - **Token lifecycle**: JWT expiry decoding with a safety margin, one login
//!   per invalidation even under concurrent callers
//! - **Bounded retries**: linear backoff on transport failures, a single
//!   re-authentication on a refused token
//! - **Typed decoding**: lenient wire types, pure normalization into the
//!   internal model
//! - **Presentation helpers**: off-peak schedules and flattened metrics
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `kraken`: Transport, token, authentication and the client facade
//! - `normalize`: Raw provider data to the internal model
//! - `model`: The normalized schema and `AccountDataSnapshot`
//! - `assembler`: One refresh cycle
//! - `offpeak`: Off-peak label parsing
//! - `metrics`: Snapshot flattening for presentation

pub mod assembler;
pub mod config;
pub mod error;
pub mod kraken;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod offpeak;

// Re-export commonly used types
pub use config::Config;
pub use error::{HestiaError, Result};
pub use kraken::KrakenClient;
pub use model::AccountDataSnapshot;
