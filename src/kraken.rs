//! Octopus Energy France (Kraken) GraphQL client
//!
//! Layers, bottom up: [`transport`] posts one request with bounded retries,
//! [`token`] holds the bearer token, [`auth`] logs in under the token lock,
//! [`executor`] attaches the token and recovers once from a refused token,
//! and [`client`] exposes the calls the host needs.

pub mod auth;
pub mod client;
pub mod executor;
pub mod queries;
pub mod token;
pub mod transport;
pub mod types;

pub use auth::{Authenticator, Credentials};
pub use client::{KrakenClient, resolve_account_number};
pub use executor::AuthenticatedExecutor;
pub use queries::{QuerySet, ReadingFrequency, ReadingWindow};
pub use token::{SharedToken, TokenManager};
pub use transport::{GraphqlTransport, Headers, HttpTransport};
pub use types::{GraphqlError, GraphqlRequest, GraphqlResponse};
