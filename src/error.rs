//! Error types and handling for Hestia
//!
//! This module defines the error types used throughout the crate. The host
//! platform only needs two questions answered about a failed refresh: does it
//! need fresh credentials ([`HestiaError::requires_reauth`]) or can it simply
//! retry on its next tick ([`HestiaError::is_transient`]).

use thiserror::Error;

/// Result type alias for Hestia operations
pub type Result<T> = std::result::Result<T, HestiaError>;

/// Main error type for Hestia
#[derive(Debug, Error)]
pub enum HestiaError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Login rejected or no valid token obtainable
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Transport gave up without a response body
    #[error("Empty response: {message}")]
    EmptyResponse { message: String },

    /// Provider-level errors embedded in a successful response
    #[error("API error: {message}")]
    Api { message: String },

    /// A refresh cycle failed as a whole
    #[error("Refresh failed: {message}")]
    Refresh { message: String },
}

impl HestiaError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        HestiaError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        HestiaError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        HestiaError::Io {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        HestiaError::Serialization {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        HestiaError::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        HestiaError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        HestiaError::Auth {
            message: message.into(),
        }
    }

    /// Create a new empty-response error
    pub fn empty_response<S: Into<String>>(message: S) -> Self {
        HestiaError::EmptyResponse {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        HestiaError::Api {
            message: message.into(),
        }
    }

    /// Create a new refresh-cycle error
    pub fn refresh<S: Into<String>>(message: S) -> Self {
        HestiaError::Refresh {
            message: message.into(),
        }
    }

    /// Whether the host should ask for new credentials instead of retrying
    pub fn requires_reauth(&self) -> bool {
        matches!(self, HestiaError::Auth { .. })
    }

    /// Whether retrying later without user action may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            HestiaError::Auth { .. } | HestiaError::Config { .. } | HestiaError::Validation { .. }
        )
    }
}

impl From<std::io::Error> for HestiaError {
    fn from(err: std::io::Error) -> Self {
        HestiaError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for HestiaError {
    fn from(err: serde_yaml::Error) -> Self {
        HestiaError::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for HestiaError {
    fn from(err: serde_json::Error) -> Self {
        HestiaError::serialization(err.to_string())
    }
}

impl From<reqwest::Error> for HestiaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HestiaError::timeout(err.to_string())
        } else {
            HestiaError::network(err.to_string())
        }
    }
}
