use crate::config::ApiConfig;
use crate::logging::StructuredLogger;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Token state shared between the authenticator and the executor.
///
/// The mutex is held for a whole login, not just the write, so that callers
/// racing on an expired token wait for one login instead of starting their own.
pub type SharedToken = Arc<Mutex<TokenManager>>;

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Read the `exp` claim of a JWT without verifying it
pub fn decode_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let payload = raw.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// Bearer token and its expiry
#[derive(Debug)]
pub struct TokenManager {
    token: Option<String>,
    expiry: Option<DateTime<Utc>>,
    margin: Duration,
    default_lifetime: Duration,
    logger: StructuredLogger,
}

impl TokenManager {
    pub fn new(margin: Duration, default_lifetime: Duration, logger: StructuredLogger) -> Self {
        Self {
            token: None,
            expiry: None,
            margin,
            default_lifetime,
            logger,
        }
    }

    pub fn from_config(api: &ApiConfig, logger: StructuredLogger) -> Self {
        Self::new(
            Duration::seconds(api.token_expiry_margin_secs),
            Duration::seconds(api.default_token_lifetime_secs),
            logger,
        )
    }

    pub fn shared(self) -> SharedToken {
        Arc::new(Mutex::new(self))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Usable only while `now < expiry - margin`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expiry) {
            (Some(_), Some(expiry)) => now < expiry - self.margin,
            _ => false,
        }
    }

    pub fn set_token(&mut self, raw: &str) {
        self.set_token_at(raw, Utc::now());
    }

    /// Replace token and expiry together; an undecodable expiry falls back to
    /// `now + default_lifetime`
    pub fn set_token_at(&mut self, raw: &str, now: DateTime<Utc>) {
        let expiry = match decode_expiry(raw) {
            Some(expiry) => expiry,
            None => {
                self.logger
                    .debug("Token expiry not decodable, assuming default lifetime");
                now + self.default_lifetime
            }
        };
        self.token = Some(raw.to_string());
        self.expiry = Some(expiry);
        self.logger
            .debug(&format!("Token stored, expires at {}", expiry.to_rfc3339()));
    }

    pub fn clear(&mut self) {
        self.token = None;
        self.expiry = None;
    }

    /// Clear only while `refused` is still the stored token; returns whether it was
    pub fn clear_if_current(&mut self, refused: &str) -> bool {
        if self.token.as_deref() == Some(refused) {
            self.clear();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::get_logger;

    fn manager() -> TokenManager {
        TokenManager::new(
            Duration::seconds(60),
            Duration::seconds(3600),
            get_logger("token"),
        )
    }

    fn jwt(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp));
        format!("{}.{}.sig", header, payload)
    }

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    #[test]
    fn decodable_expiry_boundary() {
        let mut tm = manager();
        let now = at(1_700_000_000);
        let exp = 1_700_001_000;
        tm.set_token_at(&jwt(exp), now);

        assert_eq!(tm.expiry(), Some(at(exp)));
        assert!(tm.is_valid_at(at(exp - 61)));
        // equality with expiry - margin is already invalid
        assert!(!tm.is_valid_at(at(exp - 60)));
        assert!(!tm.is_valid_at(at(exp)));
    }

    #[test]
    fn undecodable_token_uses_default_lifetime() {
        let mut tm = manager();
        let now = at(1_700_000_000);
        tm.set_token_at("opaque-token", now);

        assert_eq!(tm.expiry(), Some(now + Duration::seconds(3600)));
        assert!(tm.is_valid_at(now + Duration::seconds(3539)));
        assert!(!tm.is_valid_at(now + Duration::seconds(3540)));
    }

    #[test]
    fn garbage_payloads_never_fail() {
        assert!(decode_expiry("a.%%%.c").is_none());
        assert!(decode_expiry(&format!("a.{}.c", URL_SAFE_NO_PAD.encode("not json"))).is_none());
        assert!(decode_expiry(&format!("a.{}.c", URL_SAFE_NO_PAD.encode("{}"))).is_none());
        assert!(decode_expiry("").is_none());
    }

    #[test]
    fn padded_payload_is_accepted() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp": 1700000000}"#);
        assert!(payload.ends_with('='));
        assert_eq!(
            decode_expiry(&format!("h.{}.s", payload)),
            Some(at(1_700_000_000))
        );
    }

    #[test]
    fn clear_invalidates() {
        let mut tm = manager();
        tm.set_token("opaque");
        assert!(tm.is_valid());
        tm.clear();
        assert!(!tm.is_valid());
        assert!(tm.token().is_none());
        assert!(tm.expiry().is_none());
    }

    #[test]
    fn refused_token_clears_only_itself() {
        let mut tm = manager();
        tm.set_token("first");
        assert!(tm.clear_if_current("first"));
        assert!(tm.token().is_none());

        tm.set_token("second");
        assert!(!tm.clear_if_current("first"));
        assert_eq!(tm.token(), Some("second"));
        assert!(tm.is_valid());
    }

    #[test]
    fn set_token_replaces_previous() {
        let mut tm = manager();
        let now = at(1_700_000_000);
        tm.set_token_at(&jwt(1_700_000_500), now);
        tm.set_token_at("second", now);
        assert_eq!(tm.token(), Some("second"));
        assert_eq!(tm.expiry(), Some(now + Duration::seconds(3600)));
    }
}
