use hestia::error::HestiaError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(HestiaError::config("x"), HestiaError::Config { .. }));
    assert!(matches!(HestiaError::io("x"), HestiaError::Io { .. }));
    assert!(matches!(
        HestiaError::serialization("x"),
        HestiaError::Serialization { .. }
    ));
    assert!(matches!(
        HestiaError::network("x"),
        HestiaError::Network { .. }
    ));
    assert!(matches!(HestiaError::api("x"), HestiaError::Api { .. }));
}

#[test]
fn error_constructors_group_2() {
    assert!(matches!(HestiaError::auth("x"), HestiaError::Auth { .. }));
    assert!(matches!(
        HestiaError::validation("f", "m"),
        HestiaError::Validation { .. }
    ));
    assert!(matches!(
        HestiaError::timeout("x"),
        HestiaError::Timeout { .. }
    ));
    assert!(matches!(
        HestiaError::empty_response("x"),
        HestiaError::EmptyResponse { .. }
    ));
    assert!(matches!(
        HestiaError::refresh("x"),
        HestiaError::Refresh { .. }
    ));
}

#[test]
fn only_auth_requires_reauth() {
    let errors = [
        HestiaError::config("x"),
        HestiaError::network("x"),
        HestiaError::timeout("x"),
        HestiaError::empty_response("x"),
        HestiaError::api("x"),
        HestiaError::refresh("x"),
    ];
    for err in &errors {
        assert!(!err.requires_reauth(), "{}", err);
    }
    assert!(HestiaError::auth("x").requires_reauth());
}

#[test]
fn conversions() {
    let io: HestiaError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(io, HestiaError::Io { .. }));

    let json: HestiaError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(json, HestiaError::Serialization { .. }));
}

#[test]
fn display_messages() {
    let e = HestiaError::validation("field", "bad");
    assert!(format!("{}", e).contains("Validation error"));
    let e = HestiaError::refresh("account A-1: API error: boom");
    assert_eq!(format!("{}", e), "Refresh failed: account A-1: API error: boom");
}
