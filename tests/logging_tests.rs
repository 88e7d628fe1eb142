use hestia::config::LoggingConfig;
use hestia::logging::{LogContext, get_logger, get_logger_with_context, init_logging, parse_log_level};
use tracing::Level;

#[test]
fn config_levels_parse() {
    assert_eq!(parse_log_level("WARNING").unwrap(), Level::WARN);
    assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
    assert!(parse_log_level("LOUD").is_err());
}

#[test]
fn derived_loggers_keep_account_tag() {
    let base = get_logger_with_context(LogContext::new("client").with_account("A-1"));
    let child = base.for_component("assembler");
    assert_eq!(child.component(), "assembler");
    assert_eq!(base.component(), "client");

    let tagged = get_logger("transport").with_account("A-2");
    assert_eq!(tagged.component(), "transport");
    tagged.info("tagged line");
}

#[test]
fn console_logging_initializes_once() {
    let config = LoggingConfig::default();
    assert!(init_logging(&config).is_ok());
    assert!(init_logging(&config).is_ok());
}
