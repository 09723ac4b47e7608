//! OS configuration loading from `BETDAQ_GBEI_*` environment variables
//! (§9-A), following the same raw/resolved, injectable-lookup pattern as
//! `md-client/src/config.rs`.

use std::time::Duration;

const PREFIX: &str = "BETDAQ_GBEI_";

/// Resolved OS configuration: every field present, every default applied.
#[derive(Debug, Clone)]
pub struct OsConfig {
    /// `host:port`, passed to `TcpStream::connect` as-is.
    pub server_addr: String,
    pub virtual_punter_id: i64,
    pub virtual_punter_session_key: i64,
    pub heartbeat_interval: Duration,
    pub decimal_as_string: bool,
    pub datetime_as_timestamp: bool,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required field {0}{1}")]
    MissingField(&'static str, &'static str),
    #[error("invalid value for {0}{1}: {2}")]
    InvalidValue(&'static str, &'static str, String),
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<OsConfig, ConfigError> {
    load_from(|key| std::env::var(key).ok())
}

/// Load configuration from an arbitrary lookup function — used by tests
/// to avoid mutating the real process environment.
pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<OsConfig, ConfigError> {
    let get = |suffix: &'static str| lookup(&format!("{PREFIX}{suffix}"));

    let server_addr = get("URL").ok_or(ConfigError::MissingField(PREFIX, "URL"))?;

    let virtual_punter_id = get("PUNTER_ID")
        .ok_or(ConfigError::MissingField(PREFIX, "PUNTER_ID"))
        .and_then(|v| {
            v.parse()
                .map_err(|_| ConfigError::InvalidValue(PREFIX, "PUNTER_ID", v))
        })?;

    let virtual_punter_session_key = get("PUNTER_SESSION_KEY")
        .ok_or(ConfigError::MissingField(PREFIX, "PUNTER_SESSION_KEY"))
        .and_then(|v| {
            v.parse()
                .map_err(|_| ConfigError::InvalidValue(PREFIX, "PUNTER_SESSION_KEY", v))
        })?;

    let heartbeat_interval = match get("HEARTBEAT_INTERVAL") {
        Some(v) => Duration::from_secs_f64(
            v.parse::<f64>()
                .map_err(|_| ConfigError::InvalidValue(PREFIX, "HEARTBEAT_INTERVAL", v))?,
        ),
        None => Duration::from_secs_f64(60.0),
    };

    let decimal_as_string = parse_bool(&get, "DECIMAL_AS_STRING", false)?;
    let datetime_as_timestamp = parse_bool(&get, "DATETIME_AS_TIMESTAMP", false)?;

    let currency = get("CURRENCY").unwrap_or_else(|| "GBP".to_owned());

    Ok(OsConfig {
        server_addr,
        virtual_punter_id,
        virtual_punter_session_key,
        heartbeat_interval,
        decimal_as_string,
        datetime_as_timestamp,
        currency,
    })
}

fn parse_bool(
    get: &impl Fn(&'static str) -> Option<String>,
    suffix: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match get(suffix) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidValue(PREFIX, suffix, v)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_url_is_an_error() {
        let err = load_from(env(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingField(PREFIX, "URL"));
    }

    #[test]
    fn defaults_apply_when_optional_fields_absent() {
        let cfg = load_from(env(&[
            ("BETDAQ_GBEI_URL", "gbei.example.com:9000"),
            ("BETDAQ_GBEI_PUNTER_ID", "3233"),
            ("BETDAQ_GBEI_PUNTER_SESSION_KEY", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.server_addr, "gbei.example.com:9000");
        assert_eq!(cfg.virtual_punter_id, 3233);
        assert_eq!(cfg.heartbeat_interval, Duration::from_secs_f64(60.0));
        assert!(!cfg.decimal_as_string);
        assert!(!cfg.datetime_as_timestamp);
        assert_eq!(cfg.currency, "GBP");
    }

    #[test]
    fn parses_bool_and_currency_overrides() {
        let cfg = load_from(env(&[
            ("BETDAQ_GBEI_URL", "gbei.example.com:9000"),
            ("BETDAQ_GBEI_PUNTER_ID", "3233"),
            ("BETDAQ_GBEI_PUNTER_SESSION_KEY", "1"),
            ("BETDAQ_GBEI_DECIMAL_AS_STRING", "true"),
            ("BETDAQ_GBEI_CURRENCY", "EUR"),
        ]))
        .unwrap();
        assert!(cfg.decimal_as_string);
        assert_eq!(cfg.currency, "EUR");
    }

    #[test]
    fn invalid_punter_id_is_rejected() {
        let err = load_from(env(&[
            ("BETDAQ_GBEI_URL", "gbei.example.com:9000"),
            ("BETDAQ_GBEI_PUNTER_ID", "not-a-number"),
            ("BETDAQ_GBEI_PUNTER_SESSION_KEY", "1"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue(PREFIX, "PUNTER_ID", "not-a-number".to_owned())
        );
    }
}
