//! MDS configuration loading from `BETDAQ_AAPI_*` environment variables
//! (§9-A), following the reference crate's raw/resolved split
//! (`services/forwarder/src/config.rs`'s `RawConfig` → `ForwarderConfig`)
//! adapted from TOML to environment variables.

use std::collections::BTreeMap;
use std::time::Duration;

const PREFIX: &str = "BETDAQ_AAPI_";

/// Resolved MDS configuration: every field present, every default applied.
#[derive(Debug, Clone)]
pub struct MdsConfig {
    pub stream_url: String,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub receive_timeout: Duration,
    pub ping_frequency: Duration,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_period_secs: u32,
    pub meta_refresh_period: Duration,
    pub meta_refresh_classifiers: BTreeMap<i64, String>,
    pub prices_number: u32,
    pub filter_by_volume: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required field {0}{1}")]
    MissingField(&'static str, &'static str),
    #[error("invalid value for {0}{1}: {2}")]
    InvalidValue(&'static str, &'static str, String),
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<MdsConfig, ConfigError> {
    load_from(|key| std::env::var(key).ok())
}

/// Load configuration from an arbitrary lookup function — used by tests
/// to avoid mutating the real process environment.
pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<MdsConfig, ConfigError> {
    let get = |suffix: &'static str| lookup(&format!("{PREFIX}{suffix}"));

    let stream_url = get("STREAM_URL").ok_or(ConfigError::MissingField(PREFIX, "STREAM_URL"))?;

    let timeout = parse_float_seconds(&get, "TIMEOUT", 10.0)?;
    let connection_timeout = parse_float_seconds(&get, "CONNECTION_TIMEOUT", 60.0)?;
    let receive_timeout = parse_float_seconds(&get, "RECEIVE_TIMEOUT", 60.0)?;
    let ping_frequency = parse_float_seconds(&get, "PING_FREQUENCY", 30.0)?;
    let meta_refresh_period = parse_float_seconds(&get, "META_REFRESH_PERIOD", 300.0)?;

    let username = get("USERNAME");
    let password = get("PASSWORD");

    let refresh_period_secs = match get("REFRESH_PERIOD") {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue(PREFIX, "REFRESH_PERIOD", v))?,
        None => 60,
    };

    let meta_refresh_classifiers = match get("META_REFRESH_CLASSIFIERS") {
        Some(v) => parse_classifiers(&v)?,
        None => BTreeMap::new(),
    };

    let prices_number = match get("PRICES_NUMBER") {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue(PREFIX, "PRICES_NUMBER", v))?,
        None => 3,
    };

    let filter_by_volume = match get("FILTER_BY_VOLUME") {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue(PREFIX, "FILTER_BY_VOLUME", v))?,
        None => 1,
    };

    Ok(MdsConfig {
        stream_url,
        timeout,
        connection_timeout,
        receive_timeout,
        ping_frequency,
        username,
        password,
        refresh_period_secs,
        meta_refresh_period,
        meta_refresh_classifiers,
        prices_number,
        filter_by_volume,
    })
}

fn parse_float_seconds(
    get: &impl Fn(&'static str) -> Option<String>,
    suffix: &'static str,
    default: f64,
) -> Result<Duration, ConfigError> {
    let secs = match get(suffix) {
        Some(v) => v
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidValue(PREFIX, suffix, v))?,
        None => default,
    };
    Ok(Duration::from_secs_f64(secs))
}

fn parse_classifiers(raw: &str) -> Result<BTreeMap<i64, String>, ConfigError> {
    let mut out = BTreeMap::new();
    for pair in raw.split(',').filter(|s| !s.is_empty()) {
        let (id, label) = pair.split_once(':').ok_or_else(|| {
            ConfigError::InvalidValue(PREFIX, "META_REFRESH_CLASSIFIERS", pair.to_owned())
        })?;
        let id: i64 = id
            .parse()
            .map_err(|_| ConfigError::InvalidValue(PREFIX, "META_REFRESH_CLASSIFIERS", pair.to_owned()))?;
        out.insert(id, label.to_owned());
    }
    Ok(out)
}
