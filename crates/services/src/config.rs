use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Tunables for exam sessions and catalog loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamConfig {
    /// Countdown length for each session, in whole seconds.
    pub duration_secs: u32,
    /// Wall time between clock ticks. One second outside of tests.
    pub tick_period: Duration,
    /// Fetch attempts before a load is reported as failed. Always at least 1.
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Shuffle presentation order once when a catalog is loaded.
    pub shuffle_questions: bool,
    /// Base URL of the HTTP catalog service, if one is configured.
    pub catalog_url: Option<String>,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            duration_secs: 600,
            tick_period: Duration::from_secs(1),
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
            shuffle_questions: false,
            catalog_url: None,
        }
    }
}

impl ExamConfig {
    /// Read `EXAM_*` variables, falling back to defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`ExamConfig::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default = Self::default();
        let duration_secs = parse_var(&lookup, "EXAM_DURATION_SECS", "u32", default.duration_secs)?;
        let tick_ms = parse_var(&lookup, "EXAM_TICK_MS", "u64", millis(default.tick_period))?;
        let max_attempts = parse_var(&lookup, "EXAM_LOAD_ATTEMPTS", "u32", default.max_attempts)?;
        let retry_ms = parse_var(
            &lookup,
            "EXAM_RETRY_DELAY_MS",
            "u64",
            millis(default.retry_delay),
        )?;
        let shuffle_questions =
            parse_var(&lookup, "EXAM_SHUFFLE", "bool", default.shuffle_questions)?;
        let catalog_url = lookup("EXAM_CATALOG_URL").filter(|v| !v.trim().is_empty());

        Ok(Self {
            duration_secs,
            tick_period: Duration::from_millis(tick_ms.max(1)),
            max_attempts: max_attempts.max(1),
            retry_delay: Duration::from_millis(retry_ms),
            shuffle_questions,
            catalog_url,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                var,
                value,
                expected,
            }),
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
