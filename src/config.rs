//! Runtime configuration read from `STUDY_*` environment variables.

use crate::models::scheduling_state::{DEFAULT_MIN_EASE, INITIAL_EASE};
use crate::scheduler::practice::LimitPolicy;
use crate::scheduler::review::ReviewOptions;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DB_PATH_VAR: &str = "STUDY_DB_PATH";
pub const MIN_EASE_VAR: &str = "STUDY_MIN_EASE";
pub const REVIEW_RETRIES_VAR: &str = "STUDY_REVIEW_RETRIES";
pub const LIMIT_POLICY_VAR: &str = "STUDY_PRACTICE_LIMIT_POLICY";
pub const SEED_VAR: &str = "STUDY_PRACTICE_SEED";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}")]
    Unparsable { var: &'static str, value: String },

    #[error("{var}: {reason}")]
    OutOfRange { var: &'static str, reason: &'static str },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub min_ease: f64,
    /// Total attempts for a review that hits a concurrent update.
    pub review_retries: u32,
    /// How an `all` practice pool is cut down to a limit.
    pub limit_policy: LimitPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("study_tool.db"),
            min_ease: DEFAULT_MIN_EASE,
            review_retries: 3,
            limit_policy: LimitPolicy::Sample { seed: None },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from any variable source, defaults filling the gaps.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = lookup(DB_PATH_VAR) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(min_ease) = parse_var::<f64>(&lookup, MIN_EASE_VAR)? {
            config.min_ease = min_ease;
        }
        if let Some(retries) = parse_var::<u32>(&lookup, REVIEW_RETRIES_VAR)? {
            config.review_retries = retries;
        }
        let seed = parse_var::<u64>(&lookup, SEED_VAR)?;
        config.limit_policy = match lookup(LIMIT_POLICY_VAR).as_deref().map(str::trim) {
            None | Some("sample") => LimitPolicy::Sample { seed },
            Some("truncate") => LimitPolicy::Truncate,
            Some(other) => {
                return Err(ConfigError::Unparsable {
                    var: LIMIT_POLICY_VAR,
                    value: other.to_string(),
                });
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_ease.is_finite() || self.min_ease <= 0.0 {
            return Err(ConfigError::OutOfRange {
                var: MIN_EASE_VAR,
                reason: "must be a positive number",
            });
        }
        if self.min_ease > INITIAL_EASE {
            return Err(ConfigError::OutOfRange {
                var: MIN_EASE_VAR,
                reason: "must not exceed the initial ease of 2.5",
            });
        }
        if self.review_retries == 0 {
            return Err(ConfigError::OutOfRange {
                var: REVIEW_RETRIES_VAR,
                reason: "must allow at least one attempt",
            });
        }
        Ok(())
    }

    pub fn review_options(&self) -> ReviewOptions {
        ReviewOptions {
            min_ease: self.min_ease,
            max_attempts: self.review_retries,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Unparsable { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.min_ease, 1.3);
        assert_eq!(config.limit_policy, LimitPolicy::Sample { seed: None });
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (DB_PATH_VAR, "/tmp/cards.db"),
            (MIN_EASE_VAR, "1.5"),
            (REVIEW_RETRIES_VAR, "5"),
            (SEED_VAR, "7"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/cards.db"));
        assert_eq!(config.min_ease, 1.5);
        assert_eq!(config.review_retries, 5);
        assert_eq!(config.limit_policy, LimitPolicy::Sample { seed: Some(7) });
    }

    #[test]
    fn test_truncate_policy() {
        let config = Config::from_lookup(lookup(&[(LIMIT_POLICY_VAR, "truncate")])).unwrap();
        assert_eq!(config.limit_policy, LimitPolicy::Truncate);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[(MIN_EASE_VAR, "abc")])),
            Err(ConfigError::Unparsable { var: MIN_EASE_VAR, .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(MIN_EASE_VAR, "-1")])),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(MIN_EASE_VAR, "3.0")])),
            Err(ConfigError::OutOfRange { var: MIN_EASE_VAR, .. })
        ));
        assert!(Config::from_lookup(lookup(&[(MIN_EASE_VAR, "2.5")])).is_ok());
        assert!(matches!(
            Config::from_lookup(lookup(&[(REVIEW_RETRIES_VAR, "0")])),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(LIMIT_POLICY_VAR, "shuffle")])),
            Err(ConfigError::Unparsable { .. })
        ));
    }
}
