//! Typed environment variable readers

use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// A required variable is not set (or is blank)
    #[error("{0} not set")]
    Missing(String),

    /// The variable is set but could not be parsed
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: String, value: String },
}

/// Read an optional variable; blank values count as unset
pub fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an optional variable
pub fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, EnvError> {
    match env_opt(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| EnvError::Invalid {
                name: name.to_string(),
                value,
            }),
    }
}

/// Read a comma separated list, skipping empty items
pub fn env_list<T: FromStr>(name: &str) -> Result<Vec<T>, EnvError> {
    let Some(raw) = env_opt(name) else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse().map_err(|_| EnvError::Invalid {
                name: name.to_string(),
                value: item.to_string(),
            })
        })
        .collect()
}
