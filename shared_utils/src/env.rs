use std::{fmt::Display, str::FromStr};

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// An environment variable is set but its value does not parse into the expected type.
#[derive(Debug, Error)]
#[error("Invalid value for environment variable {name}={value:?}: {reason}")]
pub struct EnvVarParseError {
    /// Variable name.
    pub name: String,
    /// Raw value as found in the environment.
    pub value: String,
    /// Parser message.
    pub reason: String,
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Reads an optional override from the environment.
///
/// A missing or blank variable yields `Ok(None)`; a present value must parse as `T`.
pub fn env_override<T>(name: &str) -> Result<Option<T>, EnvVarParseError>
where
    T: FromStr,
    T::Err: Display,
{
    let Ok(raw) = get_env_var(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<T>().map(Some).map_err(|e| EnvVarParseError {
        name: name.to_string(),
        value: raw.clone(),
        reason: e.to_string(),
    })
}
