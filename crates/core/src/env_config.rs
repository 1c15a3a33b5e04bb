//! Environment variable parsing with warn-level logging for invalid values.

use crate::error::CoreError;

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        Err(_) => default,
    }
}

/// Read a variable that must be present and non-blank.
pub fn env_required(var: &'static str) -> Result<String, CoreError> {
    env_optional(var).ok_or(CoreError::MissingConfig(var))
}

/// Read a variable, treating blank values as unset.
#[must_use]
pub fn env_optional(var: &str) -> Option<String> {
    std::env::var(var).ok().map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}
