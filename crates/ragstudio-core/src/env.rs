//! Environment variable helpers shared by the configuration loaders.

use std::str::FromStr;

use tracing::warn;

/// String value of `key`, or `default` when unset or empty.
pub fn var_or(key: &str, default: &str) -> String {
    var_opt(key).unwrap_or_else(|| default.to_string())
}

/// Non-empty value of `key`.
pub fn var_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parsed value of `key`. Unparseable values log a warning and yield `default`.
pub fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match var_opt(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "Invalid value in environment, using default");
            default
        }),
    }
}

/// Boolean flag: `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`,
/// case-insensitive.
pub fn flag_or(key: &str, default: bool) -> bool {
    match var_opt(key).map(|v| v.to_lowercase()) {
        None => default,
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                warn!(key, value = %v, default, "Invalid flag in environment, using default");
                default
            }
        },
    }
}

/// Comma-separated list; blank items are dropped.
pub fn list_or(key: &str, default: &[&str]) -> Vec<String> {
    match var_opt(key) {
        Some(raw) => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}
