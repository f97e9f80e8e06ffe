use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub(crate) fn parse_bool_env(key: &str, default: bool) -> Result<bool> {
    let raw = env::var(key).unwrap_or_else(|_| {
        if default {
            "true".to_string()
        } else {
            "false".to_string()
        }
    });

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{key} must be a boolean, got '{raw}'"),
    }
}

/// Unset and blank values both read as `None`.
pub(crate) fn parse_optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn parse_required_env(key: &str) -> Result<String> {
    parse_optional_env(key).with_context(|| format!("{key} must be set"))
}

pub(crate) fn parse_string_env(key: &str, default: &str) -> String {
    parse_optional_env(key).unwrap_or_else(|| default.to_string())
}

pub(crate) fn parse_u64(key: &str, default: u64) -> Result<u64> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))
}

pub(crate) fn parse_usize(key: &str, default: usize) -> Result<usize> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))
}

pub(crate) fn parse_path(key: &str, default: &str) -> Result<PathBuf> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    let path = PathBuf::from(raw);
    if path.as_os_str().is_empty() {
        anyhow::bail!("{key} must not be empty");
    }
    Ok(path)
}
