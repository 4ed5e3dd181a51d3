use std::env;
use std::path::PathBuf;

pub const FORCE_ENV: &str = "CC_INSIGHTS_FORCE";
pub const BIN_DIR_ENV: &str = "CC_INSIGHTS_BIN_DIR";
pub const RC_FILE_ENV: &str = "CC_INSIGHTS_RC_FILE";
pub const CONFIG_DIR_ENV: &str = "CC_INSIGHTS_CONFIG_DIR";
pub const LOG_ENV: &str = "CC_INSIGHTS_LOG";

/// Boolean from the environment: `Some` for a recognised spelling, `None`
/// when unset or unreadable so the caller can fall back to the config file.
pub fn env_flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    let parsed = parse_flag(&value);
    if parsed.is_none() && !value.trim().is_empty() {
        log::warn!("ignoring {name}={value:?}; expected 1/0, true/false, yes/no or on/off");
    }
    parsed
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A path from the environment, ignoring unset and blank values.
pub fn env_path_override(name: &str) -> Option<PathBuf> {
    let value = env::var_os(name)?;
    let value = value.to_str()?.trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}
