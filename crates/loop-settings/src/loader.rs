//! Layered settings loading: defaults, then the user file, then `LOOP_*` env vars.
//!
//! Loading flow:
//! 1. Start with compiled [`LoopSettings::default()`]
//! 2. If `~/.agenda-loop/settings.json` exists, deep-merge it over defaults
//! 3. Apply environment variable overrides (highest priority)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::LoopSettings;

/// Resolve the path to the settings file (`~/.agenda-loop/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".agenda-loop").join("settings.json")
}

/// Load from `~/.agenda-loop/settings.json` and the process environment.
pub fn load_settings() -> Result<LoopSettings> {
    load_settings_from_path(&settings_path())
}

/// Load from `path` and the process environment.
///
/// A missing file yields defaults; a file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<LoopSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<LoopSettings> {
    let defaults = serde_json::to_value(LoopSettings::default())?;

    let merged = match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(path = %path.display(), "merging settings file over defaults");
            let user: Value = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            deep_merge(defaults, user)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
            defaults
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    Ok(serde_json::from_value(merged)?)
}

/// Overlay `source` on `target`.
///
/// Objects merge key by key, recursively. Any other `source` value replaces
/// the target outright, except `null`, which leaves the target untouched.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(settings: &mut LoopSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Empty strings count as unset. Out-of-range or unparsable numbers are
/// ignored with a warning and the file/default value is kept.
pub fn apply_overrides<F>(settings: &mut LoopSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Store ───────────────────────────────────────────────────────
    if let Some(v) = string("LOOP_DB_PATH") {
        settings.store.db_path = v;
    }
    if let Some(v) = string("LOOP_POOL_SIZE") {
        match parse_range(&v, 1u32, 256) {
            Some(n) => settings.store.pool_size = n,
            None => warn!(key = "LOOP_POOL_SIZE", value = %v, "invalid env var, ignoring"),
        }
    }

    // ── Extractor ───────────────────────────────────────────────────
    if let Some(v) = string("LOOP_GEMINI_API_KEY").or_else(|| string("GEMINI_API_KEY")) {
        settings.extractor.api_key = Some(v);
    }
    if let Some(v) = string("LOOP_GEMINI_MODEL") {
        settings.extractor.model = v;
    }
    if let Some(v) = string("LOOP_GEMINI_API_BASE") {
        settings.extractor.api_base = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = string("LOOP_EXTRACT_TIMEOUT_MS") {
        match parse_range(&v, 100u64, 600_000) {
            Some(n) => settings.extractor.timeout_ms = n,
            None => {
                warn!(key = "LOOP_EXTRACT_TIMEOUT_MS", value = %v, "invalid env var, ignoring");
            }
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = string("LOOP_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

/// Parse a number and accept it only within `min..=max`.
pub fn parse_range<T>(val: &str, min: T, max: T) -> Option<T>
where
    T: std::str::FromStr + PartialOrd,
{
    let n: T = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
