//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file only needs the keys it overrides.

use serde::{Deserialize, Serialize};

/// Default Gemini REST base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default extraction model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";

/// Default extraction request timeout.
pub const DEFAULT_EXTRACT_TIMEOUT_MS: u64 = 15_000;

/// Path value that selects an in-memory database.
pub const IN_MEMORY_DB: &str = ":memory:";

/// Root settings type.
///
/// ```json
/// {
///   "store": { "dbPath": "/var/lib/loop/facts.db" },
///   "extractor": { "timeoutMs": 20000 }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoopSettings {
    /// Temporal store settings.
    pub store: StoreSettings,
    /// Extraction service settings.
    pub extractor: ExtractorSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Temporal store database settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Database file path, or `":memory:"`.
    pub db_path: String,
    /// Maximum connection pool size (file-backed stores only).
    pub pool_size: u32,
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Page cache size in KiB.
    pub cache_size_kib: i64,
}

impl StoreSettings {
    /// Whether the configured path selects an in-memory database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY_DB
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: IN_MEMORY_DB.to_string(),
            pool_size: 16,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
        }
    }
}

/// Extraction service settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractorSettings {
    /// REST base URL, without trailing slash.
    pub api_base: String,
    /// Model name used in `models/<model>:generateContent`.
    pub model: String,
    /// API key. Absent until configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_ms: DEFAULT_EXTRACT_TIMEOUT_MS,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`EnvFilter` syntax). `RUST_LOG` overrides it.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
