//! # loop-settings
//!
//! Configuration for the agenda loop, loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`LoopSettings::default()`]
//! 2. **User file**: `~/.agenda-loop/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `LOOP_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
