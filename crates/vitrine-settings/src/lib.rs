//! # vitrine-settings
//!
//! Settings for the Vitrine signage server.
//!
//! Loading flow (highest priority last):
//! 1. Compiled defaults
//! 2. `~/.vitrine/settings.json`, deep-merged over the defaults
//! 3. `VITRINE_*` environment variable overrides

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::{LoggingSettings, ServerSettings, StreamSettings, VitrineSettings};
