//! Shared types, error model, and configuration for termdeck.
//!
//! This crate is the foundation depended on by all other termdeck crates.
//! It provides:
//! - [`TermDeckError`]: the unified error type
//! - Domain types ([`Term`], [`CardEntry`], [`CardModel`], [`OutputMode`], [`ProviderKind`])
//! - Configuration ([`AppConfig`], config loading)
//! - [`write_atomic`]: temp-file-then-rename emission used by the cache and writers

pub mod atomic;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use atomic::write_atomic;
pub use config::{
    AppConfig, DeckConfig, DefaultsConfig, ProviderConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{Result, TermDeckError};
pub use types::{CardEntry, CardModel, OutputMode, ProviderKind, Term};
