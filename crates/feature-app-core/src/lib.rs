// SPDX-License-Identifier: AGPL-3.0
// Feature App Core - Shared logic for all frontends
//
// This crate provides:
// - Settings and AppError types
// - Document stores (JSON files, in-memory)
// - SettingsManager for persistent settings
// - Counter state for the counter page
//
// Frontend-specific code lives in separate crates.

pub mod counter;
pub mod document;
pub mod settings;
pub mod types;

// Re-export commonly used items
pub use counter::Counter;
pub use document::{Document, DocumentStore, FileStore, JsonFileDocument, MemoryStore};
pub use settings::{
    merge_defaults, read_partial, Confirm, ManagerState, PartialSettings, SettingChange,
    SettingsKey, SettingsManager, CLEAR_PROMPT, DEFAULT_DOCUMENT,
};
pub use types::{AppError, Settings, Theme};
