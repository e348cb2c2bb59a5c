// SPDX-License-Identifier: AGPL-3.0
// Feature App Core - Settings persistence
//
// Settings live in a named document in the local config directory.
// Each field is written and flushed on its own; the in-memory copy only
// changes once the flush succeeded.

use crate::document::{get_as, Document, DocumentStore};
use crate::types::{is_valid_font_size, AppError, Settings, Theme};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Name of the document holding the settings
pub const DEFAULT_DOCUMENT: &str = "settings.json";

/// Prompt shown before wiping every setting
pub const CLEAR_PROMPT: &str = "Reset all settings to their defaults?";

/// Persisted field names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsKey {
    NotificationsEnabled,
    Username,
    FontSize,
    Theme,
}

impl SettingsKey {
    pub const ALL: [SettingsKey; 4] = [
        Self::NotificationsEnabled,
        Self::Username,
        Self::FontSize,
        Self::Theme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotificationsEnabled => "notificationsEnabled",
            Self::Username => "username",
            Self::FontSize => "fontSize",
            Self::Theme => "theme",
        }
    }
}

impl fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingsKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| AppError::UnknownKey(s.to_string()))
    }
}

/// A single field update with its typed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    NotificationsEnabled(bool),
    Username(String),
    FontSize(u32),
    Theme(Theme),
}

impl SettingChange {
    pub fn key(&self) -> SettingsKey {
        match self {
            Self::NotificationsEnabled(_) => SettingsKey::NotificationsEnabled,
            Self::Username(_) => SettingsKey::Username,
            Self::FontSize(_) => SettingsKey::FontSize,
            Self::Theme(_) => SettingsKey::Theme,
        }
    }

    /// Build a change from an untyped key/value pair, e.g. one coming from a
    /// webview bridge
    pub fn from_json(key: &str, value: Value) -> Result<Self, AppError> {
        let key: SettingsKey = key.parse()?;
        let bad = |e: serde_json::Error| AppError::InvalidValue(format!("{}: {}", key, e));

        let change = match key {
            SettingsKey::NotificationsEnabled => {
                Self::NotificationsEnabled(serde_json::from_value(value).map_err(bad)?)
            }
            SettingsKey::Username => Self::Username(serde_json::from_value(value).map_err(bad)?),
            SettingsKey::FontSize => Self::FontSize(serde_json::from_value(value).map_err(bad)?),
            SettingsKey::Theme => Self::Theme(serde_json::from_value(value).map_err(bad)?),
        };
        change.validate()?;
        Ok(change)
    }

    fn validate(&self) -> Result<(), AppError> {
        match self {
            Self::FontSize(size) if !is_valid_font_size(*size) => Err(AppError::InvalidValue(
                format!("Font size {} is not selectable", size),
            )),
            _ => Ok(()),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::NotificationsEnabled(enabled) => Value::Bool(*enabled),
            Self::Username(name) => Value::String(name.clone()),
            Self::FontSize(size) => Value::from(*size),
            Self::Theme(theme) => Value::String(theme.as_str().to_string()),
        }
    }

    fn apply(self, settings: &mut Settings) {
        match self {
            Self::NotificationsEnabled(enabled) => settings.notifications_enabled = enabled,
            Self::Username(name) => settings.username = name,
            Self::FontSize(size) => settings.font_size = size,
            Self::Theme(theme) => settings.theme = theme,
        }
    }
}

/// Settings as read from a document, with absent or unreadable fields left empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialSettings {
    pub notifications_enabled: Option<bool>,
    pub username: Option<String>,
    pub font_size: Option<u32>,
    pub theme: Option<Theme>,
}

/// Fill every missing field with its default
pub fn merge_defaults(partial: PartialSettings) -> Settings {
    let defaults = Settings::default();
    Settings {
        notifications_enabled: partial
            .notifications_enabled
            .unwrap_or(defaults.notifications_enabled),
        username: partial.username.unwrap_or(defaults.username),
        font_size: partial.font_size.unwrap_or(defaults.font_size),
        theme: partial.theme.unwrap_or(defaults.theme),
    }
}

fn read_field<T: DeserializeOwned>(doc: &dyn Document, key: SettingsKey) -> Option<T> {
    get_as(doc, key.as_str()).unwrap_or_else(|e| {
        tracing::warn!("Ignoring stored {}, using default: {}", key, e);
        None
    })
}

/// Read each field independently; a bad value only affects its own field
pub fn read_partial(doc: &dyn Document) -> PartialSettings {
    let font_size = read_field::<u32>(doc, SettingsKey::FontSize).filter(|size| {
        let valid = is_valid_font_size(*size);
        if !valid {
            tracing::warn!("Ignoring stored font size {}, using default", size);
        }
        valid
    });

    PartialSettings {
        notifications_enabled: read_field(doc, SettingsKey::NotificationsEnabled),
        username: read_field(doc, SettingsKey::Username),
        font_size,
        theme: read_field(doc, SettingsKey::Theme),
    }
}

/// Lifecycle of a `SettingsManager`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Loading,
    Ready,
}

/// Yes/no prompt shown before destructive operations
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

struct Inner {
    state: ManagerState,
    settings: Settings,
    document: Option<Box<dyn Document>>,
}

/// Owns the settings document for the lifetime of the UI session.
///
/// Every operation holds the internal lock across its whole write-then-flush
/// sequence, so concurrent updates are applied one at a time.
pub struct SettingsManager {
    store: Arc<dyn DocumentStore>,
    name: String,
    inner: Mutex<Inner>,
}

impl SettingsManager {
    pub fn new(store: Arc<dyn DocumentStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            inner: Mutex::new(Inner {
                state: ManagerState::Uninitialized,
                settings: Settings::default(),
                document: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the document and read the settings. Never fails: if the document
    /// cannot be opened the manager becomes ready with defaults and without
    /// a document, so later writes are skipped.
    pub fn load(&self) -> Settings {
        let mut inner = self.lock();
        inner.state = ManagerState::Loading;
        tracing::info!("Loading settings from {}", self.name);

        match self.store.open(&self.name) {
            Ok(doc) => {
                inner.settings = merge_defaults(read_partial(&*doc));
                inner.document = Some(doc);
            }
            Err(e) => {
                tracing::warn!("Failed to open {}, using defaults: {}", self.name, e);
                inner.settings = Settings::default();
                inner.document = None;
            }
        }

        inner.state = ManagerState::Ready;
        inner.settings.clone()
    }

    pub fn state(&self) -> ManagerState {
        self.lock().state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ManagerState::Ready
    }

    fn can_write(&self) -> bool {
        let inner = self.lock();
        inner.state == ManagerState::Ready && inner.document.is_some()
    }

    /// Get current settings
    pub fn settings(&self) -> Settings {
        self.lock().settings.clone()
    }

    /// Write one field and flush it.
    ///
    /// Returns `Ok(false)` without touching anything when the manager is not
    /// ready or has no document. On a flush error the staged write is undone,
    /// the in-memory settings keep their previous value and the error is
    /// returned.
    pub fn set_field(&self, change: SettingChange) -> Result<bool, AppError> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if inner.state != ManagerState::Ready {
            tracing::debug!("Ignoring {} update, settings not loaded", change.key());
            return Ok(false);
        }
        let Some(doc) = inner.document.as_mut() else {
            tracing::debug!("Ignoring {} update, no settings document", change.key());
            return Ok(false);
        };

        change.validate()?;

        let key = change.key();
        let previous = doc.get(key.as_str());
        doc.set(key.as_str(), change.to_json());

        if let Err(e) = doc.save() {
            tracing::error!("Failed to persist {}: {}", key, e);
            match previous {
                Some(value) => doc.set(key.as_str(), value),
                None => doc.remove(key.as_str()),
            }
            return Err(e);
        }

        change.apply(&mut inner.settings);
        tracing::info!("Setting {} persisted", key);
        Ok(true)
    }

    /// Remove every key from the document and reset to defaults, after the
    /// user confirmed.
    ///
    /// Returns `Ok(false)` if the manager is not ready, has no document, or the
    /// prompt was declined. A flush error restores the staged document and
    /// leaves the in-memory settings as they were.
    pub fn clear_all(&self, confirm: &dyn Confirm) -> Result<bool, AppError> {
        if !self.can_write() {
            return Ok(false);
        }

        // Prompt runs without the lock held
        if !confirm.confirm(CLEAR_PROMPT) {
            tracing::debug!("Settings reset declined");
            return Ok(false);
        }

        let mut guard = self.lock();
        let inner = &mut *guard;

        if inner.state != ManagerState::Ready {
            return Ok(false);
        }
        let Some(doc) = inner.document.as_mut() else {
            return Ok(false);
        };

        let backup: Vec<(String, Value)> = doc
            .keys()
            .into_iter()
            .filter_map(|key| doc.get(&key).map(|value| (key, value)))
            .collect();

        doc.clear();
        if let Err(e) = doc.save() {
            tracing::error!("Failed to persist settings reset: {}", e);
            for (key, value) in backup {
                doc.set(&key, value);
            }
            return Err(e);
        }

        inner.settings = Settings::default();
        tracing::info!("Settings reset to defaults");
        Ok(true)
    }
}
