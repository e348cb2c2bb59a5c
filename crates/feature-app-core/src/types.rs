// SPDX-License-Identifier: AGPL-3.0
// Feature App Core - Type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest font size offered by the settings page
pub const MIN_FONT_SIZE: u32 = 12;
/// Largest font size offered by the settings page
pub const MAX_FONT_SIZE: u32 = 24;
/// Font sizes move in steps of this many points
pub const FONT_SIZE_STEP: u32 = 2;
pub const DEFAULT_FONT_SIZE: u32 = 16;

/// Check whether a font size lies on the selectable grid (12, 14, ..., 24)
pub fn is_valid_font_size(size: u32) -> bool {
    (MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) && (size - MIN_FONT_SIZE) % FONT_SIZE_STEP == 0
}

/// Theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Follow the operating system
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(AppError::InvalidValue(format!("Unknown theme: {}", other))),
        }
    }
}

/// User settings (GUI-agnostic)
///
/// Always fully populated: fields missing from the persisted document are
/// filled with their defaults when loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Show local notifications
    pub notifications_enabled: bool,
    /// Display name, empty when unset
    pub username: String,
    /// Font size in points (see `is_valid_font_size`)
    pub font_size: u32,
    /// Theme preference
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            username: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            theme: Theme::System,
        }
    }
}

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown settings key: {0}")]
    UnknownKey(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.notifications_enabled);
        assert_eq!(settings.username, "");
        assert_eq!(settings.font_size, 16);
        assert_eq!(settings.theme, Theme::System);
    }

    #[test]
    fn test_settings_json_field_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "notificationsEnabled": true,
                "username": "",
                "fontSize": 16,
                "theme": "system",
            })
        );
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::Light.to_string(), "light");
        assert!("Dark".parse::<Theme>().is_err());
    }

    #[test]
    fn test_font_size_grid() {
        assert!(is_valid_font_size(12));
        assert!(is_valid_font_size(16));
        assert!(is_valid_font_size(24));
        assert!(!is_valid_font_size(13));
        assert!(!is_valid_font_size(10));
        assert!(!is_valid_font_size(26));
    }
}
