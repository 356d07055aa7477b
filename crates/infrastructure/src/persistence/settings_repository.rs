//! Editor settings persistence.
//!
//! Stores editor settings in the platform-specific config directory:
//! - Linux: ~/.config/courier/settings.json
//! - macOS: ~/Library/Application Support/courier/settings.json
//! - Windows: %APPDATA%/courier/settings.json

use std::path::{Path, PathBuf};

use courier_domain::EditorSettings;
use tokio::fs;

use crate::serialization::{SerializationError, from_json, to_json_stable};

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Repository for editor settings persistence.
#[derive(Debug, Clone, Default)]
pub struct SettingsRepository;

impl SettingsRepository {
    /// Creates a new settings repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("courier"))
    }

    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Loads settings from the config directory.
    ///
    /// Returns default settings if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<EditorSettings, SettingsError> {
        match Self::settings_path() {
            Some(path) => self.load_from(&path).await,
            None => Ok(EditorSettings::default()),
        }
    }

    /// Loads settings from an explicit path.
    ///
    /// Returns default settings if the file doesn't exist. Missing fields
    /// take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_from(&self, path: &Path) -> Result<EditorSettings, SettingsError> {
        if !fs::try_exists(path).await? {
            tracing::debug!(
                target: "courier::settings",
                path = %path.display(),
                "no settings file, using defaults"
            );
            return Ok(EditorSettings::default());
        }

        let content = fs::read_to_string(path).await?;
        let settings = from_json(&content)?;
        Ok(settings)
    }

    /// Saves settings to the config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no config directory or writing fails.
    pub async fn save(&self, settings: &EditorSettings) -> Result<(), SettingsError> {
        let Some(path) = Self::settings_path() else {
            return Err(SettingsError::NoConfigDir);
        };
        self.save_to(&path, settings).await
    }

    /// Saves settings to an explicit path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub async fn save_to(&self, path: &Path, settings: &EditorSettings) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = to_json_stable(settings)?;
        fs::write(path, content).await?;

        Ok(())
    }

    /// Returns the path where settings are stored, if available.
    #[must_use]
    pub fn get_settings_path() -> Option<PathBuf> {
        Self::settings_path()
    }
}
