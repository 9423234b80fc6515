//! Settings management.

use std::path::PathBuf;

use super::{ConfigError, TrSettings, loader};

/// Owns the current settings and the workspace they came from.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// Current settings.
    current_settings: TrSettings,

    /// Workspace root path.
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    /// Creates a manager with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: TrSettings::default(), workspace_root: None }
    }

    /// Loads settings for a workspace.
    ///
    /// # Arguments
    /// * `workspace_root` - workspace root path, if any
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Validation error
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for workspace: {:?}", workspace_root);

        let settings = if let Some(root) = &workspace_root {
            loader::load_from_workspace(root)?.map_or_else(TrSettings::default, |ws| {
                tracing::debug!("Loaded workspace settings: {:?}", ws);
                ws
            })
        } else {
            TrSettings::default()
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.workspace_root = workspace_root;
        tracing::debug!("Settings loaded successfully: {:?}", self.current_settings);

        Ok(())
    }

    /// Replaces the settings (used by `did_change_configuration`).
    ///
    /// # Errors
    /// Validation error.
    pub fn update_settings(&mut self, new_settings: TrSettings) -> Result<(), ConfigError> {
        tracing::debug!("Updating settings...");

        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = new_settings;
        tracing::debug!("Settings updated successfully");

        Ok(())
    }

    /// Current settings.
    #[must_use]
    pub const fn get_settings(&self) -> &TrSettings {
        &self.current_settings
    }

    /// Workspace root, if one was loaded.
    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }
}
