//! Settings file loading.

use std::path::Path;

use super::{ConfigError, TrSettings};

/// Loads settings from a workspace.
///
/// Looks for a `.qt-i18n.json` file at the workspace root.
///
/// # Returns
/// - `Ok(Some(settings))`: file found and parsed
/// - `Ok(None)`: no settings file present
/// - `Err(ConfigError)`: read or parse failure
///
/// # Errors
/// - File read error
/// - JSON parse error
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<TrSettings>, ConfigError> {
    let config_path = workspace_root.join(".qt-i18n.json");

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let settings: TrSettings = serde_json::from_str(&content)?;

    Ok(Some(settings))
}
