use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Get the path to the dbxweave config directory
/// On macOS: ~/Library/Application Support/dbxweave
/// On Linux: ~/.config/dbxweave
/// On Windows: %APPDATA%\dbxweave
pub fn get_config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
    path.push("dbxweave");
    Ok(path)
}

/// Location of the optional decision tables override
pub fn get_tables_path() -> Result<PathBuf> {
    let mut path = get_config_dir()?;
    path.push("tables.yaml");
    Ok(path)
}
