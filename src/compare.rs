use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// Compares the two persisted version files and reports the verdict.
///
/// Returns `Ok(None)` when either file is missing (reported by name,
/// nothing compared), otherwise `Ok(Some(matched))`. Both contents are
/// trimmed before the equality check.
pub fn compare_versions(config_version: &Path, dll_version: &Path) -> Result<Option<bool>> {
    if !config_version.exists() {
        println!("File {} does not exist.", config_version.display());
        return Ok(None);
    }
    if !dll_version.exists() {
        println!("File {} does not exist.", dll_version.display());
        return Ok(None);
    }

    let config = fs::read_to_string(config_version)
        .with_context(|| format!("Reading {:?}", config_version))?;
    let dll =
        fs::read_to_string(dll_version).with_context(|| format!("Reading {:?}", dll_version))?;
    let config = config.trim();
    let dll = dll.trim();

    println!("config.ini version: {config}");
    println!("DockFWInfo.dll version: {dll}");

    if config == dll {
        println!("{}", "Version the same!".green().bold());
        Ok(Some(true))
    } else {
        println!(
            "{}",
            r#"Version doesn't match! Please check your "config.ini" or "DockFWInfo.dll""#
                .red()
                .bold()
        );
        Ok(Some(false))
    }
}
