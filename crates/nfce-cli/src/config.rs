//! Configuration discovery

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use nfce_sefaz::Config;

/// Config file looked up in the current directory
pub const LOCAL_CONFIG: &str = "nfce.toml";

/// `<config dir>/nfce/config.toml`, if the platform has a config dir
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "nfce").map(|d| d.config_dir().join("config.toml"))
}

/// Pick the config file to load.
///
/// Search order:
/// 1. `explicit` (`--config`), which must exist
/// 2. `./nfce.toml`
/// 3. `user` (see [`user_config_path`])
fn discover(explicit: Option<&Path>, local: &Path, user: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        return Ok(path.to_path_buf());
    }
    if local.exists() {
        return Ok(local.to_path_buf());
    }
    if let Some(user) = user.filter(|p| p.exists()) {
        return Ok(user.to_path_buf());
    }

    let searched = match user {
        Some(u) => format!("{} or {}", local.display(), u.display()),
        None => local.display().to_string(),
    };
    bail!("No config file found (looked for {searched}). Run `nfce init` to create one.")
}

/// Locate and load configuration. Returns the config and the file it came from.
pub fn load(explicit: Option<&Path>) -> Result<(Config, PathBuf)> {
    let user = user_config_path();
    let path = discover(explicit, Path::new(LOCAL_CONFIG), user.as_deref())?;
    let config = Config::from_file(&path)?;
    Ok((config, path))
}
