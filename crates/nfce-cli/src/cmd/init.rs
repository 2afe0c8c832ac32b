//! `nfce init` - write the default configuration file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::config::LOCAL_CONFIG;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the config
    #[arg(default_value = LOCAL_CONFIG)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    write_default(&args.path, args.force)?;
    eprintln!("Wrote default configuration to {}", args.path.display());
    Ok(())
}

fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, nfce_sefaz::config::DEFAULT_TOML)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfce_sefaz::Config;
    use tempfile::TempDir;

    #[test]
    fn writes_loadable_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf/nfce.toml");

        write_default(&path, false).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.general, Config::default().general);
        assert_eq!(config.items, Config::default().items);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nfce.toml");
        std::fs::write(&path, "# mine").unwrap();

        let err = write_default(&path, false).unwrap_err();
        assert!(format!("{err}").contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");

        write_default(&path, true).unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "# mine");
    }
}
