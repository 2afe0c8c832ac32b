//! nfce - scrape NFC-e consumer receipts from the SEFAZ-RS portal
//!
//! Reads receipt links (usually scanned from QR codes), fetches each
//! consultation page, and appends issuer, totals, items and consumer data
//! to a CSV table. Links that fail stay queued for the next run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use nfce_sefaz::Config;

mod cmd;
mod config;

#[derive(Parser)]
#[command(name = "nfce")]
#[command(about = "Scrape NFC-e consumer receipts from the SEFAZ-RS portal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./nfce.toml or ~/.config/nfce/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for daily log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    /// Only log to the console
    #[arg(long, global = true)]
    no_log_file: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and extract every pending link
    Run(cmd::run::RunArgs),
    /// Extract the URL column from a multi-column scanner export
    Prepare(cmd::prepare::PrepareArgs),
    /// Write the default configuration file
    Init(cmd::init::InitArgs),
    /// Show current configuration
    Config,
}

impl Command {
    /// Whether this command does pipeline work worth keeping a log file for
    fn keeps_log(&self) -> bool {
        matches!(self, Self::Run(_) | Self::Prepare(_))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(nfce_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, the progress bar shows activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    // The daily file always gets info and above.
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    let log_file = (!cli.no_log_file && cli.command.keeps_log())
        .then(|| nfce_core::daily_log_path(&cli.log_dir));
    nfce_core::init_logging(quiet, cli.debug, multi, log_file.as_deref());

    let load_config = || config::load(cli.config.as_deref());

    match cli.command {
        Command::Run(args) => {
            let (config, _) = load_config()?;
            cmd::run::run(args, &config, &progress)
        }
        Command::Prepare(args) => {
            let (config, _) = load_config()?;
            cmd::prepare::run(args, &config)
        }
        Command::Init(args) => cmd::init::run(args),
        Command::Config => {
            let (config, source) = load_config()?;
            eprintln!("\n{}", config_table(&config, &source));
            Ok(())
        }
    }
}

fn config_table(config: &Config, source: &Path) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    let general = &config.general;
    table.add_row(vec!["Config file", &source.display().to_string()]);
    table.add_row(vec!["Link store", &general.links_file.display().to_string()]);
    table.add_row(vec![
        "Prepare input",
        &if general.prepare_input {
            format!("yes (column '{}')", general.input_column)
        } else {
            "no".to_string()
        },
    ]);
    table.add_row(vec!["Output table", &config.output_path().display().to_string()]);
    table.add_row(vec![
        "Artifacts",
        &config.artifact_path("<key>").display().to_string(),
    ]);
    table.add_row(vec![
        "Request interval",
        &format!("{}s", general.request_interval_secs),
    ]);
    table.add_row(vec!["Timeout", &format!("{}s", general.timeout_secs)]);
    table.add_row(vec![
        "Checkpoint",
        if general.checkpoint { "after each link" } else { "end of run" },
    ]);
    table.add_row(vec![
        "Mode",
        &if config.debug.live_requests {
            "live".to_string()
        } else {
            format!("replay ({})", config.debug.access_key)
        },
    ]);
    table.add_row(vec!["Item row pattern", &config.items.row_id_pattern]);
    if !config.metadata.config_version.is_empty() {
        table.add_row(vec![
            "Selectors version",
            &format!(
                "{} ({})",
                config.metadata.config_version, config.metadata.updated
            ),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_table_shows_mode_and_paths() {
        let mut config = Config::default();
        config.debug.live_requests = false;

        let rendered = config_table(&config, Path::new("nfce.toml")).to_string();

        assert!(rendered.contains("replay (chave_acesso)"));
        assert!(rendered.contains("dados_nfe.csv"));
        assert!(rendered.contains("end of run"));
    }

    #[test]
    fn cli_parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "nfce",
            "--no-log-file",
            "run",
            "--offline",
            "--links",
            "scans.csv",
        ])
        .unwrap();
        assert!(cli.no_log_file);
        match cli.command {
            Command::Run(args) => {
                assert!(args.offline);
                assert_eq!(args.links, Some(PathBuf::from("scans.csv")));
            }
            _ => panic!("expected run"),
        }
    }
}
