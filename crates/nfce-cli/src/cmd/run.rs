//! `nfce run` - process every pending link

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use nfce_core::{SharedProgress, fmt_num};
use nfce_sefaz::{Config, Summary};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Link store to process [default: general.links_file]
    #[arg(short, long)]
    pub links: Option<PathBuf>,

    /// Output table file name inside the data directory
    #[arg(short, long)]
    pub output: Option<String>,

    /// Replay the stored debug page instead of fetching
    #[arg(long)]
    pub offline: bool,

    /// Rewrite the link store after every success
    #[arg(long)]
    pub checkpoint: bool,
}

/// Config with command-line overrides applied
fn effective_config(args: RunArgs, config: &Config) -> Config {
    let mut config = config.clone();
    if let Some(links) = args.links {
        config.general.links_file = links;
    }
    if let Some(output) = args.output {
        config.general.output_file = output;
    }
    if args.offline {
        config.debug.live_requests = false;
    }
    if args.checkpoint {
        config.general.checkpoint = true;
    }
    config
}

pub fn run(args: RunArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let config = effective_config(args, config);
    let summary = nfce_sefaz::run(&config, progress)?;
    print_summary(&summary, &config);
    Ok(())
}

fn print_summary(summary: &Summary, config: &Config) {
    eprintln!();
    eprintln!("=== Run Summary ===");
    eprintln!(
        "Links: {}/{} succeeded, {} failed",
        fmt_num(summary.succeeded),
        fmt_num(summary.total_links),
        fmt_num(summary.failed)
    );
    if summary.records_written > 0 {
        eprintln!(
            "Records: {} appended to {}",
            fmt_num(summary.records_written),
            config.output_path().display()
        );
    } else {
        eprintln!("Records: none extracted");
    }
    if summary.remaining > 0 {
        eprintln!(
            "{} links remaining in {}",
            fmt_num(summary.remaining),
            config.general.links_file.display()
        );
    } else {
        eprintln!("All links processed");
    }
    eprintln!("Time: {:.1}s", summary.elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            links: None,
            output: None,
            offline: false,
            checkpoint: false,
        }
    }

    #[test]
    fn no_flags_keep_config() {
        let config = Config::default();
        assert_eq!(effective_config(args(), &config), config);
    }

    #[test]
    fn flags_override_config() {
        let config = Config::default();
        let args = RunArgs {
            links: Some(PathBuf::from("scans.csv")),
            output: Some("notas.csv".to_string()),
            offline: true,
            checkpoint: true,
        };

        let effective = effective_config(args, &config);

        assert_eq!(effective.general.links_file, PathBuf::from("scans.csv"));
        assert_eq!(effective.output_path(), PathBuf::from("dados/notas.csv"));
        assert!(!effective.debug.live_requests);
        assert!(effective.general.checkpoint);
    }
}
