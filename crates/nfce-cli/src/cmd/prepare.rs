//! `nfce prepare` - reduce a scanner export to the link store

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use nfce_sefaz::{Config, PrepareOutcome, prepare_links};

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Multi-column CSV export [default: general.links_file]
    pub input: Option<PathBuf>,

    /// Destination link store [default: overwrite input]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Header of the URL column [default: general.input_column]
    #[arg(short, long)]
    pub column: Option<String>,
}

pub fn run(args: PrepareArgs, config: &Config) -> Result<()> {
    let input = args
        .input
        .unwrap_or_else(|| config.general.links_file.clone());
    let output = args.output.unwrap_or_else(|| input.clone());
    let column = args
        .column
        .unwrap_or_else(|| config.general.input_column.clone());

    match prepare_links(&input, &output, &column)? {
        PrepareOutcome::Prepared { rows } => {
            eprintln!("{rows} links written to {}", output.display());
        }
        PrepareOutcome::AlreadyPrepared => {
            eprintln!("{} is already a link list; nothing to do", input.display());
        }
    }
    Ok(())
}
