//! Reduce a multi-column export to the single-column link store
//!
//! QR-code scanner apps export one row per scan with several columns; only
//! the URL column is needed. Running this on a file that is already a bare
//! list of links is a no-op.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// What [`prepare_links`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// Column extracted; `rows` links written
    Prepared { rows: usize },
    /// Input already holds one bare link per line
    AlreadyPrepared,
}

fn looks_like_url(cell: &str) -> bool {
    let cell = cell.trim().trim_matches('"');
    cell.starts_with("http://") || cell.starts_with("https://")
}

/// Extract column `column` of the CSV at `input` into `output`, one value
/// per line, no header. `input` and `output` may be the same file.
pub fn prepare_links(input: &Path, output: &Path, column: &str) -> Result<PrepareOutcome> {
    let content = match fs::read_to_string(input) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            bail!("Input file not found: {}", input.display())
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", input.display())),
    };
    if content.trim().is_empty() {
        bail!("Input file is empty: {}", input.display());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .with_context(|| format!("Malformed CSV: {}", input.display()))?
        .clone();

    // A link where the header should be: nothing to extract
    if headers.len() == 1 && headers.get(0).is_some_and(looks_like_url) {
        log::debug!("{} is already a single-column link list", input.display());
        return Ok(PrepareOutcome::AlreadyPrepared);
    }

    let Some(index) = headers.iter().position(|h| h == column) else {
        let available: Vec<&str> = headers.iter().collect();
        bail!(
            "Column '{column}' not found in {}. Available columns: {available:?}",
            input.display()
        );
    };

    let mut links = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Malformed CSV row {} in {}", line + 2, input.display()))?;
        if let Some(value) = record.get(index).filter(|v| !v.is_empty()) {
            links.push(value.to_string());
        }
    }

    let mut body = links.join("\n");
    if !links.is_empty() {
        body.push('\n');
    }
    fs::write(output, body).with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!(
        "Extracted {} links from column '{column}' into {}",
        links.len(),
        output.display()
    );
    Ok(PrepareOutcome::Prepared { rows: links.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EXPORT: &str = "\
date,time,type,format,text
2025-06-01,10:00,QR_CODE,TEXT,https://www.sefaz.rs.gov.br/NFCE/NFCE-COM.aspx?p=111|2|1|1|AA
2025-06-02,11:30,QR_CODE,TEXT,https://www.sefaz.rs.gov.br/NFCE/NFCE-COM.aspx?p=222|2|1|1|BB
";

    #[test]
    fn extracts_column_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.csv");
        fs::write(&path, EXPORT).unwrap();

        let outcome = prepare_links(&path, &path, "text").unwrap();

        assert_eq!(outcome, PrepareOutcome::Prepared { rows: 2 });
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "https://www.sefaz.rs.gov.br/NFCE/NFCE-COM.aspx?p=111|2|1|1|AA\n\
             https://www.sefaz.rs.gov.br/NFCE/NFCE-COM.aspx?p=222|2|1|1|BB\n"
        );
    }

    #[test]
    fn already_prepared_is_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.csv");
        let body = "https://x/?p=1|2\nhttps://x/?p=2|2\n";
        fs::write(&path, body).unwrap();

        assert_eq!(
            prepare_links(&path, &path, "text").unwrap(),
            PrepareOutcome::AlreadyPrepared
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), body);
    }

    #[test]
    fn missing_column_lists_available() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let err = prepare_links(&path, &path, "text").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("'text' not found"));
        assert!(msg.contains("\"a\", \"b\""));
    }

    #[test]
    fn missing_input() {
        let dir = TempDir::new().unwrap();
        let err = prepare_links(&dir.path().join("nope.csv"), &dir.path().join("o.csv"), "text")
            .unwrap_err();
        assert!(format!("{err}").contains("not found"));
    }

    #[test]
    fn empty_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.csv");
        fs::write(&path, "\n").unwrap();
        let err = prepare_links(&path, &path, "text").unwrap_err();
        assert!(format!("{err}").contains("empty"));
    }

    #[test]
    fn header_only_writes_empty_store() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("export.csv");
        let output = dir.path().join("links.csv");
        fs::write(&input, "date,text\n").unwrap();

        assert_eq!(
            prepare_links(&input, &output, "text").unwrap(),
            PrepareOutcome::Prepared { rows: 0 }
        );
        assert_eq!(fs::metadata(&output).unwrap().len(), 0);
    }
}
