//! Target ingestion for batch runs

use anyhow::{anyhow, Context, Result};
use ldtest_core::Target;
use std::io::Read;
use std::path::Path;

/// Read targets from a CSV file; the first column of every record is the URL
pub fn targets_from_csv(path: &Path) -> Result<Vec<Target>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open target file {:?}", path))?;
    targets_from_reader(file).with_context(|| format!("Invalid target file {:?}", path))
}

/// Parse CSV records into targets.
///
/// There is no header row. A record with an empty first column or an invalid URL
/// rejects the whole batch.
pub fn targets_from_reader<R: Read>(reader: R) -> Result<Vec<Target>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut targets = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 1;
        let record = record.with_context(|| format!("Malformed record {}", line))?;

        let url = record
            .get(0)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("Record {} has no URL", line))?;
        let target = Target::parse(url).with_context(|| format!("Record {}", line))?;
        targets.push(target);
    }

    if targets.is_empty() {
        return Err(anyhow!("No targets found"));
    }

    Ok(targets)
}

/// A single target given on the command line
pub fn target_from_arg(url: &str) -> Result<Vec<Target>> {
    let target = Target::parse(url).with_context(|| format!("Invalid --url {:?}", url))?;
    Ok(vec![target])
}
