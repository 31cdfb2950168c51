use std::io::{self, Write};

use reelcache_core::DownloadSummary;
use reelcache_model::MetadataRecord;
use serde_json::Value;

pub const NOTHING_FOUND: &str =
    "No movies with provided titles and/or IDs were found";

/// One block per record, field names right-aligned on the colon.
pub fn write_records<W: Write>(
    out: &mut W,
    records: &[MetadataRecord],
) -> io::Result<()> {
    if records.is_empty() {
        return writeln!(out, "{NOTHING_FOUND}");
    }

    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        let width = record.fields.keys().map(String::len).max().unwrap_or(0);
        for (name, value) in &record.fields {
            writeln!(out, "{name:>width$}: {}", display_value(value))?;
        }
    }
    Ok(())
}

pub fn write_json<W: Write>(
    out: &mut W,
    records: &[MetadataRecord],
) -> io::Result<()> {
    let fields: Vec<_> = records.iter().map(|record| &record.fields).collect();
    serde_json::to_writer_pretty(&mut *out, &fields)?;
    writeln!(out)
}

pub fn write_downloads<W: Write>(
    out: &mut W,
    summary: &DownloadSummary,
) -> io::Result<()> {
    if summary.total == 0 {
        return writeln!(out, "{NOTHING_FOUND}");
    }

    for item in &summary.items {
        match &item.path {
            Some(path) => writeln!(out, "{}: {}", item.title, path.display())?,
            None => writeln!(out, "{}: not downloaded", item.title)?,
        }
    }
    writeln!(
        out,
        "Downloaded {}/{} posters",
        summary.downloaded, summary.total
    )
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
