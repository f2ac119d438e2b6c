// Export module - writes the selection table to CSV
// Same order as the playlist; UTF-8 with BOM and CRLF so spreadsheet apps open it cleanly

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::selection::SelectedTrack;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const HEADER: [&str; 5] = ["artist", "track", "uri", "track_ms", "artist_ms"];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    artist: &'a str,
    track: &'a str,
    uri: Option<&'a str>,
    track_ms: u64,
    artist_ms: u64,
}

impl<'a> From<&'a SelectedTrack> for CsvRow<'a> {
    fn from(row: &'a SelectedTrack) -> Self {
        Self {
            artist: &row.artist,
            track: &row.track,
            uri: row.track_id.as_deref(),
            track_ms: row.track_total_ms,
            artist_ms: row.artist_total_ms,
        }
    }
}

/// Write `rows` to `<out_dir>/playlist_<name>_<YYYYmmdd_HHMM>.csv`.
pub fn write_csv(rows: &[SelectedTrack], playlist_name: &str, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let path = out_dir.join(csv_file_name(playlist_name, Local::now()));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_table(rows, BufWriter::new(file))?;

    info!("CSV written: {} ({} rows)", path.display(), rows.len());
    Ok(path)
}

/// Write the table (BOM, header, rows) to any writer.
pub fn write_table<W: Write>(rows: &[SelectedTrack], mut writer: W) -> Result<()> {
    writer.write_all(UTF8_BOM)?;

    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    csv.write_record(HEADER)?;
    for row in rows {
        csv.serialize(CsvRow::from(row))?;
    }
    csv.flush()?;

    Ok(())
}

pub fn csv_file_name(playlist_name: &str, now: DateTime<Local>) -> String {
    format!(
        "playlist_{}_{}.csv",
        sanitize_filename(playlist_name),
        now.format("%Y%m%d_%H%M")
    )
}

/// Replace characters most filesystems reject and squeeze whitespace.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if r#"\/:*?"<>|"#.contains(c) { '_' } else { c })
        .collect();
    let squeezed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if squeezed.is_empty() {
        "playlist".to_string()
    } else {
        squeezed
    }
}
