use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{PlayEvent, StreamingRecord};

/// Events parsed from one history file, plus how many records were unusable.
#[derive(Debug, Default)]
pub struct HistoryFile {
    pub events: Vec<PlayEvent>,
    pub skipped: usize,
}

/// Load every `*.json` history file directly inside `source_dir`.
///
/// Files are read in path order. A file that can't be read or parsed is
/// skipped with a warning; the load only fails when nothing usable is left.
pub fn load_history<P: AsRef<Path>>(source_dir: P) -> Result<Vec<PlayEvent>> {
    let source_dir = source_dir.as_ref();
    info!("Loading play history from {}", source_dir.display());

    if !source_dir.is_dir() {
        bail!("Source directory not found: {}", source_dir.display());
    }

    let files = find_history_files(source_dir);
    if files.is_empty() {
        bail!("No JSON files found in: {}", source_dir.display());
    }

    let mut events = Vec::new();
    let mut readable = 0;

    for path in &files {
        match read_history_file(path) {
            Ok(file) => {
                info!("Read {} ... OK ({} rows)", file_name(path), file.events.len());
                if file.skipped > 0 {
                    warn!(
                        "Skipped {} malformed records in {}",
                        file.skipped,
                        path.display()
                    );
                }
                events.extend(file.events);
                readable += 1;
            }
            Err(e) => {
                warn!("Failed to read history file {}: {:#}", path.display(), e);
            }
        }
    }

    if readable == 0 {
        bail!("No readable JSON files in: {}", source_dir.display());
    }

    info!("Loaded {} play events from {} files", events.len(), readable);
    Ok(events)
}

fn find_history_files(source_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.into_path()),
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file() && is_json(path))
        .collect();

    files.sort();
    debug!("Found {} history files", files.len());
    files
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read a single history file from disk.
pub fn read_history_file(path: &Path) -> Result<HistoryFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_history(&content)
}

/// Parse the contents of one history file (a JSON array of records).
/// Records that don't fit the record shape are counted, not fatal.
pub fn parse_history(content: &str) -> Result<HistoryFile> {
    let content = content.trim_start_matches('\u{feff}');
    let values: Vec<serde_json::Value> =
        serde_json::from_str(content).context("Failed to parse history JSON")?;

    let mut file = HistoryFile::default();
    for value in values {
        match serde_json::from_value::<StreamingRecord>(value) {
            Ok(record) => file.events.push(record.into()),
            Err(_) => file.skipped += 1,
        }
    }

    Ok(file)
}
