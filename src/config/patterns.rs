use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};

/// Read artist patterns: one per line, trimmed, blank and `#` lines ignored.
pub fn load_artist_patterns(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(Error::PatternFileNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| Error::PatternFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let patterns = parse_patterns(&content);

    info!(
        "Artist patterns: {} ({})",
        patterns.len(),
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    Ok(patterns)
}

pub fn parse_patterns(content: &str) -> Vec<String> {
    content
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_patterns() {
        let patterns = parse_patterns("# holiday stuff\nchristmas\n\n   \n  Mariah  \r\n#beatles\n");
        assert_eq!(patterns, vec!["christmas", "Mariah"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exclude.txt");
        fs::write(&path, "\u{feff}beatles\n# comment\nqueen\n").unwrap();

        assert_eq!(load_artist_patterns(&path).unwrap(), vec!["beatles", "queen"]);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = load_artist_patterns(&dir.path().join("nope.txt")).unwrap_err();

        assert!(matches!(err, Error::PatternFileNotFound(_)));
        assert!(err.is_config());
    }
}
