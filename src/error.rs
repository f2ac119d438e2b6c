// Error types for the selection engine
// Two families: bad configuration (caught before any data is touched)
// and empty results (expected, but terminal for a run)

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Unknown artist filter mode
    #[error("artists_filter_mode must be 'exclude' or 'include' (got '{0}')")]
    InvalidFilterMode(String),

    #[error("Invalid year range: year_start({start}) must be <= year_end({end})")]
    InvertedYearRange { start: i32, end: i32 },

    /// Pattern set could not be compiled into a matcher
    #[error("Invalid artist patterns: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Artists filter file not found: {}", .0.display())]
    PatternFileNotFound(PathBuf),

    #[error("Failed to read artists filter file {}: {source}", .path.display())]
    PatternFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Nothing left after the event filter
    #[error("No valid music rows after filtering ({total_events} events read)")]
    NoMusicPlays { total_events: usize },

    /// Selection produced no usable track URIs
    #[error("No valid track URIs to add ({rows} rows selected)")]
    NothingToPublish { rows: usize },
}

impl Error {
    /// True for errors raised before any data is processed.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::InvalidFilterMode(_)
                | Error::InvertedYearRange { .. }
                | Error::InvalidPattern(_)
                | Error::PatternFileNotFound(_)
                | Error::PatternFileRead { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(Error::InvalidFilterMode("both".into()).is_config());
        assert!(Error::InvertedYearRange { start: 2024, end: 2023 }.is_config());
        assert!(!Error::NoMusicPlays { total_events: 3 }.is_config());
        assert!(!Error::NothingToPublish { rows: 0 }.is_config());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = Error::InvertedYearRange { start: 2024, end: 2023 };
        assert_eq!(
            err.to_string(),
            "Invalid year range: year_start(2024) must be <= year_end(2023)"
        );

        let err = Error::NoMusicPlays { total_events: 12 };
        assert!(err.to_string().contains("12 events"));
    }
}
