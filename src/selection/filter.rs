use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::history::PlayEvent;

/// A play that survived the event filter: music, with artist and title known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicPlay<'a> {
    pub artist: &'a str,
    pub track: &'a str,
    pub track_id: Option<&'a str>,
    pub listened_ms: u64,
}

/// Inclusive year bounds; an unset side is unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

impl YearRange {
    pub fn new(start: Option<i32>, end: Option<i32>) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => {
                Err(Error::InvertedYearRange { start, end })
            }
            _ => Ok(()),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start.map_or(true, |start| year >= start) && self.end.map_or(true, |end| year <= end)
    }
}

/// Keep only music plays of at least `min_play_ms`, optionally within `years`.
///
/// When any year bound is set, plays without a usable timestamp are dropped too.
pub fn filter_music_plays<'a>(
    events: &'a [PlayEvent],
    min_play_ms: u64,
    years: &YearRange,
) -> Vec<MusicPlay<'a>> {
    let plays: Vec<MusicPlay<'a>> = events
        .iter()
        .filter(|event| !event.is_podcast_or_audiobook)
        .filter(|event| event.listened_ms >= min_play_ms)
        .filter(|event| !years.is_bounded() || event.year().map_or(false, |y| years.contains(y)))
        .filter_map(|event| {
            Some(MusicPlay {
                artist: event.artist.as_deref()?,
                track: event.track.as_deref()?,
                track_id: event.track_id.as_deref(),
                listened_ms: event.listened_ms,
            })
        })
        .collect();

    info!("Event filter: {} -> {} music plays", events.len(), plays.len());
    plays
}

/// What to do with plays whose artist matches a pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FilterMode {
    #[default]
    Exclude,
    Include, // keep matching artists only
}

impl FromStr for FilterMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exclude" => Ok(FilterMode::Exclude),
            "include" => Ok(FilterMode::Include),
            other => Err(Error::InvalidFilterMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for FilterMode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Exclude => write!(f, "exclude"),
            FilterMode::Include => write!(f, "include"),
        }
    }
}

/// Case-insensitive literal substring match against artist names.
#[derive(Debug, Clone, Default)]
pub struct ArtistFilter {
    patterns: Vec<String>,
    mode: FilterMode,
    matcher: Option<Regex>,
}

impl ArtistFilter {
    /// Build a filter from literal patterns. Empty strings are ignored;
    /// no patterns at all makes a pass-through filter.
    pub fn new(patterns: Vec<String>, mode: FilterMode) -> Result<Self> {
        let patterns: Vec<String> = patterns.into_iter().filter(|p| !p.is_empty()).collect();

        let matcher = if patterns.is_empty() {
            None
        } else {
            let alternation = patterns
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            Some(RegexBuilder::new(&alternation).case_insensitive(true).build()?)
        };

        Ok(Self {
            patterns,
            mode,
            matcher,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_active(&self) -> bool {
        self.matcher.is_some()
    }

    pub fn is_match(&self, artist: &str) -> bool {
        self.matcher.as_ref().map_or(false, |m| m.is_match(artist))
    }

    pub fn apply<'a>(&self, plays: Vec<MusicPlay<'a>>) -> Vec<MusicPlay<'a>> {
        if !self.is_active() {
            return plays;
        }

        let before = plays.len();
        let keep_matching = self.mode == FilterMode::Include;
        let kept: Vec<MusicPlay<'a>> = plays
            .into_iter()
            .filter(|play| self.is_match(play.artist) == keep_matching)
            .collect();

        match self.mode {
            FilterMode::Include => {
                info!("Artist include filter: {} -> {} (kept {})", before, kept.len(), kept.len())
            }
            FilterMode::Exclude => info!(
                "Artist exclude filter: {} -> {} (excluded {})",
                before,
                kept.len(),
                before - kept.len()
            ),
        }
        kept
    }
}
