// Play history - what the streaming service recorded each time something played
// Records come in loose (every field optional); PlayEvent is the normalized form

pub mod loader; // reads exported history files from disk

pub use loader::load_history;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded play, normalized from a raw history record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub timestamp: Option<DateTime<Utc>>,
    pub listened_ms: u64, // milliseconds actually played, not track length
    pub artist: Option<String>,
    pub track: Option<String>,
    pub track_id: Option<String>, // catalog URI, e.g. spotify:track:...
    pub is_podcast_or_audiobook: bool,
}

impl PlayEvent {
    /// A music play with artist and title present.
    pub fn new(artist: &str, track: &str, listened_ms: u64) -> Self {
        Self {
            artist: Some(artist.to_string()),
            track: Some(track.to_string()),
            listened_ms,
            ..Self::default()
        }
    }

    pub fn with_track_id(mut self, track_id: &str) -> Self {
        self.track_id = Some(track_id.to_string());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Calendar year of the play (UTC), if the timestamp is known.
    pub fn year(&self) -> Option<i32> {
        self.timestamp.map(|ts| ts.year())
    }
}

/// Raw record shape of the extended streaming history export.
/// Unknown fields are ignored, missing ones become `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamingRecord {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub ms_played: Option<u64>,
    #[serde(default)]
    pub master_metadata_track_name: Option<String>,
    #[serde(default)]
    pub master_metadata_album_artist_name: Option<String>,
    #[serde(default)]
    pub spotify_track_uri: Option<String>,
    // Only presence matters for these two
    #[serde(default)]
    pub episode_name: Option<serde_json::Value>,
    #[serde(default)]
    pub audiobook_title: Option<serde_json::Value>,
}

impl From<StreamingRecord> for PlayEvent {
    fn from(record: StreamingRecord) -> Self {
        Self {
            timestamp: record.ts.as_deref().and_then(parse_timestamp),
            listened_ms: record.ms_played.unwrap_or(0),
            artist: record.master_metadata_album_artist_name,
            track: record.master_metadata_track_name,
            track_id: record.spotify_track_uri,
            is_podcast_or_audiobook: record.episode_name.is_some()
                || record.audiobook_title.is_some(),
        }
    }
}

/// Parse a history timestamp into UTC. Offsets are honoured; naive
/// timestamps are taken as UTC. Anything else counts as missing.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
