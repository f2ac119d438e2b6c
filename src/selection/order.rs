use std::cmp::Reverse;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::rank::RankedTrack;

/// One row of the final table, in playlist order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTrack {
    pub artist: String,
    pub track: String,
    pub track_id: Option<String>,
    pub track_total_ms: u64,
    pub artist_total_ms: u64,
    pub rank_in_artist: usize,
}

impl From<RankedTrack<'_>> for SelectedTrack {
    fn from(ranked: RankedTrack<'_>) -> Self {
        Self {
            artist: ranked.track.artist.to_string(),
            track: ranked.track.track.to_string(),
            track_id: ranked.track.track_id.map(str::to_string),
            track_total_ms: ranked.track.total_ms,
            artist_total_ms: ranked.artist_total_ms,
            rank_in_artist: ranked.rank_in_artist,
        }
    }
}

/// Final order: artist total descending, then rank within artist.
/// Stable, so rows with equal keys stay as the ranker left them.
pub fn order_rows(mut rows: Vec<RankedTrack<'_>>) -> Vec<SelectedTrack> {
    rows.sort_by_key(|r| (Reverse(r.artist_total_ms), r.rank_in_artist));
    rows.into_iter().map(SelectedTrack::from).collect()
}

/// Track ids in table order, each once, at its first position.
/// Rows without an id are skipped.
pub fn dedup_track_uris(rows: &[SelectedTrack]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut uris = Vec::new();

    for id in rows.iter().filter_map(|row| row.track_id.as_deref()) {
        if seen.insert(id) {
            uris.push(id.to_string());
        } else {
            debug!("Dropping repeated track id {}", id);
        }
    }

    info!("Final track count: {} ({} rows)", uris.len(), rows.len());
    uris
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::aggregate::TrackTotal;

    fn ranked<'a>(
        artist: &'a str,
        track_id: Option<&'a str>,
        artist_total_ms: u64,
        rank_in_artist: usize,
    ) -> RankedTrack<'a> {
        RankedTrack {
            track: TrackTotal {
                artist,
                track: "t",
                track_id,
                total_ms: 1,
            },
            artist_rank: 0,
            artist_total_ms,
            rank_in_artist,
        }
    }

    fn row(artist: &str, track_id: Option<&str>) -> SelectedTrack {
        SelectedTrack {
            artist: artist.to_string(),
            track: "t".to_string(),
            track_id: track_id.map(str::to_string),
            track_total_ms: 1,
            artist_total_ms: 1,
            rank_in_artist: 1,
        }
    }

    #[test]
    fn test_order_by_artist_total_then_rank() {
        let rows = vec![
            ranked("Low", Some("l1"), 10, 1),
            ranked("High", Some("h2"), 90, 2),
            ranked("High", Some("h1"), 90, 1),
        ];

        let ordered: Vec<_> = order_rows(rows)
            .into_iter()
            .map(|r| r.track_id.unwrap())
            .collect();
        assert_eq!(ordered, vec!["h1", "h2", "l1"]);
    }

    #[test]
    fn test_equal_keys_keep_prior_order() {
        let rows = vec![
            ranked("A", Some("a1"), 50, 1),
            ranked("B", Some("b1"), 50, 1),
            ranked("A", Some("a2"), 50, 2),
            ranked("B", Some("b2"), 50, 2),
        ];

        let ordered: Vec<_> = order_rows(rows)
            .into_iter()
            .map(|r| r.track_id.unwrap())
            .collect();
        assert_eq!(ordered, vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn test_dedup_keeps_first_position() {
        let rows = vec![
            row("A", Some("u1")),
            row("A", None),
            row("B", Some("u2")),
            row("B (remaster tag)", Some("u1")),
            row("C", Some("u3")),
        ];

        assert_eq!(dedup_track_uris(&rows), vec!["u1", "u2", "u3"]);
    }

    #[test]
    fn test_dedup_all_missing_ids() {
        let rows = vec![row("A", None), row("B", None)];
        assert!(dedup_track_uris(&rows).is_empty());
        assert!(dedup_track_uris(&[]).is_empty());
    }
}
