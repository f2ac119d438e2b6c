// Selection engine - turns play history into the ordered track list
// Filter -> aggregate -> pick artists -> rank their tracks -> order + dedup
// Pure and synchronous; every stage returns a fresh collection

pub mod aggregate; // per-artist and per-track listening totals
pub mod filter;    // music/duration/year filter + artist patterns
pub mod order;     // final table order and track id dedup
pub mod rank;      // stable top-N ranking shared by artists and tracks

pub use aggregate::{aggregate, ArtistTotal, TrackTotal, Totals};
pub use filter::{filter_music_plays, ArtistFilter, FilterMode, MusicPlay, YearRange};
pub use order::{dedup_track_uris, order_rows, SelectedTrack};
pub use rank::{rank_tracks, rank_within, select_top_artists, Ranked, RankedTrack};

use tracing::info;

use crate::error::{Error, Result};
use crate::history::PlayEvent;

/// Knobs for one selection run.
#[derive(Debug, Clone)]
pub struct SelectionParams {
    pub top_artists: usize,
    pub tracks_per_artist: usize,
    pub min_play_ms: u64,
    pub min_track_total_ms: Option<u64>,
    pub years: YearRange,
    pub artist_filter: ArtistFilter,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            top_artists: 30,
            tracks_per_artist: 5,
            min_play_ms: 30_000,
            min_track_total_ms: None,
            years: YearRange::default(),
            artist_filter: ArtistFilter::default(),
        }
    }
}

impl SelectionParams {
    /// Checks run before any data is looked at.
    pub fn validate(&self) -> Result<()> {
        self.years.validate()
    }
}

/// Row counts going in and out of each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub events: usize,
    pub music_plays: usize,
    pub after_patterns: usize,
    pub artists: usize,
    pub tracks: usize,
    pub selected_artists: usize,
    pub rows: usize,
    pub track_uris: usize,
}

/// Result of a run: the ordered table plus the playlist's track ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub rows: Vec<SelectedTrack>,
    pub track_uris: Vec<String>,
    pub counts: StageCounts,
}

/// Run the whole pipeline over `events`.
///
/// Fails with a config error before touching the data if `params` are
/// invalid, with [`Error::NoMusicPlays`] when the event filter leaves
/// nothing, and with [`Error::NothingToPublish`] when no track id survives.
pub fn select(events: &[PlayEvent], params: &SelectionParams) -> Result<Selection> {
    params.validate()?;

    let mut counts = StageCounts {
        events: events.len(),
        ..StageCounts::default()
    };

    let plays = filter_music_plays(events, params.min_play_ms, &params.years);
    counts.music_plays = plays.len();
    if plays.is_empty() {
        return Err(Error::NoMusicPlays {
            total_events: events.len(),
        });
    }

    let plays = params.artist_filter.apply(plays);
    counts.after_patterns = plays.len();

    let totals = aggregate(&plays);
    counts.artists = totals.artists.len();
    counts.tracks = totals.tracks.len();

    let top = select_top_artists(totals.artists, params.top_artists);
    counts.selected_artists = top.len();

    let ranked = rank_tracks(
        totals.tracks,
        &top,
        params.tracks_per_artist,
        params.min_track_total_ms,
    );
    let rows = order_rows(ranked);
    counts.rows = rows.len();

    let track_uris = dedup_track_uris(&rows);
    counts.track_uris = track_uris.len();

    info!(?counts, "Selection finished");

    if track_uris.is_empty() {
        return Err(Error::NothingToPublish { rows: rows.len() });
    }

    Ok(Selection {
        rows,
        track_uris,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri_play(artist: &str, track: &str, ms: u64) -> PlayEvent {
        PlayEvent::new(artist, track, ms).with_track_id(&format!("spotify:track:{artist}-{track}"))
    }

    #[test]
    fn test_inverted_years_fail_before_filtering() {
        let params = SelectionParams {
            years: YearRange {
                start: Some(2024),
                end: Some(2023),
            },
            ..SelectionParams::default()
        };

        // Even an empty history reports the config problem, not "no data"
        let err = select(&[], &params).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_no_music_plays() {
        let events = vec![PlayEvent::new("A", "t", 1_000)];
        let err = select(&events, &SelectionParams::default()).unwrap_err();
        assert!(matches!(err, Error::NoMusicPlays { total_events: 1 }));
    }

    #[test]
    fn test_nothing_to_publish_without_ids() {
        let events = vec![PlayEvent::new("A", "t", 60_000)];
        let err = select(&events, &SelectionParams::default()).unwrap_err();
        assert!(matches!(err, Error::NothingToPublish { rows: 1 }));
    }

    #[test]
    fn test_counts_follow_stages() {
        let events = vec![
            uri_play("A", "a1", 60_000),
            uri_play("A", "a2", 40_000),
            uri_play("B", "b1", 50_000),
            uri_play("C", "c1", 1_000),
        ];
        let params = SelectionParams {
            top_artists: 1,
            tracks_per_artist: 1,
            ..SelectionParams::default()
        };

        let selection = select(&events, &params).unwrap();
        assert_eq!(
            selection.counts,
            StageCounts {
                events: 4,
                music_plays: 3,
                after_patterns: 3,
                artists: 2,
                tracks: 3,
                selected_artists: 1,
                rows: 1,
                track_uris: 1,
            }
        );
        assert_eq!(selection.track_uris, vec!["spotify:track:A-a1"]);
    }
}
