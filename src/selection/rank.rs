use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::info;

use super::aggregate::{ArtistTotal, TrackTotal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked<T> {
    pub item: T,
    pub rank: usize, // 1-based within its partition
}

/// Order `items` by `metric` descending and number them 1.. per partition.
///
/// The sort is stable: equal metrics keep their input order, so ties go to
/// whatever came first. Output is in sorted order, partitions interleaved.
pub fn rank_within<T, P, F, M>(mut items: Vec<T>, partition: F, metric: M) -> Vec<Ranked<T>>
where
    P: Eq + Hash,
    F: Fn(&T) -> P,
    M: Fn(&T) -> u64,
{
    items.sort_by_key(|item| Reverse(metric(item)));

    let mut counters: HashMap<P, usize> = HashMap::new();
    items
        .into_iter()
        .map(|item| {
            let counter = counters.entry(partition(&item)).or_insert(0);
            *counter += 1;
            Ranked {
                rank: *counter,
                item,
            }
        })
        .collect()
}

/// Top `top_artists` artists by total listening time.
pub fn select_top_artists<'a>(
    artists: Vec<ArtistTotal<'a>>,
    top_artists: usize,
) -> Vec<Ranked<ArtistTotal<'a>>> {
    let total = artists.len();
    let selected: Vec<_> = rank_within(artists, |_| (), |a| a.total_ms)
        .into_iter()
        .take(top_artists)
        .collect();

    info!("Top artists selected: {} of {}", selected.len(), total);
    selected
}

/// A track that made its artist's cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedTrack<'a> {
    pub track: TrackTotal<'a>,
    pub artist_rank: usize,
    pub artist_total_ms: u64,
    pub rank_in_artist: usize,
}

/// Rank each selected artist's tracks and keep the top `tracks_per_artist`.
///
/// `min_track_total_ms` is applied to all tracks before ranking; a track
/// must play strictly longer than the floor to stay. Tracks of artists not
/// in `artists` are dropped. Result is grouped by artist rank, then track rank.
pub fn rank_tracks<'a>(
    tracks: Vec<TrackTotal<'a>>,
    artists: &[Ranked<ArtistTotal<'a>>],
    tracks_per_artist: usize,
    min_track_total_ms: Option<u64>,
) -> Vec<RankedTrack<'a>> {
    let mut tracks = tracks;

    if let Some(floor) = min_track_total_ms {
        let before = tracks.len();
        tracks.retain(|t| t.total_ms > floor);
        info!("Track total floor: {} -> {} (> {} ms)", before, tracks.len(), floor);
    }

    let selected: HashMap<&str, (usize, u64)> = artists
        .iter()
        .map(|a| (a.item.artist, (a.rank, a.item.total_ms)))
        .collect();
    tracks.retain(|t| selected.contains_key(t.artist));

    let mut ranked: Vec<RankedTrack<'a>> = rank_within(tracks, |t| t.artist, |t| t.total_ms)
        .into_iter()
        .filter(|r| r.rank <= tracks_per_artist)
        .filter_map(|r| {
            let (artist_rank, artist_total_ms) = *selected.get(r.item.artist)?;
            Some(RankedTrack {
                track: r.item,
                artist_rank,
                artist_total_ms,
                rank_in_artist: r.rank,
            })
        })
        .collect();

    ranked.sort_by_key(|r| (r.artist_rank, r.rank_in_artist));

    info!(
        "Ranked tracks kept: {} (up to {} per artist)",
        ranked.len(),
        tracks_per_artist
    );
    ranked
}
