use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::info;

use super::filter::MusicPlay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtistTotal<'a> {
    pub artist: &'a str,
    pub total_ms: u64,
}

/// Listening time for one (artist, track, track_id) combination.
/// The same title under a different id is a separate total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackTotal<'a> {
    pub artist: &'a str,
    pub track: &'a str,
    pub track_id: Option<&'a str>,
    pub total_ms: u64,
}

/// Both groupings, each in order of first appearance in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals<'a> {
    pub artists: Vec<ArtistTotal<'a>>,
    pub tracks: Vec<TrackTotal<'a>>,
}

pub fn aggregate<'a>(plays: &[MusicPlay<'a>]) -> Totals<'a> {
    let artists = sum_in_first_seen_order(plays.iter().map(|p| (p.artist, p.listened_ms)))
        .into_iter()
        .map(|(artist, total_ms)| ArtistTotal { artist, total_ms })
        .collect::<Vec<_>>();

    let tracks = sum_in_first_seen_order(
        plays
            .iter()
            .map(|p| ((p.artist, p.track, p.track_id), p.listened_ms)),
    )
    .into_iter()
    .map(|((artist, track, track_id), total_ms)| TrackTotal {
        artist,
        track,
        track_id,
        total_ms,
    })
    .collect::<Vec<_>>();

    info!(
        "Aggregated {} plays into {} artists and {} tracks",
        plays.len(),
        artists.len(),
        tracks.len()
    );
    Totals { artists, tracks }
}

// Exact key equality, no normalization
fn sum_in_first_seen_order<K>(items: impl Iterator<Item = (K, u64)>) -> Vec<(K, u64)>
where
    K: Eq + Hash + Copy,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut sums: Vec<(K, u64)> = Vec::new();

    for (key, ms) in items {
        match index.entry(key) {
            Entry::Occupied(slot) => sums[*slot.get()].1 += ms,
            Entry::Vacant(slot) => {
                slot.insert(sums.len());
                sums.push((key, ms));
            }
        }
    }

    sums
}
