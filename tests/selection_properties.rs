use std::collections::HashSet;

use mostplayed::selection::{filter_music_plays, ArtistFilter, FilterMode, YearRange};
use mostplayed::{select, PlayEvent, SelectedTrack, SelectionParams};
use proptest::prelude::*;

const ARTISTS: [&str; 5] = ["The Beatles", "beat happening", "Queen", "ABBA", "Muse"];
const TRACKS: [&str; 4] = ["One", "Two", "Three", "Four"];
const PATTERNS: [&str; 4] = ["beat", "QUEEN", "a", "x.y"];

fn arb_event() -> impl Strategy<Value = PlayEvent> {
    (0..ARTISTS.len(), 0..TRACKS.len(), 0..6usize, 0u64..120_000).prop_map(
        |(artist, track, id, ms)| {
            // few ids, so different tracks sometimes share one
            PlayEvent::new(ARTISTS[artist], TRACKS[track], ms)
                .with_track_id(&format!("spotify:track:{id}"))
        },
    )
}

fn arb_events() -> impl Strategy<Value = Vec<PlayEvent>> {
    proptest::collection::vec(arb_event(), 0..60)
}

fn params(top_artists: usize, tracks_per_artist: usize, floor: Option<u64>) -> SelectionParams {
    SelectionParams {
        top_artists,
        tracks_per_artist,
        min_play_ms: 10_000,
        min_track_total_ms: floor,
        ..SelectionParams::default()
    }
}

// Every generated event carries an id, so an empty outcome means no rows
fn rows(events: &[PlayEvent], params: &SelectionParams) -> Vec<SelectedTrack> {
    select(events, params).map(|s| s.rows).unwrap_or_default()
}

proptest! {
    #[test]
    fn same_input_same_output(events in arb_events(), top in 0usize..6, per in 0usize..5) {
        let params = params(top, per, None);
        let first = select(&events, &params);
        let second = select(&events, &params);

        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "runs disagreed"),
        }
    }

    #[test]
    fn more_artists_never_drops_an_artist(events in arb_events(), top in 0usize..5, extra in 1usize..3) {
        let small: HashSet<String> = rows(&events, &params(top, 3, None)).into_iter().map(|r| r.artist).collect();
        let large: HashSet<String> = rows(&events, &params(top + extra, 3, None)).into_iter().map(|r| r.artist).collect();

        prop_assert!(small.is_subset(&large));
    }

    #[test]
    fn more_tracks_never_drops_a_track(events in arb_events(), per in 0usize..4, extra in 1usize..3) {
        let key = |r: SelectedTrack| (r.artist, r.track, r.track_id);
        let small: HashSet<_> = rows(&events, &params(3, per, None)).into_iter().map(key).collect();
        let large: HashSet<_> = rows(&events, &params(3, per + extra, None)).into_iter().map(key).collect();

        prop_assert!(small.is_subset(&large));
    }

    #[test]
    fn floor_holds_for_every_row(events in arb_events(), floor in 0u64..200_000) {
        for row in rows(&events, &params(5, 4, Some(floor))) {
            prop_assert!(row.track_total_ms > floor);
        }
    }

    #[test]
    fn table_is_sorted_artist_major(events in arb_events()) {
        let rows = rows(&events, &params(5, 4, None));
        for pair in rows.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.artist_total_ms > b.artist_total_ms
                    || (a.artist_total_ms == b.artist_total_ms && a.rank_in_artist <= b.rank_in_artist)
            );
        }
    }

    #[test]
    fn each_id_published_once_at_first_position(events in arb_events()) {
        if let Ok(selection) = select(&events, &params(5, 4, None)) {
            let mut expected = Vec::new();
            for id in selection.rows.iter().filter_map(|r| r.track_id.clone()) {
                if !expected.contains(&id) {
                    expected.push(id);
                }
            }
            prop_assert_eq!(selection.track_uris, expected);
        }
    }

    #[test]
    fn pattern_filter_respects_mode(
        events in arb_events(),
        picks in proptest::collection::vec(0..PATTERNS.len(), 1..3),
        include in any::<bool>(),
    ) {
        let patterns: Vec<String> = picks.iter().map(|&i| PATTERNS[i].to_string()).collect();
        let mode = if include { FilterMode::Include } else { FilterMode::Exclude };
        let filter = ArtistFilter::new(patterns.clone(), mode).unwrap();

        let plays = filter.apply(filter_music_plays(&events, 0, &YearRange::default()));
        for play in plays {
            let artist = play.artist.to_lowercase();
            let matched = patterns.iter().any(|p| artist.contains(&p.to_lowercase()));
            prop_assert_eq!(matched, include);
        }
    }
}
