// mostplayed library - turns streaming history into a "most played artists" playlist
// The selection engine is pure; loading, export and publishing sit around it

pub mod config;    // settings file, CLI-overridable, artist pattern lists
pub mod error;     // config errors and empty-result conditions
pub mod export;    // CSV table of the selection
pub mod history;   // play events and the history file loader
pub mod selection; // filter, aggregate, rank, order, dedup
#[cfg(feature = "spotify")]
pub mod spotify;   // playlist publishing

// Export the stuff other modules actually use
pub use config::Config;
pub use error::{Error, Result};
pub use history::PlayEvent;
pub use selection::{select, SelectedTrack, Selection, SelectionParams};
