// Configuration management for mostplayed
// TOML file with sensible defaults; command-line flags override it field by field

pub mod patterns; // artist pattern list files

pub use patterns::load_artist_patterns;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::selection::{ArtistFilter, FilterMode, SelectionParams, YearRange};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub selection: SelectionConfig,
    pub spotify: SpotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub top_artists: usize,
    pub tracks_per_artist: usize,
    pub min_play_ms: u64,
    pub min_track_total_ms: Option<u64>,
    pub year_start: Option<i32>,
    pub year_end: Option<i32>,
    pub artists_filter_file: Option<PathBuf>,
    pub artists_filter_mode: FilterMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub playlist_name: String,
    pub public: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./source_data"),
            output_dir: PathBuf::from("csv"),
            selection: SelectionConfig::default(),
            spotify: SpotifyConfig::default(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        let params = SelectionParams::default();
        Self {
            top_artists: params.top_artists,
            tracks_per_artist: params.tracks_per_artist,
            min_play_ms: params.min_play_ms,
            min_track_total_ms: None,
            year_start: None,
            year_end: None,
            artists_filter_file: None,
            artists_filter_mode: FilterMode::Exclude,
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            playlist_name: "My Most Played Artists".to_string(),
            public: true,
        }
    }
}

impl SelectionConfig {
    /// Validate and turn into engine parameters. Reads the pattern file if one is set.
    pub fn to_params(&self) -> crate::Result<SelectionParams> {
        let years = YearRange::new(self.year_start, self.year_end)?;

        let patterns = match &self.artists_filter_file {
            Some(path) => load_artist_patterns(path)?,
            None => Vec::new(),
        };
        let artist_filter = ArtistFilter::new(patterns, self.artists_filter_mode)?;

        Ok(SelectionParams {
            top_artists: self.top_artists,
            tracks_per_artist: self.tracks_per_artist,
            min_play_ms: self.min_play_ms,
            min_track_total_ms: self.min_track_total_ms,
            years,
            artist_filter,
        })
    }
}

impl Config {
    /// Load from the default location, writing defaults there on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("mostplayed");

        Ok(config_dir.join("config.toml"))
    }
}
