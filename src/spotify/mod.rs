// Spotify integration - publishes the selection as a brand new playlist
// Auth is either a ready access token or a refresh-token grant, both from the environment

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

const API_BASE: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Most items the API accepts per add request.
pub const ADD_ITEMS_CHUNK: usize = 100;
pub const DESCRIPTION_LIMIT: usize = 300;
const CHUNK_PAUSE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    AccessToken(String),
    RefreshToken {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `SPOTIFY_ACCESS_TOKEN` wins; otherwise all three refresh variables are needed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("SPOTIFY_ACCESS_TOKEN") {
            return Ok(Credentials::AccessToken(token));
        }

        match (
            get("SPOTIFY_CLIENT_ID"),
            get("SPOTIFY_CLIENT_SECRET"),
            get("SPOTIFY_REFRESH_TOKEN"),
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Ok(Credentials::RefreshToken {
                    client_id,
                    client_secret,
                    refresh_token,
                })
            }
            _ => Err(anyhow::anyhow!(
                "Spotify credentials missing: set SPOTIFY_ACCESS_TOKEN, or SPOTIFY_CLIENT_ID, \
                 SPOTIFY_CLIENT_SECRET and SPOTIFY_REFRESH_TOKEN"
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct NewPlaylist<'a> {
    name: &'a str,
    description: &'a str,
    public: bool,
}

#[derive(Debug, Serialize)]
struct AddItems<'a> {
    uris: &'a [String],
}

pub struct SpotifyClient {
    http: reqwest::Client,
    access_token: String,
}

impl SpotifyClient {
    pub async fn connect(credentials: Credentials) -> Result<Self> {
        let http = reqwest::Client::new();

        let access_token = match credentials {
            Credentials::AccessToken(token) => token,
            Credentials::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
            } => {
                let response: TokenResponse = http
                    .post(TOKEN_URL)
                    .basic_auth(client_id, Some(client_secret))
                    .form(&[
                        ("grant_type", "refresh_token"),
                        ("refresh_token", refresh_token.as_str()),
                    ])
                    .send()
                    .await
                    .context("Spotify token request failed")?
                    .error_for_status()
                    .context("Spotify rejected the refresh token")?
                    .json()
                    .await
                    .context("Unexpected Spotify token response")?;
                response.access_token
            }
        };

        Ok(Self { http, access_token })
    }

    pub async fn current_user(&self) -> Result<SpotifyUser> {
        let user = self
            .http
            .get(format!("{API_BASE}/me"))
            .bearer_auth(&self.access_token)
            .send()
            .await?
            .error_for_status()
            .context("Failed to fetch the current Spotify user")?
            .json()
            .await?;
        Ok(user)
    }

    pub async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<SpotifyPlaylist> {
        let body = NewPlaylist {
            name,
            description: truncate_description(description, DESCRIPTION_LIMIT),
            public,
        };

        let playlist = self
            .http
            .post(format!("{API_BASE}/users/{user_id}/playlists"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("Failed to create playlist '{}'", name))?
            .json()
            .await?;
        Ok(playlist)
    }

    /// Append `uris` in API-sized chunks, pausing between requests.
    pub async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let total = uris.len();
        let mut added = 0;

        for batch in add_batches(uris) {
            if batch.pause_first {
                tokio::time::sleep(CHUNK_PAUSE).await;
            }

            self.http
                .post(format!("{API_BASE}/playlists/{playlist_id}/tracks"))
                .bearer_auth(&self.access_token)
                .json(&AddItems { uris: batch.uris })
                .send()
                .await?
                .error_for_status()
                .with_context(|| format!("Failed to add tracks {}..{}", added, added + batch.uris.len()))?;

            added += batch.uris.len();
            info!("Adding tracks... {}/{}", added, total);
        }

        info!("Tracks added: {}", total);
        Ok(())
    }

    /// Create a playlist for the current user and fill it. Same name always
    /// creates another playlist. Returns the playlist's web link if given.
    pub async fn publish_playlist(
        &self,
        name: &str,
        description: &str,
        uris: &[String],
        public: bool,
    ) -> Result<Option<String>> {
        let me = self.current_user().await?;
        info!(
            "Authenticated as {} ({})",
            me.display_name.as_deref().unwrap_or(&me.id),
            me.id
        );

        let playlist = self.create_playlist(&me.id, name, description, public).await?;
        info!("Created playlist '{}' ({})", name, playlist.id);

        self.add_tracks(&playlist.id, uris).await?;
        Ok(playlist.external_urls.spotify)
    }
}

/// One add-items request: up to [`ADD_ITEMS_CHUNK`] uris, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddBatch<'a> {
    /// Wait `CHUNK_PAUSE` before sending. Never set on the first batch.
    pub pause_first: bool,
    pub uris: &'a [String],
}

/// Split `uris` into the requests `add_tracks` sends.
pub fn add_batches(uris: &[String]) -> impl Iterator<Item = AddBatch<'_>> {
    uris.chunks(ADD_ITEMS_CHUNK)
        .enumerate()
        .map(|(i, uris)| AddBatch {
            pause_first: i > 0,
            uris,
        })
}

/// Cut to at most `limit` characters, never inside a character.
pub fn truncate_description(description: &str, limit: usize) -> &str {
    match description.char_indices().nth(limit) {
        Some((idx, _)) => &description[..idx],
        None => description,
    }
}
