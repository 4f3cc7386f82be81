use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use rspotify::{
    clients::{BaseClient, OAuthClient},
    http::HttpError,
    model::{ArtistId, FullArtist, FullTrack, SimplifiedTrack, TrackId},
    prelude::*,
    scopes, AuthCodePkceSpotify, AuthCodeSpotify, ClientError, Config as SpotifyConfig,
    Credentials, OAuth, Token,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    cache::KeyValueStore,
    config::Config,
    error::ApiError,
    handoff::Seed,
    session::{Session, TOKEN_CACHE_KEY},
};

use self::top_items::TimeWindow;

pub mod auth;
pub mod recommendations;
pub mod top_items;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopArtist {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub popularity: u32,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedTrack {
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<String>,
}

impl RecommendedTrack {
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
}

impl UserProfile {
    /// The display name, or the account id when none is set.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.id)
    }
}

/// The Spotify endpoints the dashboard reads, authorized by a bearer token.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    async fn current_user(&self, access_token: &str) -> Result<UserProfile, ApiError>;

    async fn top_tracks(
        &self,
        access_token: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<TopTrack>, ApiError>;

    async fn top_artists(
        &self,
        access_token: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<TopArtist>, ApiError>;

    async fn recommendations(
        &self,
        access_token: &str,
        seed: &Seed,
        limit: u32,
    ) -> Result<Vec<RecommendedTrack>, ApiError>;
}

/// [`SpotifyApi`] backed by rspotify. Each call runs on a client holding only the
/// given access token, so nothing is refreshed behind the session's back.
#[derive(Default)]
pub struct RspotifyApi;

impl RspotifyApi {
    pub fn new() -> Self {
        RspotifyApi
    }

    fn client(access_token: &str) -> AuthCodeSpotify {
        AuthCodeSpotify::from_token(Token {
            access_token: access_token.to_string(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl SpotifyApi for RspotifyApi {
    async fn current_user(&self, access_token: &str) -> Result<UserProfile, ApiError> {
        debug!("GET me");
        let user = Self::client(access_token).me().await.map_err(api_error)?;
        Ok(UserProfile {
            id: user.id.id().to_string(),
            display_name: user.display_name,
        })
    }

    async fn top_tracks(
        &self,
        access_token: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<TopTrack>, ApiError> {
        debug!("GET top tracks time_range={} limit={limit}", window.api_name());
        let sp = Self::client(access_token);
        let page = sp
            .current_user_top_tracks_manual(Some(window.api_range()), Some(limit), Some(0))
            .await
            .map_err(api_error)?;
        Ok(page.items.into_iter().filter_map(top_track).collect())
    }

    async fn top_artists(
        &self,
        access_token: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<TopArtist>, ApiError> {
        debug!("GET top artists time_range={} limit={limit}", window.api_name());
        let sp = Self::client(access_token);
        let page = sp
            .current_user_top_artists_manual(Some(window.api_range()), Some(limit), Some(0))
            .await
            .map_err(api_error)?;
        Ok(page.items.into_iter().map(top_artist).collect())
    }

    async fn recommendations(
        &self,
        access_token: &str,
        seed: &Seed,
        limit: u32,
    ) -> Result<Vec<RecommendedTrack>, ApiError> {
        let seed_artists = seed
            .artist_ids()
            .iter()
            .map(|id| ArtistId::from_id(id.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::InvalidId(e.to_string()))?;
        let seed_tracks = seed
            .track_ids()
            .iter()
            .map(|id| TrackId::from_id(id.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::InvalidId(e.to_string()))?;

        let sp = Self::client(access_token);
        let recommendations = sp
            .recommendations(
                std::iter::empty(),
                (!seed_artists.is_empty()).then_some(seed_artists),
                None::<Vec<&str>>,
                (!seed_tracks.is_empty()).then_some(seed_tracks),
                None,
                Some(limit),
            )
            .await
            .map_err(api_error)?;
        Ok(recommendations
            .tracks
            .into_iter()
            .map(recommended_track)
            .collect())
    }
}

fn top_track(track: FullTrack) -> Option<TopTrack> {
    // local files have no id and cannot seed anything
    let id = track.id?;
    Some(TopTrack {
        id: id.id().to_string(),
        uri: id.uri(),
        name: track.name,
        artists: track.artists.into_iter().map(|a| a.name).collect(),
        album: track.album.name,
    })
}

fn top_artist(artist: FullArtist) -> TopArtist {
    TopArtist {
        id: artist.id.id().to_string(),
        uri: artist.id.uri(),
        name: artist.name,
        genres: artist.genres,
        popularity: artist.popularity,
    }
}

fn recommended_track(track: SimplifiedTrack) -> RecommendedTrack {
    RecommendedTrack {
        id: track.id.map(|id| id.id().to_string()),
        name: track.name,
        artists: track.artists.into_iter().map(|a| a.name).collect(),
    }
}

fn api_error(err: ClientError) -> ApiError {
    match err {
        ClientError::Http(http) => match http.as_ref() {
            HttpError::StatusCode(response) => match response.status().as_u16() {
                401 => ApiError::Unauthorized,
                code => ApiError::Status(code),
            },
            other => ApiError::Transport(other.to_string()),
        },
        ClientError::ParseJson(e) => ApiError::Decode(e.to_string()),
        other => ApiError::Transport(other.to_string()),
    }
}

// ── OAuth ──────────────────────────────────────────────────────────────────────

pub fn build_auth_client(config: &Config) -> AuthCodePkceSpotify {
    let creds = Credentials::new(&config.client_id, &config.client_secret);

    let oauth = OAuth {
        redirect_uri: config.redirect_uri.clone(),
        scopes: scopes!("user-read-email", "user-top-read"),
        ..Default::default()
    };

    // Sessions are single-shot: once the token runs out the user signs in again.
    let sp_config = SpotifyConfig {
        token_refreshing: false,
        ..Default::default()
    };

    AuthCodePkceSpotify::with_config(creds, oauth, sp_config)
}

/// Picks up a token cached by an earlier run, if it is still valid.
pub async fn restore_session(store: &Arc<dyn KeyValueStore>) -> Option<Session> {
    let token_json = match store.get(TOKEN_CACHE_KEY).await {
        Ok(Some(json)) => json,
        Ok(None) => return None,
        Err(e) => {
            warn!("Could not read cached token: {e}");
            return None;
        }
    };
    let token = match serde_json::from_str::<Token>(&token_json) {
        Ok(token) => token,
        Err(e) => {
            warn!("Discarding unreadable cached token: {e}");
            store.delete(TOKEN_CACHE_KEY).await.ok();
            return None;
        }
    };

    let now = Utc::now();
    let session = Session::from_token(&token, now);
    if session.is_expired_at(now) {
        info!("Cached token expired at {}", session.expires_at);
        store.delete(TOKEN_CACHE_KEY).await.ok();
        return None;
    }
    info!("Restored cached session");
    Some(session)
}

pub fn authorize_url(spotify: &mut AuthCodePkceSpotify) -> Result<String> {
    Ok(spotify.get_authorize_url(None)?)
}

pub async fn complete_auth(
    spotify: &AuthCodePkceSpotify,
    code: &str,
    state: &str,
    store: &Arc<dyn KeyValueStore>,
) -> Result<Session> {
    if state != spotify.oauth.state {
        bail!("OAuth state mismatch, refusing the redirect");
    }
    spotify.request_token(code).await?;

    let token = spotify
        .token
        .lock()
        .await
        .map_err(|_| anyhow!("token lock failed"))?
        .clone()
        .ok_or_else(|| anyhow!("Spotify returned no token"))?;

    let session = Session::from_token(&token, Utc::now());
    let token_json = serde_json::to_string(&token)?;
    if let Err(e) = store.set(TOKEN_CACHE_KEY, &token_json).await {
        warn!("Could not cache token: {e}");
    } else {
        info!("Token saved to cache");
    }

    Ok(session)
}
