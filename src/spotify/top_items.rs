use chrono::{DateTime, Utc};
use rspotify::model::TimeRange;
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{SpotifyApi, TopArtist, TopTrack};
use crate::{
    cache::TimedCache,
    error::{ApiError, FetchError},
    session::Session,
};

/// Spotify never returns more than one page of 50 here.
pub const TOP_ITEMS_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumString)]
pub enum EntityType {
    #[strum(serialize = "track")]
    Track,
    #[strum(serialize = "artist")]
    Artist,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
pub enum TimeWindow {
    #[default]
    #[strum(serialize = "all-time")]
    AllTime,
    #[strum(serialize = "last-6-months")]
    SixMonths,
    #[strum(serialize = "last-month")]
    OneMonth,
}

impl TimeWindow {
    pub fn api_range(self) -> TimeRange {
        match self {
            TimeWindow::AllTime => TimeRange::LongTerm,
            TimeWindow::SixMonths => TimeRange::MediumTerm,
            TimeWindow::OneMonth => TimeRange::ShortTerm,
        }
    }

    /// The `time_range` value Spotify expects.
    pub fn api_name(self) -> &'static str {
        match self {
            TimeWindow::AllTime => "long_term",
            TimeWindow::SixMonths => "medium_term",
            TimeWindow::OneMonth => "short_term",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TimeWindow::AllTime => "All Time",
            TimeWindow::SixMonths => "Last 6 Months",
            TimeWindow::OneMonth => "Last Month",
        }
    }
}

pub fn cache_key(entity: EntityType, window: TimeWindow) -> String {
    format!("{entity}_{window}")
}

/// A choice in the wizard's selectors, independent of what it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOption {
    pub value: String,
    pub label: String,
}

impl From<&TopTrack> for SeedOption {
    fn from(track: &TopTrack) -> Self {
        let label = match track.artists.first() {
            Some(artist) => format!("{} - {}", track.name, artist),
            None => track.name.clone(),
        };
        SeedOption {
            value: track.id.clone(),
            label,
        }
    }
}

impl From<&TopArtist> for SeedOption {
    fn from(artist: &TopArtist) -> Self {
        SeedOption {
            value: artist.id.clone(),
            label: artist.name.clone(),
        }
    }
}

pub struct TopItemsFetcher {
    api: Arc<dyn SpotifyApi>,
    cache: TimedCache,
    ttl: Duration,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TopItemsFetcher {
    pub fn new(api: Arc<dyn SpotifyApi>, cache: TimedCache, ttl: Duration) -> Self {
        TopItemsFetcher {
            api,
            cache,
            ttl,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn top_tracks(
        &self,
        window: TimeWindow,
        session: &Session,
    ) -> Result<Vec<TopTrack>, FetchError> {
        self.top_tracks_at(window, session, Utc::now()).await
    }

    pub async fn top_tracks_at(
        &self,
        window: TimeWindow,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<TopTrack>, FetchError> {
        let token = session.access_token_at(now)?;
        let key = cache_key(EntityType::Track, window);
        self.read_through(&key, now, || {
            self.api.top_tracks(token, window, TOP_ITEMS_LIMIT)
        })
        .await
    }

    pub async fn top_artists(
        &self,
        window: TimeWindow,
        session: &Session,
    ) -> Result<Vec<TopArtist>, FetchError> {
        self.top_artists_at(window, session, Utc::now()).await
    }

    pub async fn top_artists_at(
        &self,
        window: TimeWindow,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<TopArtist>, FetchError> {
        let token = session.access_token_at(now)?;
        let key = cache_key(EntityType::Artist, window);
        self.read_through(&key, now, || {
            self.api.top_artists(token, window, TOP_ITEMS_LIMIT)
        })
        .await
    }

    /// Whatever is cached for the window, fresh or not.
    pub async fn cached_tracks(&self, window: TimeWindow) -> Option<Vec<TopTrack>> {
        let key = cache_key(EntityType::Track, window);
        self.cache.get(&key).await.map(|entry| entry.value)
    }

    pub async fn cached_artists(&self, window: TimeWindow) -> Option<Vec<TopArtist>> {
        let key = cache_key(EntityType::Artist, window);
        self.cache.get(&key).await.map(|entry| entry.value)
    }

    async fn read_through<T, F, Fut>(
        &self,
        key: &str,
        now: DateTime<Utc>,
        request: F,
    ) -> Result<Vec<T>, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ApiError>>,
    {
        // one request per key at a time; later callers find the cache filled
        let key_lock = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.entry(key.to_string()).or_default().clone()
        };
        let _guard = key_lock.lock().await;

        if let Some(entry) = self.cache.get::<Vec<T>>(key).await {
            if entry.is_fresh(self.ttl, now) {
                debug!("Cache hit for {key}");
                return Ok(entry.value);
            }
            debug!("Cache entry for {key} is stale");
        }

        let items = match request().await {
            Ok(items) => items,
            Err(e) => {
                warn!("Fetching {key} failed: {e}");
                return Err(e.into());
            }
        };
        info!("Fetched {} items for {key}", items.len());

        if let Err(e) = self.cache.put(key, &items).await {
            warn!("Could not cache {key}: {e}");
        }
        Ok(items)
    }
}
