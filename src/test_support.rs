use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use crate::{
    error::ApiError,
    handoff::Seed,
    spotify::{
        top_items::TimeWindow, RecommendedTrack, SpotifyApi, TopArtist, TopTrack, UserProfile,
    },
};

pub fn sample_tracks(n: usize) -> Vec<TopTrack> {
    (0..n)
        .map(|i| TopTrack {
            id: format!("track{i}"),
            name: format!("Song {i}"),
            artists: vec![format!("Artist {i}"), "Guest".to_string()],
            album: format!("Album {i}"),
            uri: format!("spotify:track:track{i}"),
        })
        .collect()
}

pub fn sample_artists(n: usize) -> Vec<TopArtist> {
    (0..n)
        .map(|i| TopArtist {
            id: format!("artist{i}"),
            name: format!("Artist {i}"),
            genres: vec!["indie".to_string()],
            popularity: 50,
            uri: format!("spotify:artist:artist{i}"),
        })
        .collect()
}

pub fn sample_recommendations(n: usize) -> Vec<RecommendedTrack> {
    (0..n)
        .map(|i| RecommendedTrack {
            id: Some(format!("rec{i}")),
            name: format!("Recommended {i}"),
            artists: vec!["A".to_string(), "B".to_string()],
        })
        .collect()
}

/// Scripted [`SpotifyApi`] that records what it was asked.
pub struct MockApi {
    tracks: Vec<TopTrack>,
    artists: Vec<TopArtist>,
    recommendations: Vec<RecommendedTrack>,
    failure: Option<ApiError>,
    /// Top-item calls that fail before the mock turns healthy.
    failures_left: AtomicUsize,
    top_calls: AtomicUsize,
    recommendation_calls: AtomicUsize,
    last_window: Mutex<Option<TimeWindow>>,
    last_limit: Mutex<Option<u32>>,
    last_seed: Mutex<Option<Seed>>,
}

impl MockApi {
    pub fn with_items(tracks: usize, artists: usize) -> Self {
        MockApi {
            tracks: sample_tracks(tracks),
            artists: sample_artists(artists),
            recommendations: sample_recommendations(3),
            failure: None,
            failures_left: AtomicUsize::new(0),
            top_calls: AtomicUsize::new(0),
            recommendation_calls: AtomicUsize::new(0),
            last_window: Mutex::new(None),
            last_limit: Mutex::new(None),
            last_seed: Mutex::new(None),
        }
    }

    pub fn failing(err: ApiError) -> Self {
        MockApi {
            failure: Some(err),
            ..MockApi::with_items(0, 0)
        }
    }

    /// Fails the first `failures` top-item calls, then serves the given items.
    pub fn flaky(failures: usize, tracks: usize, artists: usize) -> Self {
        MockApi {
            failures_left: AtomicUsize::new(failures),
            ..MockApi::with_items(tracks, artists)
        }
    }

    pub fn with_recommendations(mut self, n: usize) -> Self {
        self.recommendations = sample_recommendations(n);
        self
    }

    pub fn top_calls(&self) -> usize {
        self.top_calls.load(Ordering::SeqCst)
    }

    pub fn recommendation_calls(&self) -> usize {
        self.recommendation_calls.load(Ordering::SeqCst)
    }

    pub fn last_window(&self) -> Option<TimeWindow> {
        *self.last_window.lock().unwrap()
    }

    pub fn last_limit(&self) -> Option<u32> {
        *self.last_limit.lock().unwrap()
    }

    pub fn last_seed(&self) -> Option<Seed> {
        self.last_seed.lock().unwrap().clone()
    }

    fn record_top(&self, window: TimeWindow, limit: u32) {
        self.top_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_window.lock().unwrap() = Some(window);
        *self.last_limit.lock().unwrap() = Some(limit);
    }

    fn top_failure(&self) -> Option<ApiError> {
        if self.failure.is_some() {
            return self.failure.clone();
        }
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| ApiError::Transport("offline".to_string()))
    }
}

#[async_trait]
impl SpotifyApi for MockApi {
    async fn current_user(&self, _access_token: &str) -> Result<UserProfile, ApiError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(UserProfile {
                id: "listener".to_string(),
                display_name: Some("Test Listener".to_string()),
            }),
        }
    }

    async fn top_tracks(
        &self,
        _access_token: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<TopTrack>, ApiError> {
        self.record_top(window, limit);
        tokio::task::yield_now().await;
        match self.top_failure() {
            Some(err) => Err(err),
            None => Ok(self.tracks.clone()),
        }
    }

    async fn top_artists(
        &self,
        _access_token: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<TopArtist>, ApiError> {
        self.record_top(window, limit);
        tokio::task::yield_now().await;
        match self.top_failure() {
            Some(err) => Err(err),
            None => Ok(self.artists.clone()),
        }
    }

    async fn recommendations(
        &self,
        _access_token: &str,
        seed: &Seed,
        _limit: u32,
    ) -> Result<Vec<RecommendedTrack>, ApiError> {
        self.recommendation_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_seed.lock().unwrap() = Some(seed.clone());
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.recommendations.clone()),
        }
    }
}
