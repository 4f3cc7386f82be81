use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use super::{RecommendedTrack, SpotifyApi};
use crate::{error::FetchError, handoff::RecommendationQuery, session::Session};

pub const RECOMMENDATION_LIMIT: u32 = 20;

pub struct RecommendationFetcher {
    api: Arc<dyn SpotifyApi>,
}

impl RecommendationFetcher {
    pub fn new(api: Arc<dyn SpotifyApi>) -> Self {
        RecommendationFetcher { api }
    }

    pub async fn fetch(
        &self,
        query: &RecommendationQuery,
        session: &Session,
    ) -> Result<Vec<RecommendedTrack>, FetchError> {
        self.fetch_at(query, session, Utc::now()).await
    }

    pub async fn fetch_at(
        &self,
        query: &RecommendationQuery,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<RecommendedTrack>, FetchError> {
        let token = session.access_token_at(now)?;
        match self
            .api
            .recommendations(token, &query.seed, RECOMMENDATION_LIMIT)
            .await
        {
            Ok(tracks) => {
                info!(
                    "Got {} recommendations for {} seeds",
                    tracks.len(),
                    query.seed_type()
                );
                Ok(tracks)
            }
            Err(e) => {
                warn!("Error fetching recommendations: {e}");
                Err(e.into())
            }
        }
    }
}
