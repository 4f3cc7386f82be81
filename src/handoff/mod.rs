use std::{collections::HashMap, str::FromStr};

use crate::{
    error::HandoffError,
    wizard::{SeedType, MAX_SEEDS},
};

pub const HANDOFF_VERSION: u32 = 1;

const PARAM_VERSION: &str = "v";
const PARAM_OPTION: &str = "selectedOption";
const PARAM_SONGS: &str = "selectedSongs";
const PARAM_ARTISTS: &str = "selectedArtists";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
    Tracks(Vec<String>),
    Artists(Vec<String>),
}

impl Seed {
    pub fn seed_type(&self) -> SeedType {
        match self {
            Seed::Tracks(_) => SeedType::Track,
            Seed::Artists(_) => SeedType::Artist,
        }
    }

    pub fn track_ids(&self) -> &[String] {
        match self {
            Seed::Tracks(ids) => ids,
            Seed::Artists(_) => &[],
        }
    }

    pub fn artist_ids(&self) -> &[String] {
        match self {
            Seed::Artists(ids) => ids,
            Seed::Tracks(_) => &[],
        }
    }

    fn ids(&self) -> &[String] {
        match self {
            Seed::Tracks(ids) | Seed::Artists(ids) => ids,
        }
    }
}

/// Travels in the results location, e.g.
/// `v=1&selectedOption=track&selectedSongs=%5B%22id1%22%5D&selectedArtists=%5B%5D`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationQuery {
    pub seed: Seed,
}

impl RecommendationQuery {
    pub fn new(seed: Seed) -> Self {
        RecommendationQuery { seed }
    }

    pub fn seed_type(&self) -> SeedType {
        self.seed.seed_type()
    }

    pub fn track_ids(&self) -> &[String] {
        self.seed.track_ids()
    }

    pub fn artist_ids(&self) -> &[String] {
        self.seed.artist_ids()
    }

    pub fn encode(&self) -> String {
        format!(
            "{PARAM_VERSION}={HANDOFF_VERSION}&{PARAM_OPTION}={}&{PARAM_SONGS}={}&{PARAM_ARTISTS}={}",
            self.seed_type(),
            encode_ids(self.track_ids()),
            encode_ids(self.artist_ids()),
        )
    }

    pub fn decode(query: &str) -> Result<Self, HandoffError> {
        let params = parse_query(query)?;

        if let Some(raw) = params.get(PARAM_VERSION) {
            let version = raw.parse::<u32>().map_err(|e| HandoffError::Malformed {
                param: PARAM_VERSION,
                reason: e.to_string(),
            })?;
            if version != HANDOFF_VERSION {
                return Err(HandoffError::UnsupportedVersion(version));
            }
        }

        let option = params
            .get(PARAM_OPTION)
            .ok_or(HandoffError::MissingParam(PARAM_OPTION))?;
        let songs = decode_ids(&params, PARAM_SONGS)?;
        let artists = decode_ids(&params, PARAM_ARTISTS)?;

        if option.is_empty() {
            return Err(HandoffError::MissingParam(PARAM_OPTION));
        }
        let seed_type = SeedType::from_str(option)
            .map_err(|_| HandoffError::UnknownSeedType(option.clone()))?;

        let seed = match seed_type {
            SeedType::Track => Seed::Tracks(songs),
            SeedType::Artist => Seed::Artists(artists),
        };
        let count = seed.ids().len();
        if count == 0 {
            return Err(HandoffError::EmptySeed(seed_type));
        }
        if count > MAX_SEEDS {
            return Err(HandoffError::TooManySeeds {
                count,
                max: MAX_SEEDS,
            });
        }
        Ok(RecommendationQuery { seed })
    }
}

fn encode_ids(ids: &[String]) -> String {
    // serializing a list of strings cannot fail
    let json = serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string());
    urlencoding::encode(&json).into_owned()
}

fn decode_ids(
    params: &HashMap<String, String>,
    param: &'static str,
) -> Result<Vec<String>, HandoffError> {
    let raw = params.get(param).ok_or(HandoffError::MissingParam(param))?;
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| HandoffError::Malformed {
        param,
        reason: e.to_string(),
    })
}

fn parse_query(query: &str) -> Result<HashMap<String, String>, HandoffError> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(value).map_err(|e| HandoffError::Malformed {
            param: known_param(key),
            reason: e.to_string(),
        })?;
        params.insert(key.to_string(), value.into_owned());
    }
    Ok(params)
}

fn known_param(key: &str) -> &'static str {
    [PARAM_VERSION, PARAM_OPTION, PARAM_SONGS, PARAM_ARTISTS]
        .into_iter()
        .find(|p| *p == key)
        .unwrap_or("query")
}
