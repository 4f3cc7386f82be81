use anyhow::{bail, Result};
use std::{fmt, str::FromStr};

use crate::spotify::top_items::TimeWindow;

pub const RESULTS_PATH: &str = "/recommend/results";

/// Top lists carry their window in the fragment, e.g. `/top-songs#last-month`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    TopSongs(TimeWindow),
    TopArtists(TimeWindow),
    Recommend,
    /// Carries the raw handoff query string; the results screen decodes it.
    Results(String),
}

impl Default for Route {
    fn default() -> Self {
        Route::TopSongs(TimeWindow::AllTime)
    }
}

impl Route {
    pub fn parse(location: &str) -> Result<Route> {
        let location = location.trim();
        let (rest, fragment) = match location.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (location, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, query),
            None => (rest, ""),
        };
        let path = path.trim_end_matches('/');

        // unknown fragments are ignored, like a browser would
        let window = fragment
            .and_then(|f| TimeWindow::from_str(f).ok())
            .unwrap_or_default();

        Ok(match path {
            "" | "/top-songs" => Route::TopSongs(window),
            "/top-artists" => Route::TopArtists(window),
            "/recommend" => Route::Recommend,
            RESULTS_PATH => Route::Results(query.to_string()),
            other => bail!("unknown location {other:?}"),
        })
    }

    pub fn with_window(&self, window: TimeWindow) -> Route {
        match self {
            Route::TopSongs(_) => Route::TopSongs(window),
            Route::TopArtists(_) => Route::TopArtists(window),
            other => other.clone(),
        }
    }

    pub fn window(&self) -> Option<TimeWindow> {
        match self {
            Route::TopSongs(w) | Route::TopArtists(w) => Some(*w),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::TopSongs(window) => write!(f, "/top-songs#{window}"),
            Route::TopArtists(window) => write!(f, "/top-artists#{window}"),
            Route::Recommend => write!(f, "/recommend"),
            Route::Results(query) => write!(f, "{RESULTS_PATH}?{query}"),
        }
    }
}
