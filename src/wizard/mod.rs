use serde::{Deserialize, Serialize};

use crate::{
    handoff::{RecommendationQuery, Seed},
    spotify::top_items::SeedOption,
};

/// Spotify accepts at most five seeds per recommendation request.
pub const MAX_SEEDS: usize = 5;

const SUMMARY_VISIBLE: usize = 3;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum SeedType {
    #[strum(serialize = "track")]
    Track,
    #[strum(serialize = "artist")]
    Artist,
}

/// What the recommend screen shows. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardView {
    /// Waiting for both option lists.
    Start,
    ChoosingType,
    ChoosingTracks,
    ChoosingArtists,
    Summarized(SeedType),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Editing {
    pub tracks: bool,
    pub artists: bool,
}

/// The open multi-select. `pending` only reaches the wizard state on close.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub open: bool,
    pub cursor: usize,
    pub pending: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    LimitReached,
    Ignored,
}

/// Seed type first, then up to [`MAX_SEEDS`] picks. Picks of the other type
/// survive a switch but are never submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardState {
    pub seed_type: Option<SeedType>,
    pub selected_track_ids: Vec<String>,
    pub selected_artist_ids: Vec<String>,
    pub editing: Editing,
    pub selector: Selector,
}

impl WizardState {
    pub fn view(&self, options_ready: bool) -> WizardView {
        if !options_ready {
            return WizardView::Start;
        }
        match self.seed_type {
            None => WizardView::ChoosingType,
            Some(SeedType::Track) => {
                if self.editing.tracks || self.selected_track_ids.is_empty() {
                    WizardView::ChoosingTracks
                } else {
                    WizardView::Summarized(SeedType::Track)
                }
            }
            Some(SeedType::Artist) => {
                if self.editing.artists || self.selected_artist_ids.is_empty() {
                    WizardView::ChoosingArtists
                } else {
                    WizardView::Summarized(SeedType::Artist)
                }
            }
        }
    }

    pub fn selected(&self, seed_type: SeedType) -> &[String] {
        match seed_type {
            SeedType::Track => &self.selected_track_ids,
            SeedType::Artist => &self.selected_artist_ids,
        }
    }

    /// Switches branches. Existing picks of either type are kept.
    pub fn choose_type(&mut self, seed_type: SeedType) {
        self.selector = Selector::default();
        self.editing = Editing::default();
        self.seed_type = Some(seed_type);
        if self.selected(seed_type).is_empty() {
            self.open_selector();
        }
    }

    /// Opens the selector for the current branch, pre-populated with its picks.
    pub fn open_selector(&mut self) {
        let Some(seed_type) = self.seed_type else {
            return;
        };
        self.selector = Selector {
            open: true,
            cursor: 0,
            pending: self.selected(seed_type).to_vec(),
        };
        match seed_type {
            SeedType::Track => self.editing.tracks = true,
            SeedType::Artist => self.editing.artists = true,
        }
    }

    pub fn move_cursor(&mut self, delta: isize, option_count: usize) {
        if !self.selector.open || option_count == 0 {
            return;
        }
        let max = option_count - 1;
        let next = self.selector.cursor as isize + delta;
        self.selector.cursor = next.clamp(0, max as isize) as usize;
    }

    pub fn toggle_current(&mut self, options: &[SeedOption]) -> Toggle {
        if !self.selector.open {
            return Toggle::Ignored;
        }
        let Some(option) = options.get(self.selector.cursor) else {
            return Toggle::Ignored;
        };
        let pending = &mut self.selector.pending;
        if let Some(pos) = pending.iter().position(|id| id == &option.value) {
            pending.remove(pos);
            Toggle::Removed
        } else if pending.len() >= MAX_SEEDS {
            Toggle::LimitReached
        } else {
            pending.push(option.value.clone());
            Toggle::Added
        }
    }

    /// Commits the pending picks. A no-op when the selector is closed.
    pub fn close_selector(&mut self) {
        if !self.selector.open {
            return;
        }
        let pending = std::mem::take(&mut self.selector.pending);
        match self.seed_type {
            Some(SeedType::Track) => {
                self.selected_track_ids = pending;
                self.editing.tracks = false;
            }
            Some(SeedType::Artist) => {
                self.selected_artist_ids = pending;
                self.editing.artists = false;
            }
            None => {}
        }
        self.selector = Selector::default();
    }

    pub fn clear(&mut self) {
        *self = WizardState::default();
    }

    pub fn can_submit(&self) -> bool {
        !self.selector.open
            && self
                .seed_type
                .is_some_and(|seed_type| !self.selected(seed_type).is_empty())
    }

    /// Whether [`submit`](Self::submit) would succeed once an open selector is committed.
    pub fn submit_ready(&self) -> bool {
        if self.selector.open {
            self.seed_type.is_some() && !self.selector.pending.is_empty()
        } else {
            self.can_submit()
        }
    }

    /// The query for the last chosen seed type; picks of the other type are dropped.
    pub fn submit(&self) -> Option<RecommendationQuery> {
        if !self.can_submit() {
            return None;
        }
        let seed = match self.seed_type? {
            SeedType::Track => Seed::Tracks(self.selected_track_ids.clone()),
            SeedType::Artist => Seed::Artists(self.selected_artist_ids.clone()),
        };
        Some(RecommendationQuery::new(seed))
    }

    pub fn summary_sentence(&self, options: &[SeedOption]) -> Option<String> {
        let seed_type = self.seed_type?;
        let ids = self.selected(seed_type);
        if ids.is_empty() {
            return None;
        }
        let noun = match seed_type {
            SeedType::Track => "songs",
            SeedType::Artist => "artists",
        };
        Some(format!(
            "With the {noun} {} as a seed.",
            summarize(&labels_for(ids, options))
        ))
    }
}

/// Display labels for `ids`, in pick order. Unknown ids show as themselves.
pub fn labels_for(ids: &[String], options: &[SeedOption]) -> Vec<String> {
    ids.iter()
        .map(|id| {
            options
                .iter()
                .find(|opt| &opt.value == id)
                .map(|opt| opt.label.clone())
                .unwrap_or_else(|| id.clone())
        })
        .collect()
}

/// First three labels, then an overflow count: `A, B, C, +2 more`.
pub fn summarize(labels: &[String]) -> String {
    let visible = labels
        .iter()
        .take(SUMMARY_VISIBLE)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let hidden = labels.len().saturating_sub(SUMMARY_VISIBLE);
    if hidden > 0 {
        format!("{visible}, +{hidden} more")
    } else {
        visible
    }
}
