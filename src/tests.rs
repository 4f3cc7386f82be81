#[cfg(test)]
mod tests {
    use crate::{
        app::{
            route::Route,
            state::{ActiveScreen, AppState, AuthStatus, Notification, RecommendState, TopListState},
        },
        spotify::top_items::{SeedOption, TimeWindow},
        test_support::sample_tracks,
        wizard::{SeedType, WizardView},
    };
    use chrono::{Duration, Utc};

    // ── AppState navigation ───────────────────────────────────────────────────

    #[test]
    fn test_default_location_is_all_time_songs() {
        let state = AppState::default();
        assert_eq!(state.active_screen(), ActiveScreen::TopSongs);
        assert_eq!(state.route.to_string(), "/top-songs#all-time");
        assert!(!state.is_signed_in());
    }

    #[test]
    fn test_navigate_to_changes_screen() {
        let mut state = AppState::default();
        state.navigate_to(Route::Recommend);
        assert_eq!(state.active_screen(), ActiveScreen::Recommend);
        assert_eq!(
            state.previous_route,
            Some(Route::TopSongs(TimeWindow::AllTime))
        );
    }

    #[test]
    fn test_navigate_to_same_route_noop() {
        let mut state = AppState::default();
        state.navigate_to(Route::TopSongs(TimeWindow::AllTime));
        assert!(state.previous_route.is_none());
    }

    #[test]
    fn test_results_screen_from_route() {
        let mut state = AppState::default();
        state.navigate_to(Route::parse("/recommend/results?v=1").unwrap());
        assert_eq!(state.active_screen(), ActiveScreen::Results);
    }

    #[test]
    fn test_reset_data_clears_screens() {
        let mut state = AppState {
            auth: AuthStatus::SignedIn { expires_at: Utc::now() + Duration::hours(1) },
            ..Default::default()
        };
        state.top_songs.finish(sample_tracks(3), false);
        state.recommend.track_options = Some(Vec::new());
        state.reset_data();
        assert!(state.top_songs.items.is_empty());
        assert!(state.recommend.track_options.is_none());
    }

    // ── Top lists ─────────────────────────────────────────────────────────────

    #[test]
    fn test_window_change_drops_old_items() {
        let mut list: TopListState<u32> = TopListState::default();
        list.start_loading(TimeWindow::AllTime, 1);
        list.finish(vec![1, 2, 3], false);

        list.start_loading(TimeWindow::AllTime, 2);
        assert_eq!(list.items.len(), 3, "same window keeps items while refreshing");

        list.start_loading(TimeWindow::OneMonth, 3);
        assert!(list.items.is_empty());
        assert!(list.is_loading);
        assert_eq!(list.request, 3);
    }

    #[test]
    fn test_selection_clamped() {
        let mut list: TopListState<u32> = TopListState::default();
        list.finish(vec![1, 2, 3], false);
        list.move_selection(10);
        assert_eq!(list.selected, 2);
        list.move_selection(-10);
        assert_eq!(list.selected, 0);
        list.finish(vec![9], true);
        assert_eq!(list.current(), Some(&9));
        assert!(list.is_stale);
    }

    // ── Recommend screen ──────────────────────────────────────────────────────

    #[test]
    fn test_wizard_waits_for_both_option_lists() {
        let mut recommend = RecommendState::default();
        assert_eq!(recommend.view(), WizardView::Start);
        recommend.track_options = Some(vec![SeedOption {
            value: "t".to_string(),
            label: "T".to_string(),
        }]);
        assert_eq!(recommend.view(), WizardView::Start);
        recommend.artist_options = Some(Vec::new());
        assert_eq!(recommend.view(), WizardView::ChoosingType);
        assert_eq!(recommend.options_for(SeedType::Track).len(), 1);
        assert!(recommend.current_options().is_empty());
    }

    #[test]
    fn test_type_cursor_maps_to_seed_type() {
        let mut recommend = RecommendState::default();
        assert_eq!(recommend.highlighted_type(), SeedType::Track);
        recommend.type_cursor = 1;
        assert_eq!(recommend.highlighted_type(), SeedType::Artist);
        recommend.type_cursor = 7;
        assert_eq!(recommend.highlighted_type(), SeedType::Artist);
    }

    // ── Notification ──────────────────────────────────────────────────────────

    #[test]
    fn test_notification_tick_decrements() {
        let mut state = AppState::default();
        state.set_notification(Notification::info("hello"));
        assert!(state.notification.is_some());
        // remaining_ticks=30: takes 30 ticks to reach 0, then 1 more tick to clear
        for _ in 0..31 {
            state.tick_notification();
        }
        assert!(state.notification.is_none());
    }

    #[test]
    fn test_notification_error_flag() {
        let n = Notification::error("oops");
        assert!(n.is_error);
        assert_eq!(n.message, "oops");
    }

    #[test]
    fn test_spinner_cycles() {
        let mut state = AppState::default();
        let first = state.spinner();
        state.tick = 8;
        assert_eq!(state.spinner(), first);
        state.tick = 1;
        assert_ne!(state.spinner(), first);
    }
}
