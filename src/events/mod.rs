use crossterm::event::{KeyCode, KeyEvent};

use crate::wizard::SeedType;

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    Quit,
    ToggleHelp,
    NavigateUp,
    NavigateDown,
    PrevTab,
    NextTab,
    Select,
    Back,
    SwitchScreen(u8),
    ChooseSeedType(SeedType),
    ToggleOption,
    CloseSelector,
    ClearWizard,
    SubmitWizard,
    SignIn,
    SignOut,
}

/// Where key presses go. An open wizard selector captures most keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    Normal,
    Selector,
}

pub fn map_key_to_action(key: KeyEvent, context: KeyContext) -> Option<UserAction> {
    if context == KeyContext::Selector {
        return match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(UserAction::NavigateUp),
            KeyCode::Down | KeyCode::Char('j') => Some(UserAction::NavigateDown),
            KeyCode::Char(' ') => Some(UserAction::ToggleOption),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Tab => Some(UserAction::CloseSelector),
            // anything outside the selector closes it first
            KeyCode::Char('t') => Some(UserAction::ChooseSeedType(SeedType::Track)),
            KeyCode::Char('a') => Some(UserAction::ChooseSeedType(SeedType::Artist)),
            KeyCode::Char('x') => Some(UserAction::ClearWizard),
            KeyCode::Char('s') => Some(UserAction::SubmitWizard),
            KeyCode::Char(c @ '1'..='3') => Some(UserAction::SwitchScreen(c as u8 - b'0')),
            KeyCode::Char('q') => Some(UserAction::Quit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(UserAction::Quit),
        KeyCode::Char('?') => Some(UserAction::ToggleHelp),
        KeyCode::Up | KeyCode::Char('k') => Some(UserAction::NavigateUp),
        KeyCode::Down | KeyCode::Char('j') => Some(UserAction::NavigateDown),
        KeyCode::Left | KeyCode::Char('h') => Some(UserAction::PrevTab),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => Some(UserAction::NextTab),
        KeyCode::Enter | KeyCode::Char(' ') => Some(UserAction::Select),
        KeyCode::Esc | KeyCode::Char('b') => Some(UserAction::Back),
        KeyCode::Char('1') => Some(UserAction::SwitchScreen(1)),
        KeyCode::Char('2') => Some(UserAction::SwitchScreen(2)),
        KeyCode::Char('3') => Some(UserAction::SwitchScreen(3)),
        KeyCode::Char('t') => Some(UserAction::ChooseSeedType(SeedType::Track)),
        KeyCode::Char('a') => Some(UserAction::ChooseSeedType(SeedType::Artist)),
        KeyCode::Char('x') => Some(UserAction::ClearWizard),
        KeyCode::Char('s') => Some(UserAction::SubmitWizard),
        KeyCode::Char('i') => Some(UserAction::SignIn),
        KeyCode::Char('o') => Some(UserAction::SignOut),
        _ => None,
    }
}
