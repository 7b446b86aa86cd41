use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::state::{AppState, InputMode};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    None,
    /// Begin editing the selected card, or save it when already editing.
    ToggleEdit,
    Type(char),
    Backspace,
    AttachPhoto(PathBuf),
    /// Ask to delete the selected card; the host decides whether to confirm.
    RequestDelete,
    Delete { confirmed: bool },
    Quit,
}

pub fn handle_key(state: &mut AppState, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return Action::Quit;
    }

    if state.alert.take().is_some() {
        return Action::None;
    }

    match state.input_mode {
        InputMode::Normal => handle_normal_mode(state, key),
        InputMode::Editing => handle_editing_mode(state, key),
        InputMode::AttachPath => handle_attach_mode(state, key),
        InputMode::ConfirmDelete => handle_confirm_mode(state, key),
    }
}

fn handle_normal_mode(state: &mut AppState, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') => {
            state.should_quit = true;
            Action::Quit
        }
        KeyCode::Char('j') | KeyCode::Down => {
            state.select_next();
            Action::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.select_previous();
            Action::None
        }
        KeyCode::Char('e') => Action::ToggleEdit,
        KeyCode::Char('d') => Action::RequestDelete,
        _ => Action::None,
    }
}

fn handle_editing_mode(state: &mut AppState, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => Action::ToggleEdit,
            KeyCode::Char('o') => {
                state.input_mode = InputMode::AttachPath;
                state.path_buffer.clear();
                Action::None
            }
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char(c) => Action::Type(c),
        KeyCode::Enter => Action::Type('\n'),
        KeyCode::Backspace => Action::Backspace,
        _ => Action::None,
    }
}

fn handle_attach_mode(state: &mut AppState, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc => {
            state.input_mode = InputMode::Editing;
            state.path_buffer.clear();
            Action::None
        }
        KeyCode::Enter => {
            let raw = state.path_buffer.drain(..).collect::<String>();
            state.input_mode = InputMode::Editing;
            let raw = raw.trim();
            if raw.is_empty() {
                return Action::None;
            }
            Action::AttachPhoto(PathBuf::from(raw))
        }
        KeyCode::Backspace => {
            state.path_buffer.pop();
            Action::None
        }
        KeyCode::Char(c) => {
            state.path_buffer.push(c);
            Action::None
        }
        _ => Action::None,
    }
}

fn handle_confirm_mode(state: &mut AppState, key: KeyEvent) -> Action {
    let confirmed = match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => true,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
        _ => return Action::None,
    };
    state.input_mode = InputMode::Normal;
    Action::Delete { confirmed }
}
