//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{is_valid_input_char, App, AppState, Focus, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.focus = app.focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.focus = app.focus.prev();
        }
        KeyCode::PageDown => app.scroll_profile_down(PAGE_SCROLL_SIZE),
        KeyCode::PageUp => app.scroll_profile_up(PAGE_SCROLL_SIZE),
        KeyCode::Home => app.scroll_profile_to_top(),
        KeyCode::End => app.scroll_profile_to_bottom(),
        KeyCode::Enter => match app.focus {
            Focus::Email => app.focus = Focus::Password,
            Focus::Password => app.focus = Focus::LoginButton,
            Focus::LoginButton => app.start_login(),
            Focus::ProfileButton => app.start_fetch_profile(),
        },
        KeyCode::Backspace => {
            if let Some(field) = focused_field(app) {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            if is_valid_input_char(c) {
                if let Some(field) = focused_field(app) {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

/// The text field under focus, if focus is on a field rather than a button
fn focused_field(app: &mut App) -> Option<&mut String> {
    match app.focus {
        Focus::Email => Some(&mut app.session.email),
        Focus::Password => Some(&mut app.session.password),
        Focus::LoginButton | Focus::ProfileButton => None,
    }
}
