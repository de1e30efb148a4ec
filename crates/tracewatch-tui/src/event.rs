//! Semantic application events — crossterm key events mapped to a
//! widget-agnostic vocabulary so widgets never touch crossterm directly.
//!
//! # Keybindings
//!
//! | Key(s)                  | Event                      |
//! |-------------------------|----------------------------|
//! | `q`, `Ctrl+c`           | `Quit`                     |
//! | `p`, `Space`            | `TogglePause`              |
//! | `r`                     | `Refresh`                  |
//! | `?`                     | `ToggleHelp`               |
//! | `:`                     | `CommandMode`              |
//! | `Escape`                | `Escape`                   |
//! | terminal resize         | `Resize(w, h)`             |
//!
//! ## Insert mode
//!
//! While the command bar is open the loop calls [`to_app_event_insert`]:
//! every printable character becomes `Char`, `←`/`→` move the cursor, and
//! only `Ctrl+c`, `Escape`, `Enter` and `Backspace` keep special meaning.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

/// A semantic application event derived from a raw crossterm [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Exit the dashboard (and stop ingestion).
    Quit,
    /// Freeze or resume snapshot refreshing.
    TogglePause,
    /// Take a snapshot now, even while paused.
    Refresh,
    /// Show or hide the help popup.
    ToggleHelp,
    /// Open the `:` command bar.
    CommandMode,
    /// A printable character forwarded to the command bar.
    Char(char),
    /// Delete the character before the cursor.
    Backspace,
    /// Move the command-bar cursor left.
    CursorLeft,
    /// Move the command-bar cursor right.
    CursorRight,
    /// Confirm the command bar input.
    Enter,
    /// Dismiss the active modal (command bar, help popup).
    Escape,
    /// The terminal was resized to the given (width, height).
    Resize(u16, u16),
}

/// Map a raw crossterm [`Event`] to an [`AppEvent`] (normal mode).
///
/// Returns `None` for events with no meaning to the dashboard (mouse
/// events, unbound keys).
pub fn to_app_event(event: Event) -> Option<AppEvent> {
    match event {
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        Event::Key(key) => map_key(key),
        _ => None,
    }
}

/// Map a raw crossterm [`Event`] to an [`AppEvent`] for command-bar input.
pub fn to_app_event_insert(event: Event) -> Option<AppEvent> {
    match event {
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        Event::Key(key) => map_key_insert(key),
        _ => None,
    }
}

fn map_key(key: KeyEvent) -> Option<AppEvent> {
    use KeyCode::*;
    use KeyModifiers as Mod;

    match key.code {
        Char('q') if key.modifiers == Mod::NONE => Some(AppEvent::Quit),
        Char('c') if key.modifiers == Mod::CONTROL => Some(AppEvent::Quit),

        Char('p') | Char(' ') if key.modifiers == Mod::NONE => Some(AppEvent::TogglePause),
        Char('r') if key.modifiers == Mod::NONE => Some(AppEvent::Refresh),

        // `?` and `:` are shifted on most layouts; match on the code alone
        Char('?') => Some(AppEvent::ToggleHelp),
        Char(':') => Some(AppEvent::CommandMode),

        Esc => Some(AppEvent::Escape),
        _ => None,
    }
}

fn map_key_insert(key: KeyEvent) -> Option<AppEvent> {
    use KeyCode::*;
    use KeyModifiers as Mod;

    match key.code {
        Char('c') if key.modifiers == Mod::CONTROL => Some(AppEvent::Quit),

        Left => Some(AppEvent::CursorLeft),
        Right => Some(AppEvent::CursorRight),

        Char(c) if key.modifiers == Mod::NONE || key.modifiers == Mod::SHIFT => {
            Some(AppEvent::Char(c))
        }

        Backspace if key.modifiers == Mod::NONE => Some(AppEvent::Backspace),
        Enter if key.modifiers == Mod::NONE => Some(AppEvent::Enter),
        Esc => Some(AppEvent::Escape),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
