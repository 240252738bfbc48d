//! Key mapping from terminal events to editor and UI commands.

use crate::types::EditMode;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a keypress asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    // Editing (INSERT)
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Enter,
    Escape,

    // Scrolling and sub-views (NORMAL)
    EnterInsert,
    ScrollUp,
    ScrollDown,
    OpenPicker,
    OpenLog,

    // Either mode
    PageUp,
    PageDown,
    Quit,
    Suspend,
    Detach,
}

/// Map a key event to a command for the current mode.
///
/// Releases and unrecognized keys give `None`.
pub fn handle_key_event(key: KeyEvent, mode: EditMode) -> Option<KeyCommand> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(KeyCommand::Quit),
            KeyCode::Char('z') | KeyCode::Char('Z') => Some(KeyCommand::Suspend),
            KeyCode::Char('d') | KeyCode::Char('D') => Some(KeyCommand::Detach),
            _ => None,
        };
    }
    match key.code {
        KeyCode::PageUp => return Some(KeyCommand::PageUp),
        KeyCode::PageDown => return Some(KeyCommand::PageDown),
        _ => {}
    }
    match mode {
        EditMode::Insert => insert_key(key),
        EditMode::Normal => normal_key(key),
    }
}

fn insert_key(key: KeyEvent) -> Option<KeyCommand> {
    match key.code {
        KeyCode::Char(c) => Some(KeyCommand::Insert(c)),
        KeyCode::Tab => Some(KeyCommand::Insert(' ')),
        KeyCode::Backspace => Some(KeyCommand::Backspace),
        KeyCode::Delete => Some(KeyCommand::Delete),
        KeyCode::Left => Some(KeyCommand::Left),
        KeyCode::Right => Some(KeyCommand::Right),
        KeyCode::Up => Some(KeyCommand::Up),
        KeyCode::Down => Some(KeyCommand::Down),
        KeyCode::Home => Some(KeyCommand::Home),
        KeyCode::End => Some(KeyCommand::End),
        KeyCode::Enter => Some(KeyCommand::Enter),
        KeyCode::Esc => Some(KeyCommand::Escape),
        _ => None,
    }
}

fn normal_key(key: KeyEvent) -> Option<KeyCommand> {
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => Some(KeyCommand::EnterInsert),
        KeyCode::Char('k') | KeyCode::Up => Some(KeyCommand::ScrollUp),
        KeyCode::Char('j') | KeyCode::Down => Some(KeyCommand::ScrollDown),
        KeyCode::Char('f') => Some(KeyCommand::OpenPicker),
        KeyCode::Char('L') => Some(KeyCommand::OpenLog),
        KeyCode::Esc => Some(KeyCommand::Escape),
        _ => None,
    }
}
