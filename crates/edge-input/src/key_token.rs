//! Maps a crossterm key event onto the plain `char` key alphabet every
//! `edge_buffer::Mode` dispatches on. Named keys that have no natural
//! character use the C0 control codes the mode layer already recognizes
//! (`\u{1b}` Escape, `\r` Enter, `\u{7f}` Backspace) or, for keys no mode
//! currently binds, a private-use-area placeholder so the mapping stays
//! total without colliding with printable input.

use crossterm::event::{KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKeyEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyPress {
    pub key: char,
    pub repeat: bool,
}

/// Translate one crossterm key event into a `KeyPress`. Returns `None`
/// for release events (crossterm only reports those when explicitly
/// enabled) and for keys with no character representation at all
/// (media keys, raw modifier presses).
pub(crate) fn map_key_event(event: &CKeyEvent) -> Option<KeyPress> {
    if event.kind == CKeyEventKind::Release {
        return None;
    }
    let key = map_key_code(&event.code)?;
    Some(KeyPress { key, repeat: event.kind == CKeyEventKind::Repeat })
}

fn map_key_code(code: &CKeyCode) -> Option<char> {
    let key = match code {
        CKeyCode::Char(c) => *c,
        CKeyCode::Enter => '\r',
        CKeyCode::Esc => '\u{1b}',
        CKeyCode::Backspace => '\u{7f}',
        CKeyCode::Tab => '\t',
        CKeyCode::BackTab => '\t',
        CKeyCode::Up => '\u{e000}',
        CKeyCode::Down => '\u{e001}',
        CKeyCode::Left => '\u{e002}',
        CKeyCode::Right => '\u{e003}',
        CKeyCode::Home => '\u{e004}',
        CKeyCode::End => '\u{e005}',
        CKeyCode::PageUp => '\u{e006}',
        CKeyCode::PageDown => '\u{e007}',
        CKeyCode::Delete => '\u{e008}',
        CKeyCode::Insert
        | CKeyCode::F(_)
        | CKeyCode::Null
        | CKeyCode::CapsLock
        | CKeyCode::ScrollLock
        | CKeyCode::NumLock
        | CKeyCode::PrintScreen
        | CKeyCode::Pause
        | CKeyCode::Menu
        | CKeyCode::KeypadBegin
        | CKeyCode::Media(_)
        | CKeyCode::Modifier(_) => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState as CKeyEventState, KeyModifiers as CKeyModifiers};

    fn key_event(code: CKeyCode, kind: CKeyEventKind) -> CKeyEvent {
        CKeyEvent { code, modifiers: CKeyModifiers::NONE, kind, state: CKeyEventState::empty() }
    }

    #[test]
    fn maps_basic_char() {
        let ev = key_event(CKeyCode::Char('a'), CKeyEventKind::Press);
        let press = map_key_event(&ev).expect("char should map");
        assert_eq!(press.key, 'a');
        assert!(!press.repeat);
    }

    #[test]
    fn maps_enter_escape_and_backspace_to_control_codes() {
        assert_eq!(map_key_event(&key_event(CKeyCode::Enter, CKeyEventKind::Press)).unwrap().key, '\r');
        assert_eq!(map_key_event(&key_event(CKeyCode::Esc, CKeyEventKind::Press)).unwrap().key, '\u{1b}');
        assert_eq!(map_key_event(&key_event(CKeyCode::Backspace, CKeyEventKind::Press)).unwrap().key, '\u{7f}');
    }

    #[test]
    fn detects_repeat_kind() {
        let ev = key_event(CKeyCode::Char('j'), CKeyEventKind::Repeat);
        let press = map_key_event(&ev).expect("repeat should map");
        assert!(press.repeat);
    }

    #[test]
    fn release_events_are_ignored() {
        let ev = key_event(CKeyCode::Char('a'), CKeyEventKind::Release);
        assert!(map_key_event(&ev).is_none());
    }

    #[test]
    fn unsupported_keys_return_none() {
        let ev = key_event(CKeyCode::F(5), CKeyEventKind::Press);
        assert!(map_key_event(&ev).is_none());
    }
}
