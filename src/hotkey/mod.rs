//! Hotkey detection module
//!
//! A global key listener watches for the configured combo (default
//! ctrl+shift+9) and emits one `Toggle` event on the edge where the combo
//! becomes fully held. Holding the keys down does not repeat the event; the
//! combo must be released and pressed again.
//!
//! Linux/Wayland note: rdev grabs events through the display server, so the
//! listener needs an active session. Compositor keybindings invoking
//! `voxclip transcribe` remain an alternative where global grabs are
//! unavailable.

pub mod rdev_listener;

use crate::config::HotkeyConfig;
use crate::error::HotkeyError;
use std::collections::HashSet;
use tokio::sync::mpsc;

/// A single key that can participate in a combo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character key, lowercased
    Character(char),
    /// A modifier or named key
    Special(SpecialKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Ctrl,
    Shift,
    Alt,
    Super,
    Space,
    Tab,
    Enter,
    Escape,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

/// A parsed key combination, e.g. "ctrl+shift+9"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    keys: Vec<Key>,
}

impl KeyCombo {
    /// Parse a combo string of '+'-separated key names
    pub fn parse(combo: &str) -> Result<Self, HotkeyError> {
        let mut keys = Vec::new();

        for part in combo.split('+') {
            let part = part.trim().to_lowercase();
            if part.is_empty() {
                continue;
            }
            keys.push(parse_key(&part)?);
        }

        if keys.is_empty() {
            return Err(HotkeyError::EmptyCombo);
        }

        Ok(Self { keys })
    }

    /// True when every key of the combo is in the pressed set
    pub fn is_satisfied(&self, pressed: &HashSet<Key>) -> bool {
        self.keys.iter().all(|k| pressed.contains(k))
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }
}

fn parse_key(name: &str) -> Result<Key, HotkeyError> {
    let special = match name {
        "ctrl" | "control" => Some(SpecialKey::Ctrl),
        "shift" => Some(SpecialKey::Shift),
        "alt" | "option" => Some(SpecialKey::Alt),
        "super" | "cmd" | "command" | "meta" | "win" => Some(SpecialKey::Super),
        "space" => Some(SpecialKey::Space),
        "tab" => Some(SpecialKey::Tab),
        "enter" | "return" => Some(SpecialKey::Enter),
        "esc" | "escape" => Some(SpecialKey::Escape),
        "f1" => Some(SpecialKey::F1),
        "f2" => Some(SpecialKey::F2),
        "f3" => Some(SpecialKey::F3),
        "f4" => Some(SpecialKey::F4),
        "f5" => Some(SpecialKey::F5),
        "f6" => Some(SpecialKey::F6),
        "f7" => Some(SpecialKey::F7),
        "f8" => Some(SpecialKey::F8),
        "f9" => Some(SpecialKey::F9),
        "f10" => Some(SpecialKey::F10),
        "f11" => Some(SpecialKey::F11),
        "f12" => Some(SpecialKey::F12),
        _ => None,
    };

    if let Some(special) = special {
        return Ok(Key::Special(special));
    }

    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Key::Character(c)),
        _ => Err(HotkeyError::UnknownKey(name.to_string())),
    }
}

/// Events emitted by the hotkey listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The toggle combo was pressed
    Toggle,
}

/// Trait for hotkey detection implementations
#[async_trait::async_trait]
pub trait HotkeyListener: Send + Sync {
    /// Start listening for hotkey events
    async fn start(&mut self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError>;

    /// Stop listening and clean up
    async fn stop(&mut self) -> Result<(), HotkeyError>;
}

/// Create the hotkey listener for the configured combo
pub fn create_listener(config: &HotkeyConfig) -> Result<Box<dyn HotkeyListener>, HotkeyError> {
    let combo = KeyCombo::parse(&config.combo)?;
    Ok(Box::new(rdev_listener::RdevListener::new(combo)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_combo() {
        let combo = KeyCombo::parse("ctrl+shift+9").unwrap();
        assert_eq!(
            combo.keys(),
            &[
                Key::Special(SpecialKey::Ctrl),
                Key::Special(SpecialKey::Shift),
                Key::Character('9'),
            ]
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let a = KeyCombo::parse("Ctrl+Shift+F5").unwrap();
        let b = KeyCombo::parse("ctrl+shift+f5").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_modifier_aliases() {
        let combo = KeyCombo::parse("cmd+shift+9").unwrap();
        assert!(combo.keys().contains(&Key::Special(SpecialKey::Super)));
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        match KeyCombo::parse("ctrl+frobnicate") {
            Err(HotkeyError::UnknownKey(name)) => assert_eq!(name, "frobnicate"),
            other => panic!("expected UnknownKey, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(KeyCombo::parse(""), Err(HotkeyError::EmptyCombo)));
        assert!(matches!(
            KeyCombo::parse(" + "),
            Err(HotkeyError::EmptyCombo)
        ));
    }

    #[test]
    fn test_is_satisfied_requires_all_keys() {
        let combo = KeyCombo::parse("ctrl+shift+9").unwrap();

        let mut pressed = HashSet::new();
        pressed.insert(Key::Special(SpecialKey::Ctrl));
        pressed.insert(Key::Special(SpecialKey::Shift));
        assert!(!combo.is_satisfied(&pressed));

        pressed.insert(Key::Character('9'));
        assert!(combo.is_satisfied(&pressed));

        // Extra held keys do not break the match
        pressed.insert(Key::Character('a'));
        assert!(combo.is_satisfied(&pressed));
    }
}
