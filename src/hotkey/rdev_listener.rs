//! Global key listener backed by rdev
//!
//! rdev's `listen` callback runs on a dedicated OS thread and cannot be
//! interrupted, so `stop()` detaches the forwarding channel and leaves the
//! thread parked until process exit.

use super::{HotkeyEvent, HotkeyListener, Key, KeyCombo, SpecialKey};
use crate::error::HotkeyError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct RdevListener {
    combo: KeyCombo,
    active: Arc<AtomicBool>,
    started: bool,
}

impl RdevListener {
    pub fn new(combo: KeyCombo) -> Self {
        Self {
            combo,
            active: Arc::new(AtomicBool::new(false)),
            started: false,
        }
    }
}

#[async_trait::async_trait]
impl HotkeyListener for RdevListener {
    async fn start(&mut self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError> {
        let (tx, rx) = mpsc::channel(16);
        let combo = self.combo.clone();
        let active = Arc::clone(&self.active);
        active.store(true, Ordering::SeqCst);

        std::thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || {
                let mut pressed: HashSet<Key> = HashSet::new();
                let mut satisfied = false;

                let result = rdev::listen(move |event| {
                    let (key, is_press) = match event.event_type {
                        rdev::EventType::KeyPress(k) => (map_key(k), true),
                        rdev::EventType::KeyRelease(k) => (map_key(k), false),
                        _ => return,
                    };

                    let Some(key) = key else { return };

                    if is_press {
                        pressed.insert(key);
                    } else {
                        pressed.remove(&key);
                    }

                    let now_satisfied = combo.is_satisfied(&pressed);

                    // Edge-triggered: fire once when the combo becomes held
                    if now_satisfied && !satisfied && active.load(Ordering::SeqCst) {
                        if tx.blocking_send(HotkeyEvent::Toggle).is_err() {
                            tracing::debug!("Hotkey channel closed, dropping event");
                        }
                    }
                    satisfied = now_satisfied;
                });

                // rdev reports grab failures here, not at spawn time
                if let Err(e) = result {
                    tracing::error!("Key listener exited: {:?}", e);
                }
            })
            .map_err(|e| HotkeyError::Backend(format!("Failed to spawn listener thread: {}", e)))?;

        self.started = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), HotkeyError> {
        if self.started {
            // The rdev thread cannot be joined; stop forwarding instead
            self.active.store(false, Ordering::SeqCst);
            tracing::debug!("Hotkey listener deactivated (thread persists until exit)");
            self.started = false;
        }
        Ok(())
    }
}

/// Map an rdev key to a combo key
fn map_key(key: rdev::Key) -> Option<Key> {
    use rdev::Key as R;

    let special = match key {
        R::ControlLeft | R::ControlRight => Some(SpecialKey::Ctrl),
        R::ShiftLeft | R::ShiftRight => Some(SpecialKey::Shift),
        R::Alt | R::AltGr => Some(SpecialKey::Alt),
        R::MetaLeft | R::MetaRight => Some(SpecialKey::Super),
        R::Space => Some(SpecialKey::Space),
        R::Tab => Some(SpecialKey::Tab),
        R::Return => Some(SpecialKey::Enter),
        R::Escape => Some(SpecialKey::Escape),
        R::F1 => Some(SpecialKey::F1),
        R::F2 => Some(SpecialKey::F2),
        R::F3 => Some(SpecialKey::F3),
        R::F4 => Some(SpecialKey::F4),
        R::F5 => Some(SpecialKey::F5),
        R::F6 => Some(SpecialKey::F6),
        R::F7 => Some(SpecialKey::F7),
        R::F8 => Some(SpecialKey::F8),
        R::F9 => Some(SpecialKey::F9),
        R::F10 => Some(SpecialKey::F10),
        R::F11 => Some(SpecialKey::F11),
        R::F12 => Some(SpecialKey::F12),
        _ => None,
    };

    if let Some(special) = special {
        return Some(Key::Special(special));
    }

    let ch = match key {
        R::KeyA => 'a',
        R::KeyB => 'b',
        R::KeyC => 'c',
        R::KeyD => 'd',
        R::KeyE => 'e',
        R::KeyF => 'f',
        R::KeyG => 'g',
        R::KeyH => 'h',
        R::KeyI => 'i',
        R::KeyJ => 'j',
        R::KeyK => 'k',
        R::KeyL => 'l',
        R::KeyM => 'm',
        R::KeyN => 'n',
        R::KeyO => 'o',
        R::KeyP => 'p',
        R::KeyQ => 'q',
        R::KeyR => 'r',
        R::KeyS => 's',
        R::KeyT => 't',
        R::KeyU => 'u',
        R::KeyV => 'v',
        R::KeyW => 'w',
        R::KeyX => 'x',
        R::KeyY => 'y',
        R::KeyZ => 'z',
        R::Num0 | R::Kp0 => '0',
        R::Num1 | R::Kp1 => '1',
        R::Num2 | R::Kp2 => '2',
        R::Num3 | R::Kp3 => '3',
        R::Num4 | R::Kp4 => '4',
        R::Num5 | R::Kp5 => '5',
        R::Num6 | R::Kp6 => '6',
        R::Num7 | R::Kp7 => '7',
        R::Num8 | R::Kp8 => '8',
        R::Num9 | R::Kp9 => '9',
        R::Minus => '-',
        R::Equal => '=',
        R::Comma => ',',
        R::Dot => '.',
        R::Slash => '/',
        R::SemiColon => ';',
        R::Quote => '\'',
        R::BackQuote => '`',
        _ => return None,
    };

    Some(Key::Character(ch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_modifiers_collapse_sides() {
        assert_eq!(
            map_key(rdev::Key::ControlLeft),
            Some(Key::Special(SpecialKey::Ctrl))
        );
        assert_eq!(
            map_key(rdev::Key::ControlRight),
            Some(Key::Special(SpecialKey::Ctrl))
        );
    }

    #[test]
    fn test_map_digits_and_keypad() {
        assert_eq!(map_key(rdev::Key::Num9), Some(Key::Character('9')));
        assert_eq!(map_key(rdev::Key::Kp9), Some(Key::Character('9')));
    }

    #[test]
    fn test_unmapped_keys_ignored() {
        assert_eq!(map_key(rdev::Key::CapsLock), None);
    }
}
