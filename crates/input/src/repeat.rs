//! Auto-repeat gate for held keys.
//!
//! Terminals without key-release events report a held key as a stream of
//! presses. The gate turns that stream into a first action, a pause of
//! `delay`, then one action every `interval`. State is keyed by
//! `(player, control)` so two local players never share timers.

use std::collections::HashMap;

use crate::map::Control;
use crate::types::{DAS_DELAY_SECS, DAS_INTERVAL_SECS};

/// A press further apart than this from the previous one starts a new hold.
const HOLD_WINDOW_SECS: f64 = 0.6;

#[derive(Debug, Clone, Copy)]
struct KeyTimer {
    next_eligible: f64,
    last_seen: f64,
}

#[derive(Debug, Clone)]
pub struct RepeatGate {
    delay: f64,
    interval: f64,
    keys: HashMap<(usize, Control), KeyTimer>,
}

impl RepeatGate {
    pub fn new() -> Self {
        Self::with_timing(DAS_DELAY_SECS, DAS_INTERVAL_SECS)
    }

    pub fn with_timing(delay: f64, interval: f64) -> Self {
        Self {
            delay,
            interval,
            keys: HashMap::new(),
        }
    }

    /// Register a press at time `now` (seconds). Returns true if the control
    /// should fire this time.
    ///
    /// Controls that do not repeat fire on every press.
    pub fn press(&mut self, player: usize, control: Control, now: f64) -> bool {
        if !control.repeats() {
            return true;
        }
        let (delay, interval) = (self.delay, self.interval);
        match self.keys.get_mut(&(player, control)) {
            Some(timer) if now - timer.last_seen <= HOLD_WINDOW_SECS => {
                timer.last_seen = now;
                if now >= timer.next_eligible {
                    timer.next_eligible = now + interval;
                    true
                } else {
                    false
                }
            }
            _ => {
                self.keys.insert(
                    (player, control),
                    KeyTimer {
                        next_eligible: now + delay,
                        last_seen: now,
                    },
                );
                true
            }
        }
    }

    /// Forget a key, for terminals that do report releases.
    pub fn release(&mut self, player: usize, control: Control) {
        self.keys.remove(&(player, control));
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl Default for RepeatGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_press_fires() {
        let mut gate = RepeatGate::new();
        assert!(gate.press(0, Control::MoveLeft, 10.0));
    }

    #[test]
    fn test_held_key_waits_for_delay_then_repeats() {
        let mut gate = RepeatGate::with_timing(0.25, 0.125);
        assert!(gate.press(0, Control::MoveRight, 0.0));
        assert!(!gate.press(0, Control::MoveRight, 0.125));
        assert!(gate.press(0, Control::MoveRight, 0.25));
        assert!(!gate.press(0, Control::MoveRight, 0.3125));
        assert!(gate.press(0, Control::MoveRight, 0.375));
    }

    #[test]
    fn test_gap_starts_new_hold() {
        let mut gate = RepeatGate::new();
        assert!(gate.press(0, Control::SoftDrop, 0.0));
        assert!(gate.press(0, Control::SoftDrop, 5.0));
        assert!(!gate.press(0, Control::SoftDrop, 5.01));
    }

    #[test]
    fn test_players_do_not_share_timers() {
        let mut gate = RepeatGate::new();
        assert!(gate.press(0, Control::MoveLeft, 0.0));
        assert!(gate.press(1, Control::MoveLeft, 0.01));
        assert!(!gate.press(0, Control::MoveLeft, 0.02));
    }

    #[test]
    fn test_release_resets_hold() {
        let mut gate = RepeatGate::new();
        assert!(gate.press(0, Control::MoveLeft, 0.0));
        gate.release(0, Control::MoveLeft);
        assert!(gate.press(0, Control::MoveLeft, 0.01));
    }

    #[test]
    fn test_non_repeating_controls_always_fire() {
        let mut gate = RepeatGate::new();
        assert!(gate.press(0, Control::Rotate, 0.0));
        assert!(gate.press(0, Control::Rotate, 0.01));
    }
}
