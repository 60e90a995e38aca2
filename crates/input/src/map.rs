//! Key mapping from terminal events to player controls.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press asks for. Movement controls feed an input record; the
/// rest are decisions the front-end routes to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    /// Restart the match (solo) or ask the peer to.
    Restart,
    /// Pause, or ask to resume when already paused.
    Pause,
    /// Accept the peer's open request.
    Accept,
    /// Decline the peer's open request.
    Decline,
}

impl Control {
    /// Controls that may auto-repeat while held.
    pub fn repeats(self) -> bool {
        matches!(self, Control::MoveLeft | Control::MoveRight | Control::SoftDrop)
    }
}

/// Map keyboard input to a control.
pub fn map_key(key: KeyEvent) -> Option<Control> {
    match key.code {
        // Movement
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(Control::MoveLeft)
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') | KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(Control::MoveRight)
        }
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') | KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(Control::SoftDrop)
        }

        // Rotation
        KeyCode::Up
        | KeyCode::Char('k')
        | KeyCode::Char('K')
        | KeyCode::Char('w')
        | KeyCode::Char('W') => Some(Control::Rotate),

        // Match control
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Control::Pause),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Control::Restart),
        KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => Some(Control::Accept),
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => Some(Control::Decline),

        _ => None,
    }
}

/// Map a key for two players sharing one keyboard.
///
/// Player 0 steers with WASD, player 1 with the arrow keys. Pause and
/// restart act on the whole session and are reported for player 0.
pub fn map_dual_key(key: KeyEvent) -> Option<(usize, Control)> {
    let mapped = match key.code {
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'a' => (0, Control::MoveLeft),
            'd' => (0, Control::MoveRight),
            's' => (0, Control::SoftDrop),
            'w' => (0, Control::Rotate),
            'p' => (0, Control::Pause),
            'r' => (0, Control::Restart),
            _ => return None,
        },
        KeyCode::Left => (1, Control::MoveLeft),
        KeyCode::Right => (1, Control::MoveRight),
        KeyCode::Down => (1, Control::SoftDrop),
        KeyCode::Up => (1, Control::Rotate),
        _ => return None,
    };
    Some(mapped)
}

/// Check if key should quit the game.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_keys() {
        assert_eq!(map_key(KeyEvent::from(KeyCode::Left)), Some(Control::MoveLeft));
        assert_eq!(map_key(KeyEvent::from(KeyCode::Right)), Some(Control::MoveRight));
        assert_eq!(map_key(KeyEvent::from(KeyCode::Down)), Some(Control::SoftDrop));
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('H'))), Some(Control::MoveLeft));
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('d'))), Some(Control::MoveRight));
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('J'))), Some(Control::SoftDrop));
    }

    #[test]
    fn test_rotation_keys() {
        assert_eq!(map_key(KeyEvent::from(KeyCode::Up)), Some(Control::Rotate));
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('W'))), Some(Control::Rotate));
    }

    #[test]
    fn test_decision_keys() {
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('p'))), Some(Control::Pause));
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('r'))), Some(Control::Restart));
        assert_eq!(map_key(KeyEvent::from(KeyCode::Enter)), Some(Control::Accept));
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('n'))), Some(Control::Decline));
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_only_movement_repeats() {
        assert!(Control::MoveLeft.repeats());
        assert!(Control::SoftDrop.repeats());
        assert!(!Control::Rotate.repeats());
        assert!(!Control::Pause.repeats());
    }

    #[test]
    fn test_dual_keys_split_by_player() {
        let key = |code| map_dual_key(KeyEvent::from(code));
        assert_eq!(key(KeyCode::Char('a')), Some((0, Control::MoveLeft)));
        assert_eq!(key(KeyCode::Char('D')), Some((0, Control::MoveRight)));
        assert_eq!(key(KeyCode::Char('s')), Some((0, Control::SoftDrop)));
        assert_eq!(key(KeyCode::Char('w')), Some((0, Control::Rotate)));
        assert_eq!(key(KeyCode::Left), Some((1, Control::MoveLeft)));
        assert_eq!(key(KeyCode::Right), Some((1, Control::MoveRight)));
        assert_eq!(key(KeyCode::Down), Some((1, Control::SoftDrop)));
        assert_eq!(key(KeyCode::Up), Some((1, Control::Rotate)));
        assert_eq!(key(KeyCode::Char('p')), Some((0, Control::Pause)));
        assert_eq!(key(KeyCode::Char('R')), Some((0, Control::Restart)));
        // Vim keys belong to the single-player map only.
        assert_eq!(key(KeyCode::Char('h')), None);
        assert_eq!(key(KeyCode::Enter), None);
    }

    #[test]
    fn test_quit_keys() {
        assert!(should_quit(KeyEvent::from(KeyCode::Char('q'))));
        assert!(should_quit(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('x'))));
    }
}
