//! Request/response bookkeeping for restart, pause and resume.

use crate::protocol::RequestKind;

/// Flags for one request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandshakeState {
    /// We asked and are waiting for the peer's answer.
    pub pending: bool,
    /// The peer asked and is waiting for ours.
    pub received: bool,
}

impl HandshakeState {
    pub fn is_active(&self) -> bool {
        self.pending || self.received
    }
}

/// The six handshake flags of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Handshakes {
    restart: HandshakeState,
    pause: HandshakeState,
    resume: HandshakeState,
}

impl Handshakes {
    pub fn get(&self, kind: RequestKind) -> HandshakeState {
        match kind {
            RequestKind::Restart => self.restart,
            RequestKind::Pause => self.pause,
            RequestKind::Resume => self.resume,
        }
    }

    pub fn get_mut(&mut self, kind: RequestKind) -> &mut HandshakeState {
        match kind {
            RequestKind::Restart => &mut self.restart,
            RequestKind::Pause => &mut self.pause,
            RequestKind::Resume => &mut self.resume,
        }
    }

    /// Any flag set at all.
    pub fn any_active(&self) -> bool {
        RequestKind::ALL.iter().any(|&k| self.get(k).is_active())
    }

    pub fn any_pending(&self) -> bool {
        RequestKind::ALL.iter().any(|&k| self.get(k).pending)
    }

    /// A received request of some other kind is awaiting our decision.
    pub fn received_other_than(&self, kind: RequestKind) -> bool {
        RequestKind::ALL
            .iter()
            .any(|&k| k != kind && self.get(k).received)
    }

    pub fn clear_received(&mut self) {
        for kind in RequestKind::ALL {
            self.get_mut(kind).received = false;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_independent_per_kind() {
        let mut hs = Handshakes::default();
        hs.get_mut(RequestKind::Pause).pending = true;
        assert!(hs.get(RequestKind::Pause).pending);
        assert!(!hs.get(RequestKind::Restart).is_active());
        assert!(hs.any_pending());
        assert!(hs.any_active());
    }

    #[test]
    fn test_received_other_than() {
        let mut hs = Handshakes::default();
        hs.get_mut(RequestKind::Restart).received = true;
        assert!(!hs.received_other_than(RequestKind::Restart));
        assert!(hs.received_other_than(RequestKind::Pause));
    }

    #[test]
    fn test_clear_received_keeps_pending() {
        let mut hs = Handshakes::default();
        hs.get_mut(RequestKind::Resume).pending = true;
        hs.get_mut(RequestKind::Pause).received = true;
        hs.clear_received();
        assert!(hs.get(RequestKind::Resume).pending);
        assert!(!hs.get(RequestKind::Pause).received);
        hs.clear();
        assert!(!hs.any_active());
    }
}
