//! Connection lifecycle: role, phase and the follower's reconnect schedule.

/// Which side of the match this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// No link.
    #[default]
    None,
    /// Listens, picks seeds, originates gravity.
    Authority,
    /// Dials, applies the authority's seeds and ticks.
    Follower,
}

/// Coarse link state for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    /// No role, nothing running.
    Offline,
    /// Authority with no peer attached.
    WaitingForPeer,
    /// Follower that has not reached the authority yet.
    Connecting,
    /// Paired.
    Connected,
    /// Follower that lost the authority and is re-dialing.
    Reconnecting,
    /// Follower whose authority quit on purpose. No retries.
    PeerQuit,
}

/// Re-dial schedule. The first attempt after arming fires immediately, then
/// one every `interval` seconds until disarmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    interval: f64,
    wait: Option<f64>,
}

impl ReconnectPolicy {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            wait: None,
        }
    }

    /// Start retrying. Has no effect if already retrying.
    pub fn arm(&mut self) {
        if self.wait.is_none() {
            self.wait = Some(0.0);
        }
    }

    pub fn disarm(&mut self) {
        self.wait = None;
    }

    pub fn is_armed(&self) -> bool {
        self.wait.is_some()
    }

    /// Advance by `dt`; true when an attempt should be made now.
    pub fn poll(&mut self, dt: f64) -> bool {
        let Some(wait) = self.wait.as_mut() else {
            return false;
        };
        *wait -= dt;
        if *wait <= 0.0 {
            *wait = self.interval;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disarmed_policy_never_fires() {
        let mut policy = ReconnectPolicy::new(1.0);
        for _ in 0..10 {
            assert!(!policy.poll(1.0));
        }
    }

    #[test]
    fn test_first_attempt_immediate_then_periodic() {
        let mut policy = ReconnectPolicy::new(1.0);
        policy.arm();
        assert!(policy.poll(0.25));
        // 20 x 0.25 = 5 seconds of retries at a 1 second interval.
        let fired = (0..20).filter(|_| policy.poll(0.25)).count();
        assert_eq!(fired, 5);
    }

    #[test]
    fn test_rearm_does_not_reset_schedule() {
        let mut policy = ReconnectPolicy::new(1.0);
        policy.arm();
        assert!(policy.poll(0.0));
        policy.arm();
        assert!(!policy.poll(0.5));
        policy.disarm();
        assert!(!policy.is_armed());
        assert!(!policy.poll(5.0));
    }
}
