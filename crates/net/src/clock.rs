//! Match clock: countdown, pause state and the authority's gravity timer.

/// Frame-time driven clock for one match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchClock {
    countdown_secs: f64,
    countdown: f64,
    paused: bool,
    gravity_acc: f64,
}

impl MatchClock {
    pub fn new(countdown_secs: f64) -> Self {
        Self {
            countdown_secs,
            countdown: 0.0,
            paused: false,
            gravity_acc: 0.0,
        }
    }

    /// Unpause and start a full countdown.
    pub fn rearm(&mut self) {
        self.paused = false;
        self.countdown = self.countdown_secs;
        self.gravity_acc = 0.0;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Seconds left on the countdown (zero once elapsed).
    pub fn countdown(&self) -> f64 {
        self.countdown.max(0.0)
    }

    pub fn countdown_elapsed(&self) -> bool {
        self.countdown <= 0.0
    }

    /// Run the countdown. It does not move while paused.
    pub fn advance(&mut self, dt: f64) {
        if !self.paused && self.countdown > 0.0 {
            self.countdown -= dt;
        }
    }

    /// Accumulate `dt` toward the next gravity step.
    ///
    /// While `running` is false the accumulator is held at zero, so a piece
    /// never drops the instant play resumes.
    pub fn gravity_due(&mut self, dt: f64, interval: f64, running: bool) -> bool {
        if !running {
            self.gravity_acc = 0.0;
            return false;
        }
        self.gravity_acc += dt;
        if self.gravity_acc >= interval {
            self.gravity_acc = 0.0;
            true
        } else {
            false
        }
    }

    /// Back to the idle state: not paused, no countdown.
    pub fn reset(&mut self) {
        self.countdown = 0.0;
        self.paused = false;
        self.gravity_acc = 0.0;
    }
}
