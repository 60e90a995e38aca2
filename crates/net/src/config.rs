//! Configuration for a match link

use std::time::Duration;

use crate::types::{
    COUNTDOWN_SECS, DEFAULT_PORT, INDEPENDENT_SEED_OFFSET, RECONNECT_INTERVAL_SECS,
};

/// Settings shared by both roles. Timing values are in seconds unless the
/// field name says otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct NetConfig {
    /// Interface the authority listens on
    pub host: String,

    /// TCP port of the authority's endpoint
    pub port: u16,

    /// Give the follower its own piece sequence instead of sharing the authority's
    pub independent_pieces: bool,

    /// Added to the authority seed in independent-pieces mode
    pub seed_offset: u32,

    /// Use this seed instead of the clock for every match (reproducible sessions)
    pub fixed_seed: Option<u32>,

    /// Countdown armed on (re)start and resume
    pub countdown_secs: f64,

    /// Follower re-dial period after losing the authority
    pub reconnect_interval_secs: f64,

    /// Upper bound on link events handled per frame
    pub max_events_per_poll: usize,

    /// How long a synchronous flush may block the frame loop
    pub flush_timeout_ms: u64,

    /// How long a single dial attempt may take
    pub connect_timeout_ms: u64,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            independent_pieces: false,
            seed_offset: INDEPENDENT_SEED_OFFSET,
            fixed_seed: None,
            countdown_secs: COUNTDOWN_SECS,
            reconnect_interval_secs: RECONNECT_INTERVAL_SECS,
            max_events_per_poll: 64,
            flush_timeout_ms: 250,
            connect_timeout_ms: 3000,
        }
    }
}

impl NetConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TETRIS_NG_*` environment variables.
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        use std::env;

        let mut config = Self::default();
        if let Ok(host) = env::var("TETRIS_NG_HOST") {
            let host = host.trim();
            if !host.is_empty() {
                config.host = host.to_string();
            }
        }
        if let Some(port) = env::var("TETRIS_NG_PORT").ok().and_then(|s| s.parse().ok()) {
            config.port = port;
        }
        if let Ok(v) = env::var("TETRIS_NG_INDEPENDENT_PIECES") {
            config.independent_pieces = v == "1" || v.eq_ignore_ascii_case("true");
        }
        config.fixed_seed = env::var("TETRIS_NG_SEED").ok().and_then(|s| s.parse().ok());
        config
    }

    /// Set the host to listen on
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the TCP port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Choose between shared and independent piece sequences
    pub fn with_independent_pieces(mut self, independent: bool) -> Self {
        self.independent_pieces = independent;
        self
    }

    /// Pin the match seed
    pub fn with_fixed_seed(mut self, seed: Option<u32>) -> Self {
        self.fixed_seed = seed;
        self
    }

    /// Set the countdown length
    pub fn with_countdown_secs(mut self, secs: f64) -> Self {
        self.countdown_secs = secs.max(0.0);
        self
    }

    /// Set the per-frame event budget (at least one)
    pub fn with_max_events_per_poll(mut self, max: usize) -> Self {
        self.max_events_per_poll = max.max(1);
        self
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NetConfig::default();
        assert_eq!(config.port, 1234);
        assert!(!config.independent_pieces);
        assert_eq!(config.seed_offset, 9999);
        assert_eq!(config.countdown_secs, 3.5);
        assert_eq!(config.reconnect_interval_secs, 1.0);
        assert_eq!(config.max_events_per_poll, 64);
    }

    #[test]
    fn test_builder() {
        let config = NetConfig::new()
            .with_port(4321)
            .with_independent_pieces(true)
            .with_fixed_seed(Some(7))
            .with_max_events_per_poll(0);
        assert_eq!(config.port, 4321);
        assert!(config.independent_pieces);
        assert_eq!(config.fixed_seed, Some(7));
        assert_eq!(config.max_events_per_poll, 1);
    }
}
