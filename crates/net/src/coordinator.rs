//! Synchronization coordinator.
//!
//! Keeps a local kernel and a mirror of the peer's kernel in lockstep over one
//! [`Link`]. The authority picks seeds and originates every gravity tick; the
//! follower only applies what it receives. Restart, pause and resume go
//! through a request/response handshake so both sides switch state together.
//!
//! Concurrent requests are settled in the authority's favour:
//!
//! - the authority declines an incoming request while it has a request of its
//!   own in flight, or while it is still deciding on another one;
//! - the follower declines an incoming request only while it is deciding on a
//!   different one, so the authority's request always gets through;
//! - a repeated request of a kind already awaiting a decision is ignored;
//! - a response with nothing pending is ignored.
//!
//! Requests never time out. A disconnect clears them.

use std::net::SocketAddr;

use tracing::{debug, info, warn};

use crate::addr::resolve;
use crate::clock::MatchClock;
use crate::config::NetConfig;
use crate::core::{seed_from_clock, Game};
use crate::error::{NetError, Result};
use crate::handshake::{HandshakeState, Handshakes};
use crate::lifecycle::{LinkPhase, ReconnectPolicy, Role};
use crate::protocol::{Message, RequestKind, SeedPair};
use crate::transport::{Link, LinkEvent, TcpLink};
use crate::types::InputRecord;

/// Everything the presentation layer reads each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncStatus {
    pub role: Role,
    pub phase: LinkPhase,
    pub connected: bool,
    pub peer_quit: bool,
    pub remote_started_new_game: bool,
    pub restart: HandshakeState,
    pub pause: HandshakeState,
    pub resume: HandshakeState,
    pub paused: bool,
    /// Seconds left before play (re)starts.
    pub countdown: f64,
}

pub struct Coordinator {
    config: NetConfig,
    role: Role,
    link: Option<Box<dyn Link>>,
    connected: bool,
    ever_connected: bool,
    peer_quit: bool,
    remote_started_new_game: bool,
    handshakes: Handshakes,
    clock: MatchClock,
    reconnect: ReconnectPolicy,
}

impl Coordinator {
    pub fn new(config: NetConfig) -> Self {
        let clock = MatchClock::new(config.countdown_secs);
        let reconnect = ReconnectPolicy::new(config.reconnect_interval_secs);
        Self {
            config,
            role: Role::None,
            link: None,
            connected: false,
            ever_connected: false,
            peer_quit: false,
            remote_started_new_game: false,
            handshakes: Handshakes::default(),
            clock,
            reconnect,
        }
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Open the listening endpoint and become the authority.
    ///
    /// Any previous link is stopped first. Returns the bound address.
    pub fn start_authority(&mut self) -> Result<SocketAddr> {
        self.stop();
        let addr = resolve(&self.config.host, self.config.port)?;
        let link = TcpLink::listen(addr, &self.config)?;
        let bound = link.local_addr().unwrap_or(addr);
        self.attach(Role::Authority, Box::new(link));
        Ok(bound)
    }

    /// Dial the authority at `host` and become the follower.
    ///
    /// Fails only if the address does not resolve or the endpoint cannot be
    /// created. An unreachable authority is retried like a lost one.
    pub fn start_follower(&mut self, host: &str) -> Result<()> {
        self.stop();
        let target = resolve(host, self.config.port)?;
        let link = TcpLink::dial(target, &self.config)?;
        info!(%target, "dialing authority");
        self.attach(Role::Follower, Box::new(link));
        Ok(())
    }

    /// Drive an already-built link in `role`.
    pub fn attach(&mut self, role: Role, link: Box<dyn Link>) {
        self.stop();
        self.role = role;
        self.link = Some(link);
    }

    /// Per-frame step: drain link events, run the countdown, originate
    /// gravity on the authority and retry a lost follower link.
    pub fn update(&mut self, dt: f64, local: &mut Game, remote: &mut Game) {
        if self.link.is_none() {
            return;
        }
        self.pump(local, remote);
        self.clock.advance(dt);

        if self.role == Role::Authority {
            let running = self.gravity_running(local, remote);
            if self.clock.gravity_due(dt, local.fall_interval(), running) {
                local.tick();
                remote.tick();
                self.send(&Message::GravityTick);
            }
        }

        if self.role == Role::Follower && self.reconnect.poll(dt) {
            if let Some(link) = self.link.as_mut() {
                debug!("re-dialing authority");
                link.redial();
            }
        }
    }

    fn gravity_running(&self, local: &Game, remote: &Game) -> bool {
        self.connected
            && !self.peer_quit
            && !self.clock.is_paused()
            && self.clock.countdown_elapsed()
            && !self.handshakes.any_active()
            && !self.remote_started_new_game
            && !(local.is_game_over() && remote.is_game_over())
    }

    fn pump(&mut self, local: &mut Game, remote: &mut Game) {
        for _ in 0..self.config.max_events_per_poll {
            let Some(event) = self.link.as_mut().and_then(|link| link.poll()) else {
                break;
            };
            match event {
                LinkEvent::Connected => self.on_connected(local, remote),
                LinkEvent::Message(message) => self.on_message(message, local, remote),
                LinkEvent::Disconnected => self.on_disconnected(),
            }
        }
    }

    fn on_connected(&mut self, local: &mut Game, remote: &mut Game) {
        self.connected = true;
        self.ever_connected = true;
        self.peer_quit = false;
        self.handshakes.clear();
        self.reconnect.disarm();
        info!(role = ?self.role, "peer link up");
        if self.role == Role::Authority {
            self.start_match(local, remote);
        }
    }

    fn on_disconnected(&mut self) {
        if !self.connected {
            debug!("link attempt failed");
            if self.role == Role::Follower && !self.peer_quit {
                self.reconnect.arm();
            }
            return;
        }

        self.connected = false;
        self.handshakes.clear();
        self.clock.set_paused(false);
        match self.role {
            Role::Authority => {
                self.peer_quit = true;
                info!("peer left, waiting for a new one");
            }
            Role::Follower if !self.peer_quit => {
                info!("lost the authority, reconnecting");
                self.reconnect.arm();
            }
            _ => info!("peer link down"),
        }
    }

    fn on_message(&mut self, message: Message, local: &mut Game, remote: &mut Game) {
        match message {
            Message::Input(input) => {
                remote.apply_input(input);
                remote.overwrite_score(input.score);
            }
            Message::Seed(pair) => {
                if self.role != Role::Follower {
                    warn!("seed from a peer that is not the authority, ignored");
                    return;
                }
                info!(authority = pair.authority, follower = pair.follower, "seeds received");
                local.reset(Some(pair.follower));
                remote.reset(Some(pair.authority));
                self.clock.rearm();
            }
            Message::GravityTick => {
                if self.role != Role::Follower {
                    warn!("gravity tick from a peer that is not the authority, ignored");
                } else if !self.clock.countdown_elapsed() {
                    warn!("gravity tick during countdown, dropped");
                } else {
                    local.tick();
                    remote.tick();
                }
            }
            Message::Request(kind) => self.on_request(kind),
            Message::Response { kind, accepted } => self.on_response(kind, accepted, local, remote),
            Message::Quit => {
                info!("peer quit");
                self.peer_quit = true;
                self.handshakes.clear();
                self.reconnect.disarm();
            }
            Message::NewGameAnnounce => {
                debug!("peer started a new game");
                self.remote_started_new_game = true;
            }
        }
    }

    fn on_request(&mut self, kind: RequestKind) {
        if self.handshakes.get(kind).received {
            debug!(kind = kind.as_str(), "duplicate request ignored");
            return;
        }
        let contested = match self.role {
            Role::Authority => {
                self.handshakes.any_pending() || self.handshakes.received_other_than(kind)
            }
            _ => self.handshakes.received_other_than(kind),
        };
        if contested {
            warn!(kind = kind.as_str(), "request while another is open, declining");
            self.send(&Message::Response {
                kind,
                accepted: false,
            });
            return;
        }
        info!(kind = kind.as_str(), "peer requested");
        self.handshakes.get_mut(kind).received = true;
    }

    fn on_response(&mut self, kind: RequestKind, accepted: bool, local: &mut Game, remote: &mut Game) {
        let state = self.handshakes.get_mut(kind);
        if !state.pending {
            warn!(kind = kind.as_str(), "response with nothing pending, ignored");
            return;
        }
        state.pending = false;
        info!(kind = kind.as_str(), accepted, "peer answered");
        if accepted {
            self.apply_accepted(kind, local, remote);
        }
    }

    fn apply_accepted(&mut self, kind: RequestKind, local: &mut Game, remote: &mut Game) {
        match kind {
            RequestKind::Restart => match self.role {
                Role::Authority => self.start_match(local, remote),
                _ => {
                    // The authority's Seed follows and resets both again.
                    local.reset(None);
                    remote.reset(None);
                    self.clock.rearm();
                }
            },
            RequestKind::Pause => {
                self.clock.rearm();
                self.clock.set_paused(true);
            }
            RequestKind::Resume => self.clock.rearm(),
        }
    }

    fn next_seed_pair(&self) -> SeedPair {
        let seed = self.config.fixed_seed.unwrap_or_else(seed_from_clock);
        if self.config.independent_pieces {
            SeedPair::independent(seed, self.config.seed_offset)
        } else {
            SeedPair::shared(seed)
        }
    }

    /// Authority only: pick seeds, tell the follower, reset both kernels.
    fn start_match(&mut self, local: &mut Game, remote: &mut Game) {
        let pair = self.next_seed_pair();
        self.send_seed_pair(pair);
        local.reset(Some(pair.authority));
        remote.reset(Some(pair.follower));
        self.clock.rearm();
        info!(authority = pair.authority, follower = pair.follower, "seeds distributed");
    }

    fn send(&mut self, message: &Message) {
        if !self.connected {
            return;
        }
        if let Some(link) = self.link.as_mut() {
            link.send(message);
        }
    }

    /// Forward one frame of local input.
    pub fn send_input(&mut self, input: InputRecord) {
        self.send(&Message::Input(input));
    }

    /// Apply local input, stamp the resulting score and forward it.
    pub fn submit_local_input(&mut self, mut input: InputRecord, local: &mut Game) {
        local.apply_input(input);
        input.score = local.score();
        self.send_input(input);
    }

    pub fn send_seed_pair(&mut self, pair: SeedPair) {
        self.send(&Message::Seed(pair));
    }

    /// Forward one gravity step. Only the authority may originate gravity.
    pub fn send_gravity_tick(&mut self) -> Result<()> {
        if self.role != Role::Authority {
            return Err(NetError::NotAuthority);
        }
        self.send(&Message::GravityTick);
        Ok(())
    }

    /// Ask the peer for a shared transition. No-op while one of the same kind
    /// is already pending or when no peer is attached.
    pub fn send_request(&mut self, kind: RequestKind) {
        if !self.connected {
            debug!(kind = kind.as_str(), "no peer, request not sent");
            return;
        }
        if self.handshakes.get(kind).pending {
            return;
        }
        self.send(&Message::Request(kind));
        self.handshakes.get_mut(kind).pending = true;
        info!(kind = kind.as_str(), "request sent");
    }

    /// Answer the peer's request without applying any local effect.
    pub fn send_response(&mut self, kind: RequestKind, accepted: bool) {
        self.send(&Message::Response { kind, accepted });
        self.handshakes.get_mut(kind).received = false;
    }

    /// Answer the peer's request and apply the accepted transition locally.
    pub fn respond(&mut self, kind: RequestKind, accepted: bool, local: &mut Game, remote: &mut Game) {
        if !self.handshakes.get(kind).received {
            warn!(kind = kind.as_str(), "no request of this kind to answer");
            return;
        }
        self.send_response(kind, accepted);
        info!(kind = kind.as_str(), accepted, "answered peer");
        if accepted {
            self.handshakes.clear_received();
            self.apply_accepted(kind, local, remote);
        }
    }

    /// Tell the peer we are leaving and flush before returning.
    pub fn send_quit(&mut self) {
        if !self.connected {
            return;
        }
        if let Some(link) = self.link.as_mut() {
            link.send(&Message::Quit);
            link.flush();
        }
    }

    pub fn send_new_game_announce(&mut self) {
        self.send(&Message::NewGameAnnounce);
    }

    /// Join the peer's new game: clear the announcement and start both
    /// kernels over.
    pub fn acknowledge_new_game(&mut self, local: &mut Game, remote: &mut Game) {
        if !self.remote_started_new_game {
            return;
        }
        self.remote_started_new_game = false;
        local.reset(None);
        remote.reset(None);
        info!("joined peer's new game");
    }

    /// Drop the link and forget every flag and the role.
    pub fn stop(&mut self) {
        if let Some(mut link) = self.link.take() {
            if self.connected {
                link.disconnect();
            }
            info!(role = ?self.role, "link stopped");
        }
        self.role = Role::None;
        self.connected = false;
        self.ever_connected = false;
        self.peer_quit = false;
        self.remote_started_new_game = false;
        self.handshakes.clear();
        self.clock.reset();
        self.reconnect.disarm();
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn peer_quit(&self) -> bool {
        self.peer_quit
    }

    pub fn remote_started_new_game(&self) -> bool {
        self.remote_started_new_game
    }

    pub fn handshake(&self, kind: RequestKind) -> HandshakeState {
        self.handshakes.get(kind)
    }

    /// Any of the six handshake flags is set.
    pub fn any_request_active(&self) -> bool {
        self.handshakes.any_active()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn countdown(&self) -> f64 {
        self.clock.countdown()
    }

    /// Address of the listening endpoint (authority only).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.link.as_ref().and_then(|link| link.local_addr())
    }

    /// True while local input must not reach the local kernel.
    pub fn input_blocked(&self) -> bool {
        !self.connected
            || self.peer_quit
            || self.clock.is_paused()
            || !self.clock.countdown_elapsed()
            || self.handshakes.any_active()
            || self.remote_started_new_game
    }

    pub fn phase(&self) -> LinkPhase {
        match self.role {
            Role::None => LinkPhase::Offline,
            _ if self.connected => LinkPhase::Connected,
            Role::Authority => LinkPhase::WaitingForPeer,
            Role::Follower if self.peer_quit => LinkPhase::PeerQuit,
            Role::Follower if self.ever_connected => LinkPhase::Reconnecting,
            Role::Follower => LinkPhase::Connecting,
        }
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            role: self.role,
            phase: self.phase(),
            connected: self.connected,
            peer_quit: self.peer_quit,
            remote_started_new_game: self.remote_started_new_game,
            restart: self.handshakes.get(RequestKind::Restart),
            pause: self.handshakes.get(RequestKind::Pause),
            resume: self.handshakes.get(RequestKind::Resume),
            paused: self.clock.is_paused(),
            countdown: self.clock.countdown(),
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackLink;

    #[test]
    fn test_follower_cannot_originate_gravity() {
        let (a, _b) = LoopbackLink::pair();
        let mut follower = Coordinator::new(NetConfig::default());
        follower.attach(Role::Follower, Box::new(a));
        assert!(matches!(
            follower.send_gravity_tick(),
            Err(NetError::NotAuthority)
        ));
    }

    #[test]
    fn test_offline_coordinator_is_inert() {
        let mut coord = Coordinator::new(NetConfig::default());
        let mut local = Game::new(1);
        let mut remote = Game::new(1);
        let before = local.state_hash();
        coord.update(10.0, &mut local, &mut remote);
        coord.send_request(RequestKind::Pause);
        assert_eq!(coord.phase(), LinkPhase::Offline);
        assert!(!coord.handshake(RequestKind::Pause).pending);
        assert_eq!(local.state_hash(), before);
        assert!(coord.input_blocked());
    }

    #[test]
    fn test_stop_clears_role_and_flags() {
        let (a, _b) = LoopbackLink::pair();
        let mut coord = Coordinator::new(NetConfig::default().with_fixed_seed(Some(5)));
        let mut local = Game::new(1);
        let mut remote = Game::new(1);
        coord.attach(Role::Authority, Box::new(a));
        coord.update(0.0, &mut local, &mut remote);
        assert!(coord.is_connected());
        coord.send_request(RequestKind::Restart);
        assert!(coord.any_request_active());

        coord.stop();
        assert_eq!(coord.role(), Role::None);
        assert!(!coord.is_connected());
        assert!(!coord.any_request_active());
        assert_eq!(coord.phase(), LinkPhase::Offline);
    }
}
