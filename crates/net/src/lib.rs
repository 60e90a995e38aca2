//! Two-player synchronization over a reliable ordered link.
//!
//! Each peer runs two kernels: its own player and a mirror of the other. The
//! [`Coordinator`] keeps the mirrors honest by relaying inputs, seeds and
//! gravity ticks, and gates restart/pause/resume behind a handshake.
//!
//! # Module Structure
//!
//! - [`protocol`]: tagged binary codec for the eleven message kinds
//! - [`transport`]: the [`Link`] trait, the tokio-backed [`TcpLink`] and an
//!   in-process [`LoopbackLink`]
//! - [`coordinator`]: the synchronization state machine
//! - [`handshake`], [`clock`], [`lifecycle`]: the coordinator's parts
//! - [`config`], [`error`], [`addr`]: plumbing
//!
//! # Example
//!
//! ```
//! use tetris_ng_core::Game;
//! use tetris_ng_net::{Coordinator, LoopbackLink, NetConfig, Role};
//!
//! let (a, b) = LoopbackLink::pair();
//! let config = NetConfig::default().with_fixed_seed(Some(42));
//!
//! let mut host = Coordinator::new(config.clone());
//! let mut guest = Coordinator::new(config);
//! host.attach(Role::Authority, Box::new(a));
//! guest.attach(Role::Follower, Box::new(b));
//!
//! let (mut h_local, mut h_remote) = (Game::default(), Game::default());
//! let (mut g_local, mut g_remote) = (Game::default(), Game::default());
//!
//! host.update(0.0, &mut h_local, &mut h_remote);
//! guest.update(0.0, &mut g_local, &mut g_remote);
//!
//! assert_eq!(h_local.state_hash(), g_remote.state_hash());
//! assert_eq!(g_local.state_hash(), h_remote.state_hash());
//! ```

pub mod addr;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handshake;
pub mod lifecycle;
pub mod protocol;
pub mod transport;

pub use tetris_ng_core as core;
pub use tetris_ng_types as types;

pub use addr::{local_ip_hint, resolve};
pub use clock::MatchClock;
pub use config::NetConfig;
pub use coordinator::{Coordinator, SyncStatus};
pub use error::{NetError, Result};
pub use handshake::{HandshakeState, Handshakes};
pub use lifecycle::{LinkPhase, ReconnectPolicy, Role};
pub use protocol::{decode, encode, DecodeError, Frame, Message, MessageKind, RequestKind, SeedPair};
pub use transport::{Link, LinkEvent, LoopbackLink, LoopbackWire, TcpLink};
