//! End-to-end match over real sockets on localhost

use std::thread;
use std::time::{Duration, Instant};

use tetris_ng::core::Game;
use tetris_ng::net::{Coordinator, LinkPhase, NetConfig, NetError, Role};
use tetris_ng::types::InputRecord;

struct Peer {
    coord: Coordinator,
    local: Game,
    remote: Game,
}

impl Peer {
    fn new(config: NetConfig) -> Self {
        Self {
            coord: Coordinator::new(config),
            local: Game::default(),
            remote: Game::default(),
        }
    }

    fn update(&mut self) {
        self.coord.update(0.0, &mut self.local, &mut self.remote);
    }
}

/// Pump both peers until `done` holds or five seconds pass.
fn pump_until(host: &mut Peer, guest: &mut Peer, mut done: impl FnMut(&Peer, &Peer) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        host.update();
        guest.update();
        if done(&*host, &*guest) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

fn base_config() -> NetConfig {
    NetConfig::default()
        .with_host("127.0.0.1")
        .with_port(0)
        .with_fixed_seed(Some(7))
}

#[test]
fn test_tcp_match_connects_and_mirrors_input() {
    let mut host = Peer::new(base_config());
    let addr = host.coord.start_authority().unwrap();
    assert_ne!(addr.port(), 0);
    assert_eq!(host.coord.role(), Role::Authority);
    assert_eq!(host.coord.phase(), LinkPhase::WaitingForPeer);
    assert_eq!(host.coord.local_addr(), Some(addr));

    let mut guest = Peer::new(base_config().with_port(addr.port()));
    guest.coord.start_follower("127.0.0.1").unwrap();

    assert!(
        pump_until(&mut host, &mut guest, |h, g| {
            h.coord.is_connected() && g.coord.is_connected() && g.local.seed() == 7
        }),
        "peers never paired"
    );
    assert_eq!(host.local.state_hash(), guest.remote.state_hash());

    let frame = InputRecord {
        move_left: true,
        soft_drop: true,
        ..InputRecord::default()
    };
    guest.coord.submit_local_input(frame, &mut guest.local);
    assert_eq!(guest.local.score(), 1);
    assert!(
        pump_until(&mut host, &mut guest, |h, _| h.remote.score() == 1),
        "input never arrived"
    );
    assert_eq!(host.remote.state_hash(), guest.local.state_hash());

    guest.coord.send_quit();
    assert!(
        pump_until(&mut host, &mut guest, |h, _| h.coord.peer_quit()),
        "quit never arrived"
    );
}

#[test]
fn test_tcp_follower_without_authority_keeps_retrying() {
    // Grab a free port, then release it so nothing listens there.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let mut guest = Peer::new(base_config().with_port(port));
    guest.coord.start_follower("127.0.0.1").unwrap();
    assert_eq!(guest.coord.phase(), LinkPhase::Connecting);

    for _ in 0..20 {
        guest.update();
        thread::sleep(Duration::from_millis(10));
    }
    assert!(!guest.coord.is_connected());
    assert_eq!(guest.coord.phase(), LinkPhase::Connecting);
}

#[test]
fn test_second_authority_on_same_port_fails_to_bind() {
    let mut first = Coordinator::new(base_config());
    let addr = first.start_authority().unwrap();

    let mut second = Coordinator::new(base_config().with_port(addr.port()));
    assert!(matches!(
        second.start_authority(),
        Err(NetError::Bind { .. })
    ));
    assert_eq!(second.phase(), LinkPhase::Offline);
}

#[test]
fn test_unresolvable_host_is_reported() {
    let mut guest = Coordinator::new(base_config());
    assert!(matches!(
        guest.start_follower("not a host name"),
        Err(NetError::Resolve(_))
    ));
    assert_eq!(guest.role(), Role::None);
}
