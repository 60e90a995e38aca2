//! Terminal runner (default binary).
//!
//! `solo` plays a single local game and `local` puts two players on one
//! keyboard. `host` and `join` play a networked match: each screen shows the
//! local player on the left and a mirror of the opponent on the right, kept in
//! lockstep by the coordinator.

mod render;
mod session;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

use tetris_ng::core::{seed_from_clock, Game};
use tetris_ng::input::{map_dual_key, map_key, should_quit, Control, RepeatGate};
use tetris_ng::net::{local_ip_hint, Coordinator, NetConfig, RequestKind};
use tetris_ng::types::InputRecord;

use render::{board_lines, session_line, side_by_side, status_line, TerminalRenderer};
use session::LocalSession;

const FRAME: Duration = Duration::from_millis(16);

/// tetris-ng - two-player terminal falling-block game
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TCP port of the authority (overrides TETRIS_NG_PORT)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Play alone
    Solo,
    /// Two players on one keyboard: WASD against the arrow keys
    Local {
        /// Give each player a different piece sequence
        #[arg(short, long)]
        independent_pieces: bool,
    },
    /// Host a match and wait for an opponent
    Host {
        /// Give each player a different piece sequence
        #[arg(short, long)]
        independent_pieces: bool,
    },
    /// Join a match hosted at HOST
    Join {
        host: String,
    },
}

fn init_tracing() -> Result<()> {
    // The terminal belongs to the game, so logs only go to a file.
    let Ok(path) = std::env::var("TETRIS_NG_LOG") else {
        return Ok(());
    };
    let file = File::create(&path).with_context(|| format!("cannot create log file {path}"))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let mut config = NetConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = match args.mode.unwrap_or(Mode::Solo) {
        Mode::Solo => run_local(&mut term, LocalSession::solo(seed_from_clock())),
        Mode::Local { independent_pieces } => run_local(
            &mut term,
            LocalSession::dual(seed_from_clock(), independent_pieces),
        ),
        Mode::Host { independent_pieces } => {
            config.independent_pieces |= independent_pieces;
            run_match(&mut term, config, None)
        }
        Mode::Join { host } => run_match(&mut term, config, Some(host)),
    };

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

/// Keys pressed this frame, after auto-repeat gating.
struct FrameKeys {
    /// Movement per local player.
    inputs: [InputRecord; 2],
    controls: Vec<Control>,
    quit: bool,
}

type KeyMap = fn(KeyEvent) -> Option<(usize, Control)>;

fn single_player(key: KeyEvent) -> Option<(usize, Control)> {
    map_key(key).map(|control| (0, control))
}

fn read_keys(gate: &mut RepeatGate, now: f64, keymap: KeyMap) -> Result<FrameKeys> {
    let mut keys = FrameKeys {
        inputs: [InputRecord::default(); 2],
        controls: Vec::new(),
        quit: false,
    };
    while event::poll(Duration::ZERO)? {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            if let Some((player, control)) = keymap(key) {
                gate.release(player, control);
            }
            continue;
        }
        if should_quit(key) {
            keys.quit = true;
            break;
        }
        let Some((player, control)) = keymap(key) else {
            continue;
        };
        if !gate.press(player, control, now) {
            continue;
        }
        let Some(input) = keys.inputs.get_mut(player) else {
            continue;
        };
        match control {
            Control::MoveLeft => input.move_left = true,
            Control::MoveRight => input.move_right = true,
            Control::SoftDrop => input.soft_drop = true,
            Control::Rotate => input.rotate = true,
            Control::Restart => input.reset = true,
            Control::Pause | Control::Accept | Control::Decline => keys.controls.push(control),
        }
    }
    Ok(keys)
}

/// Solo and dual-local play. Restart and pause need no agreement here.
fn run_local(term: &mut TerminalRenderer, mut session: LocalSession) -> Result<()> {
    let dual = session.games().len() == 2;
    let (keymap, help) = if dual {
        (
            map_dual_key as KeyMap,
            "p1 wasd, p2 arrows, p pause, r restart, q quit",
        )
    } else {
        (
            single_player as KeyMap,
            "arrows move, up rotates, p pause, r restart, q quit",
        )
    };

    let mut gate = RepeatGate::new();
    let started = Instant::now();
    let mut last = Instant::now();

    loop {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        let keys = read_keys(&mut gate, started.elapsed().as_secs_f64(), keymap)?;
        if keys.quit {
            return Ok(());
        }
        if keys.controls.contains(&Control::Pause) {
            session.toggle_pause();
        }
        if keys.inputs.iter().any(|input| input.reset) {
            session.restart(seed_from_clock());
            gate.clear();
        }

        session.update(dt, &keys.inputs);

        let mut lines = match session.games() {
            [solo] => board_lines(solo, "solo"),
            [left, right] => side_by_side(
                board_lines(left, "player 1"),
                board_lines(right, "player 2"),
            ),
            _ => Vec::new(),
        };
        lines.push(String::new());
        lines.push(session_line(&session, help));
        term.draw(&lines)?;
        std::thread::sleep(FRAME);
    }
}

fn open_request(coord: &Coordinator) -> Option<RequestKind> {
    RequestKind::ALL
        .into_iter()
        .find(|&kind| coord.handshake(kind).received)
}

fn run_match(term: &mut TerminalRenderer, config: NetConfig, join: Option<String>) -> Result<()> {
    let mut coord = Coordinator::new(config);
    let mut local = Game::default();
    let mut remote = Game::default();

    let banner = match &join {
        None => {
            let addr = coord.start_authority()?;
            let ip = local_ip_hint().unwrap_or_else(|| addr.ip());
            format!("hosting on {}:{}", ip, addr.port())
        }
        Some(host) => {
            coord.start_follower(host)?;
            format!("joining {host}")
        }
    };

    let mut gate = RepeatGate::new();
    let started = Instant::now();
    let mut last = Instant::now();

    loop {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        let keys = read_keys(&mut gate, started.elapsed().as_secs_f64(), single_player)?;
        if keys.quit {
            coord.send_quit();
            coord.stop();
            return Ok(());
        }

        if keys.inputs[0].reset {
            if coord.remote_started_new_game() {
                coord.acknowledge_new_game(&mut local, &mut remote);
            } else {
                coord.send_request(RequestKind::Restart);
            }
        }
        for control in &keys.controls {
            match control {
                Control::Pause if coord.is_paused() => coord.send_request(RequestKind::Resume),
                Control::Pause => coord.send_request(RequestKind::Pause),
                Control::Accept | Control::Decline => {
                    let accepted = *control == Control::Accept;
                    if let Some(kind) = open_request(&coord) {
                        coord.respond(kind, accepted, &mut local, &mut remote);
                    } else if coord.remote_started_new_game() {
                        coord.acknowledge_new_game(&mut local, &mut remote);
                    }
                }
                _ => {}
            }
        }

        coord.update(dt, &mut local, &mut remote);

        let mut movement = keys.inputs[0];
        movement.reset = false;
        if !coord.input_blocked() && !local.is_game_over() && !movement.is_idle() {
            coord.submit_local_input(movement, &mut local);
        }

        let mut lines = side_by_side(board_lines(&local, "you"), board_lines(&remote, "opponent"));
        lines.push(String::new());
        lines.push(status_line(&coord.status(), &banner));
        term.draw(&lines)?;
        std::thread::sleep(FRAME);
    }
}
