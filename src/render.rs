//! Text renderer: draws one or two playfields as plain lines.
//!
//! Every frame is a full redraw of a handful of short lines, written through
//! crossterm's queued commands into one buffer and flushed once.

use std::io::{self, Write};

use anyhow::Result;
use crossterm::{cursor, style::Print, terminal, QueueableCommand};

use tetris_ng::core::Game;
use tetris_ng::net::{LinkPhase, SyncStatus};
use tetris_ng::types::{BOARD_HEIGHT, BOARD_WIDTH};

use crate::session::{LocalSession, Outcome};

const GAP: &str = "    ";

pub struct TerminalRenderer {
    stdout: io::Stdout,
    buf: Vec<u8>,
    entered: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            buf: Vec::with_capacity(8 * 1024),
            entered: false,
        }
    }

    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.entered = true;
        self.buf.clear();
        self.buf.queue(terminal::EnterAlternateScreen)?;
        self.buf.queue(cursor::Hide)?;
        self.flush_buf()
    }

    pub fn exit(&mut self) -> Result<()> {
        if !self.entered {
            return Ok(());
        }
        self.entered = false;
        self.buf.clear();
        self.buf.queue(cursor::Show)?;
        self.buf.queue(terminal::LeaveAlternateScreen)?;
        self.flush_buf()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn draw(&mut self, lines: &[String]) -> Result<()> {
        self.buf.clear();
        for (row, line) in lines.iter().enumerate() {
            self.buf.queue(cursor::MoveTo(0, row as u16))?;
            self.buf.queue(Print(line))?;
            self.buf
                .queue(terminal::Clear(terminal::ClearType::UntilNewLine))?;
        }
        self.buf
            .queue(terminal::Clear(terminal::ClearType::FromCursorDown))?;
        self.flush_buf()
    }

    fn flush_buf(&mut self) -> Result<()> {
        self.stdout.write_all(&self.buf)?;
        self.stdout.flush()?;
        Ok(())
    }
}

/// One playfield with a title, score panel and next-piece line.
pub fn board_lines(game: &Game, title: &str) -> Vec<String> {
    let current = game.current().cells();
    let ghost = game.ghost().cells();
    let width = BOARD_WIDTH as usize * 2 + 2;

    let mut lines = Vec::with_capacity(BOARD_HEIGHT as usize + 6);
    lines.push(format!("{:^width$}", title));
    lines.push(format!("+{}+", "-".repeat(width - 2)));
    for y in 0..BOARD_HEIGHT as i8 {
        let mut row = String::with_capacity(width);
        row.push('|');
        for x in 0..BOARD_WIDTH as i8 {
            let cell = if current.contains(&(x, y)) && !game.is_game_over() {
                "[]"
            } else if game.grid().value(x, y) != 0 {
                "##"
            } else if ghost.contains(&(x, y)) && !game.is_game_over() {
                "::"
            } else {
                " ."
            };
            row.push_str(cell);
        }
        row.push('|');
        lines.push(row);
    }
    lines.push(format!("+{}+", "-".repeat(width - 2)));
    lines.push(format!(
        "score {:>7}  lvl {:>2}",
        game.score(),
        game.level()
    ));
    lines.push(format!(
        "lines {:>7}  next {}",
        game.lines(),
        game.next().kind.as_str().to_uppercase()
    ));
    if game.is_game_over() {
        lines.push("GAME OVER".to_string());
    }
    lines
}

/// Put two blocks of lines next to each other.
pub fn side_by_side(left: Vec<String>, right: Vec<String>) -> Vec<String> {
    let pad = left.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let rows = left.len().max(right.len());
    (0..rows)
        .map(|i| {
            let l = left.get(i).map(String::as_str).unwrap_or("");
            let r = right.get(i).map(String::as_str).unwrap_or("");
            format!("{:<pad$}{GAP}{}", l, r)
        })
        .collect()
}

/// Status line for a solo or dual-local session.
pub fn session_line(session: &LocalSession, help: &str) -> String {
    if let Some(outcome) = session.outcome() {
        format!("{}  (r to restart, q to quit)", outcome_text(outcome))
    } else if session.is_finished() {
        "game over (r to restart, q to quit)".to_string()
    } else if session.is_paused() {
        "paused (p to continue)".to_string()
    } else if session.countdown() > 0.0 {
        format!("starting in {:.0}", session.countdown().ceil())
    } else {
        help.to_string()
    }
}

pub fn outcome_text(outcome: Outcome) -> String {
    match outcome {
        Outcome::Winner(player) => format!("PLAYER {} WINS!", player + 1),
        Outcome::Draw => "DRAW!".to_string(),
    }
}

/// Status line for a networked match.
pub fn status_line(status: &SyncStatus, banner: &str) -> String {
    match status.phase {
        LinkPhase::Offline => "offline".to_string(),
        LinkPhase::WaitingForPeer if status.peer_quit => {
            format!("{banner}  (opponent left, waiting for a new one)")
        }
        LinkPhase::WaitingForPeer => format!("{banner}  (waiting for opponent)"),
        LinkPhase::Connecting => format!("{banner}  (connecting...)"),
        LinkPhase::Reconnecting => "connection lost, reconnecting...".to_string(),
        LinkPhase::PeerQuit => "opponent quit the match".to_string(),
        LinkPhase::Connected => {
            if status.restart.received {
                "opponent wants to restart: y / n".to_string()
            } else if status.pause.received {
                "opponent wants to pause: y / n".to_string()
            } else if status.resume.received {
                "opponent wants to resume: y / n".to_string()
            } else if status.restart.pending || status.pause.pending || status.resume.pending {
                "waiting for opponent's answer...".to_string()
            } else if status.remote_started_new_game {
                "opponent started a new game (y or r to join)".to_string()
            } else if status.paused {
                "paused (p to ask to resume)".to_string()
            } else if status.countdown > 0.0 {
                format!("starting in {:.0}", status.countdown.ceil())
            } else {
                "arrows move, up rotates, p pause, r restart, q quit".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_lines_shape() {
        let game = Game::new(42);
        let lines = board_lines(&game, "you");
        assert_eq!(lines.len(), BOARD_HEIGHT as usize + 5);
        assert!(lines.iter().any(|l| l.contains("[]")));
    }

    #[test]
    fn test_outcome_text_names_the_winner() {
        assert_eq!(outcome_text(Outcome::Winner(0)), "PLAYER 1 WINS!");
        assert_eq!(outcome_text(Outcome::Winner(1)), "PLAYER 2 WINS!");
        assert_eq!(outcome_text(Outcome::Draw), "DRAW!");
    }

    #[test]
    fn test_session_line_follows_the_clock() {
        let mut session = LocalSession::dual(4, false);
        assert_eq!(session_line(&session, "help"), "starting in 4");
        session.update(3.0, &[]);
        assert_eq!(session_line(&session, "help"), "starting in 1");
        session.update(1.0, &[]);
        assert_eq!(session_line(&session, "help"), "help");
        session.toggle_pause();
        assert_eq!(session_line(&session, "help"), "paused (p to continue)");
    }

    #[test]
    fn test_session_line_reports_the_winner() {
        let mut session = LocalSession::dual(4, false);
        while !session.is_finished() {
            session.update(1.0, &[]);
        }
        assert!(session_line(&session, "help").starts_with("DRAW!"));
    }

    #[test]
    fn test_side_by_side_pads_left_column() {
        let out = side_by_side(vec!["ab".into(), "a".into()], vec!["x".into()]);
        assert_eq!(out, vec![format!("ab{GAP}x"), format!("a {GAP}")]);
    }
}
