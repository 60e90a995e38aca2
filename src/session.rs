//! Local sessions: one or two kernels played from this keyboard.
//!
//! Solo and dual-local share the same loop. One [`MatchClock`] runs the
//! countdown after every (re)start or resume, and one gravity accumulator
//! steps every board together at player 1's fall interval.

use std::cmp::Ordering;

use tetris_ng::core::Game;
use tetris_ng::net::MatchClock;
use tetris_ng::types::{InputRecord, COUNTDOWN_SECS, INDEPENDENT_SEED_OFFSET};

/// How a two-player local session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Index of the player with the higher score.
    Winner(usize),
    Draw,
}

#[derive(Debug, Clone)]
pub struct LocalSession {
    games: Vec<Game>,
    clock: MatchClock,
    independent_pieces: bool,
}

impl LocalSession {
    pub fn solo(seed: u32) -> Self {
        Self::start(1, seed, false)
    }

    /// Two boards side by side. With `independent_pieces` player 2's bag is
    /// seeded `INDEPENDENT_SEED_OFFSET` past player 1's.
    pub fn dual(seed: u32, independent_pieces: bool) -> Self {
        Self::start(2, seed, independent_pieces)
    }

    fn start(players: usize, seed: u32, independent_pieces: bool) -> Self {
        let mut session = Self {
            games: (0..players).map(|_| Game::new(seed)).collect(),
            clock: MatchClock::new(COUNTDOWN_SECS),
            independent_pieces,
        };
        session.restart(seed);
        session
    }

    /// Reset every board and run the countdown again.
    pub fn restart(&mut self, seed: u32) {
        let offset = if self.independent_pieces {
            INDEPENDENT_SEED_OFFSET
        } else {
            0
        };
        for (player, game) in self.games.iter_mut().enumerate() {
            let player_seed = if player == 0 {
                seed
            } else {
                seed.wrapping_add(offset)
            };
            game.reset(Some(player_seed));
        }
        self.clock.rearm();
    }

    /// Pause, or resume behind a fresh countdown. Ignored once every board is
    /// over.
    pub fn toggle_pause(&mut self) {
        if self.is_finished() {
            return;
        }
        if self.clock.is_paused() {
            self.clock.rearm();
        } else {
            self.clock.set_paused(true);
        }
    }

    /// One frame: run the countdown, apply each player's input, then gravity.
    ///
    /// `inputs[i]` goes to board `i`; missing entries count as idle.
    pub fn update(&mut self, dt: f64, inputs: &[InputRecord]) {
        self.clock.advance(dt);
        let running = !self.input_blocked() && !self.is_finished();
        if running {
            for (game, input) in self.games.iter_mut().zip(inputs) {
                game.apply_input(*input);
            }
        }

        let interval = self.games[0].fall_interval();
        if self.clock.gravity_due(dt, interval, running) {
            for game in &mut self.games {
                game.tick();
            }
        }
    }

    pub fn input_blocked(&self) -> bool {
        self.clock.is_paused() || !self.clock.countdown_elapsed()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn countdown(&self) -> f64 {
        self.clock.countdown()
    }

    pub fn is_finished(&self) -> bool {
        self.games.iter().all(Game::is_game_over)
    }

    /// Winner by score once both boards of a dual session are over.
    pub fn outcome(&self) -> Option<Outcome> {
        let [first, second] = self.games.as_slice() else {
            return None;
        };
        if !(first.is_game_over() && second.is_game_over()) {
            return None;
        }
        Some(match first.score().cmp(&second.score()) {
            Ordering::Greater => Outcome::Winner(0),
            Ordering::Less => Outcome::Winner(1),
            Ordering::Equal => Outcome::Draw,
        })
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(flags: &str) -> InputRecord {
        InputRecord {
            move_left: flags.contains('l'),
            soft_drop: flags.contains('d'),
            ..InputRecord::default()
        }
    }

    fn hashes(session: &LocalSession) -> Vec<u64> {
        session.games().iter().map(Game::state_hash).collect()
    }

    /// Step with a one-second frame until every board is over.
    fn play_out(session: &mut LocalSession, inputs: &[InputRecord]) {
        for _ in 0..10_000 {
            if session.is_finished() {
                return;
            }
            session.update(1.0, inputs);
        }
        panic!("session never finished");
    }

    #[test]
    fn test_solo_starts_behind_countdown() {
        let mut session = LocalSession::solo(7);
        assert!(session.input_blocked());
        assert_eq!(session.countdown(), COUNTDOWN_SECS);

        let before = hashes(&session);
        session.update(1.0, &[input("ld")]);
        session.update(1.0, &[input("ld")]);
        assert_eq!(hashes(&session), before);

        session.update(2.0, &[input("l")]);
        assert!(!session.input_blocked());
        assert_ne!(hashes(&session), before);
    }

    #[test]
    fn test_restart_runs_the_countdown_again() {
        let mut session = LocalSession::solo(7);
        session.update(COUNTDOWN_SECS, &[]);
        assert!(!session.input_blocked());

        session.restart(8);
        assert!(session.input_blocked());
        assert_eq!(session.countdown(), COUNTDOWN_SECS);
        assert_eq!(session.games()[0].seed(), 8);
        assert_eq!(session.games()[0].grid().occupied(), 0);
    }

    #[test]
    fn test_pause_freezes_and_resume_counts_down() {
        let mut session = LocalSession::solo(3);
        session.update(COUNTDOWN_SECS, &[]);

        session.toggle_pause();
        assert!(session.is_paused());
        let frozen = hashes(&session);
        session.update(5.0, &[input("ld")]);
        assert_eq!(hashes(&session), frozen);

        session.toggle_pause();
        assert!(!session.is_paused());
        assert!(session.input_blocked());
        assert_eq!(session.countdown(), COUNTDOWN_SECS);
    }

    #[test]
    fn test_dual_seeds_shared_or_offset() {
        let shared = LocalSession::dual(42, false);
        assert_eq!(shared.games()[0].seed(), 42);
        assert_eq!(shared.games()[1].seed(), 42);
        assert_eq!(
            shared.games()[0].state_hash(),
            shared.games()[1].state_hash()
        );

        let split = LocalSession::dual(42, true);
        assert_eq!(split.games()[0].seed(), 42);
        assert_eq!(split.games()[1].seed(), 42 + INDEPENDENT_SEED_OFFSET);
    }

    #[test]
    fn test_dual_gravity_steps_both_boards_together() {
        let mut session = LocalSession::dual(5, true);
        session.update(COUNTDOWN_SECS, &[]);
        let start: Vec<i8> = session.games().iter().map(|g| g.current().y).collect();

        for _ in 0..3 {
            session.update(1.0, &[]);
        }
        for (game, y) in session.games().iter().zip(start) {
            assert_eq!(game.current().y, y + 3);
        }
    }

    #[test]
    fn test_dual_inputs_reach_their_own_board() {
        let mut session = LocalSession::dual(9, false);
        session.update(COUNTDOWN_SECS, &[]);
        let before = hashes(&session);

        session.update(0.0, &[InputRecord::default(), input("d")]);
        let after = hashes(&session);
        assert_eq!(after[0], before[0]);
        assert_ne!(after[1], before[1]);
        assert_eq!(session.games()[1].score(), 1);
    }

    #[test]
    fn test_higher_score_wins_when_both_boards_are_over() {
        let mut session = LocalSession::dual(11, false);
        session.update(COUNTDOWN_SECS, &[]);
        assert_eq!(session.outcome(), None);

        play_out(&mut session, &[InputRecord::default(), input("d")]);
        assert!(session.games()[1].score() > session.games()[0].score());
        assert_eq!(session.outcome(), Some(Outcome::Winner(1)));
    }

    #[test]
    fn test_equal_scores_draw() {
        let mut session = LocalSession::dual(11, false);
        play_out(&mut session, &[]);
        assert_eq!(session.outcome(), Some(Outcome::Draw));

        session.toggle_pause();
        assert!(!session.is_paused());
    }

    #[test]
    fn test_solo_has_no_outcome() {
        let mut session = LocalSession::solo(2);
        play_out(&mut session, &[]);
        assert!(session.is_finished());
        assert_eq!(session.outcome(), None);
    }
}
