//! Authoritative wire game state and its transitions

use tracing::{debug, info, warn};

use crate::ws::protocol::{ClientMsg, Snapshot};

use super::{SPEED, START_X, START_Y, WIRE_TOLERANCE, WIRE_Y};

/// Game phase, derived from the two state flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started, cursor parked at the start position
    Idle,
    /// Cursor is being steered along the wire
    Playing,
    /// Tolerance violated or input released
    Ended,
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndCause {
    Tolerance,
    Release,
}

/// Game state owned by a single session
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub x: f64,
    pub y: f64,
    pub started: bool,
    pub game_over: bool,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            x: START_X,
            y: START_Y,
            started: false,
            game_over: false,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.started, self.game_over) {
            (false, _) => Phase::Idle,
            (true, false) => Phase::Playing,
            (true, true) => Phase::Ended,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            x: self.x,
            y: self.y,
            started: self.started,
            game_over: self.game_over,
        }
    }

    /// Dispatch an inbound event to its transition
    pub fn handle(&mut self, msg: ClientMsg) -> Option<Snapshot> {
        match msg {
            ClientMsg::Start => self.start(),
            ClientMsg::Move { dx, dy } => self.apply_move(dx, dy),
            ClientMsg::Release => self.release(),
            ClientMsg::Restart => self.restart(),
        }
    }

    /// Begin a new run from any phase.
    pub fn start(&mut self) -> Option<Snapshot> {
        self.reset();
        self.started = true;
        debug!(phase = ?self.phase(), "Game started");
        Some(self.snapshot())
    }

    /// Apply a steering delta. Ignored unless the game is in progress.
    pub fn apply_move(&mut self, dx: f64, dy: f64) -> Option<Snapshot> {
        if self.phase() != Phase::Playing {
            return None;
        }

        let x = self.x + dx * SPEED;
        let y = self.y + dy * SPEED;

        // Snapshots must stay numeric on the wire
        if !x.is_finite() || !y.is_finite() {
            warn!(dx, dy, "Ignoring move that overflows the cursor position");
            return None;
        }

        self.x = x;
        self.y = y;

        // Strict: a deviation of exactly WIRE_TOLERANCE is still on the wire
        if (self.y - WIRE_Y).abs() > WIRE_TOLERANCE {
            self.end(EndCause::Tolerance);
        }

        Some(self.snapshot())
    }

    /// Player let go of the input. Re-emits when already ended.
    pub fn release(&mut self) -> Option<Snapshot> {
        if !self.started {
            return None;
        }

        if !self.game_over {
            self.end(EndCause::Release);
        }
        Some(self.snapshot())
    }

    /// Return to idle from any phase.
    pub fn restart(&mut self) -> Option<Snapshot> {
        self.reset();
        debug!(phase = ?self.phase(), "Game restarted");
        Some(self.snapshot())
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn end(&mut self, cause: EndCause) {
        self.game_over = true;
        info!(cause = ?cause, x = self.x, y = self.y, "Game over");
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
