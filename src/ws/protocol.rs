//! WebSocket protocol message definitions
//! Every frame is a named event: `{"event": "<name>", "data": {...}}`

use serde::{Deserialize, Serialize};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Begin a run (pointer pressed)
    Start,

    /// Steering input
    Move {
        /// Horizontal delta, roughly -1.0..=1.0 from the joystick
        dx: f64,
        /// Vertical delta
        dy: f64,
    },

    /// Pointer released
    Release,

    /// Back to idle
    Restart,
}

impl ClientMsg {
    /// Decode and validate a text frame
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let msg: Self = serde_json::from_str(text)?;
        if let Self::Move { dx, dy } = msg {
            if !dx.is_finite() || !dy.is_finite() {
                return Err(ProtocolError::NonFiniteDelta);
            }
        }
        Ok(msg)
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Full game state after a transition
    State(Snapshot),

    /// Inbound frame was rejected
    Error { code: String, message: String },
}

/// Observable game state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub x: f64,
    pub y: f64,
    pub started: bool,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
}

/// Inbound frame errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Move delta must be a finite number")]
    NonFiniteDelta,
}

impl ProtocolError {
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::Malformed(_) => "malformed",
            ProtocolError::NonFiniteDelta => "invalid_delta",
        }
    }
}

impl From<&ProtocolError> for ServerMsg {
    fn from(err: &ProtocolError) -> Self {
        ServerMsg::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}
