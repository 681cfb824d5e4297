//! Wire game rules and session tracking

pub mod registry;
pub mod state;

pub use registry::{RegistryError, SessionId, SessionRegistry};
pub use state::{GameState, Phase};

/// Cursor start position
pub const START_X: f64 = 60.0;
pub const START_Y: f64 = 225.0;

/// Vertical position of the wire
pub const WIRE_Y: f64 = 225.0;

/// Maximum allowed vertical deviation from the wire
pub const WIRE_TOLERANCE: f64 = 6.0;

/// Multiplier applied to every received input delta
pub const SPEED: f64 = 3.0;
