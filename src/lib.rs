//! Wire Game Server - authoritative server for a single-player buzz-wire game
//!
//! The client steers a cursor along a horizontal wire over a WebSocket; the
//! server owns the game state for each connection and ends the run when the
//! cursor drifts too far from the wire.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
