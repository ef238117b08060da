//! Host-less squad state for a location-based zombie party game.
//!
//! Every participant runs the same code: a [`session::GameSession`] holds
//! the local player's state plus a replicated roster of everyone else,
//! converged by merging `presence_sync` broadcasts. There is no server
//! and no referee; win/loss, progress, and proximity are all derived
//! locally from the merged view. The broadcast transport is injected
//! behind [`transport::RoomChannel`].

pub mod geo;
pub mod narrator;
pub mod protocol;
pub mod roster;
pub mod session;
pub mod tasks;
pub mod ticker;
pub mod transport;
pub mod types;
