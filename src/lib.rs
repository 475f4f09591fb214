//! Hex Action Client - client-side simulation for a turn-based hex game
//!
//! - Hex coordinates, edge masks and the logical grid built from map updates
//! - Timed actions interpolated per entity by wall-clock ticks
//! - Server message routing, with buffering until the scene is ready
//! - Local player prediction checked against server echoes

pub mod action;
pub mod client;
pub mod config;
pub mod hex;
pub mod map;
pub mod net;
pub mod protocol;
pub mod util;

pub use client::Client;
