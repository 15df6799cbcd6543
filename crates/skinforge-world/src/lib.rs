//! The server side a skin refresh runs against.
//!
//! Skinforge needs a game server to talk to: players with game profiles,
//! entity ids, positions and a connection that accepts clientbound packets.
//! This crate provides that as an in-process [`World`], owned by a single
//! [`GameLoop`] actor ("the main thread").
//!
//! # Key types
//!
//! - [`World`]: online players, levels, per-observer visibility
//! - [`ServerPlayer`]: one online player and their packet sink
//! - [`GameProfile`] / [`PropertyMap`]: the live profile a skin lives in
//! - [`GameLoop`] / [`MainThread`]: run closures with `&mut World`
//!
//! # Main-thread rule
//!
//! Nothing outside the game loop holds a `&mut World`. Async code that wants
//! to touch a player schedules a closure with [`MainThread::run_task`]
//! (fire-and-forget) or [`MainThread::call`] (awaits the closure's result).
//! Each closure runs to completion before the next one starts.

mod error;
mod game_loop;
mod player;
mod profile;
mod world;

pub use error::WorldError;
pub use game_loop::{GameLoop, GameLoopConfig, MainThread};
pub use player::{Abilities, Location, PLAYER_INVENTORY_SLOTS, PacketSink, ServerPlayer};
pub use profile::{GameProfile, PropertyMap};
pub use world::{JoinRequest, LevelInfo, World};
