//! Nabo game client - a headless client for a multiplayer map-guessing game
//!
//! The library holds everything the terminal binary is built from:
//! - REST client for the match API
//! - the match view controller (lobby, rounds, reveal, final standings)
//! - map surface mediation through a capability trait
//! - board/total bookkeeping and great-circle geometry
//! - the terminal view renderer and the app shell

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod game;
pub mod map;
pub mod ui;
pub mod util;
