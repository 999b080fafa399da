//! Match view state machine and supporting domain types

pub mod board;
pub mod controller;
pub mod events;
pub mod geo;

pub use controller::{Controller, ControllerHandle};
pub use events::{Command, Event};

use geo::LatLon;

/// Fixed distance charged for a timed-out round, in meters
pub const TIMEOUT_PENALTY_M: f64 = 50_000.0;

/// Client-local session for one match.
///
/// Created on create/join and owned by the controller; `round_no` increments
/// monotonically, and `city`/`rounds` may be back-filled from the first lobby
/// response after a join (the join endpoint returns an empty body).
#[derive(Debug, Clone)]
pub struct Session {
    pub code: String,
    pub nickname: String,
    pub city: String,
    pub rounds: u32,
    pub round_no: u32,
    pub is_host: bool,
}

impl Session {
    pub fn new(code: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            nickname: nickname.into(),
            city: String::new(),
            rounds: 0,
            round_no: 1,
            is_host: false,
        }
    }

    pub fn host(mut self) -> Self {
        self.is_host = true;
        self
    }

    pub fn with_city(mut self, city: impl Into<String>, rounds: u32) -> Self {
        self.city = city.into();
        self.rounds = rounds;
        self
    }
}

/// Per-round view/guess state, reset at the start of every round
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    pub clue: String,
    pub has_guessed: bool,
    /// A guess POST is pending; further clicks are ignored until it settles
    pub guess_in_flight: bool,
    pub my_guess: Option<LatLon>,
    pub revealed: bool,
    pub time_left: u32,
    /// The guess was the automatic timeout guess
    pub timeout_penalty: bool,
    /// Revealed answer text, shown in the sidebar
    pub answer: Option<String>,
    /// Own displayed distance in kilometers, computed locally at reveal
    pub my_distance_km: Option<f64>,
    /// Seconds left of the reveal countdown
    pub reveal_left: u32,
}

impl RoundState {
    pub fn new(round_secs: u32) -> Self {
        Self {
            time_left: round_secs,
            ..Self::default()
        }
    }
}
