//! Controller events
//!
//! Everything that can mutate match state arrives on one channel: user
//! commands, timer ticks, and the payloads the spawned fetch tasks produce.
//! Round-scoped events carry the round number they were produced for so the
//! event loop can drop responses that resolve after the view has moved on.

use crate::api::types::{FinalResponse, GuessResponse, LobbyResponse, RoundResultResponse};
use crate::api::ApiError;

/// Commands originating from the user (terminal input, bot, tests)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Host asks the server to start the match
    Start,
    /// Place a guess at the given coordinates
    Guess { lat: f64, lon: f64 },
    /// Leave the match view
    Quit,
}

/// Events consumed by the controller loop
#[derive(Debug)]
pub enum Event {
    /// A lobby poll tick resolved. `round_published` is the race-tolerant
    /// fallback: the current round was probed successfully even though the
    /// lobby status has not flipped to active yet.
    LobbyPolled {
        lobby: LobbyResponse,
        round_published: bool,
    },

    /// The one-shot round metadata fetch succeeded
    RoundMeta { round_no: u32, clue: String },

    /// One second of the round countdown elapsed
    CountdownTick { round_no: u32 },

    /// A round-result poll tick resolved. `players` is absent when the
    /// piggy-backed lobby fetch failed; `result` is absent while the round
    /// result is not yet available.
    RoundPolled {
        round_no: u32,
        players: Option<Vec<String>>,
        result: Option<RoundResultResponse>,
    },

    /// The guess POST settled
    GuessSent {
        round_no: u32,
        lat: f64,
        lon: f64,
        timed_out: bool,
        outcome: Result<GuessResponse, ApiError>,
    },

    /// One second of the reveal countdown elapsed
    RevealTick { round_no: u32 },

    /// The host's start POST settled
    StartOutcome { outcome: Result<(), ApiError> },

    /// The final standings fetch settled
    FinalFetched {
        outcome: Result<FinalResponse, ApiError>,
    },

    /// A user command
    Command(Command),
}
