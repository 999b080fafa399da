//! Wire types for the match API
//!
//! These mirror the JSON the match service speaks. Responses deserialize
//! leniently: unknown fields are ignored, and fields a given server version
//! may omit are optional.

use serde::{Deserialize, Serialize};

/// Lobby lifecycle reported by the lobby endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LobbyStatus {
    /// Waiting for the host to start
    Lobby,
    /// Rounds are being published
    Active,
    /// Any status this client version does not know
    #[serde(other)]
    Unknown,
}

/// `POST /api/match/create` request body
#[derive(Debug, Clone, Serialize)]
pub struct CreateMatchRequest {
    pub host_name: String,
    pub city: String,
    pub rounds: u32,
}

/// `POST /api/match/create` response
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMatchResponse {
    pub code: String,
    pub city: String,
    pub rounds: u32,
}

/// `POST /api/match/join` request body (the response body is empty)
#[derive(Debug, Clone, Serialize)]
pub struct JoinMatchRequest {
    pub code: String,
    pub nickname: String,
}

/// `GET /api/match/lobby` response
#[derive(Debug, Clone, Deserialize)]
pub struct LobbyResponse {
    pub status: LobbyStatus,
    #[serde(default)]
    pub players: Vec<String>,
    /// Back-filled into the session after a join; create already knows these
    pub city: Option<String>,
    pub rounds: Option<u32>,
}

/// `GET /api/match/round` response
#[derive(Debug, Clone, Deserialize)]
pub struct RoundResponse {
    pub round: RoundInfo,
}

/// Round metadata. The solution coordinates are present on the wire but the
/// client never reads them for gameplay; only the clue is used.
#[derive(Debug, Clone, Deserialize)]
pub struct RoundInfo {
    #[serde(default)]
    pub clue: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// `POST /api/match/guess` request body
#[derive(Debug, Clone, Serialize)]
pub struct GuessRequest {
    pub code: String,
    pub nickname: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalty_m: Option<f64>,
}

/// `POST /api/match/guess` response
#[derive(Debug, Clone, Deserialize)]
pub struct GuessResponse {
    pub distance_m: Option<f64>,
}

/// One row of a round's leaderboard. Extra fields such as the guess
/// coordinates are dropped on deserialization so other players' positions
/// never reach the renderer.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardRow {
    pub nickname: String,
    pub distance_m: f64,
}

/// Revealed true location for a round
#[derive(Debug, Clone, Deserialize)]
pub struct Solution {
    pub lat: f64,
    pub lon: f64,
    pub address: Option<String>,
}

/// `GET /api/match/round_result` response
#[derive(Debug, Clone, Deserialize)]
pub struct RoundResultResponse {
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardRow>,
    pub solution: Option<Solution>,
    pub round_no: Option<u32>,
}

/// One row of the final standings
#[derive(Debug, Clone, Deserialize)]
pub struct FinalRow {
    pub nickname: String,
    pub total_m: f64,
}

/// `GET /api/match/final` response
#[derive(Debug, Clone, Deserialize)]
pub struct FinalResponse {
    #[serde(rename = "final")]
    pub standings: Vec<FinalRow>,
}

/// `GET /api/cities` response
#[derive(Debug, Clone, Deserialize)]
pub struct CitiesResponse {
    pub cities: Vec<CityInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityInfo {
    pub key: String,
    pub center: CityCenter,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityCenter {
    pub lat: f64,
    pub lon: f64,
}

/// `GET /api/leaderboard` response (the global high-score table)
#[derive(Debug, Clone, Deserialize)]
pub struct TopScoresResponse {
    pub items: Vec<ScoreRow>,
}

/// One saved score. Timestamps arrive as second-resolution ISO strings
/// without an offset.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRow {
    pub id: i64,
    pub created_at: chrono::NaiveDateTime,
    pub name: String,
    pub score: i64,
    pub rounds: u32,
    pub city: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaderboard_rows_drop_extra_fields() {
        let raw = r#"{
            "leaderboard": [
                {"nickname": "anna", "distance_m": 1234.5, "lat": 59.3, "lon": 18.0}
            ],
            "solution": {"lat": 59.33, "lon": 18.06, "address": "Gamla stan"},
            "round_no": 1
        }"#;
        let parsed: RoundResultResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.leaderboard.len(), 1);
        assert_eq!(parsed.leaderboard[0].nickname, "anna");
        assert_eq!(parsed.round_no, Some(1));
    }

    #[test]
    fn lobby_status_tolerates_unknown_values() {
        let parsed: LobbyResponse =
            serde_json::from_str(r#"{"status": "archived", "players": []}"#).unwrap();
        assert_eq!(parsed.status, LobbyStatus::Unknown);
    }

    #[test]
    fn timeout_fields_are_omitted_for_normal_guesses() {
        let req = GuessRequest {
            code: "ABCD".into(),
            nickname: "anna".into(),
            lat: 59.3,
            lon: 18.0,
            timed_out: None,
            penalty_m: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("timed_out"));
        assert!(!json.contains("penalty_m"));
    }

    #[test]
    fn final_field_maps_to_standings() {
        let raw = r#"{"final": [{"nickname": "anna", "total_m": 1500.0}]}"#;
        let parsed: FinalResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.standings[0].nickname, "anna");
    }

    #[test]
    fn score_rows_parse_second_resolution_timestamps() {
        let raw = r#"{"items": [
            {"id": 7, "created_at": "2026-08-25T10:30:00", "name": "anna",
             "score": 4200, "rounds": 5, "city": "Stockholm"}
        ]}"#;
        let parsed: TopScoresResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.items[0].created_at.format("%Y-%m-%d").to_string(), "2026-08-25");
    }
}
