//! End-to-end match flow against an in-process API fixture.
//!
//! The fixture speaks just enough of the match API for two controllers to
//! play a full match over loopback HTTP: lobby, rounds, guesses, reveals,
//! and final standings.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use nabo_game_client::api::types::JoinMatchRequest;
use nabo_game_client::api::ApiClient;
use nabo_game_client::config::Timing;
use nabo_game_client::game::geo::{haversine_km, LatLon};
use nabo_game_client::game::{Command, Controller, Session};
use nabo_game_client::map::{MapSurface, NoopMap, RecordingMap};
use nabo_game_client::ui::{ViewModel, ViewPhase};

const CODE: &str = "TEST";

fn solution(round_no: u32) -> (LatLon, &'static str) {
    match round_no {
        1 => (LatLon::new(59.325, 18.07), "Slottsbacken 1, Stockholm"),
        _ => (LatLon::new(59.34, 18.05), "Odengatan 12, Stockholm"),
    }
}

#[derive(Default)]
struct Fixture {
    status: String,
    city: String,
    rounds: u32,
    players: Vec<String>,
    /// Per-round leaderboard rows in arrival order, one per nickname
    boards: BTreeMap<u32, Vec<(String, f64)>>,
    /// Overrides the computed final standings when set
    canned_finals: Option<Vec<(String, f64)>>,
}

impl Fixture {
    fn one_match(city: &str, rounds: u32, host: &str) -> Self {
        Self {
            status: "lobby".into(),
            city: city.into(),
            rounds,
            players: vec![host.into()],
            ..Self::default()
        }
    }

    fn totals(&self) -> Vec<(String, f64)> {
        let mut totals: Vec<(String, f64)> = Vec::new();
        for rows in self.boards.values() {
            for (nickname, distance_m) in rows {
                match totals.iter_mut().find(|(n, _)| n == nickname) {
                    Some((_, total)) => *total += distance_m,
                    None => totals.push((nickname.clone(), *distance_m)),
                }
            }
        }
        totals
    }
}

type Shared = Arc<Mutex<Fixture>>;

async fn serve(fixture: Shared) -> SocketAddr {
    let app = Router::new()
        .route("/api/match/join", post(join))
        .route("/api/match/start", post(start))
        .route("/api/match/lobby", get(lobby))
        .route("/api/match/round", get(round))
        .route("/api/match/guess", post(guess))
        .route("/api/match/round_result", get(round_result))
        .route("/api/match/final", get(final_standings))
        .with_state(fixture);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn q_u32(query: &HashMap<String, String>, key: &str) -> u32 {
    query.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

async fn join(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut f = state.lock().unwrap();
    if let Some(nickname) = body.get("nickname").and_then(Value::as_str) {
        if !f.players.iter().any(|p| p == nickname) {
            f.players.push(nickname.to_string());
        }
    }
    Json(json!({}))
}

async fn start(State(state): State<Shared>) -> Json<Value> {
    state.lock().unwrap().status = "active".into();
    Json(json!({}))
}

async fn lobby(State(state): State<Shared>) -> Json<Value> {
    let f = state.lock().unwrap();
    Json(json!({
        "status": f.status,
        "players": f.players,
        "city": f.city,
        "rounds": f.rounds,
    }))
}

async fn round(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    let f = state.lock().unwrap();
    let round_no = q_u32(&query, "round_no");
    if f.status != "active" || round_no == 0 || round_no > f.rounds {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "round": { "clue": format!("Clue for round {round_no}") }
    })))
}

async fn guess(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let round_no = q_u32(&query, "round_no");
    let nickname = body
        .get("nickname")
        .and_then(Value::as_str)
        .ok_or(StatusCode::BAD_REQUEST)?
        .to_string();
    let lat = body.get("lat").and_then(Value::as_f64).unwrap_or(0.0);
    let lon = body.get("lon").and_then(Value::as_f64).unwrap_or(0.0);

    let distance_m = if body.get("timed_out").and_then(Value::as_bool) == Some(true) {
        body.get("penalty_m")
            .and_then(Value::as_f64)
            .unwrap_or(50_000.0)
    } else {
        let (target, _) = solution(round_no);
        haversine_km(LatLon::new(lat, lon), target) * 1000.0
    };

    let mut f = state.lock().unwrap();
    let rows = f.boards.entry(round_no).or_default();
    match rows.iter_mut().find(|(n, _)| *n == nickname) {
        Some((_, existing)) => *existing = distance_m,
        None => rows.push((nickname, distance_m)),
    }
    Ok(Json(json!({ "distance_m": distance_m })))
}

async fn round_result(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let round_no = q_u32(&query, "round_no");
    let (target, address) = solution(round_no);
    let f = state.lock().unwrap();
    let leaderboard: Vec<Value> = f
        .boards
        .get(&round_no)
        .map(|rows| {
            rows.iter()
                .map(|(nickname, distance_m)| {
                    json!({ "nickname": nickname, "distance_m": distance_m })
                })
                .collect()
        })
        .unwrap_or_default();

    Json(json!({
        "leaderboard": leaderboard,
        "solution": { "lat": target.lat, "lon": target.lon, "address": address },
        "round_no": round_no,
    }))
}

async fn final_standings(State(state): State<Shared>) -> Json<Value> {
    let f = state.lock().unwrap();
    let mut totals = match &f.canned_finals {
        Some(rows) => rows.clone(),
        None => f.totals(),
    };
    // Worst first, to prove the client ranks for itself
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    let rows: Vec<Value> = totals
        .iter()
        .map(|(nickname, total_m)| json!({ "nickname": nickname, "total_m": total_m }))
        .collect();
    Json(json!({ "final": rows }))
}

fn fast_timing(round_secs: u64) -> Timing {
    Timing {
        round_time: Duration::from_secs(round_secs),
        reveal_time: Duration::from_secs(1),
        lobby_poll: Duration::from_millis(50),
        round_poll: Duration::from_millis(50),
    }
}

/// Record every published view into a vector until the controller closes
fn record_views(
    mut view_rx: tokio::sync::watch::Receiver<ViewModel>,
) -> (Arc<Mutex<Vec<ViewModel>>>, tokio::task::JoinHandle<()>) {
    let views = Arc::new(Mutex::new(Vec::new()));
    let sink = views.clone();
    let task = tokio::spawn(async move {
        loop {
            sink.lock().unwrap().push(view_rx.borrow_and_update().clone());
            if view_rx.changed().await.is_err() {
                return;
            }
        }
    });
    (views, task)
}

#[tokio::test]
async fn early_guesser_and_timeout_play_a_full_match() {
    let fixture = Arc::new(Mutex::new(Fixture::one_match("stockholm", 2, "anna")));
    let addr = serve(fixture.clone()).await;
    let base_url = format!("http://{addr}");

    let api = ApiClient::new(&base_url);
    api.join_match(&JoinMatchRequest {
        code: CODE.to_string(),
        nickname: "bert".to_string(),
    })
    .await
    .unwrap();

    // Anna hosts and guesses early; bert never guesses and runs into the
    // round limit.
    let session_a = Session::new(CODE, "anna").host().with_city("stockholm", 2);
    let map_a: Arc<dyn MapSurface> = Arc::new(NoopMap);
    let (controller_a, handle_a) =
        Controller::new(api.clone(), session_a, fast_timing(10), Some(map_a));
    // Bert's surface reports a view center, which becomes his timeout guess
    let session_b = Session::new(CODE, "bert");
    let map_b: Arc<dyn MapSurface> = Arc::new(RecordingMap::with_center(LatLon::new(59.0, 17.9)));
    let (controller_b, _handle_b) =
        Controller::new(api.clone(), session_b, fast_timing(2), Some(map_b));

    let (views, recorder) = record_views(handle_a.view());

    let driver = {
        let handle = handle_a.clone();
        let mut view_rx = handle_a.view();
        tokio::spawn(async move {
            let mut started = false;
            let mut guessed = 0u32;
            loop {
                let view = view_rx.borrow_and_update().clone();
                if view.phase == ViewPhase::Lobby && view.players.len() == 2 && !started {
                    started = true;
                    handle.command(Command::Start).await;
                }
                if view.phase == ViewPhase::Round && view.can_guess && view.round_no > guessed {
                    guessed = view.round_no;
                    handle
                        .command(Command::Guess {
                            lat: 59.32,
                            lon: 18.05,
                        })
                        .await;
                }
                if view_rx.changed().await.is_err() {
                    return;
                }
            }
        })
    };

    let run_a = tokio::spawn(controller_a.run());
    let run_b = tokio::spawn(controller_b.run());

    let finished = tokio::time::timeout(Duration::from_secs(30), async {
        run_a.await.unwrap();
        run_b.await.unwrap();
    })
    .await;
    tokio_test::assert_ok!(finished, "match did not finish");
    recorder.await.unwrap();
    driver.abort();

    let views = views.lock().unwrap();

    // Round 1 reveal: anna's true distance, bert's fixed penalty
    let revealed = views
        .iter()
        .find(|v| v.round_no == 1 && v.revealed)
        .expect("a revealed round 1 view");
    let anna = revealed
        .board
        .iter()
        .find(|e| e.nickname == "anna")
        .expect("anna on the round board");
    let expected = haversine_km(LatLon::new(59.32, 18.05), solution(1).0) * 1000.0;
    assert!((anna.distance_m - expected).abs() < 1.0);
    let bert = revealed
        .board
        .iter()
        .find(|e| e.nickname == "bert")
        .expect("bert on the round board");
    assert_eq!(bert.distance_m, 50_000.0);
    assert_eq!(revealed.answer.as_deref(), Some("Slottsbacken 1, Stockholm"));

    // The reveal countdown elapsed and the match advanced to round 2
    assert!(views
        .iter()
        .any(|v| v.round_no == 2 && v.phase == ViewPhase::Round));

    // Final standings, ranked ascending although the fixture sent worst-first
    let last = views.last().expect("at least one view");
    assert_eq!(last.phase, ViewPhase::Final);
    assert_eq!(last.standings.len(), 2);
    assert_eq!(last.standings[0].nickname, "anna");
    assert!(last.standings[0].total_m <= last.standings[1].total_m);
}

#[tokio::test]
async fn final_standings_are_reranked_client_side() {
    let mut fixture = Fixture::one_match("stockholm", 1, "zoe");
    fixture.canned_finals = Some(vec![
        ("maja".to_string(), 90_000.0),
        ("zoe".to_string(), 4_200.0),
        ("liam".to_string(), 100.0),
    ]);
    let fixture = Arc::new(Mutex::new(fixture));
    let addr = serve(fixture.clone()).await;

    let api = ApiClient::new(format!("http://{addr}"));
    let session = Session::new(CODE, "zoe").host().with_city("stockholm", 1);
    let (controller, handle) = Controller::new(api, session, fast_timing(10), None);
    let (views, recorder) = record_views(handle.view());

    fixture.lock().unwrap().status = "active".into();

    let driver = {
        let handle = handle.clone();
        let mut view_rx = handle.view();
        tokio::spawn(async move {
            loop {
                let view = view_rx.borrow_and_update().clone();
                if view.phase == ViewPhase::Round && view.can_guess {
                    handle
                        .command(Command::Guess {
                            lat: 59.33,
                            lon: 18.06,
                        })
                        .await;
                }
                if view_rx.changed().await.is_err() {
                    return;
                }
            }
        })
    };

    let finished = tokio::time::timeout(Duration::from_secs(15), controller.run()).await;
    tokio_test::assert_ok!(finished, "match did not finish");
    recorder.await.unwrap();
    driver.abort();

    let views = views.lock().unwrap();
    let last = views.last().expect("at least one view");
    assert_eq!(last.phase, ViewPhase::Final);
    let names: Vec<&str> = last.standings.iter().map(|r| r.nickname.as_str()).collect();
    assert_eq!(names, ["liam", "zoe", "maja"]);
}
