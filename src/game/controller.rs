//! Match view controller - the client-side round/lobby state machine
//!
//! One controller instance owns one match view. All state mutation happens on
//! its event loop; periodic work comes from spawned timer tasks that send
//! typed events back into the loop, and every round-scoped payload is tagged
//! with the round it was fetched for so stale responses are dropped instead
//! of reverting the view.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::types::{GuessRequest, LobbyStatus, RoundResultResponse};
use crate::api::ApiClient;
use crate::config::Timing;
use crate::map::MapSurface;
use crate::ui::{ViewModel, ViewPhase};
use crate::util::task::TimerSlot;

use super::board::{MatchBoards, TotalEntry};
use super::events::{Command, Event};
use super::geo::{self, LatLon};
use super::{RoundState, Session, TIMEOUT_PENALTY_M};

/// Client-local match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Lobby,
    Round,
    Reveal,
    Final,
    /// The view is finished; the event loop exits
    Done,
}

/// Handle for feeding commands into a running controller and observing its
/// published view
#[derive(Clone)]
pub struct ControllerHandle {
    events: mpsc::Sender<Event>,
    view: watch::Receiver<ViewModel>,
}

impl ControllerHandle {
    /// Send a user command. Returns false once the controller is gone.
    pub async fn command(&self, command: Command) -> bool {
        self.events.send(Event::Command(command)).await.is_ok()
    }

    pub fn view(&self) -> watch::Receiver<ViewModel> {
        self.view.clone()
    }
}

/// The match view controller
pub struct Controller {
    api: ApiClient,
    session: Session,
    timing: Timing,
    map: Option<Arc<dyn MapSurface>>,

    phase: Phase,
    round: RoundState,
    boards: MatchBoards,
    players: Vec<String>,
    standings: Vec<TotalEntry>,
    alert: Option<String>,

    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
    view_tx: watch::Sender<ViewModel>,

    lobby_poll: TimerSlot,
    round_poll: TimerSlot,
    countdown: TimerSlot,
    reveal_timer: TimerSlot,
}

impl Controller {
    pub fn new(
        api: ApiClient,
        session: Session,
        timing: Timing,
        map: Option<Arc<dyn MapSurface>>,
    ) -> (Self, ControllerHandle) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let (view_tx, view_rx) = watch::channel(ViewModel::default());

        let handle = ControllerHandle {
            events: events_tx.clone(),
            view: view_rx,
        };

        let controller = Self {
            api,
            session,
            timing,
            map,
            phase: Phase::Lobby,
            round: RoundState::default(),
            boards: MatchBoards::new(),
            players: Vec::new(),
            standings: Vec::new(),
            alert: None,
            events_tx,
            events_rx,
            view_tx,
            lobby_poll: TimerSlot::new(),
            round_poll: TimerSlot::new(),
            countdown: TimerSlot::new(),
            reveal_timer: TimerSlot::new(),
        };

        (controller, handle)
    }

    /// Run the view to completion (final standings rendered, or quit)
    pub async fn run(mut self) {
        info!(
            code = %self.session.code,
            nickname = %self.session.nickname,
            host = self.session.is_host,
            "entering match view"
        );

        self.enter_lobby();
        self.publish_view();

        while let Some(event) = self.events_rx.recv().await {
            self.handle_event(event);
            self.publish_view();
            if self.phase == Phase::Done {
                break;
            }
        }

        info!(code = %self.session.code, "match view closed");
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::LobbyPolled {
                lobby,
                round_published,
            } => self.on_lobby_polled(lobby, round_published),
            Event::RoundMeta { round_no, clue } => self.on_round_meta(round_no, clue),
            Event::CountdownTick { round_no } => self.on_countdown_tick(round_no),
            Event::RoundPolled {
                round_no,
                players,
                result,
            } => self.on_round_polled(round_no, players, result),
            Event::GuessSent {
                round_no,
                lat,
                lon,
                timed_out,
                outcome,
            } => self.on_guess_sent(round_no, lat, lon, timed_out, outcome),
            Event::RevealTick { round_no } => self.on_reveal_tick(round_no),
            Event::StartOutcome { outcome } => {
                if let Err(err) = outcome {
                    warn!(error = %err, "start request failed");
                    self.alert = Some(format!("Could not start the match: {err}"));
                }
            }
            Event::FinalFetched { outcome } => self.on_final_fetched(outcome),
            Event::Command(command) => self.on_command(command),
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Enter the lobby view and poll until the match activates
    fn enter_lobby(&mut self) {
        self.cancel_all_timers();
        self.phase = Phase::Lobby;

        let api = self.api.clone();
        let tx = self.events_tx.clone();
        let code = self.session.code.clone();
        let round_no = self.session.round_no;
        let period = self.timing.lobby_poll;

        self.lobby_poll.replace(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let lobby = match api.lobby(&code).await {
                    Ok(lobby) => lobby,
                    Err(err) => {
                        debug!(error = %err, "lobby poll failed");
                        continue;
                    }
                };
                // Race-tolerant fallback: the round may be published before
                // the lobby status flips to active.
                let round_published = lobby.status != LobbyStatus::Active
                    && api.round(&code, round_no).await.is_ok();
                if tx
                    .send(Event::LobbyPolled {
                        lobby,
                        round_published,
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }));
    }

    /// Enter the current round, or the final view once rounds are exhausted
    fn enter_round(&mut self) {
        self.cancel_all_timers();

        if self.session.rounds > 0 && self.session.round_no > self.session.rounds {
            self.enter_final();
            return;
        }

        self.phase = Phase::Round;
        self.alert = None;
        self.round = RoundState::new(self.timing.round_time.as_secs() as u32);
        self.with_map(|map| {
            map.clear_round_graphics();
            map.set_locked(false);
        });

        info!(
            code = %self.session.code,
            round = self.session.round_no,
            "entering round"
        );

        // Round metadata, failure tolerated: the round may not be published
        // yet and the poll recovers.
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        let code = self.session.code.clone();
        let round_no = self.session.round_no;
        tokio::spawn(async move {
            match api.round(&code, round_no).await {
                Ok(resp) => {
                    let _ = tx
                        .send(Event::RoundMeta {
                            round_no,
                            clue: resp.round.clue,
                        })
                        .await;
                }
                Err(err) => debug!(error = %err, round = round_no, "round not yet published"),
            }
        });

        // One-second countdown; the first tick lands after a full second
        let tx = self.events_tx.clone();
        self.countdown.replace(tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tx.send(Event::CountdownTick { round_no }).await.is_err() {
                    return;
                }
            }
        }));

        // Leaderboard poll, first tick immediate
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        let code = self.session.code.clone();
        let period = self.timing.round_poll;
        self.round_poll.replace(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let event = fetch_round_poll(&api, &code, round_no).await;
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        }));
    }

    /// Reveal the round's solution. Idempotent: duplicate "all players
    /// finished" signals for the same round do nothing.
    fn reveal(&mut self, result: RoundResultResponse) {
        if self.round.revealed {
            debug!(round = self.session.round_no, "duplicate reveal ignored");
            return;
        }

        self.countdown.cancel();
        self.round_poll.cancel();
        self.round.revealed = true;
        self.phase = Phase::Reveal;
        let round_no = self.session.round_no;

        info!(code = %self.session.code, round = round_no, "round revealed");

        if let Some(solution) = &result.solution {
            let target = LatLon::new(solution.lat, solution.lon);
            self.with_map(|map| map.clear_round_graphics());

            if let Some(guess) = self.round.my_guess {
                let bearing = geo::bearing_deg(guess, target);
                self.with_map(|map| {
                    map.add_guess_marker(guess, Some(bearing));
                });
            }
            self.with_map(|map| map.add_solution_marker(target));
            if let Some(guess) = self.round.my_guess {
                self.with_map(|map| {
                    map.draw_line(guess, target);
                    map.fit_bounds(guess, target);
                });
            }

            self.round.answer = solution
                .address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string);

            if let Some(guess) = self.round.my_guess {
                if self.round.timeout_penalty {
                    // The server leaderboard stays authoritative; the local
                    // penalty only fills the gap until it reports.
                    self.round.my_distance_km = Some(TIMEOUT_PENALTY_M / 1000.0);
                    self.boards
                        .round_mut(round_no)
                        .record_if_absent(&self.session.nickname, TIMEOUT_PENALTY_M);
                } else {
                    self.round.my_distance_km = Some(geo::haversine_km(guess, target));
                }
            }
        }

        self.round.reveal_left = self.timing.reveal_time.as_secs() as u32;

        let tx = self.events_tx.clone();
        self.reveal_timer.replace(tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tx.send(Event::RevealTick { round_no }).await.is_err() {
                    return;
                }
            }
        }));
    }

    /// Enter the final view and fetch the standings
    fn enter_final(&mut self) {
        self.cancel_all_timers();
        self.phase = Phase::Final;

        info!(code = %self.session.code, "fetching final standings");

        let api = self.api.clone();
        let tx = self.events_tx.clone();
        let code = self.session.code.clone();
        tokio::spawn(async move {
            let outcome = api.final_standings(&code).await;
            let _ = tx.send(Event::FinalFetched { outcome }).await;
        });
    }

    // ------------------------------------------------------------------
    // Event handlers
    // ------------------------------------------------------------------

    fn on_lobby_polled(&mut self, lobby: crate::api::types::LobbyResponse, round_published: bool) {
        if self.phase != Phase::Lobby {
            debug!("dropping stale lobby payload");
            return;
        }

        if !lobby.players.is_empty() {
            self.players = dedupe_players(lobby.players);
        }
        // Back-fill what the join endpoint's empty response left unknown
        if self.session.city.is_empty() {
            if let Some(city) = lobby.city {
                self.session.city = city;
            }
        }
        if self.session.rounds == 0 {
            if let Some(rounds) = lobby.rounds {
                self.session.rounds = rounds;
            }
        }

        if lobby.status == LobbyStatus::Active || round_published {
            info!(code = %self.session.code, "match activated");
            self.enter_round();
        }
    }

    fn on_round_meta(&mut self, round_no: u32, clue: String) {
        if self.phase != Phase::Round || round_no != self.session.round_no {
            debug!(round = round_no, "dropping stale round metadata");
            return;
        }
        self.round.clue = clue;
    }

    fn on_countdown_tick(&mut self, round_no: u32) {
        if self.phase != Phase::Round || round_no != self.session.round_no {
            return;
        }
        self.round.time_left = self.round.time_left.saturating_sub(1);
        if self.round.time_left == 0 {
            self.countdown.cancel();
            if !self.round.has_guessed && !self.round.guess_in_flight {
                self.auto_guess_on_timeout();
            }
        }
    }

    fn auto_guess_on_timeout(&mut self) {
        let center = self
            .map
            .as_ref()
            .and_then(|map| map.center())
            .or_else(|| geo::city_center(&self.session.city))
            .unwrap_or(geo::STOCKHOLM_CENTER);

        info!(
            round = self.session.round_no,
            lat = center.lat,
            lon = center.lon,
            "time up, sending timeout guess"
        );
        self.send_guess(center.lat, center.lon, true);
    }

    fn send_guess(&mut self, lat: f64, lon: f64, timed_out: bool) {
        if self.phase != Phase::Round || self.round.has_guessed || self.round.guess_in_flight {
            return;
        }
        self.round.guess_in_flight = true;

        let api = self.api.clone();
        let tx = self.events_tx.clone();
        let round_no = self.session.round_no;
        let request = GuessRequest {
            code: self.session.code.clone(),
            nickname: self.session.nickname.clone(),
            lat,
            lon,
            timed_out: timed_out.then_some(true),
            penalty_m: timed_out.then_some(TIMEOUT_PENALTY_M),
        };

        tokio::spawn(async move {
            let outcome = api.guess(round_no, &request).await;
            let _ = tx
                .send(Event::GuessSent {
                    round_no,
                    lat,
                    lon,
                    timed_out,
                    outcome,
                })
                .await;
        });
    }

    fn on_guess_sent(
        &mut self,
        round_no: u32,
        lat: f64,
        lon: f64,
        timed_out: bool,
        outcome: Result<crate::api::types::GuessResponse, crate::api::ApiError>,
    ) {
        if self.phase != Phase::Round || round_no != self.session.round_no {
            debug!(round = round_no, "dropping stale guess outcome");
            return;
        }
        self.round.guess_in_flight = false;

        match outcome {
            Ok(resp) => {
                self.round.has_guessed = true;
                self.round.my_guess = Some(LatLon::new(lat, lon));
                self.round.timeout_penalty = timed_out;
                self.with_map(|map| {
                    map.add_guess_marker(LatLon::new(lat, lon), None);
                    map.set_locked(true);
                });
                info!(
                    round = round_no,
                    timed_out,
                    distance_m = ?resp.distance_m,
                    "guess accepted"
                );

                // Refresh the board right away instead of waiting a poll tick
                let api = self.api.clone();
                let tx = self.events_tx.clone();
                let code = self.session.code.clone();
                tokio::spawn(async move {
                    let event = fetch_round_poll(&api, &code, round_no).await;
                    let _ = tx.send(event).await;
                });
            }
            Err(err) => {
                warn!(error = %err, round = round_no, "guess failed");
                self.alert = Some(format!("Could not send guess: {err}"));
                // Guess state stays unlocked; retry is a new click
            }
        }
    }

    fn on_round_polled(
        &mut self,
        round_no: u32,
        players: Option<Vec<String>>,
        result: Option<RoundResultResponse>,
    ) {
        if self.phase != Phase::Round || round_no != self.session.round_no {
            debug!(round = round_no, "dropping stale poll payload");
            return;
        }

        if let Some(players) = players {
            if !players.is_empty() {
                self.players = dedupe_players(players);
            }
        }

        let Some(result) = result else {
            return;
        };

        let board = self.boards.round_mut(round_no);
        for row in &result.leaderboard {
            board.record(&row.nickname, row.distance_m);
        }
        let finishers = board.finisher_count();
        let total = self.players.len();

        if total > 0 && finishers >= total {
            self.reveal(result);
        }
    }

    fn on_reveal_tick(&mut self, round_no: u32) {
        if self.phase != Phase::Reveal || round_no != self.session.round_no {
            return;
        }
        self.round.reveal_left = self.round.reveal_left.saturating_sub(1);
        if self.round.reveal_left == 0 {
            self.reveal_timer.cancel();
            if self.session.round_no >= self.session.rounds {
                self.enter_final();
            } else {
                self.session.round_no += 1;
                self.enter_round();
            }
        }
    }

    fn on_final_fetched(
        &mut self,
        outcome: Result<crate::api::types::FinalResponse, crate::api::ApiError>,
    ) {
        if self.phase != Phase::Final {
            return;
        }
        match outcome {
            Ok(resp) => {
                // The server order is unspecified; rank ascending here
                let mut standings: Vec<TotalEntry> = resp
                    .standings
                    .into_iter()
                    .map(|row| TotalEntry {
                        nickname: row.nickname,
                        total_m: row.total_m,
                    })
                    .collect();
                standings.sort_by(|a, b| a.total_m.total_cmp(&b.total_m));
                self.standings = standings;
                self.phase = Phase::Done;
            }
            Err(err) => {
                warn!(error = %err, "final standings fetch failed");
                self.alert = Some(format!("Could not fetch final results: {err}"));
            }
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Start => {
                if self.phase != Phase::Lobby || !self.session.is_host {
                    return;
                }
                let api = self.api.clone();
                let tx = self.events_tx.clone();
                let code = self.session.code.clone();
                tokio::spawn(async move {
                    let outcome = api.start_match(&code).await;
                    let _ = tx.send(Event::StartOutcome { outcome }).await;
                });
            }
            Command::Guess { lat, lon } => {
                self.send_guess(lat, lon, false);
            }
            Command::Quit => {
                self.cancel_all_timers();
                self.phase = Phase::Done;
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn cancel_all_timers(&mut self) {
        self.lobby_poll.cancel();
        self.round_poll.cancel();
        self.countdown.cancel();
        self.reveal_timer.cancel();
    }

    fn with_map(&self, f: impl FnOnce(&dyn MapSurface)) {
        if let Some(map) = &self.map {
            f(map.as_ref());
        }
    }

    fn publish_view(&self) {
        let _ = self.view_tx.send(self.view_model());
    }

    fn view_model(&self) -> ViewModel {
        let phase = match self.phase {
            Phase::Lobby => ViewPhase::Lobby,
            Phase::Round => ViewPhase::Round,
            Phase::Reveal => ViewPhase::Reveal,
            Phase::Final | Phase::Done => ViewPhase::Final,
        };

        ViewModel {
            phase,
            code: self.session.code.clone(),
            nickname: self.session.nickname.clone(),
            city: self.session.city.clone(),
            round_no: self.session.round_no,
            rounds: self.session.rounds,
            is_host: self.session.is_host,
            players: self.players.clone(),
            clue: self.round.clue.clone(),
            time_left: self.round.time_left,
            can_guess: self.phase == Phase::Round
                && !self.round.has_guessed
                && !self.round.guess_in_flight,
            board: self
                .boards
                .round(self.session.round_no)
                .map(|b| b.entries().to_vec())
                .unwrap_or_default(),
            revealed: self.round.revealed,
            totals: self
                .boards
                .compute_totals(self.session.round_no, self.round.revealed),
            answer: self.round.answer.clone(),
            my_distance: self.round.my_distance_km.map(|km| format!("{km:.2} km")),
            next_in: self.round.revealed.then_some(self.round.reveal_left),
            standings: self.standings.clone(),
            alert: self.alert.clone(),
        }
    }
}

/// Fetch current players and the round's leaderboard for one poll tick.
/// Both failures are tolerated; the next tick retries.
async fn fetch_round_poll(api: &ApiClient, code: &str, round_no: u32) -> Event {
    let players = match api.lobby(code).await {
        Ok(lobby) => Some(lobby.players),
        Err(err) => {
            debug!(error = %err, "player refresh failed");
            None
        }
    };
    let result = match api.round_result(code, round_no).await {
        Ok(result) => Some(result),
        Err(err) => {
            debug!(error = %err, round = round_no, "round result not yet available");
            None
        }
    };
    Event::RoundPolled {
        round_no,
        players,
        result,
    }
}

/// Distinct players, first-seen order preserved
fn dedupe_players(players: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(players.len());
    for player in players {
        if !out.contains(&player) {
            out.push(player);
        }
    }
    out
}
