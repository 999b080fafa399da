//! Terminal view rendering
//!
//! The controller publishes [`ViewModel`] snapshots over a watch channel;
//! [`render`] turns one into plain terminal text. Rendering is pure so the
//! sidebar layout can be tested without a running match.

use crate::game::board::{BoardEntry, TotalEntry};
use crate::util::time::format_mmss;

/// Which view is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPhase {
    #[default]
    Lobby,
    Round,
    Reveal,
    Final,
}

/// Everything the terminal view needs for one frame
#[derive(Debug, Clone, Default)]
pub struct ViewModel {
    pub phase: ViewPhase,
    pub code: String,
    pub nickname: String,
    pub city: String,
    pub round_no: u32,
    pub rounds: u32,
    pub is_host: bool,
    pub players: Vec<String>,

    pub clue: String,
    pub time_left: u32,
    /// The map accepts guesses right now
    pub can_guess: bool,
    /// Current round's board, arrival order; rendered as distances only
    /// after the reveal
    pub board: Vec<BoardEntry>,
    pub revealed: bool,
    pub totals: Vec<TotalEntry>,
    pub answer: Option<String>,
    pub my_distance: Option<String>,
    /// Seconds until the next round (or the final view) after a reveal
    pub next_in: Option<u32>,

    pub standings: Vec<TotalEntry>,
    pub alert: Option<String>,
}

/// Render a snapshot as terminal text
pub fn render(view: &ViewModel) -> String {
    let mut out = String::new();

    if let Some(alert) = &view.alert {
        out.push_str(&format!("!! {alert}\n"));
    }

    match view.phase {
        ViewPhase::Lobby => render_lobby(view, &mut out),
        ViewPhase::Round | ViewPhase::Reveal => render_round(view, &mut out),
        ViewPhase::Final => render_final(view, &mut out),
    }

    out
}

fn render_lobby(view: &ViewModel, out: &mut String) {
    out.push_str(&format!(
        "Match {} - lobby (you are {})\n",
        view.code, view.nickname
    ));
    if view.players.is_empty() {
        out.push_str("Players: -\n");
    } else {
        out.push_str(&format!("Players: {}\n", view.players.join(", ")));
    }
    if view.is_host {
        out.push_str("Waiting for you to start (type: start)\n");
    } else {
        out.push_str("Waiting for the host to start the game...\n");
    }
}

fn render_round(view: &ViewModel, out: &mut String) {
    out.push_str(&format!(
        "Round {}/{} - match {}\n",
        view.round_no, view.rounds, view.code
    ));
    if view.clue.is_empty() {
        out.push_str("Clue: waiting for clue...\n");
    } else {
        out.push_str(&format!("Clue: {}\n", view.clue));
    }
    out.push_str(&format!("Time: {}\n", format_mmss(view.time_left)));

    if let Some(answer) = &view.answer {
        out.push_str(&format!("Answer: {answer}\n"));
        if let Some(distance) = &view.my_distance {
            out.push_str(&format!("Your distance: {distance}\n"));
        }
    }

    if let Some(next_in) = view.next_in {
        if view.round_no >= view.rounds {
            out.push_str(&format!("Final results in: {next_in}s\n"));
        } else {
            out.push_str(&format!("Next round in: {next_in}s\n"));
        }
    }

    out.push_str(&format!("Round {} results:\n", view.round_no));
    if !view.revealed {
        // Only Done/Waiting while the round is live
        if view.players.is_empty() {
            out.push_str("  -\n");
        }
        for player in &view.players {
            let done = view.board.iter().any(|e| &e.nickname == player);
            let status = if done { "Done" } else { "Waiting..." };
            out.push_str(&format!("  {player} - {status}\n"));
        }
    } else {
        let mut ranked = view.board.clone();
        ranked.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        if ranked.is_empty() {
            out.push_str("  -\n");
        }
        for entry in &ranked {
            out.push_str(&format!("  {} - {:.0} m\n", entry.nickname, entry.distance_m));
        }
    }

    out.push_str("Totals:\n");
    if view.totals.is_empty() {
        out.push_str("  -\n");
    }
    for total in &view.totals {
        out.push_str(&format!("  {} - {:.0} m\n", total.nickname, total.total_m));
    }

    if view.can_guess {
        out.push_str("Guess with: guess <lat> <lon>\n");
    }
}

fn render_final(view: &ViewModel, out: &mut String) {
    out.push_str(&format!("Final standings - match {}\n", view.code));
    if view.standings.is_empty() {
        out.push_str("  -\n");
    }
    for (idx, row) in view.standings.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} - {:.0} m\n",
            idx + 1,
            row.nickname,
            row.total_m
        ));
    }
}
