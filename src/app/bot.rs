//! Automated player.
//!
//! Watches the controller's published views and plays by sending the same
//! commands a human would: the host bot starts the match once a second player
//! shows up, and every round it guesses near the city center after a short
//! think pause. Deterministic for a given seed.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::game::geo::{self, LatLon};
use crate::game::{Command, ControllerHandle};
use crate::ui::ViewPhase;

pub struct Bot {
    handle: ControllerHandle,
    rng: ChaCha8Rng,
    think: Duration,
}

impl Bot {
    pub fn new(handle: ControllerHandle, seed: u64, think_ms: u64) -> Self {
        Self {
            handle,
            rng: ChaCha8Rng::seed_from_u64(seed),
            think: Duration::from_millis(think_ms),
        }
    }

    pub async fn run(mut self) {
        let mut view_rx = self.handle.view();
        let mut started = false;
        let mut guessed_round = 0u32;

        loop {
            let view = view_rx.borrow_and_update().clone();

            if view.phase == ViewPhase::Lobby && view.is_host && !started && view.players.len() >= 2
            {
                started = true;
                info!(players = view.players.len(), "bot starting the match");
                if !self.handle.command(Command::Start).await {
                    return;
                }
            }

            if view.phase == ViewPhase::Round && view.can_guess && view.round_no > guessed_round {
                guessed_round = view.round_no;
                let guess = self.pick_guess(&view.city);
                tokio::time::sleep(self.think).await;
                info!(
                    round = view.round_no,
                    lat = guess.lat,
                    lon = guess.lon,
                    "bot guessing"
                );
                if !self
                    .handle
                    .command(Command::Guess {
                        lat: guess.lat,
                        lon: guess.lon,
                    })
                    .await
                {
                    return;
                }
            }

            if view_rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// A point within a few kilometers of the city center
    fn pick_guess(&mut self, city: &str) -> LatLon {
        let center = geo::city_center(city).unwrap_or(geo::STOCKHOLM_CENTER);
        let dlat = self.rng.gen_range(-0.045..0.045);
        let dlon = self.rng.gen_range(-0.09..0.09);
        LatLon::new(center.lat + dlat, center.lon + dlon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_the_same_guesses() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        let ga: f64 = a.gen_range(-0.045..0.045);
        let gb: f64 = b.gen_range(-0.045..0.045);
        assert_eq!(ga, gb);
    }

    #[test]
    fn guesses_stay_near_the_city_center() {
        let api = crate::api::ApiClient::new("http://127.0.0.1:9");
        let session = crate::game::Session::new("ABCD", "bot");
        let (_controller, handle) =
            crate::game::Controller::new(api, session, Default::default(), None);
        let mut bot = Bot::new(handle, 7, 0);
        for _ in 0..32 {
            let guess = bot.pick_guess("goteborg");
            let center = geo::city_center("goteborg").unwrap();
            assert!(geo::haversine_km(guess, center) < 12.0);
        }
    }
}
