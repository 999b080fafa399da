//! Application shell.
//!
//! Dispatches the CLI, creates or joins a match, and runs one match view:
//! controller on its own event loop, a printer task re-rendering the terminal
//! on every published view, and either a stdin command reader or the bot as
//! the player.

pub mod bot;

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::warn;

use crate::api::types::{CreateMatchRequest, JoinMatchRequest};
use crate::api::ApiClient;
use crate::cli::{BotArgs, Cli, CliCommand};
use crate::config::Config;
use crate::game::{Command, Controller, ControllerHandle, Session};
use crate::map::{LogMap, MapSurface};
use crate::ui::{self, ViewModel};

pub async fn run(config: Config, cli: Cli) -> anyhow::Result<()> {
    let api = ApiClient::new(&config.api_url);

    match cli.command {
        CliCommand::Cities => list_cities(&api).await,
        CliCommand::Top { city, limit, order } => {
            show_top_scores(&api, city.as_deref(), limit, &order).await
        }
        CliCommand::Create {
            nickname,
            city,
            rounds,
            bot,
        } => host_loop(&api, &config, &nickname, &city, rounds, bot).await,
        CliCommand::Join {
            code,
            nickname,
            bot,
        } => {
            api.join_match(&JoinMatchRequest {
                code: code.clone(),
                nickname: nickname.clone(),
            })
            .await
            .context("could not join the match")?;
            // City and round count arrive with the first lobby response
            let session = Session::new(code, nickname);
            play_match(&api, &config, session, bot).await
        }
    }
}

/// Create a match, play it, and offer a rematch with the same settings
async fn host_loop(
    api: &ApiClient,
    config: &Config,
    nickname: &str,
    city: &str,
    rounds: u32,
    bot: BotArgs,
) -> anyhow::Result<()> {
    loop {
        let created = api
            .create_match(&CreateMatchRequest {
                host_name: nickname.to_string(),
                city: city.to_string(),
                rounds,
            })
            .await
            .context("could not create a match")?;
        println!(
            "Match {} created: {} rounds in {}",
            created.code, created.rounds, created.city
        );
        println!("Share the code, then type `start` when everyone is in.");

        let session = Session::new(&created.code, nickname)
            .host()
            .with_city(&created.city, created.rounds);
        play_match(api, config, session, bot).await?;

        if bot.bot || !ask_play_again().await? {
            return Ok(());
        }
    }
}

/// Run one match view to completion
async fn play_match(
    api: &ApiClient,
    config: &Config,
    session: Session,
    bot: BotArgs,
) -> anyhow::Result<()> {
    let map: Arc<dyn MapSurface> = Arc::new(LogMap);
    let (controller, handle) = Controller::new(api.clone(), session, config.timing, Some(map));

    let printer = tokio::spawn(print_views(handle.view()));
    let player = if bot.bot {
        tokio::spawn(bot::Bot::new(handle.clone(), bot.bot_seed, bot.bot_think_ms).run())
    } else {
        tokio::spawn(read_commands(handle.clone()))
    };

    controller.run().await;

    player.abort();
    // The controller's last publish is the final standings; the printer ends
    // on its own once the view sender is gone, so wait for it instead of
    // aborting it mid-frame.
    let _ = printer.await;
    Ok(())
}

/// Re-render the terminal on every published view
async fn print_views(view_rx: watch::Receiver<ViewModel>) {
    consume_views(view_rx, |view| println!("\n{}", ui::render(view))).await;
}

/// Feed every published view to `sink` until the sender is dropped. The
/// frame current at drop time is always delivered before this returns.
async fn consume_views(mut view_rx: watch::Receiver<ViewModel>, mut sink: impl FnMut(&ViewModel)) {
    loop {
        sink(&view_rx.borrow_and_update());
        if view_rx.changed().await.is_err() {
            return;
        }
    }
}

/// Read terminal commands until the controller or stdin goes away
async fn read_commands(handle: ControllerHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some(command) = parse_command(&line) else {
            if !line.trim().is_empty() {
                warn!(input = %line, "unrecognized command, try: start | guess <lat> <lon> | quit");
            }
            continue;
        };
        if !handle.command(command).await {
            return;
        }
        if command == Command::Quit {
            return;
        }
    }
    // stdin closed; leave the match rather than playing on headless
    let _ = handle.command(Command::Quit).await;
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "start" => Some(Command::Start),
        "quit" | "exit" => Some(Command::Quit),
        "guess" => {
            let lat: f64 = parts.next()?.parse().ok()?;
            let lon: f64 = parts.next()?.parse().ok()?;
            Some(Command::Guess { lat, lon })
        }
        _ => None,
    }
}

async fn ask_play_again() -> anyhow::Result<bool> {
    println!("Play again with the same settings? [y/N]");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let answer = lines.next_line().await?;
    Ok(matches!(answer, Some(line) if line.trim().eq_ignore_ascii_case("y")))
}

async fn list_cities(api: &ApiClient) -> anyhow::Result<()> {
    let cities = api.cities().await.context("could not fetch the city list")?;
    for city in cities.cities {
        println!(
            "{} ({:.3}, {:.3})",
            city.key, city.center.lat, city.center.lon
        );
    }
    Ok(())
}

async fn show_top_scores(
    api: &ApiClient,
    city: Option<&str>,
    limit: u32,
    order: &str,
) -> anyhow::Result<()> {
    let scores = api
        .top_scores(city, limit, order)
        .await
        .context("could not fetch the top scores")?;
    if scores.items.is_empty() {
        println!("No scores yet.");
        return Ok(());
    }
    for (idx, row) in scores.items.iter().enumerate() {
        let city = row.city.as_deref().unwrap_or("-");
        println!(
            "{:>3}. {} - {} m over {} rounds ({}, {})",
            idx + 1,
            row.name,
            row.score,
            row.rounds,
            city,
            row.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::ViewPhase;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn view_consumer_delivers_the_final_frame_before_exiting() {
        let (view_tx, view_rx) = watch::channel(ViewModel::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let consumer = tokio::spawn(consume_views(view_rx, move |view| {
            sink.lock().unwrap().push(view.phase);
        }));

        let final_view = ViewModel {
            phase: ViewPhase::Final,
            ..ViewModel::default()
        };
        view_tx.send(final_view).unwrap();
        drop(view_tx);

        // Awaiting (not aborting) must always yield the standings frame
        consumer.await.unwrap();
        assert_eq!(seen.lock().unwrap().last(), Some(&ViewPhase::Final));
    }

    #[test]
    fn terminal_commands_parse() {
        assert_eq!(parse_command("start"), Some(Command::Start));
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(
            parse_command("guess 59.33 18.06"),
            Some(Command::Guess {
                lat: 59.33,
                lon: 18.06
            })
        );
        assert_eq!(parse_command("guess 59.33"), None);
        assert_eq!(parse_command("guess north here"), None);
        assert_eq!(parse_command("dance"), None);
    }
}
