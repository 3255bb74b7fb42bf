//! Interactive game in the terminal.

use anyhow::{Context, Result};
use smart_horses_client::{HttpGameService, TurnSynchronizer};
use smart_horses_core::GameEvent;
use smart_horses_types::{Difficulty, Winner};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::ClientConfig;
use crate::render::{self, Input};

type Engine = TurnSynchronizer<HttpGameService>;

/// Run the play command.
pub async fn run(config: &ClientConfig, difficulty: Difficulty) -> Result<()> {
    let service = HttpGameService::new(&config.server.url, config.timeout())
        .context("Invalid server configuration")?;
    let engine = TurnSynchronizer::new(service, config.engine_config());
    let announcer = tokio::spawn(announce(engine.events(), engine.clone()));

    println!("Smart Horses against {}", config.server.url);
    println!("Type 'help' for commands.");
    println!();

    let mut difficulty = difficulty;
    start(&engine, difficulty).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to write prompt")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        match render::parse_input(&line) {
            Ok(Input::Quit) => break,
            Ok(Input::Empty) => continue,
            Ok(Input::Help) => {
                print!("{}", render::HELP);
                continue;
            }
            Ok(Input::New(level)) => {
                difficulty = level.unwrap_or(difficulty);
                start(&engine, difficulty).await;
                continue;
            }
            Ok(Input::Move(square)) => {
                if let Err(reason) = engine.submit_local_move(square).await {
                    println!("Cannot move to {}: {reason}", render::square_name(square));
                    continue;
                }
            }
            Ok(Input::Moves) => {
                engine.refresh_legal_moves().await;
                let view = engine.view();
                if view.legal_moves.is_empty() {
                    println!("No legal moves right now.");
                } else {
                    println!("Legal moves: {}", render::square_list(&view.legal_moves));
                }
                continue;
            }
            Ok(Input::Hint) => {
                match engine.fetch_opponent_move().await {
                    Ok(hint) => match hint.evaluation {
                        Some(evaluation) => println!(
                            "Engine plays {} (evaluation {evaluation:.2})",
                            render::square_name(hint.square)
                        ),
                        None => println!("Engine plays {}", render::square_name(hint.square)),
                    },
                    Err(e) => println!("No hint: {e}"),
                }
                continue;
            }
            Err(e) => {
                println!("{e}");
                continue;
            }
        }

        show(&engine);
    }

    engine.reset();
    announcer.abort();
    Ok(())
}

async fn start(engine: &Engine, difficulty: Difficulty) {
    println!("Starting a {difficulty} game...");
    if let Err(reason) = engine.start_game(difficulty).await {
        println!("{reason}");
        return;
    }
    show(engine);
}

fn show(engine: &Engine) {
    let view = engine.view();
    println!();
    print!("{}", render::board(&view));
    println!();
    print!("{}", render::status(&view));
}

/// Print game events as they happen.
async fn announce(mut events: broadcast::Receiver<GameEvent>, engine: Engine) {
    let local = engine.config().local_side;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "event printer lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            GameEvent::PieceMoved { side, square } if side != local => {
                println!();
                println!("Machine moved to {}", render::square_name(square));
                show(&engine);
            }
            GameEvent::PenaltyApplied { .. } => {
                println!("You had no legal move: penalty applied.");
            }
            GameEvent::GameOver { outcome } => match outcome {
                Winner::Draw => println!("Game over: draw."),
                winner if winner == Winner::from(local) => println!("Game over: you win!"),
                _ => println!("Game over: the machine wins."),
            },
            // Failures show up in the status line.
            GameEvent::GameStarted { .. }
            | GameEvent::PieceMoved { .. }
            | GameEvent::MoveFailed { .. }
            | GameEvent::StartFailed { .. } => {}
        }
    }
}
