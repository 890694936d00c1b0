use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use engine::{ArenaConfig, ArenaState, GameEngine, GameEvent, MatchMode, RoundOutcome};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "snakebattle",
    about = "Run headless AI-vs-AI snake battles and log the action"
)]
struct Args {
    /// Rounds to play before exiting
    #[arg(long, default_value_t = 3)]
    rounds: u32,

    /// Simulation rate in moves per second
    #[arg(long, default_value_t = 15)]
    tick_rate: u16,

    /// Enable obstacle mode
    #[arg(long)]
    obstacles: bool,

    /// RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let config = ArenaConfig {
        tick_rate: args.tick_rate,
        ..ArenaConfig::default()
    };

    info!(
        "Starting {} round(s) at {} moves/s, obstacles {}, seed {}",
        args.rounds,
        args.tick_rate,
        if args.obstacles { "on" } else { "off" },
        seed
    );

    let start_ms = Utc::now().timestamp_millis();
    let mut engine = GameEngine::new(config, seed, start_ms);
    engine.set_obstacle_mode(args.obstacles)?;
    engine.start_match(MatchMode::AiVsAi)?;

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let mut poll = interval(Duration::from_millis(10));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut rounds_played = 0u32;

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => {
                warn!("Interrupted, stopping match");
                engine.stop_match()?;
                break;
            }

            _ = poll.tick() => {
                let now_ms = Utc::now().timestamp_millis();
                for event in engine.run_until(now_ms)? {
                    log_event(&event);
                    if matches!(event, GameEvent::RoundOver { .. }) {
                        rounds_played += 1;
                    }
                }
                if rounds_played >= args.rounds
                    && engine.arena().state() != ArenaState::Running
                {
                    engine.stop_match()?;
                    break;
                }
            }
        }
    }

    let snapshot = engine.snapshot();
    info!("Final score after {} round(s):", rounds_played);
    for snake in &snapshot.snakes {
        info!(
            "  snake {} ({}): {} win(s)",
            snake.id, snake.color, snake.score
        );
    }
    Ok(())
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::RoundStarted => info!("New round"),
        GameEvent::SnakeDied { snake_id, cause } => {
            info!("Snake {} died ({})", snake_id, cause)
        }
        GameEvent::RoundOver { outcome } => match outcome {
            RoundOutcome::Winner { snake_id, cause } => {
                info!("Round over: snake {} wins ({})", snake_id, cause)
            }
            RoundOutcome::Draw { cause } => info!("Round over: draw ({})", cause),
        },
        GameEvent::FoodEaten { snake_id, position } => {
            debug!("Snake {} ate food at ({}, {})", snake_id, position.x, position.y)
        }
        GameEvent::PowerUpCollected { snake_id, kind, .. } => {
            info!("Snake {} picked up {:?}", snake_id, kind)
        }
        GameEvent::PowerUpExpired { snake_id } => {
            debug!("Snake {} power-up expired", snake_id)
        }
        GameEvent::ObstacleSpawned { position } => {
            debug!("Obstacle spawned at ({}, {})", position.x, position.y)
        }
        GameEvent::FoodSpawned { .. }
        | GameEvent::PowerUpSpawned { .. }
        | GameEvent::SnakeTurned { .. }
        | GameEvent::ObstaclesCleared => {}
    }
}
