// Fairway draft entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Open database and import the player pool
// 4. Resume or create the draft session
// 5. Spawn the draft actor
// 6. Report events and read commands from stdin until the draft completes,
//    halts, or Ctrl+C
// 7. Cleanup on exit

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use fairway_app::actor::{DraftActor, DraftEvent, DraftHandle};
use fairway_app::app;
use fairway_core::auth::OwnerOrCommissioner;
use fairway_core::config;
use fairway_core::db::SqliteStore;
use fairway_core::pool;
use fairway_core::ids::{ParticipantId, PlayerId, UserId};
use fairway_core::service::DraftService;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Fairway draft starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} participants, {} rounds, {}s pick timer",
        config.league.name,
        config.league.participants.len(),
        config.draft.total_rounds,
        config.draft.pick_timer_secs
    );

    // 3. Open database and import players
    let db = SqliteStore::open(&config.database.path).context("failed to open database")?;
    info!("Database opened at {}", config.database.path);
    let players = pool::load_players(Path::new(&config.data.players)).context("failed to load player pool")?;
    db.import_players(&players).context("failed to import players")?;

    // 4. Resume or create the session
    let mut boot = app::recover_or_create(&config, &db)?;
    if boot.resumed {
        info!("Draft state restored from previous session");
    } else {
        info!("Starting fresh draft session");
    }
    println!("Draft order for {}:", boot.league.name);
    for position in 1..=boot.session.participant_count() {
        if let Some(participant) = boot.session.participant_at(position) {
            println!("  #{position} {} ({})", participant.name, participant.id);
        }
    }

    // 5. Spawn the actor
    let store = Arc::new(db);
    let service = DraftService::new(
        store.clone(),
        boot.session.clone(),
        boot.league.rules,
        Arc::new(OwnerOrCommissioner {
            commissioner: boot.league.commissioner.clone(),
        }),
    );
    let (events_tx, mut events_rx) = mpsc::channel(256);
    let timer = Duration::from_secs(config.draft.pick_timer_secs);
    let (handle, actor_task) = DraftActor::new(service, timer, events_tx).spawn();

    // 6. Report events and serve stdin commands
    println!("Commands: pick <participant> <player> <user> | options <participant> | status | quit");
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    loop {
        tokio::select! {
            event = events_rx.recv() => {
                match event {
                    Some(DraftEvent::OnTheClock { clock, timer }) => {
                        println!(
                            "Pick #{} (round {}): {} is on the clock ({}s)",
                            clock.slot.pick_number,
                            clock.slot.round,
                            clock.participant_id,
                            timer.as_secs()
                        );
                    }
                    Some(DraftEvent::PickMade(pick)) => {
                        println!(
                            "  {} took {}{}",
                            pick.participant_id,
                            pick.player_id,
                            if pick.auto_picked { " (auto)" } else { "" }
                        );
                    }
                    Some(DraftEvent::Completed { total_picks }) => {
                        println!("Draft complete: {total_picks} picks");
                        if let Err(e) = app::close_draft(store.as_ref(), &mut boot.league, true) {
                            error!("Failed to close draft: {:#}", e);
                        }
                        break;
                    }
                    Some(DraftEvent::Halted { reason, .. }) => {
                        eprintln!("Draft halted: {reason}. Operator intervention required.");
                        break;
                    }
                    None => {
                        warn!("Event channel closed");
                        break;
                    }
                }
            }
            line = input.next_line(), if input_open => {
                match line {
                    Ok(Some(line)) => {
                        if !run_command(&handle, line.trim()).await {
                            break;
                        }
                    }
                    Ok(None) => input_open = false,
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        input_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down");
                break;
            }
        }
    }

    // 7. Cleanup: stop the actor and wait for it (with timeout)
    let _ = handle.quit().await;
    match tokio::time::timeout(Duration::from_secs(5), actor_task).await {
        Ok(Ok(Err(e))) => error!("Draft actor error: {:#}", e),
        Ok(Err(e)) => error!("Draft actor task failed: {}", e),
        Err(_) => warn!("Draft actor did not stop within 5s"),
        Ok(Ok(Ok(()))) => {}
    }

    info!("Fairway draft shut down cleanly");
    Ok(())
}

/// Execute one line of operator input. Returns `false` on `quit`.
async fn run_command(handle: &DraftHandle, line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [] => {}
        ["quit"] => return false,
        ["status"] => match handle.status().await {
            Ok(status) => println!(
                "{} picks of {} ({}){}",
                status.pick_count,
                status.total_picks,
                status.phase,
                if status.halted { ", halted" } else { "" }
            ),
            Err(e) => eprintln!("status failed: {e}"),
        },
        ["options", participant] => match handle.options(ParticipantId::from(*participant)).await {
            Ok(options) => {
                println!(
                    "Round {}: {} available, {} allowed",
                    options.current_round,
                    options.available_pool.len(),
                    options.filtered_pool.len()
                );
                if let Some(player) = options.recommendation {
                    println!("  recommended: {} ({})", player.name(), player.id());
                }
            }
            Err(e) => eprintln!("options failed: {e}"),
        },
        ["pick", participant, player, user] => {
            let result = handle
                .pick(
                    ParticipantId::from(*participant),
                    PlayerId::from(*player),
                    UserId::from(*user),
                )
                .await;
            if let Err(e) = result {
                eprintln!("pick rejected: {e}");
            }
        }
        _ => eprintln!("unrecognized command: {line}"),
    }
    true
}

/// Initialize tracing to log to `logs/fairway.log`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("fairway.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fairway=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
