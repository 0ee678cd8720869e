use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;
use tokio::sync::Mutex;

use movienight_client::{
    AppError, AppResult,
    config::Config,
    external::{MovieNightApi, ShowtimeApi},
    models::{ShowtimeId, Vote},
    services::{LiveUpdateService, SessionService, SharedSession, VoteOutcome},
    tasks,
    utils::remaining_badge,
};

/// `<showtime-id>=<vote>`, where vote is -1..=3, `down` or `clear`.
fn parse_vote_arg(arg: &str) -> AppResult<(ShowtimeId, Vote)> {
    let (id, vote) = arg.split_once('=').ok_or_else(|| {
        AppError::ValidationError(format!("Expected <showtime-id>=<vote>, got {arg}"))
    })?;
    Ok((ShowtimeId::from(id.trim()), vote.parse()?))
}

fn print_session(session: &SessionService) {
    println!(
        "{}",
        remaining_badge(session.user().map(|u| u.name.as_str()), session.remaining())
    );
    for card in session.cards() {
        println!("{card}");
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stderr)
        .init();

    let config = Config::from_toml()?;
    let votes = std::env::args()
        .skip(1)
        .map(|arg| parse_vote_arg(&arg))
        .collect::<AppResult<Vec<_>>>()?;

    let api = MovieNightApi::new(&config.api)?;
    let shared_api: Arc<dyn ShowtimeApi> = Arc::new(api.clone());
    let mut session = SessionService::bootstrap(shared_api, config.session.vote_allowance).await?;

    if !session.is_authenticated()
        && let Some((email, password)) = config.credentials()
    {
        if let Err(e) = session.login(email, password).await {
            e.report("Login");
        }
    }

    for (id, vote) in votes {
        match session.vote(&id, vote) {
            Ok(VoteOutcome::Accepted(change)) => {
                log::info!("Voted {} on {id}, {} remaining", change.current, change.remaining)
            }
            Ok(VoteOutcome::Rejected(reason)) => {
                log::warn!("Vote {vote} on {id} not applied: {reason:?}")
            }
            Err(e) => e.report("Voting"),
        }
    }
    session.flush().await;

    print_session(&session);

    if !config.live.enabled {
        return Ok(());
    }

    let session: SharedSession = Arc::new(Mutex::new(session));
    let live = LiveUpdateService::new(api, session.clone(), config.live.reconnect_delay());
    let handles = tasks::spawn_all(session.clone(), Some(live), config.live.refresh_interval());

    log::info!("Following live updates, Ctrl-C to quit");
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {e}");
    }

    for handle in handles {
        handle.abort();
    }
    print_session(&*session.lock().await);
    Ok(())
}
