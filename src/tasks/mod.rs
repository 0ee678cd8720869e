//! Background jobs that keep the session in step with the server.
//!
//! Call `spawn_all` once after the session is bootstrapped.

use crate::services::{LiveUpdateService, SharedSession};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawn the periodic refetch and, if given, the live-update follower.
///
/// Tasks are detached with `tokio::spawn`; abort the returned handles to stop them.
pub fn spawn_all(
    session: SharedSession,
    live_updates: Option<LiveUpdateService>,
    refresh_interval: Duration,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    // 全量刷新：纠正推送遗漏的总票数
    {
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            loop {
                tokio::time::sleep(refresh_interval).await;
                let mut session = session.lock().await;
                match session.refresh().await {
                    Ok(n) => log::debug!(
                        "Refreshed {n} showtimes, {} votes remaining",
                        session.remaining()
                    ),
                    Err(e) => e.report("Refreshing showtimes"),
                }
            }
        }));
    }

    if let Some(live) = live_updates {
        handles.push(tokio::spawn(async move {
            live.run().await;
        }));
    }

    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mock::MockShowtimeApi;
    use crate::models::Showtime;
    use crate::services::SessionService;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn test_refresh_task_reloads() {
        let api = Arc::new(MockShowtimeApi::anonymous(vec![]));
        let session = SessionService::bootstrap(api.clone(), 6).await.unwrap();
        let session: SharedSession = Arc::new(Mutex::new(session));

        let handles = spawn_all(session.clone(), None, Duration::from_secs(60));
        assert_eq!(handles.len(), 1);

        *api.showtimes.lock().unwrap() = vec![Showtime {
            id: "new".into(),
            votes: 3,
            ..Default::default()
        }];
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(session.lock().await.cards().len(), 1);
        for handle in handles {
            handle.abort();
        }
    }
}
