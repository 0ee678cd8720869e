use crate::error::AppResult;
use crate::external::{EventStreamDecoder, MovieNightApi, SseFrame, decode_event};
use crate::services::SharedSession;
use futures_util::StreamExt;
use std::time::Duration;

/// Follows the server-push stream and feeds `activity` events into the session.
#[derive(Clone)]
pub struct LiveUpdateService {
    api: MovieNightApi,
    session: SharedSession,
    reconnect_delay: Duration,
}

impl LiveUpdateService {
    pub fn new(api: MovieNightApi, session: SharedSession, reconnect_delay: Duration) -> Self {
        Self {
            api,
            session,
            reconnect_delay,
        }
    }

    /// Reconnects forever. The server may shorten the delay with `retry:`.
    pub async fn run(&self) {
        let mut last_event_id: Option<String> = None;
        loop {
            let mut decoder = EventStreamDecoder::new();
            match self.follow(&mut decoder, last_event_id.as_deref()).await {
                Ok(n) => log::info!("Live update stream closed after {n} events"),
                Err(e) => e.report("Live updates"),
            }
            if let Some(id) = decoder.last_event_id() {
                last_event_id = Some(id.to_string());
            }

            let delay = decoder
                .retry_ms()
                .map(Duration::from_millis)
                .unwrap_or(self.reconnect_delay);
            log::debug!("Reconnecting to live updates in {delay:?}");
            tokio::time::sleep(delay).await;
        }
    }

    /// Reads one connection until it ends. Returns the number of frames seen.
    pub async fn follow(
        &self,
        decoder: &mut EventStreamDecoder,
        last_event_id: Option<&str>,
    ) -> AppResult<usize> {
        let response = self.api.open_live_stream(last_event_id).await?;
        log::info!("Connected to live updates");

        let mut stream = response.bytes_stream();
        let mut seen = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for frame in decoder.push(&chunk) {
                seen += 1;
                self.dispatch(&frame).await;
            }
        }
        Ok(seen)
    }

    /// Applies one frame. Malformed payloads are skipped. Returns true when
    /// the showtime list changed.
    pub async fn dispatch(&self, frame: &SseFrame) -> bool {
        match decode_event(frame) {
            Ok(event) => self.session.lock().await.apply_live_event(&event),
            Err(e) => {
                log::warn!("Skipping malformed {} event: {e}", frame.event_name());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::external::mock::MockShowtimeApi;
    use crate::models::{Showtime, User};
    use crate::services::SessionService;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    async fn service() -> LiveUpdateService {
        let mock = MockShowtimeApi::signed_in(
            User {
                id: 1,
                name: "Sam".into(),
                ..Default::default()
            },
            vec![Showtime {
                id: "x".into(),
                vote: 2,
                votes: 10,
                ..Default::default()
            }],
        );
        let session = SessionService::bootstrap(Arc::new(mock), 6).await.unwrap();
        let api = MovieNightApi::new(&ApiConfig::default()).unwrap();
        LiveUpdateService::new(api, Arc::new(Mutex::new(session)), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_dispatch_activity() {
        let live = service().await;
        let mut decoder = EventStreamDecoder::new();
        let frames = decoder.push(
            b"event: activity\ndata: {\"user\":{\"name\":\"Jo\"},\"votes\":[{\"id\":\"x\",\"votes\":42}]}\n\n",
        );

        assert!(live.dispatch(&frames[0]).await);
        let session = live.session.lock().await;
        let item = session.reconciler().get(&"x".into()).unwrap();
        assert_eq!(item.total_votes, 42);
        assert_eq!(item.my_vote.value(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_skips_malformed() {
        let live = service().await;
        let frame = SseFrame {
            event: Some("activity".into()),
            id: None,
            data: "oops".into(),
        };
        assert!(!live.dispatch(&frame).await);
        let session = live.session.lock().await;
        assert_eq!(session.reconciler().get(&"x".into()).unwrap().total_votes, 10);
    }
}
