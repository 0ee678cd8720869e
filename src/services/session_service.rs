use crate::error::{AppError, AppResult};
use crate::external::ShowtimeApi;
use crate::models::{LiveEvent, RsvpValue, ShowtimeId, User, UserSettings, Vote, VoteEntry};
use crate::services::{VoteOutcome, VoteReconciler};
use crate::utils::{ShowtimeCard, normalize_sms_phone, validate_email, validate_password};
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// The server answered 401 for the profile: browsing without voting.
    Anonymous,
    Authenticated(User),
}

/// One user's view of the voting page: who they are, the showtimes and their
/// votes. Created by [`SessionService::bootstrap`], torn down by `logout`.
pub struct SessionService {
    api: Arc<dyn ShowtimeApi>,
    state: SessionState,
    reconciler: VoteReconciler,
    in_flight: Vec<JoinHandle<()>>,
}

impl SessionService {
    pub fn new(api: Arc<dyn ShowtimeApi>, vote_allowance: u32) -> Self {
        Self {
            api,
            state: SessionState::Anonymous,
            reconciler: VoteReconciler::new(vote_allowance),
            in_flight: Vec::new(),
        }
    }

    /// Fetches the profile and the showtime list once each.
    pub async fn bootstrap(api: Arc<dyn ShowtimeApi>, vote_allowance: u32) -> AppResult<Self> {
        let mut session = Self::new(api, vote_allowance);

        match session.api.current_user().await? {
            Some(user) => {
                log::info!("Signed in as {} ({})", user.name, user.email);
                session.state = SessionState::Authenticated(user);
            }
            None => log::info!("Login to get started"),
        }

        session.refresh().await?;
        Ok(session)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn reconciler(&self) -> &VoteReconciler {
        &self.reconciler
    }

    pub fn remaining(&self) -> i32 {
        self.reconciler.remaining()
    }

    pub fn cards(&self) -> Vec<ShowtimeCard> {
        self.reconciler
            .items()
            .iter()
            .map(ShowtimeCard::from_item)
            .collect()
    }

    /// Full refetch of the showtime list. Returns the number of showtimes.
    ///
    /// Pending vote submissions land first, otherwise the fetched list could
    /// predate them and the next submission would erase them on the server.
    pub async fn refresh(&mut self) -> AppResult<usize> {
        self.flush().await;
        let showtimes = self.api.showtimes().await?;
        let count = showtimes.len();
        self.reconciler.load(showtimes);
        log::debug!(
            "Loaded {count} showtimes, {} votes remaining",
            self.reconciler.remaining()
        );
        Ok(count)
    }

    /// Signs in and reloads the showtimes for the new user. A failed reload
    /// leaves the session signed in with no showtimes until the next refresh.
    pub async fn login(&mut self, email: &str, password: &str) -> AppResult<User> {
        validate_email(email)?;
        validate_password(password)?;

        let user = self.api.login(email.trim(), password).await?;
        log::info!("Welcome: {}", user.name);

        // the vote set belonged to whoever was browsing before
        self.flush().await;
        self.reconciler.clear();
        self.state = SessionState::Authenticated(user.clone());
        if let Err(e) = self.refresh().await {
            e.report("Loading showtimes after login");
        }
        Ok(user)
    }

    pub fn logout(&mut self) {
        if let SessionState::Authenticated(user) = &self.state {
            log::info!("Signed out {}", user.name);
        }
        self.state = SessionState::Anonymous;
        self.reconciler.clear();
    }

    /// Applies a vote locally and, if accepted, posts the full vote set in
    /// the background. Submission failures are logged, never retried: the
    /// next accepted vote resends everything.
    pub fn vote(&mut self, id: &ShowtimeId, vote: Vote) -> AppResult<VoteOutcome> {
        if !self.is_authenticated() {
            return Err(AppError::AuthError("Login to vote".into()));
        }

        let outcome = self.reconciler.apply_vote(id, vote);
        if let VoteOutcome::Accepted(change) = &outcome {
            log::info!(
                "Vote on {} changed {} -> {}, {} remaining",
                change.id,
                change.previous,
                change.current,
                change.remaining
            );
            self.submit(change.submission.clone());
        }
        Ok(outcome)
    }

    fn submit(&mut self, votes: Vec<VoteEntry>) {
        self.in_flight.retain(|handle| !handle.is_finished());

        let api = Arc::clone(&self.api);
        self.in_flight.push(tokio::spawn(async move {
            if let Err(e) = api.submit_votes(&votes).await {
                e.report("Submitting votes");
            }
        }));
    }

    /// Waits for every submission still in flight.
    pub async fn flush(&mut self) {
        for handle in self.in_flight.drain(..) {
            if let Err(e) = handle.await {
                log::error!("Vote submission task failed: {e}");
            }
        }
    }

    /// Applies a pushed event. Returns true when the showtimes changed.
    pub fn apply_live_event(&mut self, event: &LiveEvent) -> bool {
        match event {
            LiveEvent::Activity(activity) => {
                log::info!("{} just voted!", activity.actor_name());
                self.reconciler.apply_server_update(&activity.votes) > 0
            }
            LiveEvent::Rsvp(rsvp) => {
                let name = rsvp.user.as_ref().map(|u| u.name.as_str()).unwrap_or("Someone");
                log::info!("{name} RSVP'd {}", rsvp.value);
                false
            }
            LiveEvent::Keepalive => false,
            LiveEvent::Other { data, .. } => {
                log::debug!("Unhandled live event {}: {data}", event.name());
                false
            }
        }
    }

    pub async fn register(&self, name: &str, email: &str) -> AppResult<()> {
        if self.is_authenticated() {
            return Err(AppError::ValidationError("Already registered".into()));
        }
        if name.trim().is_empty() {
            return Err(AppError::ValidationError("Name must not be empty".into()));
        }
        validate_email(email)?;

        self.api.register(name.trim(), email.trim()).await?;
        log::info!("Registration complete, check {email} for next steps");
        Ok(())
    }

    pub async fn update_settings(&mut self, mut settings: UserSettings) -> AppResult<User> {
        let SessionState::Authenticated(user) = &self.state else {
            return Err(AppError::AuthError("Login to change settings".into()));
        };
        settings.phone = normalize_sms_phone(&settings.phone)?;

        let updated = user.with_settings(settings);
        self.api.update_settings(&updated).await?;
        log::info!("Settings updated");

        self.state = SessionState::Authenticated(updated.clone());
        Ok(updated)
    }

    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        validate_email(email)?;
        self.api.request_password_reset(email.trim()).await?;
        log::info!("Password reset requested, check {email} for next steps");
        Ok(())
    }

    pub async fn reset_password(&self, ott: &str, password: &str) -> AppResult<()> {
        if ott.trim().is_empty() {
            return Err(AppError::ValidationError("Missing one-time token".into()));
        }
        validate_password(password)?;
        self.api.reset_password(ott.trim(), password).await
    }

    pub async fn rsvp(&self, id: &ShowtimeId, value: RsvpValue) -> AppResult<()> {
        if self.reconciler.get(id).is_none() {
            return Err(AppError::NotFound(format!("Showtime {id}")));
        }
        self.api.rsvp(id, value).await
    }
}
