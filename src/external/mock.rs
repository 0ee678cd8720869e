//! In-memory [`ShowtimeApi`] for session tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::external::ShowtimeApi;
use crate::models::{RsvpValue, Showtime, ShowtimeId, User, VoteEntry};

#[derive(Default)]
pub struct MockShowtimeApi {
    pub user: Mutex<Option<User>>,
    pub password: String,
    pub showtimes: Mutex<Vec<Showtime>>,
    pub submissions: Mutex<Vec<Vec<VoteEntry>>>,
    pub settings_updates: Mutex<Vec<User>>,
    pub reset_requests: Mutex<Vec<String>>,
    pub rsvps: Mutex<Vec<(ShowtimeId, RsvpValue)>>,
    pub fail_submissions: bool,
    pub fail_showtimes: AtomicBool,
    /// The user the server would log in, while `user` is the current session.
    pub account: Option<User>,
}

impl MockShowtimeApi {
    pub fn anonymous(showtimes: Vec<Showtime>) -> Self {
        Self {
            showtimes: Mutex::new(showtimes),
            ..Default::default()
        }
    }

    pub fn signed_in(user: User, showtimes: Vec<Showtime>) -> Self {
        Self {
            user: Mutex::new(Some(user.clone())),
            account: Some(user),
            showtimes: Mutex::new(showtimes),
            ..Default::default()
        }
    }

    pub fn submitted(&self) -> Vec<Vec<VoteEntry>> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShowtimeApi for MockShowtimeApi {
    async fn current_user(&self) -> AppResult<Option<User>> {
        Ok(self.user.lock().unwrap().clone())
    }

    async fn showtimes(&self) -> AppResult<Vec<Showtime>> {
        if self.fail_showtimes.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApiError("Fetching showtimes failed: HTTP 502".into()));
        }
        Ok(self.showtimes.lock().unwrap().clone())
    }

    async fn submit_votes(&self, votes: &[VoteEntry]) -> AppResult<()> {
        if self.fail_submissions {
            return Err(AppError::ExternalApiError("Posting votes failed: HTTP 500".into()));
        }
        // like the server, the posted set replaces the user's votes wholesale
        for showtime in self.showtimes.lock().unwrap().iter_mut() {
            showtime.vote = votes
                .iter()
                .find(|entry| entry.id == showtime.id)
                .map_or(0, |entry| entry.vote.value() as i64);
        }
        self.submissions.lock().unwrap().push(votes.to_vec());
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        match &self.account {
            Some(account) if account.email == email && self.password == password => {
                *self.user.lock().unwrap() = Some(account.clone());
                Ok(account.clone())
            }
            _ => Err(AppError::AuthError("Login failed".into())),
        }
    }

    async fn register(&self, _name: &str, _email: &str) -> AppResult<()> {
        Ok(())
    }

    async fn update_settings(&self, user: &User) -> AppResult<()> {
        self.settings_updates.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        self.reset_requests.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn reset_password(&self, _ott: &str, _password: &str) -> AppResult<()> {
        Ok(())
    }

    async fn rsvp(&self, showtime_id: &ShowtimeId, value: RsvpValue) -> AppResult<()> {
        self.rsvps.lock().unwrap().push((showtime_id.clone(), value));
        Ok(())
    }
}
