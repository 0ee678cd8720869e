use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    LoginRequest, RegisterRequest, ResetPasswordRequest, RsvpValue, Showtime, ShowtimeId, User,
    VoteEntry,
};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;

/// The calls a session makes against the movie night server.
#[async_trait]
pub trait ShowtimeApi: Send + Sync {
    /// `Ok(None)` means the server does not know us: anonymous browsing.
    async fn current_user(&self) -> AppResult<Option<User>>;

    async fn showtimes(&self) -> AppResult<Vec<Showtime>>;

    /// Persists the complete vote set; the payload is absolute, never a delta.
    async fn submit_votes(&self, votes: &[VoteEntry]) -> AppResult<()>;

    async fn login(&self, email: &str, password: &str) -> AppResult<User>;

    async fn register(&self, name: &str, email: &str) -> AppResult<()>;

    async fn update_settings(&self, user: &User) -> AppResult<()>;

    async fn request_password_reset(&self, email: &str) -> AppResult<()>;

    async fn reset_password(&self, ott: &str, password: &str) -> AppResult<()>;

    async fn rsvp(&self, showtime_id: &ShowtimeId, value: RsvpValue) -> AppResult<()>;
}

/// HTTP client for the movie night server. The server tracks the login with
/// a session cookie, so the client keeps a cookie store.
#[derive(Clone)]
pub struct MovieNightApi {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl MovieNightApi {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid api.base_url: {e}")))?;
        // No client-wide timeout: it would also cut the long-lived event stream.
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .connect_timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
        })
    }

    fn url(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::InternalError(format!("Bad API path {path}: {e}")))
    }

    /// Opens the server-push stream. The caller reads the body incrementally.
    pub async fn open_live_stream(&self, last_event_id: Option<&str>) -> AppResult<Response> {
        let mut request = self
            .client
            .get(self.url("api/sse")?)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = last_event_id {
            request = request.header("Last-Event-ID", id);
        }
        let response = request.send().await?;
        ensure_success(response, "Opening live updates").await
    }
}

async fn ensure_success(response: Response, context: &str) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AppError::ExternalApiError(format!(
        "{context} failed: HTTP {}: {}",
        status.as_u16(),
        error_text.trim()
    )))
}

#[async_trait]
impl ShowtimeApi for MovieNightApi {
    async fn current_user(&self) -> AppResult<Option<User>> {
        let response = self
            .client
            .get(self.url("api/users/me")?)
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            log::debug!("Profile request returned 401, browsing anonymously");
            return Ok(None);
        }
        let response = ensure_success(response, "Fetching profile").await?;
        Ok(Some(response.json().await?))
    }

    async fn showtimes(&self) -> AppResult<Vec<Showtime>> {
        let response = self
            .client
            .get(self.url("api/showtimes")?)
            .timeout(self.timeout)
            .send()
            .await?;
        let response = ensure_success(response, "Fetching showtimes").await?;
        let showtimes: Vec<Showtime> = response.json().await?;
        log::debug!("Fetched {} showtimes", showtimes.len());
        Ok(showtimes)
    }

    async fn submit_votes(&self, votes: &[VoteEntry]) -> AppResult<()> {
        let response = self
            .client
            .post(self.url("api/showtimes")?)
            .timeout(self.timeout)
            .json(votes)
            .send()
            .await?;
        ensure_success(response, "Posting votes").await?;
        log::info!("Votes posted: {} showtimes", votes.len());
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(self.url("api/login")?)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AppError::AuthError("Login failed".to_string()));
        }
        let response = ensure_success(response, "Login").await?;
        Ok(response.json().await?)
    }

    async fn register(&self, name: &str, email: &str) -> AppResult<()> {
        let body = RegisterRequest {
            email: email.to_string(),
            name: name.to_string(),
        };
        let response = self
            .client
            .post(self.url("api/users")?)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;
        ensure_success(response, "Registration").await?;
        Ok(())
    }

    async fn update_settings(&self, user: &User) -> AppResult<()> {
        let response = self
            .client
            .post(self.url("api/users/me")?)
            .timeout(self.timeout)
            .json(user)
            .send()
            .await?;
        ensure_success(response, "Updating settings").await?;
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let response = self
            .client
            .get(self.url("api/password")?)
            .timeout(self.timeout)
            .query(&[("email", email)])
            .send()
            .await?;

        // The server answers 202 whether or not the address is known.
        if response.status() != StatusCode::ACCEPTED {
            let response = ensure_success(response, "Password reset request").await?;
            log::warn!(
                "Password reset request answered {} instead of 202",
                response.status()
            );
        }
        Ok(())
    }

    async fn reset_password(&self, ott: &str, password: &str) -> AppResult<()> {
        let body = ResetPasswordRequest {
            ott: ott.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(self.url("api/password")?)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;
        ensure_success(response, "Password reset").await?;
        Ok(())
    }

    async fn rsvp(&self, showtime_id: &ShowtimeId, value: RsvpValue) -> AppResult<()> {
        let response = self
            .client
            .get(self.url("callback/rsvp")?)
            .timeout(self.timeout)
            .query(&[("showtimeId", showtime_id.as_str()), ("value", value.as_str())])
            .send()
            .await?;
        ensure_success(response, "RSVP").await?;
        log::info!("RSVP: {value}");
        Ok(())
    }
}
