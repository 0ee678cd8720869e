use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => "EXTERNAL_API_ERROR",
            AppError::ConfigError(_) | AppError::TomlError(_) => "CONFIG_ERROR",
            AppError::SerdeJsonError(_) => "MALFORMED_DATA",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// `<context> [<code>]: <message>`, the line [`report`](Self::report) logs.
    fn describe(&self, context: &str) -> String {
        let detail = match self {
            AppError::ValidationError(msg) => format!("validation error: {msg}"),
            AppError::AuthError(msg) => format!("authentication error: {msg}"),
            AppError::NotFound(msg) => format!("not found: {msg}"),
            AppError::ExternalApiError(msg) => format!("external API error: {msg}"),
            AppError::ReqwestError(err) => format!("request failed: {err}"),
            _ => self.to_string(),
        };
        format!("{context} [{}]: {detail}", self.code())
    }

    /// Logs the error where it stops propagating. Failures are terminal at the
    /// boundary that observed them, so this is the last thing that sees them.
    pub fn report(&self, context: &str) {
        match self {
            AppError::ValidationError(_) | AppError::AuthError(_) | AppError::NotFound(_) => {
                log::warn!("{}", self.describe(context))
            }
            _ => log::error!("{}", self.describe(context)),
        }
    }
}
