use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// Loose shape check; the server is the authority on whether the address exists.
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Please fill in the email and try again".to_string(),
        ));
    }
    if !email_regex().is_match(email.trim()) {
        return Err(AppError::ValidationError(format!(
            "Invalid email address: {email}"
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::ValidationError("Password must not be empty".to_string()));
    }
    Ok(())
}

/// Text notifications go through the carrier's email gateway, which wants
/// the bare 10-digit US number.
pub fn normalize_sms_phone(phone: &str) -> AppResult<String> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        0 => Ok(String::new()),
        10 => Ok(digits),
        11 if digits.starts_with('1') => Ok(digits[1..].to_string()),
        _ => Err(AppError::ValidationError(format!(
            "Phone number must be a 10-digit US number, got {phone}"
        ))),
    }
}
