use crate::error::AppError;
use crate::models::{ShowtimeId, User};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aggregate total for one showtime, as pushed after another user votes.
/// The server sends whole showtime objects here; only `id` and `votes` matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteTotal {
    pub id: ShowtimeId,
    #[serde(default)]
    pub votes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityEvent {
    pub user: Option<User>,
    pub votes: Vec<VoteTotal>,
}

impl ActivityEvent {
    pub fn actor_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("Someone")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsvpEvent {
    pub user: Option<User>,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpValue {
    Yes,
    Maybe,
    No,
}

impl RsvpValue {
    pub fn as_str(self) -> &'static str {
        match self {
            RsvpValue::Yes => "yes",
            RsvpValue::Maybe => "maybe",
            RsvpValue::No => "no",
        }
    }
}

impl fmt::Display for RsvpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RsvpValue {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(RsvpValue::Yes),
            "maybe" => Ok(RsvpValue::Maybe),
            "no" => Ok(RsvpValue::No),
            other => Err(AppError::ValidationError(format!(
                "RSVP must be yes, maybe or no, got {other}"
            ))),
        }
    }
}

/// A decoded message from the live-update stream.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Activity(ActivityEvent),
    Rsvp(RsvpEvent),
    Keepalive,
    Other { event: String, data: String },
}

impl LiveEvent {
    pub fn name(&self) -> &str {
        match self {
            LiveEvent::Activity(_) => "activity",
            LiveEvent::Rsvp(_) => "rsvp",
            LiveEvent::Keepalive => "keepalive",
            LiveEvent::Other { event, .. } => event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_payload_ignores_extra_showtime_fields() {
        let event: ActivityEvent = serde_json::from_str(
            r#"{"user":{"id":2,"name":"Jo"},
                "votes":[{"id":"st-1","votes":42,"vote":3,"screen":"4"},{"id":8}]}"#,
        )
        .unwrap();
        assert_eq!(event.actor_name(), "Jo");
        assert_eq!(event.votes.len(), 2);
        assert_eq!(event.votes[0].votes, 42);
        assert_eq!(event.votes[1].id.as_str(), "8");
        assert_eq!(event.votes[1].votes, 0);
    }

    #[test]
    fn test_actor_name_fallback() {
        assert_eq!(ActivityEvent::default().actor_name(), "Someone");
    }

    #[test]
    fn test_rsvp_value() {
        assert_eq!("Maybe".parse::<RsvpValue>().unwrap(), RsvpValue::Maybe);
        assert!("later".parse::<RsvpValue>().is_err());
        assert_eq!(RsvpValue::No.to_string(), "no");
    }
}
