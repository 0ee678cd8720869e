use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned showtime identifier. The API has sent both JSON strings and
/// numbers for it, so either is accepted and kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ShowtimeId(String);

impl ShowtimeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShowtimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShowtimeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ShowtimeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for ShowtimeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => ShowtimeId(s),
            RawId::Signed(n) => ShowtimeId(n.to_string()),
            RawId::Unsigned(n) => ShowtimeId(n.to_string()),
        })
    }
}

/// One user's vote on one showtime: `-1` thumbs down, `0` no opinion,
/// `1..=3` stars. Construction is the only place the range is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Vote(i8);

impl Vote {
    pub const MIN: i32 = -1;
    pub const MAX: i32 = 3;

    pub const DOWN: Vote = Vote(-1);
    pub const NEUTRAL: Vote = Vote(0);

    pub fn new(value: i32) -> AppResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Vote(value as i8))
        } else {
            Err(AppError::ValidationError(format!(
                "Vote must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Pins server-supplied values into range instead of rejecting the whole list.
    pub fn clamped(value: i64) -> Self {
        Vote(value.clamp(Self::MIN as i64, Self::MAX as i64) as i8)
    }

    pub fn value(self) -> i32 {
        self.0 as i32
    }

    pub fn is_down(self) -> bool {
        self.0 < 0
    }

    pub fn is_neutral(self) -> bool {
        self.0 == 0
    }

    /// Number of lit stars; zero for neutral and downvotes.
    pub fn star_count(self) -> u8 {
        self.0.max(0) as u8
    }
}

impl TryFrom<i32> for Vote {
    type Error = AppError;

    fn try_from(value: i32) -> AppResult<Self> {
        Vote::new(value)
    }
}

impl From<Vote> for i32 {
    fn from(vote: Vote) -> i32 {
        vote.value()
    }
}

impl FromStr for Vote {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim() {
            "down" | "thumbs-down" => Ok(Vote::DOWN),
            "clear" | "none" => Ok(Vote::NEUTRAL),
            other => {
                let n: i32 = other
                    .parse()
                    .map_err(|_| AppError::ValidationError(format!("Invalid vote: {other}")))?;
                Vote::new(n)
            }
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub id: i64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
}

/// A showtime as listed by `GET api/showtimes`. `vote` is the current user's
/// vote (always 0 for anonymous sessions); `votes` is the aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Showtime {
    pub id: ShowtimeId,
    pub vote: i64,
    pub votes: i64,
    pub movie: Movie,
    pub location: String,
    pub showtime: Option<DateTime<Utc>>,
    pub screen: String,
    pub preview_seats_link: String,
    pub buy_tickets_link: String,
}

/// One element of the vote-set payload posted to `api/showtimes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEntry {
    pub id: ShowtimeId,
    pub vote: Vote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_range() {
        for n in -1..=3 {
            assert_eq!(Vote::new(n).unwrap().value(), n);
        }
        assert!(Vote::new(-2).is_err());
        assert!(Vote::new(4).is_err());
        assert_eq!(Vote::new(2).unwrap().star_count(), 2);
        assert_eq!(Vote::DOWN.star_count(), 0);
    }

    #[test]
    fn test_vote_clamped() {
        assert_eq!(Vote::clamped(-7), Vote::DOWN);
        assert_eq!(Vote::clamped(12).value(), 3);
        assert_eq!(Vote::clamped(2).value(), 2);
    }

    #[test]
    fn test_vote_from_str() {
        assert_eq!("down".parse::<Vote>().unwrap(), Vote::DOWN);
        assert_eq!("clear".parse::<Vote>().unwrap(), Vote::NEUTRAL);
        assert_eq!(" 3 ".parse::<Vote>().unwrap().value(), 3);
        assert!("5".parse::<Vote>().is_err());
        assert!("lots".parse::<Vote>().is_err());
    }

    #[test]
    fn test_vote_entry_rejects_out_of_range() {
        assert!(serde_json::from_str::<VoteEntry>(r#"{"id":"a","vote":9}"#).is_err());
        let entry: VoteEntry = serde_json::from_str(r#"{"id":7,"vote":-1}"#).unwrap();
        assert_eq!(entry.id.as_str(), "7");
        assert_eq!(entry.vote, Vote::DOWN);
    }

    #[test]
    fn test_showtime_decodes_with_missing_fields() {
        let json = r#"[
            {"id":"st-1","vote":2,"votes":14,
             "movie":{"id":3,"Title":"Alien","imdbID":"tt0078748"},
             "location":"Jordan Commons","showtime":"2017-05-05T19:30:00-06:00",
             "screen":"Screen 4","previewSeatsLink":"/seats/1","buyTicketsLink":"/buy/1"},
            {"id":42}
        ]"#;
        let list: Vec<Showtime> = serde_json::from_str(json).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].movie.title, "Alien");
        assert_eq!(list[0].preview_seats_link, "/seats/1");
        assert!(list[0].showtime.is_some());
        assert_eq!(list[1].id, ShowtimeId::new("42"));
        assert_eq!(list[1].votes, 0);
        assert!(list[1].showtime.is_none());
    }

    #[test]
    fn test_vote_entry_serializes_flat() {
        let entry = VoteEntry {
            id: "st-9".into(),
            vote: Vote::new(3).unwrap(),
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"id":"st-9","vote":3}"#
        );
    }
}
