//! Display projection of the vote model. Nothing here is ever read back.

use crate::services::ShowtimeItem;
use chrono::Local;
use std::fmt;

/// Totals at or above this open the RSVP choices on a card.
pub const RSVP_THRESHOLD: i64 = 1000;

const IMDB_TITLE_URL: &str = "http://www.imdb.com/title/";
const THEATRE_SITE_URL: &str = "http://www.megaplextheatres.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLink {
    pub label: &'static str,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowtimeCard {
    pub id: String,
    pub title: String,
    pub location: String,
    pub screen: String,
    pub starts_at: String,
    pub total_votes: i64,
    pub thumb_down: bool,
    pub stars: u8,
    pub poster_path: String,
    pub preview_path: String,
    pub links: Vec<MenuLink>,
    pub rsvp_open: bool,
}

impl ShowtimeCard {
    pub fn from_item(item: &ShowtimeItem) -> Self {
        let mut links = Vec::new();
        if !item.movie.imdb_id.is_empty() {
            links.push(MenuLink {
                label: "IMDB",
                href: format!("{IMDB_TITLE_URL}{}", item.movie.imdb_id),
            });
        }
        if !item.preview_seats_link.is_empty() {
            links.push(MenuLink {
                label: "Seating",
                href: format!("{THEATRE_SITE_URL}{}", item.preview_seats_link),
            });
        }
        if !item.buy_tickets_link.is_empty() {
            links.push(MenuLink {
                label: "Purchase",
                href: format!("{THEATRE_SITE_URL}{}", item.buy_tickets_link),
            });
        }

        Self {
            id: item.id.to_string(),
            title: item.movie.title.clone(),
            location: item.location.clone(),
            screen: item.screen.clone(),
            starts_at: item
                .showtime
                .map(|t| t.with_timezone(&Local).format("%a %H:%M").to_string())
                .unwrap_or_default(),
            total_votes: item.total_votes,
            thumb_down: item.my_vote.is_down(),
            stars: item.my_vote.star_count(),
            poster_path: format!("api/movies/{}", item.movie.id),
            preview_path: format!("api/preview?showtimeid={}", item.id),
            links,
            rsvp_open: item.total_votes >= RSVP_THRESHOLD,
        }
    }
}

impl fmt::Display for ShowtimeCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stars: String = (1..=3)
            .map(|n| if n <= self.stars { '*' } else { '.' })
            .collect();
        write!(
            f,
            "[{stars}]{} {:>5}  {} | {} {} {} (id {})",
            if self.thumb_down { " down" } else { "     " },
            self.total_votes,
            self.title,
            self.location,
            self.screen,
            self.starts_at,
            self.id
        )
    }
}

/// Header line: who is browsing and what is left to spend.
pub fn remaining_badge(user_name: Option<&str>, remaining: i32) -> String {
    match user_name {
        Some(name) => format!("{name}: {remaining} votes remaining"),
        None => "Login to get started".to_string(),
    }
}
