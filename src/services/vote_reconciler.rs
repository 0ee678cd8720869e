use crate::models::{Movie, Showtime, ShowtimeId, Vote, VoteEntry, VoteTotal};
use chrono::{DateTime, Utc};

/// In-memory state of one showtime for the current user.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowtimeItem {
    pub id: ShowtimeId,
    pub my_vote: Vote,
    pub total_votes: i64,
    pub showtime: Option<DateTime<Utc>>,
    pub movie: Movie,
    pub location: String,
    pub screen: String,
    pub preview_seats_link: String,
    pub buy_tickets_link: String,
}

impl From<Showtime> for ShowtimeItem {
    fn from(s: Showtime) -> Self {
        Self {
            id: s.id,
            my_vote: Vote::clamped(s.vote),
            total_votes: s.votes.max(0),
            showtime: s.showtime,
            movie: s.movie,
            location: s.location,
            screen: s.screen,
            preview_seats_link: s.preview_seats_link,
            buy_tickets_link: s.buy_tickets_link,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownShowtime,
    AllowanceExceeded,
}

/// Result of an accepted vote. `submission` is the absolute vote set to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteChange {
    pub id: ShowtimeId,
    pub previous: Vote,
    pub current: Vote,
    pub total_votes: i64,
    pub remaining: i32,
    pub submission: Vec<VoteEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    Accepted(VoteChange),
    Rejected(RejectReason),
}

impl VoteOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VoteOutcome::Accepted(_))
    }
}

/// Per-showtime votes plus the user's remaining allowance.
///
/// Items are always kept in display order: ascending by the user's vote,
/// then by showtime, then by id.
#[derive(Debug, Clone)]
pub struct VoteReconciler {
    allowance: i32,
    remaining: i32,
    items: Vec<ShowtimeItem>,
}

impl VoteReconciler {
    pub fn new(allowance: u32) -> Self {
        let allowance = allowance.min(i32::MAX as u32) as i32;
        Self {
            allowance,
            remaining: allowance,
            items: Vec::new(),
        }
    }

    /// Replaces every item from a full fetch and recomputes the remaining budget.
    pub fn load(&mut self, showtimes: Vec<Showtime>) {
        self.items = showtimes.into_iter().map(ShowtimeItem::from).collect();
        let spent: i32 = self
            .items
            .iter()
            .map(|item| item.my_vote.value().max(0))
            .sum();
        self.remaining = self.allowance - spent;
        if self.remaining < 0 {
            log::warn!(
                "Server reports {spent} vote points spent, more than the allowance of {}",
                self.allowance
            );
        }
        self.reorder();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.remaining = self.allowance;
    }

    pub fn allowance(&self) -> i32 {
        self.allowance
    }

    pub fn remaining(&self) -> i32 {
        self.remaining
    }

    pub fn items(&self) -> &[ShowtimeItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ShowtimeId) -> Option<&ShowtimeItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Applies the user's vote on `id`.
    ///
    /// An upvote that would overdraw the allowance is a silent no-op, as is a
    /// vote on an unknown showtime. A downvote on an already downvoted item
    /// clears it instead.
    pub fn apply_vote(&mut self, id: &ShowtimeId, requested: Vote) -> VoteOutcome {
        let Some(index) = self.items.iter().position(|item| &item.id == id) else {
            log::debug!("Ignoring vote on unknown showtime {id}");
            return VoteOutcome::Rejected(RejectReason::UnknownShowtime);
        };

        let current = self.items[index].my_vote;
        let (cur, req) = (current.value(), requested.value());

        if req > 0 && self.remaining + cur - req < 0 {
            log::debug!(
                "Ignoring vote {req} on {id}: {} remaining, {cur} already placed",
                self.remaining
            );
            return VoteOutcome::Rejected(RejectReason::AllowanceExceeded);
        }

        let effective = if requested.is_down() && current.is_down() {
            Vote::NEUTRAL
        } else {
            requested
        };
        let eff = effective.value();

        self.remaining = if eff > 0 && cur >= 0 {
            self.remaining + cur - eff
        } else if cur >= 0 {
            self.remaining + cur
        } else {
            self.remaining - eff
        };

        let item = &mut self.items[index];
        item.total_votes = (item.total_votes - cur as i64 + eff as i64).max(0);
        item.my_vote = effective;
        let total_votes = item.total_votes;

        self.reorder();

        VoteOutcome::Accepted(VoteChange {
            id: id.clone(),
            previous: current,
            current: effective,
            total_votes,
            remaining: self.remaining,
            submission: self.submission(),
        })
    }

    /// Overwrites aggregate totals pushed by the server. The user's own votes
    /// and remaining budget are never touched here. Returns how many known
    /// showtimes were updated.
    pub fn apply_server_update(&mut self, updates: &[VoteTotal]) -> usize {
        let mut applied = 0;
        for update in updates {
            match self.items.iter_mut().find(|item| item.id == update.id) {
                Some(item) => {
                    item.total_votes = update.votes.max(0);
                    applied += 1;
                }
                None => log::debug!("Pushed total for unknown showtime {}", update.id),
            }
        }
        self.reorder();
        applied
    }

    pub fn reorder(&mut self) {
        self.items.sort_by(|a, b| {
            a.my_vote
                .cmp(&b.my_vote)
                .then_with(|| a.showtime.cmp(&b.showtime))
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    /// Every nonzero vote, in display order.
    pub fn submission(&self) -> Vec<VoteEntry> {
        self.items
            .iter()
            .filter(|item| !item.my_vote.is_neutral())
            .map(|item| VoteEntry {
                id: item.id.clone(),
                vote: item.my_vote,
            })
            .collect()
    }
}
