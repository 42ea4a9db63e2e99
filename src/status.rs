//! Due and learned classification for a single item.
//!
//! Day boundaries are local calendar days, not rolling 24 hour windows.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::ReviewItem;

/// Items due within this many calendar days count as "due soon".
pub const DUE_SOON_DAYS: i64 = 3;

/// Success rate below which an item is still being learned.
pub const LEARNING_THRESHOLD: f64 = 0.6;

/// Success rate from which an item is labelled mastered.
pub const MASTERED_THRESHOLD: f64 = 0.8;

/// Stricter success rate behind the `is_mastered` flag.
pub const STRICT_MASTERY_RATE: f64 = 0.9;

/// Reviews required before the `is_mastered` flag can be set.
pub const STRICT_MASTERY_REVIEWS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueState {
    Overdue,
    DueToday,
    DueSoon,
    NotDue,
}

impl DueState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::DueToday => "due-today",
            Self::DueSoon => "due-soon",
            Self::NotDue => "not-due",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DueStatus {
    pub state: DueState,
    /// Calendar days from today to the due day. Negative when the due day has passed.
    pub days_until_due: i64,
}

impl DueStatus {
    pub fn is_overdue(&self) -> bool {
        self.state == DueState::Overdue
    }

    /// Falls on today's calendar day. Independent of `is_overdue`: an item
    /// due earlier today is both.
    pub fn is_due_today(&self) -> bool {
        self.days_until_due == 0
    }

    pub fn is_due_soon(&self) -> bool {
        self.days_until_due > 0 && self.days_until_due <= DUE_SOON_DAYS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LearnedState {
    New,
    Learning,
    Learned,
    Mastered,
}

impl LearnedState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Learned => "learned",
            Self::Mastered => "mastered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LearnedStatus {
    pub state: LearnedState,
    pub success_rate: f64,
    pub is_learned: bool,
    /// Stricter than `state == Mastered`: needs a 90% rate over at least five reviews.
    pub is_mastered: bool,
}

/// Signed calendar-day distance from `now` to `next_review`.
pub fn days_until_due(next_review: DateTime<Local>, now: DateTime<Local>) -> i64 {
    (next_review.date_naive() - now.date_naive()).num_days()
}

pub fn due_status(item: &ReviewItem, now: DateTime<Local>) -> DueStatus {
    let days = days_until_due(item.next_review, now);

    let state = if item.next_review < now {
        DueState::Overdue
    } else if days == 0 {
        DueState::DueToday
    } else if days > 0 && days <= DUE_SOON_DAYS {
        DueState::DueSoon
    } else {
        DueState::NotDue
    };

    DueStatus {
        state,
        days_until_due: days,
    }
}

pub fn learned_status(item: &ReviewItem) -> LearnedStatus {
    let success_rate = item.success_rate();

    let state = if item.review_count == 0 {
        LearnedState::New
    } else if success_rate < LEARNING_THRESHOLD {
        LearnedState::Learning
    } else if success_rate < MASTERED_THRESHOLD {
        LearnedState::Learned
    } else {
        LearnedState::Mastered
    };

    LearnedStatus {
        state,
        success_rate,
        is_learned: success_rate >= MASTERED_THRESHOLD,
        is_mastered: success_rate >= STRICT_MASTERY_RATE
            && item.review_count >= STRICT_MASTERY_REVIEWS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn due_at(next_review: DateTime<Local>) -> ReviewItem {
        let mut item = ReviewItem::with_id("i".into(), "f".into(), "b".into(), at(1, 12));
        item.next_review = next_review;
        item
    }

    fn reviewed(review_count: u32, success_count: u32) -> ReviewItem {
        let mut item = due_at(at(1, 12));
        item.review_count = review_count;
        item.success_count = success_count;
        item
    }

    #[test]
    fn earlier_today_is_overdue() {
        let status = due_status(&due_at(at(12, 8)), at(12, 12));
        assert_eq!(status.state, DueState::Overdue);
        assert_eq!(status.days_until_due, 0);
        assert!(status.is_overdue());
        assert!(status.is_due_today());
        assert!(!status.is_due_soon());
    }

    #[test]
    fn later_today_is_due_today() {
        let status = due_status(&due_at(at(12, 20)), at(12, 12));
        assert_eq!(status.state, DueState::DueToday);
        assert_eq!(status.days_until_due, 0);
        assert!(status.is_due_today());
        assert!(!status.is_overdue());
    }

    #[test]
    fn exactly_now_is_due_today() {
        let status = due_status(&due_at(at(12, 12)), at(12, 12));
        assert_eq!(status.state, DueState::DueToday);
    }

    #[test]
    fn past_days_are_negative() {
        let status = due_status(&due_at(at(9, 23)), at(12, 1));
        assert_eq!(status.state, DueState::Overdue);
        assert_eq!(status.days_until_due, -3);
    }

    #[test]
    fn calendar_days_not_rolling_windows() {
        // Five hours away but across midnight.
        let status = due_status(&due_at(at(13, 2)), at(12, 21));
        assert_eq!(status.days_until_due, 1);
        assert_eq!(status.state, DueState::DueSoon);
    }

    #[test]
    fn due_soon_window_is_three_days() {
        assert_eq!(due_status(&due_at(at(15, 9)), at(12, 12)).state, DueState::DueSoon);
        assert_eq!(due_status(&due_at(at(16, 9)), at(12, 12)).state, DueState::NotDue);
        assert_eq!(due_status(&due_at(at(16, 9)), at(12, 12)).days_until_due, 4);
    }

    #[test]
    fn classification_is_deterministic() {
        let item = due_at(at(12, 12) + Duration::days(2));
        assert_eq!(due_status(&item, at(12, 12)), due_status(&item, at(12, 12)));
        assert_eq!(learned_status(&item), learned_status(&item));
    }

    #[test]
    fn never_reviewed_is_new() {
        let status = learned_status(&reviewed(0, 0));
        assert_eq!(status.state, LearnedState::New);
        assert_eq!(status.success_rate, 0.0);
        assert!(!status.is_learned);
        assert!(!status.is_mastered);
    }

    #[test]
    fn learned_thresholds() {
        assert_eq!(learned_status(&reviewed(10, 5)).state, LearnedState::Learning);
        assert_eq!(learned_status(&reviewed(10, 6)).state, LearnedState::Learned);
        assert_eq!(learned_status(&reviewed(10, 7)).state, LearnedState::Learned);
        assert_eq!(learned_status(&reviewed(10, 8)).state, LearnedState::Mastered);
        assert_eq!(learned_status(&reviewed(1, 1)).state, LearnedState::Mastered);
    }

    #[test]
    fn mastered_label_differs_from_strict_flag() {
        // 100% but too few reviews.
        let few = learned_status(&reviewed(3, 3));
        assert_eq!(few.state, LearnedState::Mastered);
        assert!(few.is_learned);
        assert!(!few.is_mastered);

        // Enough reviews but only 80%.
        let eighty = learned_status(&reviewed(10, 8));
        assert_eq!(eighty.state, LearnedState::Mastered);
        assert!(!eighty.is_mastered);

        let strict = learned_status(&reviewed(10, 9));
        assert!(strict.is_mastered);
    }

    #[test]
    fn exactly_one_learned_state_holds() {
        for reviews in 0..12u32 {
            for successes in 0..=reviews {
                let state = learned_status(&reviewed(reviews, successes)).state;
                let hits = [
                    LearnedState::New,
                    LearnedState::Learning,
                    LearnedState::Learned,
                    LearnedState::Mastered,
                ]
                .iter()
                .filter(|s| **s == state)
                .count();
                assert_eq!(hits, 1);
                assert_eq!(state == LearnedState::New, reviews == 0);
            }
        }
    }
}
