//! Data models for review items and decks.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sm2::Scheduler;

/// Initial ease factor for a fresh item.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Lowest ease factor the scheduler will ever produce.
pub const MIN_EASE_FACTOR: f64 = 1.3;

fn short_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

/// How well an item was recalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseQuality {
    Again = 0, // Complete blackout
    Hard = 1,  // Serious difficulty
    Good = 2,  // Some hesitation
    Easy = 3,  // Perfect recall
}

impl ResponseQuality {
    pub const ALL: [ResponseQuality; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

    /// Ordinal quality fed into the SM-2 formulas.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Whether this answer counts towards `success_count`.
    ///
    /// This is looser than the scheduler's growth threshold: `Good` counts
    /// as a success here but still lapses the interval.
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Good | Self::Easy)
    }

    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Again),
            '2' => Some(Self::Hard),
            '3' => Some(Self::Good),
            '4' => Some(Self::Easy),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Again => "Again",
            Self::Hard => "Hard",
            Self::Good => "Good",
            Self::Easy => "Easy",
        }
    }
}

impl fmt::Display for ResponseQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResponseQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(quality) = s.chars().next().filter(|_| s.len() == 1).and_then(Self::from_key) {
            return Ok(quality);
        }
        match s.to_lowercase().as_str() {
            "again" => Ok(Self::Again),
            "hard" => Ok(Self::Hard),
            "good" => Ok(Self::Good),
            "easy" => Ok(Self::Easy),
            other => Err(format!(
                "unknown response quality '{}' (expected again, hard, good, easy or 1-4)",
                other
            )),
        }
    }
}

/// A single schedulable flashcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: String,
    pub front: String,
    pub back: String,

    // SM-2 fields
    pub ease_factor: f64,
    pub interval: u32,
    pub repetition: u32,
    pub next_review: DateTime<Local>,

    // Tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Local>>,
    pub review_count: u32,
    pub success_count: u32,

    // Metadata
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Local>,
}

impl ReviewItem {
    /// A fresh item, due immediately.
    pub fn new(front: String, back: String, now: DateTime<Local>) -> Self {
        Self::with_id(short_id(), front, back, now)
    }

    pub fn with_id(id: String, front: String, back: String, now: DateTime<Local>) -> Self {
        Self {
            id,
            front,
            back,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 0,
            repetition: 0,
            next_review: now,
            last_reviewed: None,
            review_count: 0,
            success_count: 0,
            category: String::new(),
            tags: Vec::new(),
            created_at: now,
        }
    }

    pub fn is_new(&self) -> bool {
        self.review_count == 0
    }

    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        self.next_review <= now
    }

    /// `success_count / review_count`, or 0 for an item never reviewed.
    pub fn success_rate(&self) -> f64 {
        if self.review_count == 0 {
            0.0
        } else {
            f64::from(self.success_count) / f64::from(self.review_count)
        }
    }

    /// Case-insensitive match against the category or any tag.
    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
            || self.tags.iter().any(|t| t.eq_ignore_ascii_case(category))
    }
}

/// One answered review, kept in the deck history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub item_id: String,
    pub quality: ResponseQuality,
    pub reviewed_at: DateTime<Local>,
}

impl ReviewLog {
    pub fn is_failure(&self) -> bool {
        !self.quality.is_pass()
    }
}

/// An owned collection of review items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub items: Vec<ReviewItem>,
    pub created_at: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_studied: Option<DateTime<Local>>,
    #[serde(default)]
    pub history: Vec<ReviewLog>,
}

impl Deck {
    pub fn new(name: String, now: DateTime<Local>) -> Self {
        Self {
            id: short_id(),
            name,
            description: String::new(),
            items: Vec::new(),
            created_at: now,
            last_studied: None,
            history: Vec::new(),
        }
    }

    pub fn add_item(&mut self, front: String, back: String, now: DateTime<Local>) -> &ReviewItem {
        let mut item = ReviewItem::new(front, back, now);
        while self.get(&item.id).is_some() {
            item.id = short_id();
        }
        let idx = self.items.len();
        self.items.push(item);
        &self.items[idx]
    }

    /// Insert an externally built item. Refuses duplicate ids.
    pub fn insert(&mut self, item: ReviewItem) -> bool {
        if self.get(&item.id).is_some() {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn get(&self, id: &str) -> Option<&ReviewItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Answer one item: replace it with the scheduled state and log the review.
    ///
    /// Returns `None` when the deck has no item with this id.
    pub fn apply_review(
        &mut self,
        scheduler: &Scheduler,
        id: &str,
        quality: ResponseQuality,
        now: DateTime<Local>,
    ) -> Option<&ReviewItem> {
        let idx = self.position(id)?;
        let updated = scheduler.review(&self.items[idx], quality, now);

        tracing::debug!(
            deck = %self.id,
            item = %id,
            %quality,
            interval = updated.interval,
            ease = updated.ease_factor,
            "Applied review"
        );

        self.items[idx] = updated;
        self.history.push(ReviewLog {
            item_id: id.to_string(),
            quality,
            reviewed_at: now,
        });
        self.last_studied = Some(now);
        Some(&self.items[idx])
    }

    /// Ids of items with at least one failed answer in the history.
    pub fn failed_item_ids(&self) -> HashSet<&str> {
        self.history
            .iter()
            .filter(|log| log.is_failure())
            .map(|log| log.item_id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
