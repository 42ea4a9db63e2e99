//! Study session selection and progress tracking.

use std::collections::HashSet;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::{Deck, ResponseQuality, ReviewItem, ReviewLog};
use crate::sm2::Scheduler;

/// Default cap on new items introduced per session.
pub const DEFAULT_NEW_CARDS_PER_DAY: usize = 20;

/// What a study session draws from the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyMode {
    /// Everything whose review time has arrived.
    Review,
    /// Never-reviewed items, up to the daily cap.
    New,
    /// The whole deck.
    All,
    /// Items with at least one failed answer on record.
    Mistakes,
    /// Items whose category or tags match.
    Category(String),
    /// Due reviewed items first, then new items up to the daily cap.
    Daily,
}

impl StudyMode {
    pub fn name(&self) -> &str {
        match self {
            Self::Review => "review",
            Self::New => "new",
            Self::All => "all",
            Self::Mistakes => "mistakes",
            Self::Category(_) => "category",
            Self::Daily => "daily",
        }
    }
}

/// Source of "has this item ever been failed".
pub trait FailureHistory {
    fn has_failed(&self, item_id: &str) -> bool;
}

impl FailureHistory for HashSet<&str> {
    fn has_failed(&self, item_id: &str) -> bool {
        self.contains(item_id)
    }
}

impl FailureHistory for [ReviewLog] {
    fn has_failed(&self, item_id: &str) -> bool {
        self.iter().any(|log| log.item_id == item_id && log.is_failure())
    }
}

/// Picks the working set for a session. Never modifies items.
#[derive(Debug, Clone, Copy)]
pub struct SessionSelector {
    pub new_cards_per_day: usize,
}

impl Default for SessionSelector {
    fn default() -> Self {
        Self {
            new_cards_per_day: DEFAULT_NEW_CARDS_PER_DAY,
        }
    }
}

impl SessionSelector {
    pub fn new(new_cards_per_day: usize) -> Self {
        Self { new_cards_per_day }
    }

    /// Select from a deck, using its own review history for `Mistakes`.
    pub fn select_deck<'a>(
        &self,
        deck: &'a Deck,
        mode: &StudyMode,
        now: DateTime<Local>,
    ) -> Vec<&'a ReviewItem> {
        self.select(&deck.items, mode, now, deck.history.as_slice())
    }

    /// Select in collection order.
    pub fn select<'a, H>(
        &self,
        items: &'a [ReviewItem],
        mode: &StudyMode,
        now: DateTime<Local>,
        failures: &H,
    ) -> Vec<&'a ReviewItem>
    where
        H: FailureHistory + ?Sized,
    {
        match mode {
            StudyMode::Review => items.iter().filter(|i| i.is_due(now)).collect(),
            StudyMode::New => self.new_items(items),
            StudyMode::All => items.iter().collect(),
            StudyMode::Mistakes => items.iter().filter(|i| failures.has_failed(&i.id)).collect(),
            StudyMode::Category(category) => {
                self.select_matching(items, |i| i.in_category(category))
            }
            StudyMode::Daily => {
                let mut queue: Vec<&ReviewItem> = items
                    .iter()
                    .filter(|i| !i.is_new() && i.is_due(now))
                    .collect();
                queue.extend(self.new_items(items));
                queue
            }
        }
    }

    /// Select with an arbitrary caller predicate.
    pub fn select_matching<'a, P>(&self, items: &'a [ReviewItem], predicate: P) -> Vec<&'a ReviewItem>
    where
        P: Fn(&ReviewItem) -> bool,
    {
        items.iter().filter(|i| predicate(*i)).collect()
    }

    fn new_items<'a>(&self, items: &'a [ReviewItem]) -> Vec<&'a ReviewItem> {
        items
            .iter()
            .filter(|i| i.is_new())
            .take(self.new_cards_per_day)
            .collect()
    }
}

/// Running tally for a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct SessionStats {
    pub correct: usize,
    pub total: usize,
    /// Percentage of passing answers, 0 before the first answer.
    pub accuracy: f64,
}

/// What a finished session amounts to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub mode: String,
    pub studied: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub minutes: i64,
}

/// An in-progress pass over a selected queue.
#[derive(Debug, Clone)]
pub struct StudySession {
    pub mode: StudyMode,
    queue: Vec<String>,
    position: usize,
    pub started_at: DateTime<Local>,
    pub results: Vec<ReviewLog>,
}

impl StudySession {
    pub fn start(
        deck: &Deck,
        selector: &SessionSelector,
        mode: StudyMode,
        now: DateTime<Local>,
    ) -> Self {
        let queue: Vec<String> = selector
            .select_deck(deck, &mode, now)
            .into_iter()
            .map(|item| item.id.clone())
            .collect();

        tracing::info!(deck = %deck.id, mode = mode.name(), items = queue.len(), "Starting study session");

        Self {
            mode,
            queue,
            position: 0,
            started_at: now,
            results: Vec::new(),
        }
    }

    pub fn current_id(&self) -> Option<&str> {
        self.queue.get(self.position).map(String::as_str)
    }

    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.position)
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    pub fn skip(&mut self) {
        if !self.is_complete() {
            self.position += 1;
        }
    }

    /// Answer the current item and move on.
    ///
    /// Returns the rescheduled item, or `None` once the queue is exhausted
    /// or the item has left the deck.
    pub fn answer(
        &mut self,
        deck: &mut Deck,
        scheduler: &Scheduler,
        quality: ResponseQuality,
        now: DateTime<Local>,
    ) -> Option<ReviewItem> {
        let id = self.current_id()?.to_string();
        self.position += 1;

        let updated = deck.apply_review(scheduler, &id, quality, now)?.clone();
        self.results.push(ReviewLog {
            item_id: id,
            quality,
            reviewed_at: now,
        });
        Some(updated)
    }

    pub fn stats(&self) -> SessionStats {
        let total = self.results.len();
        let correct = self.results.iter().filter(|r| r.quality.is_pass()).count();
        let accuracy = if total > 0 {
            correct as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        SessionStats {
            correct,
            total,
            accuracy,
        }
    }

    pub fn finish(self, now: DateTime<Local>) -> SessionSummary {
        let stats = self.stats();
        let minutes = ((now - self.started_at).num_seconds().max(0) + 30) / 60;

        tracing::info!(
            mode = self.mode.name(),
            studied = stats.total,
            accuracy = stats.accuracy,
            minutes,
            "Finished study session"
        );

        SessionSummary {
            mode: self.mode.name().to_string(),
            studied: stats.total,
            correct: stats.correct,
            accuracy: stats.accuracy,
            minutes,
        }
    }
}
