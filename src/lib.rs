//! SM-2 spaced repetition engine.
//!
//! Decides when each review item is next due, classifies items by due and
//! learned status, and aggregates those classifications over a deck.

pub mod clock;
pub mod config;
pub mod models;
pub mod session;
pub mod sm2;
pub mod stats;
pub mod status;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use models::{Deck, ResponseQuality, ReviewItem, ReviewLog};
pub use session::{SessionSelector, StudyMode, StudySession};
pub use sm2::Scheduler;
pub use stats::CollectionStats;
pub use status::{DueState, DueStatus, LearnedState, LearnedStatus};
pub use storage::{DeckStore, JsonDeckStore};
