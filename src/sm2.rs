//! SM-2 scheduling.
//!
//! Only an `Easy` answer grows the interval. `Again`, `Hard` and `Good` all
//! lapse it back to one day, while the ease factor is recomputed for every
//! answer.

use chrono::{DateTime, Days, Duration, Local};

use crate::models::{ResponseQuality, ReviewItem, MIN_EASE_FACTOR};

/// Ordinal quality at or above which the interval grows.
pub const GROWTH_THRESHOLD: u8 = 3;

/// Longest interval the scheduler will hand out, about a hundred years.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// The four scheduling fields produced by one review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sm2Outcome {
    pub ease_factor: f64,
    pub interval: u32,
    pub repetition: u32,
    pub next_review: DateTime<Local>,
}

/// Stateless SM-2 scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }

    /// Compute the next scheduling state without touching `item`.
    pub fn schedule(
        &self,
        item: &ReviewItem,
        quality: ResponseQuality,
        now: DateTime<Local>,
    ) -> Sm2Outcome {
        let q = quality.ordinal();

        let (interval, repetition) = if q >= GROWTH_THRESHOLD {
            let interval = match item.repetition {
                0 => 1,
                1 => 6,
                _ => (f64::from(item.interval) * item.ease_factor).round() as u32,
            };
            let interval = interval.min(MAX_INTERVAL_DAYS);
            (interval, item.repetition + 1)
        } else {
            (1, 0)
        };

        Sm2Outcome {
            ease_factor: next_ease_factor(item.ease_factor, q),
            interval,
            repetition,
            next_review: add_days(now, interval),
        }
    }

    /// Schedule `item` and apply the review bookkeeping.
    ///
    /// `review_count` always increments; `success_count` only when the
    /// answer passes by [`ResponseQuality::is_pass`].
    pub fn review(
        &self,
        item: &ReviewItem,
        quality: ResponseQuality,
        now: DateTime<Local>,
    ) -> ReviewItem {
        debug_assert!(item.success_count <= item.review_count);
        let outcome = self.schedule(item, quality, now);
        ReviewItem {
            ease_factor: outcome.ease_factor,
            interval: outcome.interval,
            repetition: outcome.repetition,
            next_review: outcome.next_review,
            last_reviewed: Some(now),
            review_count: item.review_count.saturating_add(1),
            success_count: if quality.is_pass() {
                item.success_count.saturating_add(1)
            } else {
                item.success_count
            },
            ..item.clone()
        }
    }

    /// Interval in days each answer would produce, in `ResponseQuality::ALL` order.
    pub fn preview_intervals(&self, item: &ReviewItem) -> [(ResponseQuality, u32); 4] {
        let now = item.next_review;
        ResponseQuality::ALL.map(|quality| (quality, self.schedule(item, quality, now).interval))
    }
}

/// `EF' = max(1.3, EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)))`
pub fn next_ease_factor(ease_factor: f64, q: u8) -> f64 {
    let d = 5.0 - f64::from(q);
    (ease_factor + (0.1 - d * (0.08 + d * 0.02))).max(MIN_EASE_FACTOR)
}

/// Calendar-day addition in local time, so a review at 09:00 is due at 09:00.
///
/// Past the end of chrono's date range the item stays due at `now`.
fn add_days(now: DateTime<Local>, days: u32) -> DateTime<Local> {
    now.checked_add_days(Days::new(u64::from(days)))
        .or_else(|| now.checked_add_signed(Duration::days(i64::from(days))))
        .unwrap_or(now)
}

/// Short human label for an interval.
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=29 => format!("{}d", days),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{:.1}y", f64::from(days) / 365.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap()
    }

    fn item(ease_factor: f64, interval: u32, repetition: u32) -> ReviewItem {
        let mut item = ReviewItem::with_id("c1".into(), "front".into(), "back".into(), noon());
        item.ease_factor = ease_factor;
        item.interval = interval;
        item.repetition = repetition;
        item
    }

    #[test]
    fn easy_grows_interval_by_ease() {
        let out = Scheduler::new().schedule(&item(2.0, 10, 2), ResponseQuality::Easy, noon());
        assert_eq!(out.interval, 20);
        assert_eq!(out.repetition, 3);
    }

    #[test]
    fn first_two_repetitions_are_fixed() {
        let scheduler = Scheduler::new();
        for ease in [1.3, 2.5, 3.7] {
            let first = scheduler.review(&item(ease, 0, 0), ResponseQuality::Easy, noon());
            assert_eq!(first.interval, 1);
            assert_eq!(first.repetition, 1);

            let second = scheduler.review(&first, ResponseQuality::Easy, noon());
            assert_eq!(second.interval, 6);
            assert_eq!(second.repetition, 2);
        }
    }

    #[test]
    fn lapse_resets_regardless_of_state() {
        let scheduler = Scheduler::new();
        for quality in [ResponseQuality::Again, ResponseQuality::Hard, ResponseQuality::Good] {
            for (ease, interval, rep) in [(2.5, 0, 0), (2.1, 6, 2), (1.3, 120, 9)] {
                let out = scheduler.schedule(&item(ease, interval, rep), quality, noon());
                assert_eq!(out.repetition, 0, "{:?}", quality);
                assert_eq!(out.interval, 1, "{:?}", quality);
            }
        }
    }

    #[test]
    fn good_answer_on_fresh_item_lapses() {
        let mut fresh = item(2.5, 0, 0);
        fresh.review_count = 3;
        fresh.success_count = 3;

        let out = Scheduler::new().review(&fresh, ResponseQuality::Good, noon());
        assert_eq!(out.repetition, 0);
        assert_eq!(out.interval, 1);
        assert!((out.ease_factor - 2.18).abs() < 1e-9);
        // Still a success for learned-status purposes.
        assert_eq!(out.review_count, 4);
        assert_eq!(out.success_count, 4);
    }

    #[test]
    fn ease_never_drops_below_floor() {
        let scheduler = Scheduler::new();
        let mut current = item(2.5, 10, 5);
        for _ in 0..20 {
            current = scheduler.review(&current, ResponseQuality::Again, noon());
            assert!(current.ease_factor >= MIN_EASE_FACTOR);
        }
        assert!((current.ease_factor - MIN_EASE_FACTOR).abs() < 1e-9);

        for quality in ResponseQuality::ALL {
            let out = scheduler.schedule(&item(1.0, 3, 3), quality, noon());
            assert!(out.ease_factor >= MIN_EASE_FACTOR);
        }
    }

    #[test]
    fn ease_deltas_per_quality() {
        assert!((next_ease_factor(2.5, 3) - 2.36).abs() < 1e-9);
        assert!((next_ease_factor(2.5, 2) - 2.18).abs() < 1e-9);
        assert!((next_ease_factor(2.5, 1) - 1.96).abs() < 1e-9);
        assert!((next_ease_factor(2.5, 0) - 1.7).abs() < 1e-9);
    }

    #[test]
    fn interval_rounds_half_away_from_zero() {
        // 5 * 2.5 = 12.5 -> 13
        let out = Scheduler::new().schedule(&item(2.5, 5, 2), ResponseQuality::Easy, noon());
        assert_eq!(out.interval, 13);
    }

    #[test]
    fn next_review_is_now_plus_interval_days() {
        let out = Scheduler::new().schedule(&item(2.0, 10, 2), ResponseQuality::Easy, noon());
        assert_eq!(out.next_review, Local.with_ymd_and_hms(2024, 7, 2, 12, 0, 0).unwrap());
    }

    #[test]
    fn schedule_is_pure() {
        let scheduler = Scheduler::new();
        let input = item(2.2, 8, 4);
        let before = input.clone();
        let a = scheduler.schedule(&input, ResponseQuality::Easy, noon());
        let b = scheduler.schedule(&input, ResponseQuality::Easy, noon());
        assert_eq!(a, b);
        assert_eq!(input, before);
    }

    #[test]
    fn review_counts_every_answer() {
        let scheduler = Scheduler::new();
        let mut current = item(2.5, 0, 0);
        for quality in [
            ResponseQuality::Again,
            ResponseQuality::Hard,
            ResponseQuality::Good,
            ResponseQuality::Easy,
        ] {
            current = scheduler.review(&current, quality, noon());
        }
        assert_eq!(current.review_count, 4);
        assert_eq!(current.success_count, 2);
        assert_eq!(current.last_reviewed, Some(noon()));
        assert!(current.success_count <= current.review_count);
    }

    #[test]
    fn preview_only_easy_grows() {
        let preview = Scheduler::new().preview_intervals(&item(2.5, 6, 2));
        assert_eq!(preview[0], (ResponseQuality::Again, 1));
        assert_eq!(preview[1], (ResponseQuality::Hard, 1));
        assert_eq!(preview[2], (ResponseQuality::Good, 1));
        assert_eq!(preview[3], (ResponseQuality::Easy, 15));
    }

    #[test]
    fn long_easy_streak_stays_within_cap() {
        let scheduler = Scheduler::new();
        let mut current = item(2.5, 0, 0);
        for _ in 0..200 {
            current = scheduler.review(&current, ResponseQuality::Easy, noon());
            assert!(current.interval <= MAX_INTERVAL_DAYS);
        }
        assert_eq!(current.interval, MAX_INTERVAL_DAYS);
        assert_eq!(current.repetition, 200);
        assert_eq!(
            current.next_review,
            noon().checked_add_days(Days::new(u64::from(MAX_INTERVAL_DAYS))).unwrap()
        );
    }

    #[test]
    fn interval_at_cap_does_not_exceed_it() {
        let out = Scheduler::new().schedule(&item(2.5, MAX_INTERVAL_DAYS, 9), ResponseQuality::Easy, noon());
        assert_eq!(out.interval, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn interval_labels() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(6), "6d");
        assert_eq!(format_interval(45), "1mo");
        assert_eq!(format_interval(730), "2.0y");
    }
}
