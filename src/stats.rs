//! Deck-wide statistics and due forecasts.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Days, Local, NaiveDate};
use serde::Serialize;

use crate::models::ReviewItem;
use crate::status::{due_status, learned_status, LearnedState};

/// Upper bound of the "due this week" window, in calendar days from today.
pub const WEEK_DAYS: i64 = 7;

/// Default horizon for [`forecast`].
pub const DEFAULT_FORECAST_DAYS: u32 = 30;

/// Statistics for a collection of items.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CollectionStats {
    pub total: usize,

    // Learned status, sums to `total`
    pub new: usize,
    pub learning: usize,
    pub learned: usize,
    pub mastered: usize,

    // Due status
    pub overdue: usize,
    pub due_today: usize,
    pub due_soon: usize,
    pub due_this_week: usize,

    /// Mean success rate over reviewed items only.
    pub average_success_rate: f64,
}

impl CollectionStats {
    pub fn compute<'a, I>(items: I, now: DateTime<Local>) -> Self
    where
        I: IntoIterator<Item = &'a ReviewItem>,
    {
        let mut stats = Self::default();
        let mut rate_sum = 0.0;
        let mut reviewed = 0usize;

        for item in items {
            stats.total += 1;

            let learned = learned_status(item);
            match learned.state {
                LearnedState::New => stats.new += 1,
                LearnedState::Learning => stats.learning += 1,
                LearnedState::Learned => stats.learned += 1,
                LearnedState::Mastered => stats.mastered += 1,
            }

            // Flags, not the label: an item due earlier today is both overdue and due today.
            let due = due_status(item, now);
            if due.is_overdue() {
                stats.overdue += 1;
            }
            if due.is_due_today() {
                stats.due_today += 1;
            }
            if due.is_due_soon() {
                stats.due_soon += 1;
            }
            if (0..=WEEK_DAYS).contains(&due.days_until_due) {
                stats.due_this_week += 1;
            }

            if item.review_count > 0 {
                rate_sum += learned.success_rate;
                reviewed += 1;
            }
        }

        if reviewed > 0 {
            stats.average_success_rate = rate_sum / reviewed as f64;
        }

        stats
    }
}

/// Items waiting right now, split by whether they were ever reviewed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DueCounts {
    pub new: usize,
    pub review: usize,
    pub total: usize,
}

pub fn due_counts<'a, I>(items: I, now: DateTime<Local>) -> DueCounts
where
    I: IntoIterator<Item = &'a ReviewItem>,
{
    let mut counts = DueCounts::default();
    for item in items {
        if item.is_new() {
            counts.new += 1;
        } else if item.is_due(now) {
            counts.review += 1;
        }
    }
    counts.total = counts.new + counts.review;
    counts
}

/// Total successes over total reviews, as a percentage.
pub fn retention_rate<'a, I>(items: I) -> f64
where
    I: IntoIterator<Item = &'a ReviewItem>,
{
    let (successes, reviews) = items
        .into_iter()
        .filter(|item| item.review_count > 0)
        .fold((0u64, 0u64), |(s, r), item| {
            (s + u64::from(item.success_count), r + u64::from(item.review_count))
        });

    if reviews == 0 {
        0.0
    } else {
        successes as f64 / reviews as f64 * 100.0
    }
}

/// Number of items falling due on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub count: usize,
}

impl ForecastDay {
    pub fn intensity(&self) -> WorkloadIntensity {
        WorkloadIntensity::from_count(self.count)
    }
}

/// Per-day due counts for `days` calendar days starting today.
///
/// Items whose due day is before today are not counted.
pub fn forecast<'a, I>(items: I, now: DateTime<Local>, days: u32) -> Vec<ForecastDay>
where
    I: IntoIterator<Item = &'a ReviewItem>,
{
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for item in items {
        *per_day.entry(item.next_review.date_naive()).or_default() += 1;
    }

    let today = now.date_naive();
    (0..days)
        .filter_map(|offset| today.checked_add_days(Days::new(u64::from(offset))))
        .map(|date| ForecastDay {
            date,
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Review load over the next three weeks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeeklyWorkload {
    pub this_week: usize,
    pub next_week: usize,
    pub following: usize,
}

impl WeeklyWorkload {
    pub fn from_forecast(days: &[ForecastDay]) -> Self {
        let week = |n: usize| -> usize {
            days.iter().skip(n * 7).take(7).map(|d| d.count).sum()
        };
        Self {
            this_week: week(0),
            next_week: week(1),
            following: week(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum WorkloadIntensity {
    None,
    Light,
    Moderate,
    Heavy,
    Intense,
}

impl WorkloadIntensity {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Self::None,
            1..=5 => Self::Light,
            6..=15 => Self::Moderate,
            16..=25 => Self::Heavy,
            _ => Self::Intense,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Light => "Light",
            Self::Moderate => "Moderate",
            Self::Heavy => "Heavy",
            Self::Intense => "Intense",
        }
    }
}

/// Items bucketed by the calendar day they fall due.
pub fn group_by_due_date<'a, I>(items: I) -> BTreeMap<NaiveDate, Vec<&'a ReviewItem>>
where
    I: IntoIterator<Item = &'a ReviewItem>,
{
    let mut grouped: BTreeMap<NaiveDate, Vec<&ReviewItem>> = BTreeMap::new();
    for item in items {
        grouped.entry(item.next_review.date_naive()).or_default().push(item);
    }
    grouped
}

/// Consecutive study days ending today.
pub fn study_streak<I>(study_dates: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut days: Vec<NaiveDate> = study_dates.into_iter().collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut streak = 0;
    let mut expected = Some(today);
    for day in days.into_iter().skip_while(|d| *d > today) {
        if Some(day) != expected {
            break;
        }
        streak += 1;
        expected = day.pred_opt();
    }
    streak
}
