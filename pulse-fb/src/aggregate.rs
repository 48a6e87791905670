//! Aggregation engine
//!
//! Pure computations over loaded feedback records. No I/O here: callers
//! load records from the store and hand them in, and results are
//! recomputed per request.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::FeedbackRecord;

/// Ratings at or above this count as positive
const POSITIVE_THRESHOLD: u8 = 4;

/// Ratings at or below this count as negative
const NEGATIVE_THRESHOLD: u8 = 2;

/// Summary statistics over a set of feedback records
///
/// Every statistic is fully defined for empty input: no NaN, no panic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateView {
    /// Number of records aggregated; 0 flags an empty input
    pub count: usize,
    /// Arithmetic mean rating; exactly 0.0 when count is 0
    pub mean_rating: f64,
    /// Fraction of ratings >= 4, in [0, 1]; 0.0 when count is 0
    pub positive_rate: f64,
    /// Number of ratings <= 2
    pub negative_count: u64,
    /// Submissions per star; always exactly the keys 1..=5, zero-filled
    pub rating_histogram: BTreeMap<u8, u64>,
    /// Submissions per UTC calendar day of `created_at`; only days with
    /// at least one submission appear, in ascending date order
    pub daily_series: BTreeMap<NaiveDate, u64>,
}

/// Listing sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most recent first (default)
    #[default]
    Newest,
    /// Oldest first
    Oldest,
    /// Highest rating first
    HighestRating,
    /// Lowest rating first
    LowestRating,
}

/// Compute summary statistics over the given records
pub fn summarize(records: &[FeedbackRecord]) -> AggregateView {
    let count = records.len();
    let mut rating_histogram: BTreeMap<u8, u64> = (1..=5).map(|star| (star, 0)).collect();
    let mut daily_series: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut rating_sum: u64 = 0;
    let mut positive: u64 = 0;
    let mut negative_count: u64 = 0;

    for record in records {
        rating_sum += record.rating as u64;
        if record.rating >= POSITIVE_THRESHOLD {
            positive += 1;
        }
        if record.rating <= NEGATIVE_THRESHOLD {
            negative_count += 1;
        }
        // Ratings are validated upstream; only the fixed 1..=5 keys exist
        if let Some(slot) = rating_histogram.get_mut(&record.rating) {
            *slot += 1;
        }
        *daily_series
            .entry(record.created_at.date_naive())
            .or_insert(0) += 1;
    }

    let (mean_rating, positive_rate) = if count == 0 {
        (0.0, 0.0)
    } else {
        (
            rating_sum as f64 / count as f64,
            positive as f64 / count as f64,
        )
    };

    AggregateView {
        count,
        mean_rating,
        positive_rate,
        negative_count,
        rating_histogram,
        daily_series,
    }
}

/// Filter records by included ratings, then order them
///
/// An empty `ratings_included` set keeps nothing. All four sort orders
/// break ties by id ascending, so equal keys yield a deterministic
/// listing.
pub fn filter_and_sort(
    records: Vec<FeedbackRecord>,
    ratings_included: &BTreeSet<u8>,
    sort: SortKey,
) -> Vec<FeedbackRecord> {
    let mut filtered: Vec<FeedbackRecord> = records
        .into_iter()
        .filter(|record| ratings_included.contains(&record.rating))
        .collect();

    filtered.sort_by(|a, b| {
        let ordering = match sort {
            SortKey::Newest => b.created_at.cmp(&a.created_at),
            SortKey::Oldest => a.created_at.cmp(&b.created_at),
            SortKey::HighestRating => b.rating.cmp(&a.rating),
            SortKey::LowestRating => a.rating.cmp(&b.rating),
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    });

    filtered
}

/// The full rating set 1..=5 (the keep-everything filter)
pub fn all_ratings() -> BTreeSet<u8> {
    (1..=5).collect()
}

/// Count records per category
///
/// Records without the optional category field are omitted.
pub fn category_breakdown(records: &[FeedbackRecord]) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        if let Some(category) = &record.category {
            *counts.entry(category.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Count distinct submitter emails
///
/// Records without the optional email field are omitted, so anonymous
/// submissions never inflate the count.
pub fn unique_users(records: &[FeedbackRecord]) -> usize {
    records
        .iter()
        .filter_map(|record| record.email.as_deref())
        .collect::<BTreeSet<_>>()
        .len()
}
