//! Keyword trend detection over the index.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::memory::index::semantic_index::SemanticIndex;

/// Keywords below this index-wide count never trend.
pub const MIN_TREND_TOTAL: usize = 3;
/// Maximum number of trending keywords returned.
pub const MAX_TRENDING: usize = 20;

/// A keyword whose usage rose inside the trailing window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendingKeyword {
    /// Normalized keyword.
    pub keyword: String,
    /// `recent / max(total - recent, 1)`.
    pub trend: f64,
    /// Entries containing the keyword.
    pub total_count: usize,
    /// Entries containing the keyword inside the window.
    pub recent_count: usize,
}

impl SemanticIndex {
    /// Keywords trending over the trailing `window`.
    #[must_use]
    pub fn trending_keywords(&self, window: Duration) -> Vec<TrendingKeyword> {
        self.trending_keywords_at(window, Utc::now())
    }

    /// Keywords trending over the `window` ending at `now`.
    ///
    /// Sorted by trend, then total count, then keyword.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn trending_keywords_at(
        &self,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Vec<TrendingKeyword> {
        let since = now - window;
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();

        for entry in self.entries.values() {
            let recent = entry.timestamp >= since && entry.timestamp <= now;
            for keyword in &entry.keywords {
                let (total, recent_count) = counts.entry(keyword.as_str()).or_default();
                *total += 1;
                if recent {
                    *recent_count += 1;
                }
            }
        }

        let mut trending: Vec<TrendingKeyword> = counts
            .into_iter()
            .filter(|(_, (total, _))| *total >= MIN_TREND_TOTAL)
            .map(|(keyword, (total, recent))| TrendingKeyword {
                keyword: keyword.to_string(),
                trend: recent as f64 / total.saturating_sub(recent).max(1) as f64,
                total_count: total,
                recent_count: recent,
            })
            .collect();

        trending.sort_by(|a, b| {
            b.trend
                .total_cmp(&a.trend)
                .then_with(|| b.total_count.cmp(&a.total_count))
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        trending.truncate(MAX_TRENDING);
        trending
    }
}
