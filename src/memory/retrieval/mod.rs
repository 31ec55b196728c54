//! Search, ranking and trend analysis over the semantic index.

pub mod context;
pub mod ranking;
pub mod search;
pub mod trending;

pub use context::best_sentence;
pub use ranking::{ScoreBreakdown, jaccard, precision, recency_score, score_entry};
pub use search::{RECENT_SCOPE_DAYS, SearchOptions, SearchResult, SearchScope, TimeRange};
pub use trending::{MAX_TRENDING, MIN_TREND_TOTAL, TrendingKeyword};
