use serde::Serialize;

use super::collection::CollectionItem;
use super::quiz::FormatChoice;
use super::release::ReleaseData;

/// Filter constraints derived from quiz answers. Computed once per request,
/// never persisted.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    /// Inclusive year range, or `None` when the decade answer was "any".
    pub year_range: Option<(i32, i32)>,
    pub mood_keywords: Vec<String>,
    pub tempo_keywords: Vec<String>,
    pub format: FormatChoice,
    pub genres: Vec<String>,
}

/// One collection item with its computed match score and the reasons each
/// scoring predicate contributed.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredItem {
    pub item: CollectionItem,
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Final engine output. `score` is nominally 0-100 but the additive
/// components are not clamped, so rare edge cases can exceed 100. `reasons`
/// is non-empty whenever the score is positive, one entry per satisfied
/// predicate, and `release.id` always equals the item's embedded release id.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub item: CollectionItem,
    pub release: ReleaseData,
    pub score: u32,
    pub reasons: Vec<String>,
}
