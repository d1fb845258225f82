use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

use crate::models::{
    CollectionItem, FilterCriteria, FormatChoice, QuizAnswers, Recommendation, ReleaseData,
    ReleaseFormat, ScoredItem,
};

/// Items within this many points of the top score are all eligible for the
/// final pick.
pub const CLOSE_MATCH_MARGIN: u32 = 5;

const GENRE_POINTS: u32 = 30;
const DECADE_POINTS: u32 = 25;
const MOOD_TEMPO_POINTS: u32 = 25;
const FORMAT_POINTS: u32 = 10;
const RATING_POINTS: u32 = 10;
const RECENT_POINTS: u32 = 10;
const FAIRLY_RECENT_POINTS: u32 = 5;

/// Map quiz answers onto filter criteria. Pure and deterministic; an
/// unrecognized mood or tempo degrades to an empty keyword set rather than
/// failing, and an "any" decade means no year constraint.
pub fn to_filter_criteria(answers: &QuizAnswers) -> FilterCriteria {
    FilterCriteria {
        year_range: decade_range(&answers.decade),
        mood_keywords: mood_keywords(&answers.mood),
        tempo_keywords: tempo_keywords(&answers.tempo),
        format: answers.format,
        genres: answers.genres.clone(),
    }
}

fn decade_range(decade: &str) -> Option<(i32, i32)> {
    let token = decade.trim().trim_end_matches(|c| c == 's' || c == 'S');
    let start: i32 = token.parse().ok().filter(|y| (1000..=9999).contains(y))?;
    Some((start, start + 9))
}

fn mood_keywords(mood: &str) -> Vec<String> {
    let words: &[&str] = match mood.trim().to_lowercase().as_str() {
        "chill" => &["ambient", "downtempo", "lounge", "jazz", "soul"],
        "energetic" => &["dance", "funk", "disco", "electro", "house"],
        "aggressive" => &["metal", "hardcore", "punk", "industrial", "noise"],
        "melancholic" => &["blues", "folk", "ballad", "acoustic", "slow"],
        "upbeat" => &["pop", "disco", "soul", "funk", "ska"],
        _ => &[],
    };
    words.iter().map(|w| w.to_string()).collect()
}

fn tempo_keywords(tempo: &str) -> Vec<String> {
    let words: &[&str] = match tempo.trim().to_lowercase().as_str() {
        "slow" => &["ballad", "ambient", "downtempo", "doom"],
        "medium" => &["rock", "pop", "soul", "groove"],
        "fast" => &["fast", "dance", "punk", "thrash", "techno", "hardcore"],
        _ => &[],
    };
    words.iter().map(|w| w.to_string()).collect()
}

fn format_matches(item: &CollectionItem, choice: FormatChoice) -> bool {
    match choice {
        FormatChoice::Both => true,
        FormatChoice::Single => item.basic_information.format_class() == ReleaseFormat::Single,
        // An ambiguous format counts as an album.
        FormatChoice::Album => matches!(
            item.basic_information.format_class(),
            ReleaseFormat::Album | ReleaseFormat::Ambiguous
        ),
    }
}

fn genre_matches(item: &CollectionItem, genres: &[String]) -> bool {
    if genres.is_empty() {
        return true;
    }
    let haystack = genre_text(item);
    genres
        .iter()
        .any(|g| haystack.contains(&g.to_lowercase()))
}

fn decade_matches(item: &CollectionItem, range: Option<(i32, i32)>) -> bool {
    match range {
        Some((min, max)) => (min..=max).contains(&item.basic_information.year),
        None => true,
    }
}

fn mood_tempo_matches(item: &CollectionItem, criteria: &FilterCriteria) -> bool {
    if criteria.mood_keywords.is_empty() && criteria.tempo_keywords.is_empty() {
        return true;
    }
    let haystack = mood_text(item);
    criteria
        .mood_keywords
        .iter()
        .chain(criteria.tempo_keywords.iter())
        .any(|kw| haystack.contains(kw.as_str()))
}

fn genre_text(item: &CollectionItem) -> String {
    let info = &item.basic_information;
    let mut text = info.genres.join(" ");
    text.push(' ');
    text.push_str(&info.styles.join(" "));
    text.to_lowercase()
}

fn mood_text(item: &CollectionItem) -> String {
    let mut text = genre_text(item);
    text.push(' ');
    text.push_str(&item.basic_information.title.to_lowercase());
    text
}

/// Strict filter pass: the format constraint is a hard gate, and any one of
/// the qualitative predicates keeps the item. Deliberately permissive, since
/// precision comes from scoring.
pub fn filter_collection(items: &[CollectionItem], criteria: &FilterCriteria) -> Vec<CollectionItem> {
    items
        .iter()
        .filter(|item| {
            format_matches(item, criteria.format)
                && (genre_matches(item, &criteria.genres)
                    || decade_matches(item, criteria.year_range)
                    || mood_tempo_matches(item, criteria))
        })
        .cloned()
        .collect()
}

/// Relax constraints when the strict pass found nothing: drop the format
/// gate, then the decade, then the genres, cumulatively, stopping at the
/// first relaxation that yields candidates. Empty after all three means a
/// genuine no-match, which is a valid outcome.
pub fn broaden_filters(items: &[CollectionItem], criteria: &FilterCriteria) -> Vec<CollectionItem> {
    let mut relaxed = criteria.clone();

    relaxed.format = FormatChoice::Both;
    let after_format = filter_collection(items, &relaxed);
    if !after_format.is_empty() {
        debug!("broadened by dropping the format constraint");
        return after_format;
    }

    relaxed.year_range = None;
    let after_decade = filter_collection(items, &relaxed);
    if !after_decade.is_empty() {
        debug!("broadened by dropping the decade constraint");
        return after_decade;
    }

    relaxed.genres.clear();
    let after_genre = filter_collection(items, &relaxed);
    if !after_genre.is_empty() {
        debug!("broadened by dropping the genre constraint");
    }
    after_genre
}

/// Additive match score with one reason per satisfied predicate, in a fixed
/// order. The components are not clamped: 100 is nominal, and a rated,
/// recently added record matching everything lands above it.
pub fn score(item: &CollectionItem, criteria: &FilterCriteria) -> (u32, Vec<String>) {
    let mut points = 0;
    let mut reasons = Vec::new();

    if genre_matches(item, &criteria.genres) {
        points += GENRE_POINTS;
        reasons.push("Matches the genres you picked".to_string());
    }
    // "any" contributes neither bonus nor penalty.
    if criteria.year_range.is_some() && decade_matches(item, criteria.year_range) {
        points += DECADE_POINTS;
        reasons.push("Released in your chosen decade".to_string());
    }
    if mood_tempo_matches(item, criteria) {
        points += MOOD_TEMPO_POINTS;
        reasons.push("Fits the mood and tempo you're after".to_string());
    }
    if format_matches(item, criteria.format) {
        points += FORMAT_POINTS;
        reasons.push("The right format for tonight".to_string());
    }
    if item.rating > 0 {
        points += RATING_POINTS;
        reasons.push("A record you've rated yourself".to_string());
    }
    match item.days_since_added() {
        Some(days) if days < 30 => {
            points += RECENT_POINTS;
            reasons.push("Added to your collection in the last month".to_string());
        }
        Some(days) if days < 90 => {
            points += FAIRLY_RECENT_POINTS;
            reasons.push("A recent addition to your collection".to_string());
        }
        _ => {}
    }

    (points, reasons)
}

/// Score every item and sort by score, then user rating, then date added,
/// all descending. The sort is stable, so remaining ties keep iteration
/// order.
pub fn rank(items: &[CollectionItem], criteria: &FilterCriteria) -> Vec<ScoredItem> {
    let mut scored: Vec<ScoredItem> = items
        .iter()
        .map(|item| {
            let (score, reasons) = score(item, criteria);
            ScoredItem {
                item: item.clone(),
                score,
                reasons,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.item.rating.cmp(&a.item.rating))
            .then(b.item.date_added.cmp(&a.item.date_added))
    });
    scored
}

/// Pick tonight's record. Every item is scored; a top score of zero means no
/// recommendation. All items within `CLOSE_MATCH_MARGIN` of the top are
/// eligible and one is chosen uniformly through the injected `rng`. If no
/// extended metadata was fetched for the winner, a minimal projection of its
/// embedded information stands in.
pub fn recommend<R: Rng>(
    items: &[CollectionItem],
    answers: &QuizAnswers,
    release_data: &HashMap<u64, ReleaseData>,
    rng: &mut R,
) -> Option<Recommendation> {
    let criteria = to_filter_criteria(answers);
    let mut scored = rank(items, &criteria);

    let top_score = scored.first()?.score;
    if top_score == 0 {
        debug!("top score is zero, no recommendation");
        return None;
    }

    let close = scored
        .iter()
        .take_while(|s| top_score - s.score <= CLOSE_MATCH_MARGIN)
        .count();
    let pick = if close > 1 { rng.gen_range(0..close) } else { 0 };
    let chosen = scored.swap_remove(pick);

    let release = release_data
        .get(&chosen.item.basic_information.id)
        .cloned()
        .unwrap_or_else(|| ReleaseData::from_basic(&chosen.item));

    debug!(
        "recommending {} (score {}, {} close matches)",
        chosen.item.basic_information.title, chosen.score, close
    );

    Some(Recommendation {
        item: chosen.item,
        release,
        score: chosen.score,
        reasons: chosen.reasons,
    })
}
