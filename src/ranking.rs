use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedImage {
    pub name: String,
    /// Description as returned by the model; this is what was scored.
    pub description: String,
    /// Description shown to the user, translated when translation is on.
    pub display_description: String,
    pub relevance: f32,
}

fn by_relevance_desc(a: &RankedImage, b: &RankedImage) -> Ordering {
    match (a.relevance.is_nan(), b.relevance.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.relevance.partial_cmp(&a.relevance).unwrap_or(Ordering::Equal),
    }
}

/// Most relevant first. Ties keep their input order and NaN scores go last.
#[must_use]
pub fn rank(mut items: Vec<RankedImage>) -> Vec<RankedImage> {
    items.sort_by(by_relevance_desc);
    items
}

#[must_use]
pub fn top(items: Vec<RankedImage>, n: usize) -> Vec<RankedImage> {
    let mut ranked = rank(items);
    ranked.truncate(n);
    ranked
}
