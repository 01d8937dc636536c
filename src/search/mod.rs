//! Slide list filters.
//!
//! Pure projections over an already loaded list; nothing here touches the drive.

use crate::models::SlideRecord;

/// Slides whose title contains `query`, ignoring case.
///
/// A blank query matches every slide. Otherwise the query is matched as
/// typed, surrounding spaces included.
pub fn filter_by_title<'a, I>(slides: I, query: &str) -> Vec<&'a SlideRecord>
where
    I: IntoIterator<Item = &'a SlideRecord>,
{
    if query.trim().is_empty() {
        return slides.into_iter().collect();
    }
    let needle = query.to_lowercase();
    slides
        .into_iter()
        .filter(|slide| slide.title.to_lowercase().contains(&needle))
        .collect()
}

/// Slides carrying at least one of `query_tags`.
///
/// An empty tag query matches every slide.
pub fn filter_by_tags<'a, I>(slides: I, query_tags: &[String]) -> Vec<&'a SlideRecord>
where
    I: IntoIterator<Item = &'a SlideRecord>,
{
    let wanted: Vec<&str> = query_tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if wanted.is_empty() {
        return slides.into_iter().collect();
    }
    slides
        .into_iter()
        .filter(|slide| slide.tags.iter().any(|tag| wanted.contains(&tag.as_str())))
        .collect()
}
