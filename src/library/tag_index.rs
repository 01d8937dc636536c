//! Multiset operations on the tag index.

use std::collections::HashMap;

use crate::models::{SlideRecord, TagSuggestion};

/// Append every tag, keeping duplicates.
pub fn append_tags(index: &mut Vec<String>, tags: &[String]) {
    index.extend(tags.iter().cloned());
}

/// Remove one matching entry per tag, preserving the order of what remains.
///
/// Tags without a remaining match are ignored.
pub fn subtract_tags(index: &mut Vec<String>, tags: &[String]) {
    for tag in tags {
        if let Some(position) = index.iter().position(|entry| entry == tag) {
            index.remove(position);
        }
    }
}

/// Swap a slide's contribution to the index from `old` to `new`.
pub fn replace_tags(index: &mut Vec<String>, old: &[String], new: &[String]) {
    subtract_tags(index, old);
    append_tags(index, new);
}

/// The index implied by a slide list: every slide's tags in list order.
pub fn rebuild_index(slides: &[SlideRecord]) -> Vec<String> {
    slides
        .iter()
        .flat_map(|slide| slide.tags.iter().cloned())
        .collect()
}

/// Multiset difference `left - right`.
pub fn difference(left: &[String], right: &[String]) -> Vec<String> {
    let mut remaining = left.to_vec();
    subtract_tags(&mut remaining, right);
    remaining
}

/// Distinct tags ordered by use count, then name.
pub fn suggestions(index: &[String]) -> Vec<TagSuggestion> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in index {
        *counts.entry(tag.as_str()).or_default() += 1;
    }

    let mut suggestions: Vec<TagSuggestion> = counts
        .into_iter()
        .map(|(name, count)| TagSuggestion {
            name: name.to_string(),
            count,
        })
        .collect();
    suggestions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_subtract_removes_one_occurrence_each() {
        let mut index = strings(&["a", "b", "a", "c"]);
        subtract_tags(&mut index, &strings(&["a", "c"]));
        assert_eq!(index, strings(&["b", "a"]));
    }

    #[test]
    fn test_subtract_ignores_unmatched() {
        let mut index = strings(&["a"]);
        subtract_tags(&mut index, &strings(&["z", "a", "a"]));
        assert!(index.is_empty());
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let mut index = strings(&["finance"]);
        append_tags(&mut index, &strings(&["finance", "q1"]));
        assert_eq!(index, strings(&["finance", "finance", "q1"]));
    }

    #[test]
    fn test_replace_tags() {
        let mut index = strings(&["x", "old", "y", "old"]);
        replace_tags(&mut index, &strings(&["old"]), &strings(&["new"]));
        assert_eq!(index, strings(&["x", "y", "old", "new"]));
    }

    #[test]
    fn test_difference() {
        let left = strings(&["a", "a", "b"]);
        let right = strings(&["a", "c"]);
        assert_eq!(difference(&left, &right), strings(&["a", "b"]));
        assert_eq!(difference(&right, &left), strings(&["c"]));
    }

    #[test]
    fn test_suggestions_order() {
        let index = strings(&["q1", "finance", "q1", "alpha", "finance", "q1"]);
        let names: Vec<(String, usize)> = suggestions(&index)
            .into_iter()
            .map(|s| (s.name, s.count))
            .collect();
        assert_eq!(
            names,
            vec![
                ("q1".to_string(), 3),
                ("finance".to_string(), 2),
                ("alpha".to_string(), 1)
            ]
        );
    }
}
