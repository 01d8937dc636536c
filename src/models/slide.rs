//! Slide record model matching the entries of `slides.json`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One saved slide.
///
/// Field names are snake_case on the wire; `slides.json` written by older
/// add-in builds uses `base64` for the blob and a key/value object for `tags`,
/// both of which are accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    pub saved_at: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(alias = "base64")]
    pub slide: String,
}

/// Root of `slides.json`. Newest records come first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideListDocument {
    #[serde(default)]
    pub slides: Vec<SlideRecord>,
}

impl SlideListDocument {
    pub fn find(&self, id: &str) -> Option<&SlideRecord> {
        self.slides.iter().find(|slide| slide.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.slides.iter().position(|slide| slide.id == id)
    }
}

/// What the host returns for the current selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedSlide {
    /// Base64 export of the slide
    pub slide: String,
    /// Base64 raster thumbnail
    pub thumbnail: String,
}

/// Request body for saving the current selection.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSlideRequest {
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub exported: ExportedSlide,
}

/// Request body for editing the mutable fields of a slide.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSlideRequest {
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
}

/// Formatting mode the host applies when inserting a saved slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertFormatting {
    KeepSourceFormatting,
}

/// Everything the host needs to insert a saved slide after the selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideInsertion {
    pub source_id: String,
    pub slide: String,
    pub formatting: InsertFormatting,
}

/// Accepts the current string-array form as well as the legacy key/value object.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| tags_from_value(&v)).unwrap_or_default())
}

/// Convert a stored `tags` value into the canonical list of strings.
pub fn tags_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(tag_text).collect(),
        Value::Object(map) => map.values().filter_map(tag_text).collect(),
        Value::String(s) => parse_tag_input(s),
        _ => Vec::new(),
    }
}

fn tag_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim(),
        Value::Object(map) => map.get("value")?.as_str()?.trim(),
        _ => return None,
    };
    (!text.is_empty()).then(|| text.to_string())
}

/// Parse what the tag widget submits.
///
/// The widget posts either a JSON array of `{"value": ".."}` objects or a
/// plain comma-separated list.
pub fn parse_tag_input(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return tags_from_value(&value);
        }
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_wire_format() {
        let record = SlideRecord {
            id: "a1".to_string(),
            title: "Q1 Review".to_string(),
            tags: vec!["finance".to_string(), "q1".to_string()],
            saved_at: "2025-02-10T12:00:00Z".to_string(),
            thumbnail: "iVBOR".to_string(),
            slide: "UEsDB".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "a1",
                "title": "Q1 Review",
                "tags": ["finance", "q1"],
                "saved_at": "2025-02-10T12:00:00Z",
                "thumbnail": "iVBOR",
                "slide": "UEsDB"
            })
        );
    }

    #[test]
    fn test_legacy_record_is_converted() {
        let doc: SlideListDocument = serde_json::from_value(json!({
            "slides": [{
                "id": "1",
                "base64": "SGVsbG8gd29ybGQ=",
                "thumbnail": "iVBORw0KGgo",
                "saved_at": "2025-02-10T12:00:00Z",
                "text_content": "This is the first slide content.",
                "tags": {
                    "project": "Marketing Campaign",
                    "topic": "Social Media Strategy"
                }
            }]
        }))
        .unwrap();

        let slide = &doc.slides[0];
        assert_eq!(slide.slide, "SGVsbG8gd29ybGQ=");
        assert_eq!(slide.title, "");
        assert_eq!(
            slide.tags,
            vec!["Marketing Campaign", "Social Media Strategy"]
        );
    }

    #[test]
    fn test_legacy_object_tags_keep_document_order() {
        let raw = r#"{"slides": [{
            "id": "2",
            "base64": "AAAA",
            "saved_at": "2025-02-10T12:00:00Z",
            "tags": {"project": "Apollo", "topic": "Budget", "subtopic": "Travel"}
        }]}"#;
        let doc: SlideListDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.slides[0].tags, vec!["Apollo", "Budget", "Travel"]);

        let value: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(
            tags_from_value(&value["slides"][0]["tags"]),
            vec!["Apollo", "Budget", "Travel"]
        );
    }

    #[test]
    fn test_missing_or_null_tags() {
        let doc: SlideListDocument = serde_json::from_value(json!({
            "slides": [
                {"id": "1", "saved_at": "t", "slide": "x"},
                {"id": "2", "saved_at": "t", "slide": "x", "tags": null}
            ]
        }))
        .unwrap();
        assert!(doc.slides.iter().all(|s| s.tags.is_empty()));
    }

    #[test]
    fn test_parse_tag_input_widget_json() {
        let tags = parse_tag_input(r#"[{"value":"finance"},{"value":" q1 "},{"value":""}]"#);
        assert_eq!(tags, vec!["finance", "q1"]);
    }

    #[test]
    fn test_parse_tag_input_comma_list() {
        assert_eq!(parse_tag_input("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_tag_input("   ").is_empty());
    }

    #[test]
    fn test_create_request_accepts_widget_string() {
        let request: CreateSlideRequest = serde_json::from_value(json!({
            "title": "Roadmap",
            "tags": "[{\"value\":\"plan\"}]",
            "slide": "UEsDB",
            "thumbnail": "iVBOR"
        }))
        .unwrap();
        assert_eq!(request.tags, vec!["plan"]);
        assert_eq!(request.exported.slide, "UEsDB");
    }
}
