//! Read-only scan for no-AI usage markers in an existing record.

use std::collections::BTreeMap;

use serde::Serialize;

use super::record::MetadataRecord;

/// Lowercase phrases that signal a no-AI intent.
pub const KEYWORDS: [&str; 8] = [
    "no ai",
    "no-ai",
    "noai",
    "ai prohibited",
    "not for ai",
    "no ai training",
    "ai learning prohibited",
    "protected from ai",
];

/// Fields scanned for [`KEYWORDS`].
pub const FIELDS: [&str; 6] = [
    "Copyright",
    "Artist",
    "UserComment",
    "Software",
    "DocumentName",
    "ImageDescription",
];

/// Keys of the structured comment payload.
pub const STRUCTURED_KEYS: [&str; 3] = ["usage_restriction", "license", "creator_intent"];

/// What [`detect_no_ai_markers`] found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerReport {
    /// Field name to its full text, for fields containing a keyword.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    /// Every key of the comment JSON, when it carries a structured marker.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub structured: BTreeMap<String, serde_json::Value>,
    /// The comment text that was parsed for `structured`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_json: Option<String>,
    /// Parse failure of a brace-bearing comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MarkerReport {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
            && self.structured.is_empty()
            && self.raw_json.is_none()
            && self.error.is_none()
    }

    /// True when any marker was found.
    pub fn is_protected(&self) -> bool {
        !self.fields.is_empty() || !self.structured.is_empty()
    }
}

pub fn detect_no_ai_markers(record: &MetadataRecord) -> MarkerReport {
    let mut report = MarkerReport::default();

    for field in FIELDS {
        let Some(text) = record.field_text(field) else {
            continue;
        };
        let lower = text.to_lowercase();
        if KEYWORDS.iter().any(|k| lower.contains(k)) {
            report.fields.insert(field.to_string(), text);
        }
    }

    if let Some(comment) = &record.comment {
        if comment.contains('{') && comment.contains('}') {
            scan_structured(comment, &mut report);
        }
    }

    report
}

fn scan_structured(comment: &str, report: &mut MarkerReport) {
    let normalized = comment.replace('©', "(c)");
    match serde_json::from_str::<serde_json::Value>(&normalized) {
        Ok(serde_json::Value::Object(map)) => {
            if STRUCTURED_KEYS.iter().any(|k| map.contains_key(*k)) {
                report.structured = map.into_iter().collect();
                report.raw_json = Some(normalized);
            }
        }
        Ok(_) => {}
        Err(e) => report.error = Some(format!("JSON parse error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::policy::{decide, MetadataPolicy};
    use crate::metadata::record::Group;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_clean_record_has_no_markers() {
        let mut record = MetadataRecord::new();
        record.set(Group::Primary, "Make", "Canon");
        record.set(Group::Primary, "Software", "Lightroom");
        let report = detect_no_ai_markers(&record);
        assert!(report.is_empty());
        assert!(!report.is_protected());
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let mut record = MetadataRecord::new();
        record.set(Group::Primary, "Copyright", "(c) Jane. NO AI TRAINING.");
        record.set(Group::Primary, "Make", "noai camera");
        let report = detect_no_ai_markers(&record);
        assert_eq!(report.fields.len(), 1);
        assert_eq!(report.fields["Copyright"], "(c) Jane. NO AI TRAINING.");
    }

    #[test]
    fn test_marker_written_by_policy_is_detected() {
        let mut rng = StdRng::seed_from_u64(3);
        let record = decide(&MetadataRecord::new(), &MetadataPolicy::default(), &mut rng);
        let report = detect_no_ai_markers(&record);
        assert!(report.is_protected());
        assert!(report.fields.contains_key("Copyright"));
        assert!(report.fields.contains_key("DocumentName"));
        assert_eq!(
            report.structured["usage_restriction"],
            serde_json::json!("no_ai_training")
        );
        assert!(report.raw_json.is_some());
        assert!(report.error.is_none());
    }

    #[test]
    fn test_unrelated_json_is_ignored() {
        let mut record = MetadataRecord::new();
        record.comment = Some(r#"{"lens": "50mm"}"#.into());
        let report = detect_no_ai_markers(&record);
        assert!(report.structured.is_empty());
        assert!(report.raw_json.is_none());
        assert!(report.error.is_none());
    }

    #[test]
    fn test_broken_json_becomes_error_string() {
        let mut record = MetadataRecord::new();
        record.comment = Some("{license: no_ai".into());
        // Needs a closing brace to be attempted at all.
        assert!(detect_no_ai_markers(&record).error.is_none());

        record.comment = Some("{license: no_ai}".into());
        let report = detect_no_ai_markers(&record);
        assert!(report.error.as_deref().unwrap().starts_with("JSON parse error"));
    }

    #[test]
    fn test_copyright_glyph_normalized_before_parse() {
        let mut record = MetadataRecord::new();
        record.comment = Some(r#"{"license": "© no_ai"}"#.into());
        let report = detect_no_ai_markers(&record);
        assert_eq!(report.structured["license"], serde_json::json!("(c) no_ai"));
    }
}
