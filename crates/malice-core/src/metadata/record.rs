//! Structured EXIF record: three tag groups plus the user comment.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag group within an EXIF block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// IFD0: camera and file attributes.
    Primary,
    /// Exif sub-IFD: shooting attributes.
    Capture,
    /// GPS sub-IFD.
    Location,
}

/// A tag value, keeping enough of the EXIF type to write it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TagValue {
    Text(String),
    /// EXIF UNDEFINED payload.
    Bytes(Vec<u8>),
    /// EXIF BYTE array.
    Byte(Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    SRational(Vec<(i32, i32)>),
}

impl TagValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

fn join<T, F: Fn(&T) -> String>(items: &[T], f: F) -> String {
    items.iter().map(f).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) | Self::Byte(b) => match std::str::from_utf8(b) {
                Ok(s) if !s.chars().any(|c| c.is_control() && c != '\0') => {
                    f.write_str(s.trim_end_matches('\0'))
                }
                _ => write!(f, "Binary data ({} bytes)", b.len()),
            },
            Self::Short(v) => f.write_str(&join(v, |x| x.to_string())),
            Self::Long(v) => f.write_str(&join(v, |x| x.to_string())),
            Self::Rational(v) => f.write_str(&join(v, |(n, d)| format!("{n}/{d}"))),
            Self::SRational(v) => f.write_str(&join(v, |(n, d)| format!("{n}/{d}"))),
        }
    }
}

/// Metadata carried by an image, grouped the way EXIF stores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub primary: BTreeMap<String, TagValue>,
    pub capture: BTreeMap<String, TagValue>,
    pub location: BTreeMap<String, TagValue>,
    /// EXIF UserComment, decoded to text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
            && self.capture.is_empty()
            && self.location.is_empty()
            && self.comment.is_none()
    }

    pub fn group(&self, group: Group) -> &BTreeMap<String, TagValue> {
        match group {
            Group::Primary => &self.primary,
            Group::Capture => &self.capture,
            Group::Location => &self.location,
        }
    }

    pub fn group_mut(&mut self, group: Group) -> &mut BTreeMap<String, TagValue> {
        match group {
            Group::Primary => &mut self.primary,
            Group::Capture => &mut self.capture,
            Group::Location => &mut self.location,
        }
    }

    /// Set a tag, replacing any previous value.
    pub fn set(&mut self, group: Group, name: &str, value: impl Into<TagValue>) {
        self.group_mut(group).insert(name.to_string(), value.into());
    }

    /// Text of a named field, looking at the comment, then primary, then capture.
    pub fn field_text(&self, name: &str) -> Option<String> {
        if name == "UserComment" {
            return self.comment.clone();
        }
        self.primary
            .get(name)
            .or_else(|| self.capture.get(name))
            .map(ToString::to_string)
    }

    /// Primary and capture tags (plus the comment) rendered as text.
    pub fn exif_strings(&self) -> BTreeMap<String, String> {
        let mut out: BTreeMap<String, String> = self
            .primary
            .iter()
            .chain(self.capture.iter())
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        if let Some(comment) = &self.comment {
            out.insert("UserComment".to_string(), comment.clone());
        }
        out
    }

    /// GPS tags rendered as text.
    pub fn location_strings(&self) -> BTreeMap<String, String> {
        self.location
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}
