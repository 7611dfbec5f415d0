//! Deciding what metadata the output file carries.
//!
//! [`decide`] is a pure function of the existing record, the policy and the
//! random source. Steps run in a fixed order so later ones win:
//! remove or keep, then fabricate, then the no-AI marker.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::record::{Group, MetadataRecord};

pub const NO_AI_COPYRIGHT: &str = "© No AI usage permitted. Not for AI training or generation.";
pub const NO_AI_SOFTWARE: &str = "NoAI-Protected";
pub const NO_AI_DOCUMENT_NAME: &str = "Protected from AI training";
pub const NO_AI_ARTIST: &str = "Protected by m-alice";

/// Fabricated-metadata template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FakeType {
    /// Pick one of the concrete templates uniformly per run.
    #[default]
    Random,
    /// Looks exported from a paint program.
    Paint,
    /// Looks shot on an older compact camera on a random date.
    OldCamera,
    /// Looks captured with a screenshot tool.
    Screenshot,
}

impl FakeType {
    pub const TEMPLATES: [FakeType; 3] = [FakeType::Paint, FakeType::OldCamera, FakeType::Screenshot];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "random" => Some(Self::Random),
            "paint" => Some(Self::Paint),
            "old_camera" => Some(Self::OldCamera),
            "screenshot" => Some(Self::Screenshot),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Paint => "paint",
            Self::OldCamera => "old_camera",
            Self::Screenshot => "screenshot",
        }
    }

    /// Replace `Random` with a concrete template.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        match self {
            Self::Random => Self::TEMPLATES[rng.gen_range(0..Self::TEMPLATES.len())],
            other => other,
        }
    }
}

/// Which metadata operations to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataPolicy {
    /// Drop all existing metadata.
    pub remove: bool,
    /// Write a fabricated provenance template.
    pub fabricate: bool,
    pub fake_type: FakeType,
    /// Add the no-AI usage marker.
    pub no_ai_flag: bool,
}

impl Default for MetadataPolicy {
    fn default() -> Self {
        Self {
            remove: true,
            fabricate: true,
            fake_type: FakeType::Random,
            no_ai_flag: true,
        }
    }
}

/// Outcome of [`decide_detailed`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub record: MetadataRecord,
    /// Template actually applied, when fabricating.
    pub template: Option<FakeType>,
}

/// The record to write for `existing` under `policy`.
pub fn decide<R: Rng + ?Sized>(existing: &MetadataRecord, policy: &MetadataPolicy, rng: &mut R) -> MetadataRecord {
    decide_detailed(existing, policy, rng).record
}

/// Like [`decide`], also reporting the template that was used.
pub fn decide_detailed<R: Rng + ?Sized>(
    existing: &MetadataRecord,
    policy: &MetadataPolicy,
    rng: &mut R,
) -> Decision {
    let mut record = if policy.remove {
        MetadataRecord::new()
    } else {
        existing.clone()
    };

    let template = policy.fabricate.then(|| {
        let template = policy.fake_type.resolve(rng);
        fabricate(&mut record, template, rng);
        template
    });

    if policy.no_ai_flag {
        add_no_ai_marker(&mut record);
    }

    Decision { record, template }
}

fn fabricate<R: Rng + ?Sized>(record: &mut MetadataRecord, template: FakeType, rng: &mut R) {
    match template {
        FakeType::Paint => {
            record.set(Group::Primary, "Software", "Adobe Photoshop");
            record.set(Group::Primary, "Make", "Adobe Systems");
            record.comment = Some("Created with Adobe Photoshop".to_string());
        }
        FakeType::OldCamera => {
            record.set(Group::Primary, "Make", "NIKON");
            record.set(Group::Primary, "Model", "COOLPIX P900");
            record.set(Group::Capture, "DateTimeOriginal", random_capture_date(rng));
        }
        FakeType::Screenshot => {
            record.set(Group::Primary, "Software", "Windows Snipping Tool");
            record.set(Group::Primary, "Make", "Microsoft Windows");
            record.comment = Some("Screenshot".to_string());
        }
        // Resolved before we get here.
        FakeType::Random => {}
    }
}

/// EXIF datetime at midnight on a random day between 2010 and 2023.
pub fn random_capture_date<R: Rng + ?Sized>(rng: &mut R) -> String {
    let year = rng.gen_range(2010..=2023);
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=28);
    format!("{year:04}:{month:02}:{day:02} 00:00:00")
}

/// JSON payload stored in the user comment.
pub fn no_ai_payload() -> String {
    serde_json::json!({
        "usage_restriction": "no_ai_training",
        "license": "no_ai",
        "creator_intent": "exclude_from_ai_datasets",
    })
    .to_string()
}

fn add_no_ai_marker(record: &mut MetadataRecord) {
    record.comment = Some(no_ai_payload());
    record.set(Group::Primary, "Copyright", NO_AI_COPYRIGHT);
    record.set(Group::Primary, "Software", NO_AI_SOFTWARE);
    record.set(Group::Primary, "DocumentName", NO_AI_DOCUMENT_NAME);
    record.set(Group::Primary, "Artist", NO_AI_ARTIST);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn existing() -> MetadataRecord {
        let mut r = MetadataRecord::new();
        r.set(Group::Primary, "Make", "Canon");
        r.set(Group::Primary, "Model", "EOS 5D");
        r.set(Group::Location, "GPSLatitudeRef", "N");
        r.comment = Some("family trip".into());
        r
    }

    fn policy(remove: bool, fabricate: bool, fake_type: FakeType, no_ai_flag: bool) -> MetadataPolicy {
        MetadataPolicy {
            remove,
            fabricate,
            fake_type,
            no_ai_flag,
        }
    }

    #[test]
    fn test_remove_only_yields_empty_record() {
        let mut rng = StdRng::seed_from_u64(0);
        let out = decide(&existing(), &policy(true, false, FakeType::Random, false), &mut rng);
        assert!(out.is_empty());
    }

    #[test]
    fn test_keep_preserves_existing() {
        let mut rng = StdRng::seed_from_u64(0);
        let out = decide(&existing(), &policy(false, false, FakeType::Random, false), &mut rng);
        assert_eq!(out, existing());
    }

    #[test]
    fn test_no_ai_comment_has_structured_keys() {
        let mut rng = StdRng::seed_from_u64(0);
        let out = decide(&existing(), &policy(true, false, FakeType::Random, true), &mut rng);
        let comment = out.comment.as_deref().unwrap();
        let json: serde_json::Value = serde_json::from_str(comment).unwrap();
        for key in ["usage_restriction", "license", "creator_intent"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(out.field_text("Copyright").as_deref(), Some(NO_AI_COPYRIGHT));
        assert_eq!(out.field_text("Artist").as_deref(), Some(NO_AI_ARTIST));
    }

    #[test]
    fn test_no_ai_overrides_fabricated_fields() {
        let mut rng = StdRng::seed_from_u64(0);
        let d = decide_detailed(&existing(), &policy(true, true, FakeType::Paint, true), &mut rng);
        assert_eq!(d.template, Some(FakeType::Paint));
        assert_eq!(d.record.field_text("Software").as_deref(), Some(NO_AI_SOFTWARE));
        // Make is not touched by the marker, so the fabricated value survives.
        assert_eq!(d.record.field_text("Make").as_deref(), Some("Adobe Systems"));
        assert!(d.record.comment.as_deref().unwrap().contains("no_ai_training"));
    }

    #[test]
    fn test_fabricate_after_remove_repopulates() {
        let mut rng = StdRng::seed_from_u64(0);
        let out = decide(&existing(), &policy(true, true, FakeType::Screenshot, false), &mut rng);
        assert_eq!(out.field_text("Make").as_deref(), Some("Microsoft Windows"));
        assert_eq!(out.comment.as_deref(), Some("Screenshot"));
        assert!(out.location.is_empty());
    }

    #[test]
    fn test_old_camera_date_in_range() {
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = decide(
                &MetadataRecord::new(),
                &policy(true, true, FakeType::OldCamera, false),
                &mut rng,
            );
            let date = out.field_text("DateTimeOriginal").unwrap();
            let year: u32 = date[0..4].parse().unwrap();
            let month: u32 = date[5..7].parse().unwrap();
            let day: u32 = date[8..10].parse().unwrap();
            assert!((2010..=2023).contains(&year));
            assert!((1..=12).contains(&month));
            assert!((1..=28).contains(&day));
            assert!(date.ends_with(" 00:00:00"));
            assert_eq!(out.field_text("Model").as_deref(), Some("COOLPIX P900"));
        }
    }

    #[test]
    fn test_random_template_is_concrete() {
        let mut seen = std::collections::HashSet::new();
        for seed in 0..60 {
            let mut rng = StdRng::seed_from_u64(seed);
            let d = decide_detailed(
                &MetadataRecord::new(),
                &MetadataPolicy::default(),
                &mut rng,
            );
            let t = d.template.unwrap();
            assert_ne!(t, FakeType::Random);
            seen.insert(t);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_fake_type_parse() {
        assert_eq!(FakeType::parse("old-camera"), Some(FakeType::OldCamera));
        assert_eq!(FakeType::parse("PAINT"), Some(FakeType::Paint));
        assert_eq!(FakeType::parse("film"), None);
    }
}
