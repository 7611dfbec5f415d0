//! Human-facing summary of an image file's metadata.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::ImageReader;
use serde::Serialize;

use super::codec::read_record_strict;
use super::detect::{detect_no_ai_markers, MarkerReport};
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub path: PathBuf,
    pub format: String,
    /// Color layout of the decoded image, e.g. `Rgb8`.
    pub color: String,
    pub width: u32,
    pub height: u32,
    /// Primary and capture tags, plus `UserComment`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub exif: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub gps: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "MarkerReport::is_empty")]
    pub markers: MarkerReport,
    /// Why the EXIF block could not be read, if it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif_error: Option<String>,
}

/// Decode `path` and summarize its metadata.
///
/// Only a missing or undecodable image is an error; a bad EXIF block is
/// reported in `exif_error`.
pub fn inspect(path: &Path) -> PipelineResult<InspectReport> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    let decode_err = |message: String| PipelineError::Decode {
        path: path.to_path_buf(),
        message,
    };

    let reader = ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?;
    let format = reader
        .format()
        .map(|f| format!("{f:?}"))
        .unwrap_or_else(|| "Unknown".to_string());
    let image = reader.decode().map_err(|e| decode_err(e.to_string()))?;

    let (record, exif_error) = match read_record_strict(path) {
        Ok(record) => (record, None),
        Err(e) => (Default::default(), Some(e.to_string())),
    };

    Ok(InspectReport {
        path: path.to_path_buf(),
        format,
        color: format!("{:?}", image.color()),
        width: image.width(),
        height: image.height(),
        exif: record.exif_strings(),
        gps: record.location_strings(),
        markers: detect_no_ai_markers(&record),
        exif_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::codec::write_record;
    use crate::metadata::policy::{decide, MetadataPolicy};
    use crate::metadata::record::MetadataRecord;
    use image::{Rgba, RgbaImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn test_inspect_plain_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.png");
        RgbaImage::from_pixel(5, 7, Rgba([1, 2, 3, 255])).save(&path).unwrap();

        let report = inspect(&path).unwrap();
        assert_eq!(report.format, "Png");
        assert_eq!(report.color, "Rgba8");
        assert_eq!((report.width, report.height), (5, 7));
        assert!(report.exif.is_empty());
        assert!(report.markers.is_empty());
        assert!(report.exif_error.is_none());
    }

    #[test]
    fn test_inspect_finds_markers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("marked.png");
        RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])).save(&path).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let record = decide(&MetadataRecord::new(), &MetadataPolicy::default(), &mut rng);
        write_record(&path, &record).unwrap();

        let report = inspect(&path).unwrap();
        assert!(report.markers.is_protected());
        assert!(report.exif.contains_key("UserComment"));
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("markers").is_some());
    }

    #[test]
    fn test_inspect_missing_file() {
        assert!(matches!(
            inspect(Path::new("/nope/missing.png")),
            Err(PipelineError::FileNotFound(_))
        ));
    }
}
