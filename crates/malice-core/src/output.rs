//! Writing results: processed images and JSON run reports.
//!
//! [`EncodeFormat`] encodes the final image into its container.
//! [`ReportWriter`] serializes run reports as JSON or JSON Lines.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::types::ProcessReport;

/// JPEG output quality.
pub const JPEG_QUALITY: u8 = 95;

/// Image container for processed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeFormat {
    /// Lossless, keeps alpha
    #[default]
    Png,
    /// Lossless WebP, keeps alpha
    Webp,
    /// Quality 95, alpha dropped
    #[serde(alias = "jpg")]
    Jpeg,
}

impl EncodeFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Jpeg => "jpg",
        }
    }

    /// Encode `image` to `path`, replacing any existing file.
    pub fn encode(self, image: &DynamicImage, path: &Path) -> Result<(), PipelineError> {
        let encode_err = |message: String| PipelineError::Encode {
            path: path.to_path_buf(),
            message,
        };
        let file = File::create(path).map_err(|e| encode_err(format!("Cannot create file: {e}")))?;
        let mut writer = BufWriter::new(file);

        let result = match self {
            Self::Png => image.write_to(&mut writer, ImageFormat::Png),
            Self::Webp => image.write_with_encoder(WebPEncoder::new_lossless(&mut writer)),
            Self::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)),
        };
        result.map_err(|e| encode_err(e.to_string()))?;
        writer.flush().map_err(|e| encode_err(e.to_string()))
    }
}

impl std::fmt::Display for EncodeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Jpeg => "jpeg",
        })
    }
}

/// Default output location: `<dir or input's dir>/<prefix><stem>.<ext>`.
pub fn output_path(input: &Path, dir: Option<&Path>, prefix: &str, format: EncodeFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let parent = dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    parent.join(format!("{prefix}{stem}.{}", format.extension()))
}

/// Layout of a run-report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// An object for a single run, an array for a batch
    #[default]
    Json,
    /// One report per line
    JsonLines,
}

/// Serializes [`ProcessReport`]s onto a writer.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    pretty: bool,
}

impl<W: Write> ReportWriter<W> {
    /// `pretty` only applies to [`ReportFormat::Json`].
    pub fn new(writer: W, format: ReportFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    /// Write the report of one single-file run.
    pub fn write_single(&mut self, report: &ProcessReport) -> io::Result<()> {
        self.emit(report)
    }

    /// Write the reports of a batch run.
    pub fn write_batch(&mut self, reports: &[ProcessReport]) -> io::Result<()> {
        match self.format {
            ReportFormat::Json => self.emit(reports),
            ReportFormat::JsonLines => reports.iter().try_for_each(|r| self.emit(r)),
        }
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn emit<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        let written = if self.pretty && self.format == ReportFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, value)
        } else {
            serde_json::to_writer(&mut self.writer, value)
        };
        written.map_err(io::Error::other)?;
        writeln!(self.writer)
    }
}

/// Create `path` and write run reports into it.
///
/// `batch` selects the batch layout (a JSON array) even for one report.
pub fn save_reports(
    path: &Path,
    format: ReportFormat,
    pretty: bool,
    reports: &[ProcessReport],
    batch: bool,
) -> io::Result<()> {
    let mut writer = ReportWriter::new(BufWriter::new(File::create(path)?), format, pretty);
    if batch {
        writer.write_batch(reports)?;
    } else {
        for report in reports {
            writer.write_single(report)?;
        }
    }
    writer.finish().map(drop)
}

/// Serialize any report (run or inspection) to a JSON string.
pub fn to_json<T: Serialize>(item: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(item)
    } else {
        serde_json::to_string(item)
    }
}
