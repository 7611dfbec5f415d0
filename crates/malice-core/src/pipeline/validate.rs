//! Input validation before decoding.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Extensions accepted as input, lowercase.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Whether `path` carries a supported extension (case-insensitive).
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Validates files before processing.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Perform quick validation before full decode.
    ///
    /// Checks:
    /// - File exists and is readable
    /// - Extension is one of JPEG, PNG or WebP
    /// - File size is within limits
    /// - File starts with JPEG, PNG or WebP magic bytes
    pub fn validate(&self, path: &Path) -> Result<(), PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        if !has_supported_extension(path) {
            return Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("none")
                    .to_string(),
            });
        }

        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        self.check_magic_bytes(path)
    }

    /// Check file magic bytes to verify it's a supported image container.
    fn check_magic_bytes(&self, path: &Path) -> Result<(), PipelineError> {
        let mut file = std::fs::File::open(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {}", e),
        })?;

        let mut header = [0u8; 12];
        let bytes_read = file.read(&mut header).unwrap_or(0);

        if bytes_read < 4 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }

        if !Self::is_valid_image_header(&header, bytes_read) {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }

        Ok(())
    }

    /// Check if the header bytes match JPEG, PNG or WebP.
    fn is_valid_image_header(header: &[u8; 12], bytes_read: usize) -> bool {
        if bytes_read < 4 {
            return false;
        }

        // JPEG: FF D8 FF
        if header[..3] == [0xFF, 0xD8, 0xFF] {
            return true;
        }

        // PNG: 89 50 4E 47
        if header[..4] == [0x89, b'P', b'N', b'G'] {
            return true;
        }

        // WebP: RIFF....WEBP
        bytes_read >= 12 && &header[..4] == b"RIFF" && &header[8..12] == b"WEBP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    #[test]
    fn test_magic_bytes_jpeg() {
        let header = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(Validator::is_valid_image_header(&header, 12));
    }

    #[test]
    fn test_magic_bytes_png() {
        let header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert!(Validator::is_valid_image_header(&header, 12));
    }

    #[test]
    fn test_magic_bytes_webp() {
        let header = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'E', b'B', b'P'];
        assert!(Validator::is_valid_image_header(&header, 12));
    }

    #[test]
    fn test_magic_bytes_other_riff_rejected() {
        let header = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'A', b'V', b'E'];
        assert!(!Validator::is_valid_image_header(&header, 12));
    }

    #[test]
    fn test_magic_bytes_gif_rejected() {
        let header = [b'G', b'I', b'F', b'8', b'9', b'a', 0, 0, 0, 0, 0, 0];
        assert!(!Validator::is_valid_image_header(&header, 12));
    }

    #[test]
    fn test_supported_extension() {
        assert!(has_supported_extension(Path::new("a.JPG")));
        assert!(has_supported_extension(Path::new("dir/b.webp")));
        assert!(!has_supported_extension(Path::new("c.gif")));
        assert!(!has_supported_extension(Path::new("noext")));
    }

    #[test]
    fn test_validate_missing_file() {
        let v = Validator::new(LimitsConfig::default());
        assert!(matches!(
            v.validate(&PathBuf::from("/nope/x.png")),
            Err(PipelineError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_validate_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bmp");
        RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])).save(&path).unwrap();
        let v = Validator::new(LimitsConfig::default());
        assert!(matches!(
            v.validate(&path),
            Err(PipelineError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_validate_mislabelled_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"hello world, not an image").unwrap();
        let v = Validator::new(LimitsConfig::default());
        assert!(matches!(v.validate(&path), Err(PipelineError::Decode { .. })));
    }

    #[test]
    fn test_validate_real_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])).save(&path).unwrap();
        let v = Validator::new(LimitsConfig::default());
        assert!(v.validate(&path).is_ok());
    }
}
