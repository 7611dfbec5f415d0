//! EXIF container adapter.
//!
//! kamadak-exif handles the TIFF-structured EXIF block; img-parts splices
//! that block in and out of JPEG, PNG and WebP files without touching the
//! compressed image data.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use exif::experimental::Writer;
use exif::{Context, Field, In, Reader, Tag, Value};
use img_parts::{Bytes, DynImage, ImageEXIF};
use thiserror::Error;

use super::record::{Group, MetadataRecord, TagValue};

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a JPEG, PNG or WebP container: {0}")]
    UnsupportedContainer(PathBuf),

    #[error("Malformed container {path}: {message}")]
    Container { path: PathBuf, message: String },

    #[error("Malformed EXIF block: {0}")]
    Exif(#[from] exif::Error),
}

const USER_COMMENT: u16 = 0x9286;

/// Structural and pointer tags that are never carried in a record.
const STRUCTURAL: [u16; 18] = [
    0x0100, 0x0101, 0x0102, 0x0103, 0x0111, 0x0115, 0x0116, 0x0117, 0x011c, 0x0142, 0x0143,
    0x0144, 0x0145, 0x0201, 0x0202, 0x8769, 0x8825, 0xa005,
];

/// Vendor blobs reference absolute offsets and do not survive a rewrite.
const MAKER_NOTE: u16 = 0x927c;

const PRIMARY_TAGS: &[(u16, &str)] = &[
    (0x010d, "DocumentName"),
    (0x010e, "ImageDescription"),
    (0x010f, "Make"),
    (0x0110, "Model"),
    (0x0112, "Orientation"),
    (0x011a, "XResolution"),
    (0x011b, "YResolution"),
    (0x0128, "ResolutionUnit"),
    (0x012d, "TransferFunction"),
    (0x0131, "Software"),
    (0x0132, "DateTime"),
    (0x013b, "Artist"),
    (0x013e, "WhitePoint"),
    (0x013f, "PrimaryChromaticities"),
    (0x0211, "YCbCrCoefficients"),
    (0x0213, "YCbCrPositioning"),
    (0x0214, "ReferenceBlackWhite"),
    (0x8298, "Copyright"),
];

const CAPTURE_TAGS: &[(u16, &str)] = &[
    (0x829a, "ExposureTime"),
    (0x829d, "FNumber"),
    (0x8822, "ExposureProgram"),
    (0x8827, "PhotographicSensitivity"),
    (0x9000, "ExifVersion"),
    (0x9003, "DateTimeOriginal"),
    (0x9004, "DateTimeDigitized"),
    (0x9010, "OffsetTime"),
    (0x9011, "OffsetTimeOriginal"),
    (0x9101, "ComponentsConfiguration"),
    (0x9201, "ShutterSpeedValue"),
    (0x9202, "ApertureValue"),
    (0x9203, "BrightnessValue"),
    (0x9204, "ExposureBiasValue"),
    (0x9205, "MaxApertureValue"),
    (0x9207, "MeteringMode"),
    (0x9208, "LightSource"),
    (0x9209, "Flash"),
    (0x920a, "FocalLength"),
    (0x9290, "SubSecTime"),
    (0x9291, "SubSecTimeOriginal"),
    (0x9292, "SubSecTimeDigitized"),
    (0xa000, "FlashpixVersion"),
    (0xa001, "ColorSpace"),
    (0xa002, "PixelXDimension"),
    (0xa003, "PixelYDimension"),
    (0xa217, "SensingMethod"),
    (0xa300, "FileSource"),
    (0xa301, "SceneType"),
    (0xa401, "CustomRendered"),
    (0xa402, "ExposureMode"),
    (0xa403, "WhiteBalance"),
    (0xa404, "DigitalZoomRatio"),
    (0xa405, "FocalLengthIn35mmFilm"),
    (0xa406, "SceneCaptureType"),
    (0xa408, "Contrast"),
    (0xa409, "Saturation"),
    (0xa40a, "Sharpness"),
    (0xa420, "ImageUniqueID"),
    (0xa430, "CameraOwnerName"),
    (0xa431, "BodySerialNumber"),
    (0xa432, "LensSpecification"),
    (0xa433, "LensMake"),
    (0xa434, "LensModel"),
];

const LOCATION_TAGS: &[(u16, &str)] = &[
    (0x0000, "GPSVersionID"),
    (0x0001, "GPSLatitudeRef"),
    (0x0002, "GPSLatitude"),
    (0x0003, "GPSLongitudeRef"),
    (0x0004, "GPSLongitude"),
    (0x0005, "GPSAltitudeRef"),
    (0x0006, "GPSAltitude"),
    (0x0007, "GPSTimeStamp"),
    (0x0008, "GPSSatellites"),
    (0x000c, "GPSSpeedRef"),
    (0x000d, "GPSSpeed"),
    (0x0010, "GPSImgDirectionRef"),
    (0x0011, "GPSImgDirection"),
    (0x0012, "GPSMapDatum"),
    (0x001b, "GPSProcessingMethod"),
    (0x001d, "GPSDateStamp"),
];

fn table(group: Group) -> &'static [(u16, &'static str)] {
    match group {
        Group::Primary => PRIMARY_TAGS,
        Group::Capture => CAPTURE_TAGS,
        Group::Location => LOCATION_TAGS,
    }
}

fn context(group: Group) -> Context {
    match group {
        Group::Primary => Context::Tiff,
        Group::Capture => Context::Exif,
        Group::Location => Context::Gps,
    }
}

fn group_of(context: Context) -> Option<Group> {
    match context {
        Context::Tiff => Some(Group::Primary),
        Context::Exif => Some(Group::Capture),
        Context::Gps => Some(Group::Location),
        _ => None,
    }
}

/// Display name of a tag; unlisted tags become `Unknown-<number>`.
pub fn tag_name(group: Group, number: u16) -> String {
    table(group)
        .iter()
        .find(|(n, _)| *n == number)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("Unknown-{number}"))
}

/// Inverse of [`tag_name`].
pub fn tag_number(group: Group, name: &str) -> Option<u16> {
    if let Some((number, _)) = table(group).iter().find(|(_, n)| *n == name) {
        return Some(*number);
    }
    name.strip_prefix("Unknown-")?.parse().ok()
}

fn is_carried(group: Group, number: u16) -> bool {
    match group {
        Group::Location => true,
        _ => !STRUCTURAL.contains(&number) && number != MAKER_NOTE && number != USER_COMMENT,
    }
}

fn from_exif_value(value: &Value) -> Option<TagValue> {
    Some(match value {
        Value::Ascii(parts) => {
            let joined: Vec<u8> = parts.join(&b' ');
            TagValue::Text(
                String::from_utf8_lossy(&joined)
                    .trim_end_matches('\0')
                    .to_string(),
            )
        }
        Value::Byte(v) => TagValue::Byte(v.clone()),
        Value::Undefined(v, _) => TagValue::Bytes(v.clone()),
        Value::Short(v) => TagValue::Short(v.clone()),
        Value::Long(v) => TagValue::Long(v.clone()),
        Value::Rational(v) => TagValue::Rational(v.iter().map(|r| (r.num, r.denom)).collect()),
        Value::SRational(v) => TagValue::SRational(v.iter().map(|r| (r.num, r.denom)).collect()),
        _ => return None,
    })
}

fn to_exif_value(value: &TagValue) -> Value {
    match value {
        TagValue::Text(s) => Value::Ascii(vec![s.as_bytes().to_vec()]),
        TagValue::Bytes(b) => Value::Undefined(b.clone(), 0),
        TagValue::Byte(b) => Value::Byte(b.clone()),
        TagValue::Short(v) => Value::Short(v.clone()),
        TagValue::Long(v) => Value::Long(v.clone()),
        TagValue::Rational(v) => Value::Rational(
            v.iter()
                .map(|&(num, denom)| exif::Rational { num, denom })
                .collect(),
        ),
        TagValue::SRational(v) => Value::SRational(
            v.iter()
                .map(|&(num, denom)| exif::SRational { num, denom })
                .collect(),
        ),
    }
}

/// UserComment payload: 8-byte character code, then the text.
pub fn encode_user_comment(text: &str) -> Vec<u8> {
    let code: &[u8; 8] = if text.is_ascii() {
        b"ASCII\0\0\0"
    } else {
        // Undefined code; readers fall back to the raw bytes, which are UTF-8.
        b"\0\0\0\0\0\0\0\0"
    };
    let mut out = Vec::with_capacity(8 + text.len());
    out.extend_from_slice(code);
    out.extend_from_slice(text.as_bytes());
    out
}

/// Text of a UserComment payload, with its character code stripped.
pub fn decode_user_comment(raw: &[u8]) -> String {
    let text = match raw.split_at_checked(8) {
        Some((b"UNICODE\0", rest)) => decode_ucs2(rest),
        Some((b"ASCII\0\0\0", rest))
        | Some((b"JIS\0\0\0\0\0", rest))
        | Some((b"\0\0\0\0\0\0\0\0", rest)) => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(raw).into_owned(),
    };
    text.trim_end_matches(['\0', ' ']).to_string()
}

/// UCS-2 text with unknown byte order; the zero high byte of Latin text
/// gives it away.
fn decode_ucs2(raw: &[u8]) -> String {
    let big_endian = raw.first() == Some(&0);
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Parse a raw TIFF-structured EXIF block.
pub fn decode_exif(tiff: &[u8]) -> Result<MetadataRecord, MetadataError> {
    let exif = Reader::new().read_raw(tiff.to_vec())?;
    let mut record = MetadataRecord::new();

    for field in exif.fields() {
        if field.ifd_num != In::PRIMARY {
            continue;
        }
        let Some(group) = group_of(field.tag.context()) else {
            continue;
        };
        let number = field.tag.number();

        if group == Group::Capture && number == USER_COMMENT {
            if let Value::Undefined(raw, _) | Value::Byte(raw) = &field.value {
                record.comment = Some(decode_user_comment(raw));
            }
            continue;
        }
        if !is_carried(group, number) {
            continue;
        }
        match from_exif_value(&field.value) {
            Some(value) => {
                record.group_mut(group).insert(tag_name(group, number), value);
            }
            None => tracing::debug!(tag = number, "Dropping EXIF field with unsupported type"),
        }
    }

    Ok(record)
}

/// Serialize a record to a TIFF-structured EXIF block.
///
/// Returns `None` for an empty record. Names that map to no tag number are
/// skipped with a warning.
pub fn encode_exif(record: &MetadataRecord) -> Result<Option<Vec<u8>>, MetadataError> {
    if record.is_empty() {
        return Ok(None);
    }

    let mut fields = Vec::new();
    for group in [Group::Primary, Group::Capture, Group::Location] {
        for (name, value) in record.group(group) {
            let Some(number) = tag_number(group, name) else {
                tracing::warn!(tag = %name, "Skipping unknown EXIF tag name");
                continue;
            };
            if !is_carried(group, number) {
                continue;
            }
            fields.push(Field {
                tag: Tag(context(group), number),
                ifd_num: In::PRIMARY,
                value: to_exif_value(value),
            });
        }
    }
    if let Some(comment) = &record.comment {
        fields.push(Field {
            tag: Tag(Context::Exif, USER_COMMENT),
            ifd_num: In::PRIMARY,
            value: Value::Undefined(encode_user_comment(comment), 0),
        });
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false)?;
    Ok(Some(buf.into_inner()))
}

fn load_container(path: &Path) -> Result<DynImage, MetadataError> {
    let data = fs::read(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    DynImage::from_bytes(Bytes::from(data))
        .map_err(|e| MetadataError::Container {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .ok_or_else(|| MetadataError::UnsupportedContainer(path.to_path_buf()))
}

/// Record stored in a file; a file without an EXIF block gives an empty record.
pub fn read_record_strict(path: &Path) -> Result<MetadataRecord, MetadataError> {
    match load_container(path)?.exif() {
        Some(block) => decode_exif(&block),
        None => Ok(MetadataRecord::new()),
    }
}

/// Like [`read_record_strict`], but any failure yields an empty record.
pub fn read_record(path: &Path) -> MetadataRecord {
    read_record_strict(path).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Unreadable metadata, treating as empty");
        MetadataRecord::new()
    })
}

/// VP8X flag telling decoders the bitstream carries alpha.
const VP8X_ALPHA: u8 = 0x10;
/// `alpha_is_used` bit of the 32-bit VP8L header word.
const VP8L_ALPHA_BIT: u32 = 1 << 28;

/// Set the VP8X alpha flag of an extended WebP when its image data has alpha.
///
/// Adding an EXIF chunk turns a simple WebP into an extended one, and the
/// new VP8X header starts with only the EXIF flag. Without the alpha flag
/// decoders treat the picture as opaque. Non-WebP data is left alone.
fn mark_webp_alpha(data: &mut [u8]) {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WEBP" {
        return;
    }

    let mut flags_at = None;
    let mut has_alpha = false;
    let mut pos = 12;
    while pos + 8 <= data.len() {
        let size = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]]) as usize;
        let body = pos + 8;
        let end = body.saturating_add(size).min(data.len());
        match &data[pos..pos + 4] {
            b"VP8X" if end > body => flags_at = Some(body),
            b"ALPH" => has_alpha = true,
            b"VP8L" if end - body >= 5 => {
                let header = u32::from_le_bytes([data[body + 1], data[body + 2], data[body + 3], data[body + 4]]);
                has_alpha |= header & VP8L_ALPHA_BIT != 0;
            }
            _ => {}
        }
        // Chunks are padded to an even length.
        pos = body.saturating_add(size).saturating_add(size & 1);
    }

    if let (Some(at), true) = (flags_at, has_alpha) {
        data[at] |= VP8X_ALPHA;
    }
}

/// Replace the EXIF block of a file in place.
///
/// An empty record removes the block entirely.
pub fn write_record(path: &Path, record: &MetadataRecord) -> Result<(), MetadataError> {
    let mut container = load_container(path)?;
    let block = encode_exif(record)?;
    container.set_exif(block.map(Bytes::from));

    let mut out = Vec::new();
    container
        .encoder()
        .write_to(&mut out)
        .map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    mark_webp_alpha(&mut out);
    fs::write(path, out).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), empty = record.is_empty(), "Metadata written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::policy::{no_ai_payload, NO_AI_COPYRIGHT};
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::tempdir;

    fn sample_record() -> MetadataRecord {
        let mut r = MetadataRecord::new();
        r.set(Group::Primary, "Make", "NIKON");
        r.set(Group::Primary, "Copyright", NO_AI_COPYRIGHT);
        r.set(Group::Primary, "XResolution", TagValue::Rational(vec![(72, 1)]));
        r.set(Group::Capture, "DateTimeOriginal", "2014:06:09 00:00:00");
        r.set(Group::Location, "GPSLatitudeRef", "N");
        r.comment = Some(no_ai_payload());
        r
    }

    fn write_image(dir: &Path, name: &str, format: ImageFormat) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(16, 12, Rgb([90, 120, 150]))
            .save_with_format(&path, format)
            .unwrap();
        path
    }

    #[test]
    fn test_tag_names_round_trip() {
        assert_eq!(tag_name(Group::Primary, 0x8298), "Copyright");
        assert_eq!(tag_number(Group::Primary, "Copyright"), Some(0x8298));
        assert_eq!(tag_name(Group::Capture, 0xbeef), "Unknown-48879");
        assert_eq!(tag_number(Group::Capture, "Unknown-48879"), Some(0xbeef));
        assert_eq!(tag_number(Group::Location, "Nope"), None);
    }

    #[test]
    fn test_user_comment_prefixes() {
        let raw = encode_user_comment("hello");
        assert_eq!(&raw[..8], b"ASCII\0\0\0");
        assert_eq!(decode_user_comment(&raw), "hello");

        let raw = encode_user_comment("ねこ");
        assert_eq!(&raw[..8], &[0u8; 8]);
        assert_eq!(decode_user_comment(&raw), "ねこ");

        let mut unicode = b"UNICODE\0".to_vec();
        unicode.extend_from_slice(&[0, b'h', 0, b'i']);
        assert_eq!(decode_user_comment(&unicode), "hi");

        assert_eq!(decode_user_comment(b"ASCII\0\0\0trailing   \0\0"), "trailing");
    }

    #[test]
    fn test_block_round_trip() {
        let record = sample_record();
        let block = encode_exif(&record).unwrap().unwrap();
        let decoded = decode_exif(&block).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_empty_record_encodes_to_nothing() {
        assert!(encode_exif(&MetadataRecord::new()).unwrap().is_none());
    }

    #[test]
    fn test_garbage_block_is_an_error() {
        assert!(matches!(
            decode_exif(b"definitely not tiff"),
            Err(MetadataError::Exif(_))
        ));
    }

    #[test]
    fn test_png_write_and_read_back() {
        let dir = tempdir().unwrap();
        let path = write_image(dir.path(), "a.png", ImageFormat::Png);
        assert!(read_record(&path).is_empty());

        write_record(&path, &sample_record()).unwrap();
        let back = read_record_strict(&path).unwrap();
        assert_eq!(back.comment.as_deref(), Some(no_ai_payload().as_str()));
        assert_eq!(back.field_text("Copyright").as_deref(), Some(NO_AI_COPYRIGHT));

        // Still a decodable image.
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (16, 12));
    }

    #[test]
    fn test_jpeg_write_and_read_back() {
        let dir = tempdir().unwrap();
        let path = write_image(dir.path(), "a.jpg", ImageFormat::Jpeg);
        write_record(&path, &sample_record()).unwrap();
        let back = read_record(&path);
        assert_eq!(back.field_text("Make").as_deref(), Some("NIKON"));
        assert_eq!(
            back.field_text("DateTimeOriginal").as_deref(),
            Some("2014:06:09 00:00:00")
        );
        assert_eq!(back.location_strings()["GPSLatitudeRef"], "N");
        assert!(image::open(&path).is_ok());
    }

    #[test]
    fn test_webp_write_and_read_back() {
        let dir = tempdir().unwrap();
        let path = write_image(dir.path(), "a.webp", ImageFormat::WebP);
        write_record(&path, &sample_record()).unwrap();

        let back = read_record_strict(&path).unwrap();
        assert_eq!(back.comment.as_deref(), Some(no_ai_payload().as_str()));
        assert_eq!(back.field_text("Make").as_deref(), Some("NIKON"));
        let img = image::open(&path).unwrap();
        assert_eq!(img.to_rgb8().get_pixel(3, 3), &Rgb([90, 120, 150]));
    }

    #[test]
    fn test_webp_keeps_transparency_after_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clear.webp");
        let pixels = RgbaImage::from_fn(40, 30, |x, y| Rgba([x as u8 * 6, y as u8 * 8, 50, 100]));
        pixels.save_with_format(&path, ImageFormat::WebP).unwrap();

        write_record(&path, &sample_record()).unwrap();

        let img = image::open(&path).unwrap();
        assert!(img.color().has_alpha());
        assert_eq!(img.to_rgba8(), pixels);
        assert!(read_record_strict(&path).unwrap().comment.is_some());
    }

    #[test]
    fn test_alpha_flag_only_set_when_bitstream_has_alpha() {
        fn webp(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
            let mut body = b"WEBP".to_vec();
            for (id, payload) in chunks {
                body.extend_from_slice(*id);
                body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
                body.extend_from_slice(payload);
                if payload.len() % 2 == 1 {
                    body.push(0);
                }
            }
            let mut out = b"RIFF".to_vec();
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
            out.extend(body);
            out
        }
        let vp8x = vec![0x08, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let vp8l = |alpha: bool| {
            let word: u32 = if alpha { VP8L_ALPHA_BIT } else { 0 };
            let mut p = vec![0x2f];
            p.extend_from_slice(&word.to_le_bytes());
            p
        };
        let flags_offset = 12 + 8;

        let mut with_alpha = webp(&[(b"VP8X", vp8x.clone()), (b"VP8L", vp8l(true))]);
        mark_webp_alpha(&mut with_alpha);
        assert_eq!(with_alpha[flags_offset], 0x08 | VP8X_ALPHA);

        let mut opaque = webp(&[(b"VP8X", vp8x.clone()), (b"VP8L", vp8l(false))]);
        mark_webp_alpha(&mut opaque);
        assert_eq!(opaque[flags_offset], 0x08);

        let mut lossy = webp(&[(b"VP8X", vp8x), (b"ALPH", vec![0; 3]), (b"VP8 ", vec![0; 4])]);
        mark_webp_alpha(&mut lossy);
        assert_eq!(lossy[flags_offset], 0x08 | VP8X_ALPHA);

        let mut png_like = b"\x89PNG\r\n\x1a\n0000".to_vec();
        let before = png_like.clone();
        mark_webp_alpha(&mut png_like);
        assert_eq!(png_like, before);
    }

    #[test]
    fn test_empty_record_strips_block() {
        let dir = tempdir().unwrap();
        let path = write_image(dir.path(), "a.jpg", ImageFormat::Jpeg);
        write_record(&path, &sample_record()).unwrap();
        write_record(&path, &MetadataRecord::new()).unwrap();

        let data = fs::read(&path).unwrap();
        let container = DynImage::from_bytes(Bytes::from(data)).unwrap().unwrap();
        assert!(container.exif().is_none());
        assert!(read_record_strict(&path).unwrap().is_empty());
    }

    #[test]
    fn test_non_image_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"plain text").unwrap();
        assert!(matches!(
            read_record_strict(&path),
            Err(MetadataError::UnsupportedContainer(_))
        ));
        assert!(read_record(&path).is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_record_strict(Path::new("/nonexistent/x.png")).unwrap_err();
        assert!(matches!(err, MetadataError::Io { .. }));
    }
}
