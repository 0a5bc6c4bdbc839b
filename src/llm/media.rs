use base64::{engine::general_purpose, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_PHOTO_MIME: &str = "image/jpeg";

static DATA_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:(image/[A-Za-z0-9.+-]+);base64,").expect("valid data url regex")
});

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn normalize_image_mime_type(mime_type: &str) -> String {
    let lowered = mime_type.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" => "image/jpeg".to_string(),
        _ => lowered,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhotoError {
    #[error("Photo is empty")]
    Empty,
    #[error("Photo is not valid base64: {0}")]
    InvalidBase64(String),
    #[error("Photo is {actual} bytes, limit is {limit}")]
    TooLarge { actual: usize, limit: usize },
    #[error("Photo content is {0}, expected an image")]
    NotAnImage(String),
}

/// A decoded upload ready to be attached to a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl PhotoPayload {
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Accepts bare base64 or a `data:image/<x>;base64,` URL.
pub fn decode_photo(raw: &str, max_bytes: usize) -> Result<PhotoPayload, PhotoError> {
    let trimmed = raw.trim();
    let (declared_mime, encoded) = match DATA_URL_RE.captures(trimmed) {
        Some(captures) => {
            let prefix_len = captures.get(0).map(|m| m.end()).unwrap_or(0);
            let mime = captures.get(1).map(|m| m.as_str().to_string());
            (mime, &trimmed[prefix_len..])
        }
        None => (None, trimmed),
    };

    let compact: String = encoded.chars().filter(|ch| !ch.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(PhotoError::Empty);
    }

    let bytes = general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| PhotoError::InvalidBase64(err.to_string()))?;
    if bytes.is_empty() {
        return Err(PhotoError::Empty);
    }
    if bytes.len() > max_bytes {
        return Err(PhotoError::TooLarge {
            actual: bytes.len(),
            limit: max_bytes,
        });
    }

    let detected = detect_mime_type(&bytes);
    if let Some(detected) = detected.as_deref() {
        if !detected.starts_with("image/") {
            return Err(PhotoError::NotAnImage(detected.to_string()));
        }
    }

    let mime_type = detected
        .or(declared_mime)
        .map(|mime| normalize_image_mime_type(&mime))
        .unwrap_or_else(|| DEFAULT_PHOTO_MIME.to_string());

    Ok(PhotoPayload { bytes, mime_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    fn encode(bytes: &[u8]) -> String {
        general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn strips_data_url_prefix_and_sniffs_type() {
        let raw = format!("data:image/jpeg;base64,{}", encode(PNG_MAGIC));
        let photo = decode_photo(&raw, 1024).unwrap();
        assert_eq!(photo.bytes, PNG_MAGIC);
        assert_eq!(photo.mime_type, "image/png");
    }

    #[test]
    fn bare_base64_is_accepted() {
        let photo = decode_photo(&encode(JPEG_MAGIC), 1024).unwrap();
        assert_eq!(photo.mime_type, "image/jpeg");
        assert_eq!(photo.to_base64(), encode(JPEG_MAGIC));
    }

    #[test]
    fn falls_back_to_declared_then_default_mime() {
        let raw = format!("data:image/jpg;base64,{}", encode(b"opaque"));
        assert_eq!(decode_photo(&raw, 1024).unwrap().mime_type, "image/jpeg");

        let raw = format!("data:image/webp;base64,{}", encode(b"opaque"));
        assert_eq!(decode_photo(&raw, 1024).unwrap().mime_type, "image/webp");

        assert_eq!(
            decode_photo(&encode(b"opaque"), 1024).unwrap().mime_type,
            DEFAULT_PHOTO_MIME
        );
    }

    #[test]
    fn rejects_bad_payloads() {
        assert_eq!(
            decode_photo("data:image/png;base64,", 1024),
            Err(PhotoError::Empty)
        );
        assert!(matches!(
            decode_photo("not base64 at all!", 1024),
            Err(PhotoError::InvalidBase64(_))
        ));
        assert_eq!(
            decode_photo(&encode(PNG_MAGIC), 4),
            Err(PhotoError::TooLarge {
                actual: PNG_MAGIC.len(),
                limit: 4
            })
        );
        assert!(matches!(
            decode_photo(&encode(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3"), 1024),
            Err(PhotoError::NotAnImage(_))
        ));
    }

    #[test]
    fn detects_heic_brand() {
        let mut data = vec![0, 0, 0, 24];
        data.extend_from_slice(b"ftypheic");
        data.extend_from_slice(&[0; 8]);
        assert_eq!(detect_mime_type(&data).as_deref(), Some("image/heic"));
    }
}
