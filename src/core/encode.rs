use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::error::AppError;

/// Payload the generation client sends inline: the whole image as base64
/// plus its declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub base64: String,
    pub mime_type: String,
}

impl EncodedImage {
    /// Preview handle for the webview. Dropping the owning `SelectedImage`
    /// releases it.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Reads the whole file into memory and encodes it. No size limit is
/// enforced here; the service rejects oversized payloads.
pub async fn encode_file(path: &Path) -> Result<EncodedImage, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::encoding(format!("read {}: {e}", path.display())))?;

    Ok(EncodedImage {
        base64: STANDARD.encode(&bytes),
        mime_type: mime_for_path(path).to_string(),
    })
}

/// Accepts either a bare base64 string or a full `data:<mime>;base64,<data>`
/// URL (as produced by webview file readers) and strips the prefix when
/// present. The payload is decoded once to reject unreadable input early.
pub fn from_data_url(input: &str, fallback_mime: &str) -> Result<EncodedImage, AppError> {
    let (mime_type, payload) = match input.strip_prefix("data:") {
        None => (fallback_mime, input),
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| AppError::encoding("data url without payload separator"))?;
            match header.strip_suffix(";base64") {
                Some(mime) if !mime.is_empty() => (mime, payload),
                Some(_) => (fallback_mime, payload),
                None => return Err(AppError::encoding("data url is not base64 encoded")),
            }
        }
    };

    STANDARD
        .decode(payload)
        .map_err(|e| AppError::encoding(format!("invalid base64 payload: {e}")))?;

    Ok(EncodedImage {
        base64: payload.to_string(),
        mime_type: mime_type.to_string(),
    })
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("alttext-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join(name);
        std::fs::write(&path, bytes).expect("write");
        path
    }

    #[tokio::test]
    async fn encode_roundtrips_exact_bytes() {
        let bytes: Vec<u8> = (0u8..=255).cycle().take(1024).collect();
        let path = temp_file("sample.png", &bytes);

        let encoded = encode_file(&path).await.expect("encode");
        assert_eq!(encoded.mime_type, "image/png");
        let decoded = STANDARD.decode(&encoded.base64).expect("decode");
        assert_eq!(decoded, bytes);
    }

    #[tokio::test]
    async fn missing_file_is_an_encoding_error() {
        let path = std::env::temp_dir().join(format!("alttext-missing-{}", Uuid::new_v4()));
        let err = encode_file(&path).await.expect_err("must fail");
        assert!(matches!(err, AppError::Encoding { .. }));
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        let payload = STANDARD.encode(b"pixels");
        let input = format!("data:image/webp;base64,{payload}");
        let encoded = from_data_url(&input, "image/png").expect("parse");
        assert_eq!(encoded.mime_type, "image/webp");
        assert_eq!(encoded.base64, payload);
    }

    #[test]
    fn bare_base64_uses_fallback_mime() {
        let payload = STANDARD.encode(b"pixels");
        let encoded = from_data_url(&payload, "image/jpeg").expect("parse");
        assert_eq!(encoded.mime_type, "image/jpeg");
        assert_eq!(encoded.base64, payload);
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let err = from_data_url("data:image/png;base64,@@not base64@@", "image/png")
            .expect_err("must fail");
        assert!(matches!(err, AppError::Encoding { .. }));

        let err = from_data_url("data:image/png,plaintext", "image/png").expect_err("must fail");
        assert!(matches!(err, AppError::Encoding { .. }));
    }

    #[test]
    fn mime_inference_covers_common_extensions() {
        assert_eq!(mime_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.gif")), "image/gif");
        assert_eq!(mime_for_path(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("a.unknown")), "application/octet-stream");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }
}
