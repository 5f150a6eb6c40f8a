//! Image attachments encoded for inline transport

use crate::base::{ProviderError, ProviderResult};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use std::path::Path;
use tracing::debug;

/// MIME type assumed when the file extension says nothing useful
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// A base64-encoded image and its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    /// Base64 payload, without any data URI prefix
    pub data: String,
}

impl ImageData {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, BASE64_STANDARD.encode(bytes))
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parse a `data:` URI back into its parts
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime_type = header
            .split(';')
            .next()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME);
        Some(Self::new(mime_type, payload))
    }
}

/// The payload after the data URI comma separator
pub fn payload_from_data_uri(uri: &str) -> Option<&str> {
    uri.split_once(',').map(|(_, payload)| payload)
}

/// Guess an image MIME type from the file extension
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        _ => DEFAULT_IMAGE_MIME,
    }
}

/// Read an image file and base64-encode it
pub async fn encode_file_as_base64(path: impl AsRef<Path>) -> ProviderResult<ImageData> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ProviderError::ImageError(format!("Failed to read '{}': {}", path.display(), e))
    })?;
    if bytes.is_empty() {
        return Err(ProviderError::ImageError(format!(
            "'{}' is empty",
            path.display()
        )));
    }

    let image = ImageData::from_bytes(mime_from_path(path), &bytes);
    debug!(
        path = %path.display(),
        mime = %image.mime_type,
        bytes = bytes.len(),
        "Encoded image"
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_data_uri_round_trip() {
        let image = ImageData::from_bytes("image/png", b"\x89PNG");
        let uri = image.to_data_uri();
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
        assert_eq!(payload_from_data_uri(&uri), Some("iVBORw=="));
        assert_eq!(ImageData::from_data_uri(&uri), Some(image));
    }

    #[test]
    fn test_from_data_uri_rejects_other_strings() {
        assert!(ImageData::from_data_uri("hello").is_none());
        assert!(ImageData::from_data_uri("data:image/png;base64").is_none());
        assert_eq!(
            ImageData::from_data_uri("data:;base64,AA").unwrap().mime_type,
            DEFAULT_IMAGE_MIME
        );
    }

    #[test]
    fn test_mime_from_path() {
        assert_eq!(mime_from_path(Path::new("dash.PNG")), "image/png");
        assert_eq!(mime_from_path(Path::new("car.jpg")), "image/jpeg");
        assert_eq!(mime_from_path(Path::new("noext")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_encode_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gauge.webp");
        std::fs::write(&path, b"abc").unwrap();

        let image = encode_file_as_base64(&path).await.unwrap();
        assert_eq!(image.mime_type, "image/webp");
        assert_eq!(image.data, "YWJj");
    }

    #[tokio::test]
    async fn test_encode_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = encode_file_as_base64(temp_dir.path().join("missing.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ImageError(_)));
    }
}
