// Image decoder - turns uploaded files into handles the client can send

use super::types::{ImageHandle, ImageKind};
use std::path::Path;
use tracing::debug;

/// Decodes jpg/jpeg/png uploads into [`ImageHandle`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Read and decode an image from disk
    pub async fn decode_file(&self, path: impl AsRef<Path>) -> Result<ImageHandle, DecodeError> {
        let path = path.as_ref();

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());

        // Reject before reading so a large unsupported file costs nothing
        Self::detect_kind(&filename)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DecodeError::IoError(format!("{}: {}", path.display(), e)))?;

        self.decode_bytes(filename, bytes)
    }

    /// Decode raw uploaded bytes; the filename decides the accepted format
    pub fn decode_bytes(
        &self,
        filename: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<ImageHandle, DecodeError> {
        let filename = filename.into();
        let kind = Self::detect_kind(&filename)?;

        let decoded = image::load_from_memory_with_format(&bytes, kind.as_image_format())
            .map_err(|e| DecodeError::InvalidImage(format!("{}: {}", filename, e)))?;

        debug!(
            filename = %filename,
            width = decoded.width(),
            height = decoded.height(),
            "decoded upload"
        );

        Ok(ImageHandle::new(filename, kind, decoded.width(), decoded.height(), bytes))
    }

    fn detect_kind(filename: &str) -> Result<ImageKind, DecodeError> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageKind::from_extension)
            .ok_or_else(|| DecodeError::UnsupportedFormat(filename.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Unsupported format (expected jpg, jpeg or png): {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}
