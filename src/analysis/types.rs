// Core types for the analysis pipeline

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Prompt sent when the user leaves the prompt field empty
pub const FALLBACK_PROMPT: &str = "Analyze and describe the image(s)";

/// Resolve the prompt actually sent for one image
pub fn effective_prompt(prompt: &str) -> &str {
    if prompt.is_empty() {
        FALLBACK_PROMPT
    } else {
        prompt
    }
}

/// Image formats accepted by the uploader
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Detect the kind from a file extension; `None` for anything outside jpg/jpeg/png
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }

    pub fn as_image_format(&self) -> image::ImageFormat {
        match self {
            ImageKind::Jpeg => image::ImageFormat::Jpeg,
            ImageKind::Png => image::ImageFormat::Png,
        }
    }
}

/// A decoded upload, ready to be sent to the generation client.
///
/// Cloning is cheap: the encoded bytes are shared.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pub filename: String,
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    bytes: Arc<[u8]>,
}

impl ImageHandle {
    pub fn new(
        filename: impl Into<String>,
        kind: ImageKind,
        width: u32,
        height: u32,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            kind,
            width,
            height,
            bytes: bytes.into(),
        }
    }

    /// Encoded file contents as uploaded
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }
}

/// One user-triggered batch: a prompt plus the images it applies to
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub prompt: String,
    pub images: Vec<ImageHandle>,
}

impl AnalysisRequest {
    pub fn new(prompt: impl Into<String>, images: Vec<ImageHandle>) -> Self {
        Self {
            prompt: prompt.into(),
            images,
        }
    }
}

/// What happened to one image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "status", content = "text")]
pub enum Outcome {
    Success(String),
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Result for the image at `index` of the request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub index: usize,
    pub filename: String,
    pub outcome: Outcome,
}

impl AnalysisResult {
    pub fn success(index: usize, filename: impl Into<String>, text: String) -> Self {
        Self {
            index,
            filename: filename.into(),
            outcome: Outcome::Success(text),
        }
    }

    pub fn failed(index: usize, filename: impl Into<String>, error: String) -> Self {
        Self {
            index,
            filename: filename.into(),
            outcome: Outcome::Failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_prompt_fallback() {
        assert_eq!(effective_prompt(""), FALLBACK_PROMPT);
        assert_eq!(effective_prompt("Describe the cats"), "Describe the cats");
    }

    #[test]
    fn test_whitespace_prompt_is_sent_as_is() {
        assert_eq!(effective_prompt("  "), "  ");
    }

    #[test]
    fn test_effective_prompt_compares_by_value() {
        let built = String::from_utf8(Vec::new()).unwrap();
        assert_eq!(effective_prompt(&built), FALLBACK_PROMPT);
    }

    #[test]
    fn test_image_kind_detection() {
        assert_eq!(ImageKind::from_extension("JPG"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("jpeg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("png"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_extension("gif"), None);
        assert_eq!(ImageKind::Png.mime_type(), "image/png");
    }

    #[test]
    fn test_handle_clone_shares_bytes() {
        let handle = ImageHandle::new("a.png", ImageKind::Png, 1, 1, vec![1u8, 2, 3]);
        let copy = handle.clone();
        assert!(std::ptr::eq(handle.bytes(), copy.bytes()));
    }

    #[test]
    fn test_outcome_serialization() {
        let result = AnalysisResult::success(0, "cat.jpg", "A cat".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"]["status"], "success");
        assert_eq!(json["outcome"]["text"], "A cat");
    }
}
