//! Core types for image generation.

use crate::error::{JobPostError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG format (lossy).
    #[default]
    Jpeg,
    /// PNG format (lossless).
    Png,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the file extension used when exporting this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Parses a MIME type such as `image/jpeg`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Aspect ratios accepted by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square aspect ratio.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 landscape aspect ratio.
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait aspect ratio.
    #[serde(rename = "9:16")]
    Portrait,
    /// 4:3 standard landscape aspect ratio.
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4 standard portrait aspect ratio.
    #[serde(rename = "3:4")]
    StandardPortrait,
}

impl AspectRatio {
    /// Returns the aspect ratio as a string (e.g., "1:1").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to render one or more images from a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// How many images to render.
    pub number_of_images: u32,
    /// Requested aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Requested output format.
    pub format: ImageFormat,
}

impl ImageRequest {
    /// Creates a request for a single square JPEG.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            number_of_images: 1,
            aspect_ratio: AspectRatio::default(),
            format: ImageFormat::default(),
        }
    }

    /// Sets how many images to render.
    pub fn with_count(mut self, count: u32) -> Self {
        self.number_of_images = count;
        self
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Sets the desired output format.
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }
}

/// One rendered image exactly as the provider returned it.
///
/// The bytes stay base64-encoded; they are only decoded on export.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "image payload should be displayed or exported"]
pub struct ImagePayload {
    /// Base64-encoded image bytes.
    pub data: String,
    /// Image format.
    pub format: ImageFormat,
}

impl ImagePayload {
    /// Creates a payload from base64 text.
    pub fn new(data: impl Into<String>, format: ImageFormat) -> Self {
        Self {
            data: data.into(),
            format,
        }
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.data)
    }

    /// Decodes the base64 payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.data.trim())
            .map_err(|e| JobPostError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(
            ImageFormat::from_mime_type("image/jpeg"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_mime_type("IMAGE/PNG"),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn test_request_defaults() {
        let req = ImageRequest::new("A cat");
        assert_eq!(req.number_of_images, 1);
        assert_eq!(req.aspect_ratio, AspectRatio::Square);
        assert_eq!(req.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_payload_data_url() {
        let payload = ImagePayload::new("/9j/4AAQ", ImageFormat::Jpeg);
        assert_eq!(payload.to_data_url(), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn test_payload_decode() {
        let payload = ImagePayload::new("/9j/4A==", ImageFormat::Jpeg);
        let bytes = payload.decode().unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);

        let bad = ImagePayload::new("not base64!!", ImageFormat::Jpeg);
        assert!(matches!(bad.decode(), Err(JobPostError::Decode(_))));
    }
}
