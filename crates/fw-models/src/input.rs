//! Batch submission inputs.

use thiserror::Error;
use url::Url;

/// Input rejected before any network call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("no image data provided")]
    EmptyImage,

    #[error("no video data provided")]
    EmptyVideo,

    #[error("no URL provided")]
    EmptyUrl,

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),
}

/// One batch submission payload. Exactly one payload per request.
#[derive(Debug, Clone)]
pub enum BatchInput {
    /// Raw image bytes (JPEG/PNG as produced by the consumer).
    Image(Vec<u8>),
    /// Raw video file bytes.
    Video(Vec<u8>),
    /// Remote image URL the service fetches itself.
    RemoteUrl(String),
}

impl BatchInput {
    /// Validate the payload before it reaches the transport layer.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            BatchInput::Image(bytes) if bytes.is_empty() => Err(ValidationError::EmptyImage),
            BatchInput::Video(bytes) if bytes.is_empty() => Err(ValidationError::EmptyVideo),
            BatchInput::RemoteUrl(url) => {
                let trimmed = url.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::EmptyUrl);
                }
                Url::parse(trimmed)
                    .map(|_| ())
                    .map_err(|_| ValidationError::InvalidUrl(trimmed.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            BatchInput::Image(_) => "image",
            BatchInput::Video(_) => "video",
            BatchInput::RemoteUrl(_) => "url",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_non_empty_payloads() {
        assert!(BatchInput::Image(vec![0xFF, 0xD8]).validate().is_ok());
        assert!(BatchInput::Video(vec![0x00; 16]).validate().is_ok());
        assert!(BatchInput::RemoteUrl("https://example.com/fire.jpg".into())
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_payloads() {
        assert_eq!(
            BatchInput::Image(vec![]).validate(),
            Err(ValidationError::EmptyImage)
        );
        assert_eq!(
            BatchInput::Video(vec![]).validate(),
            Err(ValidationError::EmptyVideo)
        );
        assert_eq!(
            BatchInput::RemoteUrl("   ".into()).validate(),
            Err(ValidationError::EmptyUrl)
        );
    }

    #[test]
    fn test_validate_rejects_unparseable_url() {
        assert!(matches!(
            BatchInput::RemoteUrl("not a url".into()).validate(),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(BatchInput::Image(vec![1]).kind(), "image");
        assert_eq!(BatchInput::Video(vec![1]).kind(), "video");
        assert_eq!(BatchInput::RemoteUrl("x".into()).kind(), "url");
    }
}
