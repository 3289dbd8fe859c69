// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera filter pipeline

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for per-frame operations
pub type FrameResult<T> = Result<T, FrameError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Per-frame analysis errors
    Frame(FrameError),
    /// Configuration errors
    Config(String),
    /// Frame source errors (capture thread, buffer pool)
    Source(String),
    /// Terminal preview errors
    Terminal(String),
    /// Generic error with message
    Other(String),
}

/// Errors raised while analyzing a single frame
///
/// All of these are local to the frame that caused them: the frame is dropped,
/// its buffer is released and the pipeline keeps accepting frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Pixel format or geometry is not usable for the requested operation
    UnsupportedFormat(String),
    /// Declared geometry does not match the length of the byte region
    BufferSizeMismatch { expected: usize, actual: usize },
    /// A transform failed on well-formed input (programming error)
    TransformFailure(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Frame(e) => write!(f, "Frame error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Source(msg) => write!(f, "Frame source error: {}", msg),
            AppError::Terminal(msg) => write!(f, "Terminal error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            FrameError::BufferSizeMismatch { expected, actual } => write!(
                f,
                "Buffer size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            FrameError::TransformFailure(msg) => write!(f, "Transform failure: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for FrameError {}

impl From<FrameError> for AppError {
    fn from(err: FrameError) -> Self {
        AppError::Frame(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_mismatch_display() {
        let err = FrameError::BufferSizeMismatch {
            expected: 24,
            actual: 20,
        };
        assert_eq!(
            err.to_string(),
            "Buffer size mismatch: expected 24 bytes, got 20"
        );
    }

    #[test]
    fn test_frame_error_converts_to_app_error() {
        let err: AppError = FrameError::UnsupportedFormat("RGBA".into()).into();
        assert_eq!(err, AppError::Frame(FrameError::UnsupportedFormat("RGBA".into())));
        assert!(err.to_string().starts_with("Frame error: "));
    }

    #[test]
    fn test_json_error_is_config_error() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: AppError = json_err.into();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error: "));
    }
}
