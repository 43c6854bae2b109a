//! Error types for snap.
//!
//! Allocation and conversion failures are reported to the immediate caller as
//! explicit results. Precondition violations on the lane types (lane index out
//! of range, short slices) panic instead of being reported here.

use std::fmt;
use thiserror::Error;

/// Error codes covering every recoverable or fatal failure in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No supported instruction set, or the running CPU lacks the compiled one.
    Configuration,
    /// The aligned allocator could not satisfy a request.
    AllocationFailed,
    /// No conversion routine resolves for a format pairing.
    UnsupportedConversion,
    /// Source and destination dimensions are incompatible.
    SizeMismatch,
    /// A slice failed the alignment check of an aligned wrapper.
    Misaligned,
    /// A malformed argument, such as an inconsistent buffer description.
    InvalidArgument,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Configuration => write!(f, "CONFIGURATION"),
            ErrorCode::AllocationFailed => write!(f, "ALLOCATION_FAILED"),
            ErrorCode::UnsupportedConversion => write!(f, "UNSUPPORTED_CONVERSION"),
            ErrorCode::SizeMismatch => write!(f, "SIZE_MISMATCH"),
            ErrorCode::Misaligned => write!(f, "MISALIGNED"),
            ErrorCode::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
        }
    }
}

/// Main error type for snap operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct SnapError {
    code: ErrorCode,
    message: String,
}

impl SnapError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the error is fatal for the process (only configuration errors are).
    pub fn is_fatal(&self) -> bool {
        self.code == ErrorCode::Configuration
    }

    // Convenience constructors

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, msg)
    }

    /// Create an allocation failure error.
    pub fn allocation_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AllocationFailed, msg)
    }

    /// Create an unsupported conversion error.
    pub fn unsupported_conversion(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedConversion, msg)
    }

    /// Create a size mismatch error.
    pub fn size_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SizeMismatch, msg)
    }

    /// Create a misalignment error.
    pub fn misaligned(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Misaligned, msg)
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, msg)
    }
}

impl fmt::Display for SnapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Result type alias for snap operations.
pub type Result<T> = std::result::Result<T, SnapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SnapError::size_mismatch("matrix is 4x4, image is 8x8");
        assert_eq!(err.code(), ErrorCode::SizeMismatch);
        assert_eq!(err.message(), "matrix is 4x4, image is 8x8");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = SnapError::unsupported_conversion("BGR_24 -> GREY_8");
        let display = format!("{}", err);
        assert!(display.contains("UNSUPPORTED_CONVERSION"));
        assert!(display.contains("BGR_24 -> GREY_8"));
    }

    #[test]
    fn test_configuration_is_fatal() {
        assert!(SnapError::configuration("no SIMD").is_fatal());
        assert!(!SnapError::allocation_failed("oom").is_fatal());
    }
}
