//! Error types for fmcast-tx
//!
//! One variant per failure class of a streaming session. A session surfaces
//! exactly one of these to its caller.

use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fmcast-tx
#[derive(Error, Debug)]
pub enum StreamError {
    /// Empty playlist, invalid settings or a missing executable.
    /// Raised before any pipe or process exists.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Pipe, descriptor, spawn or mid-stream write failure
    #[error("Resource error: {0}")]
    Resource(String),

    /// A decoder process exited non-zero
    #[error("Decoder failed on {} with code {code}: {message}", .track.display())]
    Decoder {
        track: PathBuf,
        code: i32,
        /// Decoder stderr, trimmed
        message: String,
    },

    /// The consumer process exited non-zero
    #[error("Consumer exited with code {code}")]
    Consumer { code: i32 },
}

impl StreamError {
    /// Resource error with the underlying system error text
    pub fn resource(context: impl Display, err: impl Display) -> Self {
        Self::Resource(format!("{}: {}", context, err))
    }
}

impl From<fmcast_common::Error> for StreamError {
    fn from(err: fmcast_common::Error) -> Self {
        match err {
            fmcast_common::Error::Io(e) => Self::Resource(e.to_string()),
            fmcast_common::Error::Config(msg)
            | fmcast_common::Error::NotFound(msg)
            | fmcast_common::Error::InvalidInput(msg) => Self::Configuration(msg),
        }
    }
}

/// Convenience Result type using StreamError
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_carries_system_text() {
        let io = std::io::Error::from_raw_os_error(32);
        let err = StreamError::resource("pipe write failed", &io);
        let text = err.to_string();
        assert!(text.starts_with("Resource error: pipe write failed: "));
        assert!(text.contains(&io.to_string()));
    }

    #[test]
    fn test_decoder_display() {
        let err = StreamError::Decoder {
            track: PathBuf::from("/music/b.mp3"),
            code: 1,
            message: "Invalid data found when processing input".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Decoder failed on /music/b.mp3 with code 1: Invalid data found when processing input"
        );
    }

    #[test]
    fn test_consumer_display() {
        let err = StreamError::Consumer { code: 3 };
        assert_eq!(err.to_string(), "Consumer exited with code 3");
    }

    #[test]
    fn test_common_errors_map_to_configuration() {
        let err: StreamError = fmcast_common::Error::NotFound("ffmpeg not found on PATH".into()).into();
        assert!(matches!(err, StreamError::Configuration(ref m) if m.contains("ffmpeg")));

        let err: StreamError = fmcast_common::Error::Config("bad".into()).into();
        assert!(matches!(err, StreamError::Configuration(_)));
    }

    #[test]
    fn test_common_io_maps_to_resource() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: StreamError = fmcast_common::Error::Io(io).into();
        assert!(matches!(err, StreamError::Resource(ref m) if m == "boom"));
    }
}
