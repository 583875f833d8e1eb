//! # fmcast Transmitter Library (fmcast-tx)
//!
//! Streams an ordered playlist to a transmitter process as one continuous
//! headered PCM byte stream.
//!
//! **Purpose:** Decode each track with an external decoder (ffmpeg), forward
//! the raw samples through an OS pipe wired to the transmitter's stdin, and
//! reconcile decoder and transmitter outcomes into one result.
//!
//! **Architecture:** One long-lived consumer process supervised on its own
//! tokio task, fed by a sequential decode-and-forward loop.

pub mod config;
pub mod error;
pub mod stream;

pub use config::StreamConfiguration;
pub use error::{Result, StreamError};
pub use stream::{run, SessionReport};
