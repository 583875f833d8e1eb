//! Streaming core
//!
//! Leaves first: [`pipe`] and [`header`] have no dependencies on the rest,
//! [`decoder`] and [`consumer`] supervise the external processes, and
//! [`orchestrator`] composes them into a session.

pub mod consumer;
pub mod decoder;
pub mod header;
pub mod orchestrator;
pub mod pipe;
pub mod process;

pub use consumer::ConsumerProcess;
pub use decoder::TrackDecoder;
pub use header::StreamHeader;
pub use orchestrator::{run, SessionOutcome, SessionReport};
pub use pipe::{PipeBridge, PipeEndpoints, StdinRedirect};
