//! Streaming session orchestration
//!
//! **Session sequence:**
//! 1. Reject an empty playlist or invalid configuration (nothing spawned yet)
//! 2. Create the pipe, redirect stdin onto its read end, start the consumer
//! 3. Write the streaming header
//! 4. Decode tracks strictly in order, stopping at the first failure
//! 5. Close the write end (end-of-stream) and join the consumer
//! 6. Reconcile: a decode-phase error wins over a consumer failure
//!
//! The consumer runs on its own task for the whole session while this
//! task decodes and writes. The write end has a single writer.

use crate::config::StreamConfiguration;
use crate::error::{Result, StreamError};
use crate::stream::consumer::ConsumerProcess;
use crate::stream::decoder::TrackDecoder;
use crate::stream::header::{StreamHeader, HEADER_LEN};
use crate::stream::pipe::{PipeBridge, PipeEndpoints};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Summary of a successful session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub tracks_streamed: usize,
    /// Header plus all PCM bytes written to the consumer
    pub bytes_written: u64,
    pub consumer_exit_code: i32,
}

/// Both halves of a session's result, reconciled once both are known
#[derive(Debug, Default)]
pub struct SessionOutcome {
    pub consumer_exit_code: Option<i32>,
    pub first_failure: Option<StreamError>,
}

impl SessionOutcome {
    /// Keep the earliest failure; later ones are logged and dropped
    pub fn record_failure(&mut self, err: StreamError) {
        if self.first_failure.is_none() {
            self.first_failure = Some(err);
        } else {
            debug!(error = %err, "Suppressed secondary failure");
        }
    }

    /// Final verdict: decode failure, then consumer failure, then success
    pub fn finish(self) -> Result<i32> {
        if let Some(err) = self.first_failure {
            return Err(err);
        }
        match self.consumer_exit_code {
            Some(0) => Ok(0),
            Some(code) => Err(StreamError::Consumer { code }),
            None => Err(StreamError::Resource(
                "consumer exit status was never recorded".to_string(),
            )),
        }
    }
}

/// Bytes and tracks delivered by the decode phase
#[derive(Debug, Clone, Copy, Default)]
struct DecodeProgress {
    tracks: usize,
    bytes: u64,
}

/// Stream `playlist` to the configured consumer
///
/// Returns once the consumer has exited. On failure, exactly one error is
/// surfaced; whatever was written before it stays delivered.
pub async fn run<P>(playlist: &[P], config: &StreamConfiguration) -> Result<SessionReport>
where
    P: AsRef<Path>,
{
    if playlist.is_empty() {
        return Err(StreamError::Configuration("playlist is empty".to_string()));
    }
    config.validate()?;
    config.preflight()?;

    let session_id = Uuid::new_v4();
    let span = info_span!("session", %session_id);
    run_session(session_id, playlist, config)
        .instrument(span)
        .await
}

async fn run_session<P>(
    session_id: Uuid,
    playlist: &[P],
    config: &StreamConfiguration,
) -> Result<SessionReport>
where
    P: AsRef<Path>,
{
    info!(
        tracks = playlist.len(),
        frequency = %config.frequency_arg(),
        sample_rate = config.sample_rate,
        channels = config.channels,
        "Starting stream session"
    );

    let PipeEndpoints {
        read_end,
        mut write_end,
    } = PipeBridge::acquire()?;

    let redirect = PipeBridge::bind_as_input(read_end)?;
    let consumer = ConsumerProcess::start(config, redirect.consumer_input()?)?;

    // The consumer holds its own copy of the read end now. Restoring stdin
    // here leaves no reader in this process, so an early consumer exit
    // shows up as a failed write instead of a stalled one.
    let decoded = match redirect.release() {
        Ok(()) => stream_playlist(playlist, config, &mut write_end).await,
        Err(e) => Err(e),
    };

    // End-of-stream for the consumer
    drop(write_end);

    let mut outcome = SessionOutcome::default();
    let progress = match decoded {
        Ok(progress) => progress,
        Err(e) => {
            warn!(error = %e, "Decode phase aborted");
            outcome.record_failure(e);
            DecodeProgress::default()
        }
    };

    match consumer.join().await {
        Ok(code) => outcome.consumer_exit_code = Some(code),
        Err(e) => outcome.record_failure(e),
    }

    let consumer_exit_code = outcome.finish()?;
    info!(
        tracks = progress.tracks,
        bytes = progress.bytes,
        "Stream session complete"
    );

    Ok(SessionReport {
        session_id,
        tracks_streamed: progress.tracks,
        bytes_written: progress.bytes,
        consumer_exit_code,
    })
}

/// Header, then every track in order
async fn stream_playlist<P, W>(
    playlist: &[P],
    config: &StreamConfiguration,
    sink: &mut W,
) -> Result<DecodeProgress>
where
    P: AsRef<Path>,
    W: AsyncWrite + Unpin + ?Sized,
{
    let header = StreamHeader::build(config.sample_rate, config.channels, config.bits_per_sample)?;
    sink.write_all(header.as_bytes())
        .await
        .map_err(|e| StreamError::resource("failed to write stream header", e))?;

    let mut progress = DecodeProgress {
        tracks: 0,
        bytes: HEADER_LEN as u64,
    };

    let decoder = TrackDecoder::new(config);
    for (index, track) in playlist.iter().enumerate() {
        let track = track.as_ref();
        info!(
            track = %track.display(),
            position = index + 1,
            total = playlist.len(),
            "Streaming track"
        );

        progress.bytes += decoder.decode(track, sink).await?;
        progress.tracks += 1;
    }

    Ok(progress)
}
