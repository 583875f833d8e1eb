//! Per-track decoder process
//!
//! One external decoder is spawned per playlist entry. Its stdout is
//! forwarded to the session sink chunk by chunk; nothing is buffered
//! beyond a single chunk. stderr is collected on a separate task so a
//! chatty decoder cannot stall on a full diagnostics pipe.
//!
//! **Failure handling:**
//! - Non-zero exit: [`StreamError::Decoder`] with the trimmed stderr text
//! - Sink write failure: the decoder is killed and reaped, then
//!   [`StreamError::Resource`] is returned
//! - The sink is never closed here

use crate::config::StreamConfiguration;
use crate::error::{Result, StreamError};
use crate::stream::process::exit_code;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Decodes tracks with the configured decoder executable
#[derive(Debug, Clone, Copy)]
pub struct TrackDecoder<'a> {
    config: &'a StreamConfiguration,
}

/// Where a forwarding loop broke
#[derive(Debug)]
enum ForwardError {
    /// Reading the decoder's stdout failed
    Read(io::Error),
    /// Writing to the sink failed
    Write(io::Error),
}

impl<'a> TrackDecoder<'a> {
    pub fn new(config: &'a StreamConfiguration) -> Self {
        Self { config }
    }

    /// Decode `track` and forward its PCM into `sink`
    ///
    /// Returns the number of bytes forwarded. Bytes already forwarded
    /// before a failure stay in the sink.
    pub async fn decode<W>(&self, track: &Path, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut child = Command::new(&self.config.decoder_path)
            .args(self.config.decoder_args(track))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                StreamError::resource(
                    format!(
                        "failed to spawn decoder {} for {}",
                        self.config.decoder_path.display(),
                        track.display()
                    ),
                    e,
                )
            })?;

        debug!(track = %track.display(), pid = ?child.id(), "Decoder started");

        let (Some(mut stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            terminate(&mut child, track).await;
            return Err(StreamError::Resource(format!(
                "decoder for {} started without captured output",
                track.display()
            )));
        };
        let diagnostics = tokio::spawn(collect_diagnostics(stderr));

        let forwarded = forward(&mut stdout, sink, self.config.chunk_size).await;
        drop(stdout);

        let forwarded = match forwarded {
            Ok(bytes) => bytes,
            Err(failure) => {
                terminate(&mut child, track).await;
                diagnostics.abort();
                return Err(match failure {
                    ForwardError::Write(e) => StreamError::resource(
                        format!("pipe write failed while streaming {}", track.display()),
                        e,
                    ),
                    ForwardError::Read(e) => StreamError::resource(
                        format!("failed to read decoder output for {}", track.display()),
                        e,
                    ),
                });
            }
        };

        let status = child.wait().await.map_err(|e| {
            StreamError::resource(format!("failed to wait for decoder of {}", track.display()), e)
        })?;
        let message = join_diagnostics(diagnostics, track).await;

        if !status.success() {
            let code = exit_code(status);
            warn!(track = %track.display(), exit_code = code, "Decoder failed");
            return Err(StreamError::Decoder {
                track: track.to_path_buf(),
                code,
                message,
            });
        }

        debug!(track = %track.display(), bytes = forwarded, "Decoder finished");
        Ok(forwarded)
    }
}

/// Copy `source` into `sink` one bounded chunk at a time
async fn forward<R, W>(
    source: &mut R,
    sink: &mut W,
    chunk_size: usize,
) -> std::result::Result<u64, ForwardError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut chunk = vec![0u8; chunk_size];
    let mut total = 0u64;
    loop {
        let n = source.read(&mut chunk).await.map_err(ForwardError::Read)?;
        if n == 0 {
            break;
        }
        sink.write_all(&chunk[..n]).await.map_err(ForwardError::Write)?;
        total += n as u64;
    }
    sink.flush().await.map_err(ForwardError::Write)?;
    Ok(total)
}

/// Read all of stderr, lossily decoded and trimmed
async fn collect_diagnostics(mut stderr: ChildStderr) -> String {
    let mut buf = Vec::new();
    if let Err(e) = stderr.read_to_end(&mut buf).await {
        debug!(error = %e, "Decoder stderr read ended early");
    }
    String::from_utf8_lossy(&buf).trim().to_string()
}

/// Collected stderr text, empty if the collector task was lost
async fn join_diagnostics(collector: JoinHandle<String>, track: &Path) -> String {
    match collector.await {
        Ok(text) => text,
        Err(e) => {
            debug!(track = %track.display(), error = %e, "Decoder stderr collector lost");
            String::new()
        }
    }
}

/// Kill and reap a decoder that is being abandoned
async fn terminate(child: &mut Child, track: &Path) {
    if let Err(e) = child.start_kill() {
        debug!(track = %track.display(), error = %e, "Decoder kill failed (already exited?)");
    }
    match child.wait().await {
        Ok(status) => debug!(
            track = %track.display(),
            exit_code = exit_code(status),
            "Abandoned decoder reaped"
        ),
        Err(e) => warn!(track = %track.display(), error = %e, "Failed to reap decoder"),
    }
}
