//! Pipe bridge between the decode loop and the consumer
//!
//! **Ownership:**
//! - The read end is consumed by [`PipeBridge::bind_as_input`]; after the
//!   redirect only fd 0 (and the consumer's copy of it) refer to it.
//! - The write end belongs to the decode loop for the whole session.
//!   Dropping it is what signals end-of-stream to the consumer.
//!
//! Both ends are created close-on-exec, so decoder processes never
//! inherit them.

use crate::error::{Result, StreamError};
use nix::libc::STDIN_FILENO;
use nix::unistd::dup2;
use std::io::{self, PipeReader};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::process::Stdio;
use tokio::net::unix::pipe::Sender;
use tracing::{debug, warn};

/// Both ends of a freshly created pipe
#[derive(Debug)]
pub struct PipeEndpoints {
    /// Blocking read end, destined for the consumer's stdin
    pub read_end: PipeReader,
    /// Non-blocking write end driven by the tokio reactor
    pub write_end: Sender,
}

/// Creates the session pipe and redirects stdin onto it
pub struct PipeBridge;

impl PipeBridge {
    /// Create a pipe
    ///
    /// Must be called from within a tokio runtime (the write end is
    /// registered with the reactor).
    pub fn acquire() -> Result<PipeEndpoints> {
        let (read_end, writer) =
            io::pipe().map_err(|e| StreamError::resource("failed to create pipe", e))?;
        let write_end = Sender::from_owned_fd(OwnedFd::from(writer))
            .map_err(|e| StreamError::resource("failed to register pipe write end", e))?;

        debug!(
            read_fd = read_end.as_fd().as_raw_fd(),
            write_fd = write_end.as_raw_fd(),
            "Pipe created"
        );

        Ok(PipeEndpoints {
            read_end,
            write_end,
        })
    }

    /// Substitute this process's stdin with `read_end`
    ///
    /// The original stdin comes back when the returned guard is released
    /// or dropped. `read_end` itself is closed once duplicated onto fd 0.
    pub fn bind_as_input(read_end: PipeReader) -> Result<StdinRedirect> {
        StdinRedirect::bind(read_end)
    }
}

/// Scoped stdin redirection
///
/// Restores the saved stdin on [`release`](Self::release) or on drop,
/// whichever comes first.
#[must_use = "dropping the guard restores stdin immediately"]
#[derive(Debug)]
pub struct StdinRedirect {
    saved: Option<OwnedFd>,
}

impl StdinRedirect {
    fn bind(read_end: PipeReader) -> Result<Self> {
        let saved = io::stdin()
            .as_fd()
            .try_clone_to_owned()
            .map_err(|e| StreamError::resource("failed to save stdin", e))?;

        dup2(read_end.as_fd().as_raw_fd(), STDIN_FILENO)
            .map_err(|e| StreamError::resource("failed to redirect stdin to pipe", e))?;
        drop(read_end);

        debug!(saved_fd = saved.as_raw_fd(), "stdin redirected to pipe");
        Ok(Self { saved: Some(saved) })
    }

    /// A fresh duplicate of the redirected stdin, for a child process
    pub fn consumer_input(&self) -> Result<Stdio> {
        let fd = io::stdin()
            .as_fd()
            .try_clone_to_owned()
            .map_err(|e| StreamError::resource("failed to duplicate redirected stdin", e))?;
        Ok(Stdio::from(fd))
    }

    /// Restore the original stdin now, reporting failure
    pub fn release(mut self) -> Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        let Some(saved) = self.saved.take() else {
            return Ok(());
        };
        dup2(saved.as_raw_fd(), STDIN_FILENO)
            .map_err(|e| StreamError::resource("failed to restore stdin", e))?;
        debug!("stdin restored");
        Ok(())
    }
}

impl Drop for StdinRedirect {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(error = %e, "stdin restore on drop failed");
        }
    }
}
