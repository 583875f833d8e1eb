//! Consumer (transmitter) process supervision
//!
//! The consumer is spawned once per session and runs for its whole
//! duration, reading the header and PCM from its stdin. A dedicated tokio
//! task waits on it; the exit status travels back through a oneshot
//! channel, so it is written exactly once and read exactly once.

use crate::config::StreamConfiguration;
use crate::error::{Result, StreamError};
use crate::stream::process::exit_code;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Handle to a running consumer
#[derive(Debug)]
pub struct ConsumerProcess {
    program: PathBuf,
    pid: Option<u32>,
    exit: oneshot::Receiver<io::Result<ExitStatus>>,
}

impl ConsumerProcess {
    /// Spawn the consumer reading from `input`
    ///
    /// stdout and stderr are inherited so the consumer's own output reaches
    /// the terminal. Must be called from within a tokio runtime.
    pub fn start(config: &StreamConfiguration, input: Stdio) -> Result<Self> {
        let program = config.consumer_path.clone();

        let mut command = Command::new(&program);
        command
            .args(config.consumer_args())
            .stdin(input)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = command.spawn().map_err(|e| {
            StreamError::resource(format!("failed to spawn consumer {}", program.display()), e)
        })?;
        // Closes this process's copy of the input descriptor
        drop(command);

        let pid = child.id();
        info!(
            pid = ?pid,
            program = %program.display(),
            frequency = %config.frequency_arg(),
            "Consumer started"
        );

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let status = child.wait().await;
            if tx.send(status).is_err() {
                debug!("Consumer exited after its handle was dropped");
            }
        });

        Ok(Self {
            program,
            pid,
            exit: rx,
        })
    }

    /// OS process id, if the process was still running when spawned
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the consumer to exit and return its exit code
    ///
    /// Signal terminations are reported as `128 + signal`.
    pub async fn join(self) -> Result<i32> {
        let status = self
            .exit
            .await
            .map_err(|_| {
                StreamError::Resource(format!(
                    "supervisor for {} stopped without reporting an exit status",
                    self.program.display()
                ))
            })?
            .map_err(|e| StreamError::resource("failed to wait for consumer", e))?;

        let code = exit_code(status);
        if code == 0 {
            info!(pid = ?self.pid, "Consumer exited cleanly");
        } else {
            warn!(pid = ?self.pid, exit_code = code, "Consumer exited with failure");
        }
        Ok(code)
    }
}
