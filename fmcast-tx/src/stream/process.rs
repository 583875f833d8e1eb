//! Exit status helpers shared by decoder and consumer supervision

use std::process::ExitStatus;

/// Numeric exit code for a finished process
///
/// A process killed by a signal has no exit code; it is reported as
/// `128 + signal`, the shell convention.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
