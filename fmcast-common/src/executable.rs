//! External executable resolution
//!
//! Used as a preflight check before launching decoder and consumer
//! processes, so a missing tool is reported as a configuration problem
//! rather than a failure halfway through a session.

use crate::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Resolve a program to the file that would be executed
///
/// A program with a directory component (`./tool`, `/usr/bin/tool`) must
/// name an executable file directly. A bare name is searched on `PATH`.
pub fn resolve_executable(program: &Path) -> Result<PathBuf> {
    if program.as_os_str().is_empty() {
        return Err(Error::InvalidInput("executable path is empty".to_string()));
    }

    if program.components().count() > 1 {
        return if is_executable(program) {
            Ok(program.to_path_buf())
        } else {
            Err(Error::NotFound(format!(
                "{} is not an executable file",
                program.display()
            )))
        };
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    search_path(program.as_os_str(), &path_var).ok_or_else(|| {
        Error::NotFound(format!("{} not found on PATH", program.display()))
    })
}

fn search_path(name: &OsStr, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
