//! Test fixtures for fmcast-tx integration tests
//!
//! Stands in for ffmpeg and fm_transmitter with small `/bin/sh` scripts:
//! - FakeDecoder: logs each spawn and its pid, `cat`s the track file to
//!   stdout, fails (exit 3, message on stderr) for any track whose name
//!   contains "fail"
//! - FakeConsumer: logs its arguments, copies stdin to a capture file,
//!   logs "eof", then exits with a chosen code
//!
//! Tests that spawn these run under #[serial]: scripts are written and then
//! executed, and a concurrent fork could otherwise hold them open for
//! writing (ETXTBSY).

#![allow(dead_code)]

use fmcast_tx::StreamConfiguration;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory with fake executables and track files
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write an executable shell script
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod script");
        path
    }

    /// Write a track file with `len` bytes of a pattern seeded by `seed`
    pub fn track(&self, name: &str, seed: u8, len: usize) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, pcm_pattern(seed, len)).expect("Failed to write track");
        path
    }

    /// ffmpeg stand-in; track path is argument 5
    pub fn decoder(&self) -> PathBuf {
        let log = self.decoder_log();
        let args = self.path("decoder.args");
        let pids = self.decoder_pid_log();
        self.script(
            "fake-decoder",
            &format!(
                r#"track="$5"
printf '%s\n' "$track" >> '{log}'
printf '%s\n' "$*" >> '{args}'
printf '%s\n' "$$" >> '{pids}'
case "$track" in
  *fail*) printf '  cannot decode %s  \n' "$track" >&2; exit 3 ;;
esac
exec cat "$track""#,
                log = log.display(),
                args = args.display(),
                pids = pids.display(),
            ),
        )
    }

    /// fm_transmitter stand-in reading all of stdin
    pub fn consumer(&self, exit_code: i32) -> PathBuf {
        let log = self.consumer_log();
        let capture = self.capture_path();
        self.script(
            "fake-consumer",
            &format!(
                r#"printf 'args %s\n' "$*" >> '{log}'
cat > '{capture}'
printf 'eof\n' >> '{log}'
exit {exit_code}"#,
                log = log.display(),
                capture = capture.display(),
                exit_code = exit_code,
            ),
        )
    }

    /// Consumer that exits without reading its input
    pub fn early_exit_consumer(&self) -> PathBuf {
        let log = self.consumer_log();
        self.script(
            "early-consumer",
            &format!(
                "printf 'started\\n' >> '{log}'\nexit 0",
                log = log.display()
            ),
        )
    }

    pub fn decoder_log(&self) -> PathBuf {
        self.path("decoder.log")
    }

    pub fn decoder_pid_log(&self) -> PathBuf {
        self.path("decoder.pids")
    }

    pub fn consumer_log(&self) -> PathBuf {
        self.path("consumer.log")
    }

    pub fn capture_path(&self) -> PathBuf {
        self.path("consumer.capture")
    }

    /// Tracks the fake decoder was spawned for, in spawn order
    pub fn decoder_spawns(&self) -> Vec<PathBuf> {
        read_lines(&self.decoder_log()).into_iter().map(PathBuf::from).collect()
    }

    /// Pids of every fake decoder that got as far as running
    pub fn decoder_pids(&self) -> Vec<u32> {
        read_lines(&self.decoder_pid_log())
            .iter()
            .map(|line| line.parse().expect("Malformed pid line"))
            .collect()
    }

    pub fn consumer_log_lines(&self) -> Vec<String> {
        read_lines(&self.consumer_log())
    }

    /// Bytes the fake consumer received on stdin
    pub fn captured(&self) -> Vec<u8> {
        std::fs::read(self.capture_path()).unwrap_or_default()
    }

    /// Session configuration wired to the fake executables
    pub fn config(&self, consumer: &Path) -> StreamConfiguration {
        StreamConfiguration::new(100.1)
            .with_decoder(self.decoder())
            .with_consumer(consumer)
    }
}

/// True while `pid` has a process table entry, zombies included
pub fn process_exists(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

/// Deterministic bytes distinct per seed
pub fn pcm_pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| seed.wrapping_mul(31).wrapping_add((i % 253) as u8))
        .collect()
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
