//! fmcast-tx session configuration
//!
//! A [`StreamConfiguration`] is built once per session and never mutated
//! while the session runs.

use crate::error::{Result, StreamError};
use crate::stream::header::StreamHeader;
use fmcast_common::config::TomlConfig;
use fmcast_common::executable::resolve_executable;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Compiled default sample rate (Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Compiled default channel count
pub const DEFAULT_CHANNELS: u16 = 1;

/// Bit depth of the decoder output (s16le)
pub const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// Compiled default decoder executable
pub const DEFAULT_DECODER: &str = "ffmpeg";

/// Compiled default consumer executable
pub const DEFAULT_CONSUMER: &str = "fm_transmitter";

/// Read size when draining decoder output
pub const DEFAULT_CHUNK_SIZE: usize = 32_768;

/// Streaming session configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfiguration {
    /// Carrier frequency in MHz, forwarded to the consumer
    pub frequency_mhz: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub decoder_path: PathBuf,
    pub consumer_path: PathBuf,
    /// Upper bound on each read from a decoder's stdout
    pub chunk_size: usize,
}

/// Values supplied on the command line or through the environment
///
/// `None` means "not given" and defers to the TOML file, then the
/// compiled default.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub decoder_path: Option<PathBuf>,
    pub consumer_path: Option<PathBuf>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

impl StreamConfiguration {
    /// Configuration with compiled defaults for everything but the frequency
    pub fn new(frequency_mhz: f64) -> Self {
        Self {
            frequency_mhz,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
            decoder_path: PathBuf::from(DEFAULT_DECODER),
            consumer_path: PathBuf::from(DEFAULT_CONSUMER),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Layer command-line/env overrides over the TOML file over defaults
    pub fn resolve(frequency_mhz: f64, overrides: &ConfigOverrides, toml: &TomlConfig) -> Self {
        let defaults = Self::new(frequency_mhz);
        Self {
            decoder_path: overrides
                .decoder_path
                .clone()
                .or_else(|| toml.decoder_path.clone())
                .unwrap_or(defaults.decoder_path),
            consumer_path: overrides
                .consumer_path
                .clone()
                .or_else(|| toml.consumer_path.clone())
                .unwrap_or(defaults.consumer_path),
            sample_rate: overrides
                .sample_rate
                .or(toml.sample_rate)
                .unwrap_or(defaults.sample_rate),
            channels: overrides
                .channels
                .or(toml.channels)
                .unwrap_or(defaults.channels),
            chunk_size: toml.chunk_size.unwrap_or(defaults.chunk_size),
            ..defaults
        }
    }

    pub fn with_decoder(mut self, path: impl Into<PathBuf>) -> Self {
        self.decoder_path = path.into();
        self
    }

    pub fn with_consumer(mut self, path: impl Into<PathBuf>) -> Self {
        self.consumer_path = path.into();
        self
    }

    pub fn with_format(mut self, sample_rate: u32, channels: u16) -> Self {
        self.sample_rate = sample_rate;
        self.channels = channels;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Reject values the header and decoder contract cannot represent
    pub fn validate(&self) -> Result<()> {
        if !self.frequency_mhz.is_finite() || self.frequency_mhz <= 0.0 {
            return Err(StreamError::Configuration(format!(
                "frequency must be a positive number of MHz, got {}",
                self.frequency_mhz
            )));
        }
        if self.sample_rate == 0 {
            return Err(StreamError::Configuration("sample rate must be positive".into()));
        }
        if self.channels == 0 {
            return Err(StreamError::Configuration("channel count must be positive".into()));
        }
        // The decoder is always asked for s16le
        if self.bits_per_sample != DEFAULT_BITS_PER_SAMPLE {
            return Err(StreamError::Configuration(format!(
                "bits per sample must be {}, got {}",
                DEFAULT_BITS_PER_SAMPLE, self.bits_per_sample
            )));
        }
        if self.chunk_size == 0 {
            return Err(StreamError::Configuration("chunk size must be positive".into()));
        }
        // Byte rate and block align must fit the header fields
        StreamHeader::build(self.sample_rate, self.channels, self.bits_per_sample)?;
        Ok(())
    }

    /// Resolve both executables, failing if either is missing
    pub fn preflight(&self) -> Result<()> {
        resolve_executable(&self.consumer_path)?;
        resolve_executable(&self.decoder_path)?;
        Ok(())
    }

    /// Frequency as passed to the consumer: three decimals
    pub fn frequency_arg(&self) -> String {
        format!("{:.3}", self.frequency_mhz)
    }

    /// Consumer argument vector: `-f <MHz> -` (read from stdin)
    pub fn consumer_args(&self) -> Vec<OsString> {
        vec!["-f".into(), self.frequency_arg().into(), "-".into()]
    }

    /// Decoder argument vector for one track: raw s16le at the session rate
    pub fn decoder_args(&self, track: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            track.as_os_str().to_os_string(),
            "-f".into(),
            "s16le".into(),
            "-ac".into(),
            self.channels.to_string().into(),
            "-ar".into(),
            self.sample_rate.to_string().into(),
            "-acodec".into(),
            "pcm_s16le".into(),
            "pipe:1".into(),
        ]
    }
}
