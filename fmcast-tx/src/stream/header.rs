//! Streaming WAV header
//!
//! A 44-byte RIFF/WAVE header whose RIFF size and data size are both
//! 0xFFFFFFFF. The total length of a decoded playlist is not known until
//! every track has been decoded, so the consumer is told to read until
//! end-of-stream instead.

use crate::error::{Result, StreamError};

/// Length of the canonical PCM header
pub const HEADER_LEN: usize = 44;

/// Size field value meaning "unknown, read until end-of-stream"
pub const UNKNOWN_LENGTH: u32 = u32::MAX;

/// Size of the PCM `fmt ` chunk body
const FMT_CHUNK_SIZE: u32 = 16;

/// WAVE_FORMAT_PCM
const FORMAT_PCM: u16 = 1;

/// Immutable streaming header for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader([u8; HEADER_LEN]);

impl StreamHeader {
    /// Build the header for the given PCM format
    ///
    /// Fails with a configuration error when the derived byte rate or
    /// block align does not fit its header field.
    pub fn build(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Result<Self> {
        let overflow = || {
            StreamError::Configuration(format!(
                "{} Hz x {} channels x {} bits overflows the header fields",
                sample_rate, channels, bits_per_sample
            ))
        };
        let block_align = u16::try_from(u32::from(channels) * u32::from(bits_per_sample) / 8)
            .map_err(|_| overflow())?;
        let byte_rate = u32::try_from(
            u64::from(sample_rate) * u64::from(channels) * u64::from(bits_per_sample) / 8,
        )
        .map_err(|_| overflow())?;

        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(b"RIFF");
        bytes[4..8].copy_from_slice(&UNKNOWN_LENGTH.to_le_bytes());
        bytes[8..12].copy_from_slice(b"WAVE");
        bytes[12..16].copy_from_slice(b"fmt ");
        bytes[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
        bytes[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
        bytes[22..24].copy_from_slice(&channels.to_le_bytes());
        bytes[24..28].copy_from_slice(&sample_rate.to_le_bytes());
        bytes[28..32].copy_from_slice(&byte_rate.to_le_bytes());
        bytes[32..34].copy_from_slice(&block_align.to_le_bytes());
        bytes[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());
        bytes[36..40].copy_from_slice(b"data");
        bytes[40..44].copy_from_slice(&UNKNOWN_LENGTH.to_le_bytes());
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for StreamHeader {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
