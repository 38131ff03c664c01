//! Clip decoding using symphonia
//!
//! Step clips are short, so each one is decoded completely into memory
//! before playback starts.
//!
//! # Sample Format
//!
//! - Output: stereo f32 samples, interleaved `[L, R, L, R, ...]`
//! - Mono files: duplicated to stereo
//! - Multi-channel: downmixed to stereo
//!
//! # Failure mapping
//!
//! - File missing: `AudioError::AssetNotFound`
//! - File unreadable, I/O error mid-stream: `AudioError::LoadError`
//! - Unknown container, no audio track, no codec: `AudioError::UnsupportedFormat`

use crate::error::AudioError;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// A fully decoded clip
#[derive(Debug, Clone)]
pub struct DecodedClip {
    /// Interleaved stereo f32 samples
    pub samples: Vec<f32>,
    /// Sample rate of `samples`
    pub sample_rate: u32,
}

impl DecodedClip {
    pub const CHANNELS: u16 = 2;

    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / Self::CHANNELS as usize
    }

    /// Clip length in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frames() as u64 * 1000) / self.sample_rate as u64
    }
}

/// Decode the whole file at `path`
pub fn decode_file(path: &Path) -> Result<DecodedClip, AudioError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AudioError::AssetNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AudioError::LoadError {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        }
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let unsupported = |detail: String| AudioError::UnsupportedFormat {
        path: path.to_path_buf(),
        detail,
    };

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| unsupported(format!("{}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| unsupported("No audio track found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| unsupported(format!("{}", e)))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(SymphoniaError::IoError(e)) => {
                return Err(AudioError::LoadError {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
            Err(e) => return Err(unsupported(format!("{}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                // Corrupt packet: skip it, keep the rest of the clip
                warn!("Skipping undecodable packet in {}: {}", path.display(), msg);
                continue;
            }
            Err(e) => return Err(unsupported(format!("{}", e))),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);

        append_as_stereo(&mut samples, buffer.samples(), spec.channels.count());
    }

    if sample_rate == 0 {
        return Err(unsupported("Unknown sample rate".to_string()));
    }

    let clip = DecodedClip { samples, sample_rate };
    debug!(
        "Decoded {} ({} frames, {} ms at {} Hz)",
        path.display(),
        clip.frames(),
        clip.duration_ms(),
        clip.sample_rate
    );
    Ok(clip)
}

/// Append interleaved `input` with `channels` channels as stereo
fn append_as_stereo(out: &mut Vec<f32>, input: &[f32], channels: usize) {
    match channels {
        0 => {}
        1 => {
            out.reserve(input.len() * 2);
            for &sample in input {
                out.push(sample);
                out.push(sample);
            }
        }
        2 => out.extend_from_slice(input),
        _ => {
            // Average even channels into left, odd into right
            let half = channels as f32 / 2.0;
            for frame in input.chunks_exact(channels) {
                let mut left_sum = 0.0f32;
                let mut right_sum = 0.0f32;
                for (ch_idx, sample) in frame.iter().enumerate() {
                    if ch_idx % 2 == 0 {
                        left_sum += sample;
                    } else {
                        right_sum += sample;
                    }
                }
                out.push(left_sum / half);
                out.push(right_sum / half);
            }
        }
    }
}
