//! Microphone capture using cpal.
//!
//! Records from a configured or default input device into memory. Captured chunks cross
//! from the audio callback thread over a crossbeam channel; on stop the
//! buffered audio is downmixed to 16kHz mono and encoded as WAV bytes.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use std::io::Cursor;

/// Target sample rate for encoded recordings
const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Microphone recorder producing in-memory WAV data
pub struct MicRecorder {
    stream: Option<cpal::Stream>,
    chunks: Option<Receiver<Vec<f32>>>,
    source_rate: Option<u32>,
    source_channels: Option<usize>,
}

impl Default for MicRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MicRecorder {
    /// Create a new recorder
    pub fn new() -> Self {
        Self {
            stream: None,
            chunks: None,
            source_rate: None,
            source_channels: None,
        }
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Start recording
    ///
    /// Records from the named input device when `preferred` matches one,
    /// falling back to the system default otherwise.
    #[allow(deprecated)] // cpal 0.17 deprecates name() but description() is not yet stable
    pub fn start(&mut self, preferred: Option<&str>) -> Result<()> {
        if self.stream.is_some() {
            return Err(anyhow!("Recording already in progress"));
        }

        let host = cpal::default_host();
        let device = resolve_input_device(&host, preferred)
            .ok_or_else(|| anyhow!("No input device available"))?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let supported_config = device.default_input_config()?;
        let source_rate = supported_config.sample_rate();
        let source_channels = supported_config.channels() as usize;

        tracing::info!(
            "Starting recording: device='{}', {}Hz, {} channels, format={:?}",
            device_name,
            source_rate,
            source_channels,
            supported_config.sample_format()
        );

        let (tx, rx): (Sender<Vec<f32>>, Receiver<Vec<f32>>) = crossbeam_channel::unbounded();
        self.chunks = Some(rx);
        self.source_rate = Some(source_rate);
        self.source_channels = Some(source_channels);

        let stream = device.build_input_stream(
            &supported_config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Unbounded channel: the send never blocks the callback
                if tx.send(data.to_vec()).is_err() {
                    tracing::warn!("Audio chunk dropped: receiver gone");
                }
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);

        tracing::info!("Recording started");
        Ok(())
    }

    /// Stop recording and return the buffered audio as WAV bytes
    pub fn stop(&mut self) -> Result<Vec<u8>> {
        let stream = self
            .stream
            .take()
            .ok_or_else(|| anyhow!("No recording in progress"))?;
        drop(stream);

        let rx = self
            .chunks
            .take()
            .ok_or_else(|| anyhow!("Recording channel missing"))?;
        let source_rate = self.source_rate.take().unwrap_or(TARGET_SAMPLE_RATE);
        let source_channels = self.source_channels.take().unwrap_or(1);

        let mut samples: Vec<f32> = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            samples.extend_from_slice(&chunk);
        }

        let converted = downsample_and_convert(&samples, source_rate, source_channels);
        let data = encode_wav(&converted)?;

        tracing::info!(
            "Recording stopped: {} source samples, {} encoded bytes",
            samples.len(),
            data.len()
        );
        Ok(data)
    }
}

/// Find the input device to record from
///
/// An unmatched preferred name falls back to the default device rather
/// than failing the recording.
#[allow(deprecated)]
fn resolve_input_device(host: &cpal::Host, preferred: Option<&str>) -> Option<cpal::Device> {
    if let Some(name) = preferred {
        match host.input_devices() {
            Ok(mut devices) => {
                if let Some(device) =
                    devices.find(|d| d.name().map(|n| n == name).unwrap_or(false))
                {
                    return Some(device);
                }
                tracing::warn!("Input device '{}' not found, using default", name);
            }
            Err(e) => {
                tracing::warn!("Could not enumerate input devices: {}", e);
            }
        }
    }

    host.default_input_device()
}

/// Downsample and convert audio to 16kHz mono i16 by decimation
fn downsample_and_convert(samples: &[f32], source_rate: u32, channels: usize) -> Vec<i16> {
    let channels = channels.max(1);
    let ratio = (source_rate as usize) / TARGET_SAMPLE_RATE as usize;

    // Mix channels to mono and decimate
    samples
        .chunks(channels)
        .step_by(ratio.max(1))
        .map(|frame| {
            let mono: f32 = frame.iter().sum::<f32>() / frame.len() as f32;
            (mono * 32767.0).clamp(-32768.0, 32767.0) as i16
        })
        .collect()
}

/// Encode 16kHz mono samples as an in-memory WAV file
fn encode_wav(samples: &[i16]) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
