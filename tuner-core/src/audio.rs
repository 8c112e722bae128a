//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It provides functions for setting up audio streams, selecting appropriate devices,
//! and streaming fixed-size frames to the engine.
//!
//! ## Features
//! - Automatic audio device selection
//! - Configurable sample rates and formats
//! - Real-time audio streaming with buffering
//! - Distinct, recoverable acquisition errors

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::Sender;

use crate::error::{TunerError, TunerResult};

/// Audio buffer size for processing frames.
///
/// This constant defines the number of samples per audio frame.
/// Larger buffers provide more frequency resolution but increase latency.
pub const BUFFER_SIZE: usize = 4096;

/// Preferred capture sample rate in Hz.
const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Configures the audio stream for pitch analysis
/// 3. Sets up a callback that streams full frames to the engine
///
/// Every failure mode is surfaced as a [`TunerError`]; nothing is left
/// running on error, so the caller may retry once the condition (e.g. a
/// missing or busy device) is resolved.
///
/// # Arguments
/// * `sender` - Channel sender for streaming audio frames to the engine
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and sample rate
/// * `Err(e)` - Acquisition failed
///
/// # Audio Configuration
/// - Sample Rate: 44.1 kHz preferred, clamped to what the device offers
/// - Format: 32-bit float
/// - Channels: Mono (1 channel)
/// - Buffer Size: 4096 samples (~93ms at 44.1kHz)
pub fn start_capture(sender: Sender<Vec<f32>>) -> TunerResult<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(TunerError::NoInputDevice)?;

    log::info!("using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or(TunerError::NoSupportedConfig)?;

    let sample_rate = TARGET_SAMPLE_RATE.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(sample_rate));

    let sample_rate_val = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    log::info!("selected sample rate: {} Hz", sample_rate_val);

    let err_fn = |err| log::error!("an error occurred on the audio stream: {err}");

    // This buffer accumulates audio data from the callback.
    let mut audio_buffer = Vec::with_capacity(BUFFER_SIZE * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // Append new data to our buffer.
            audio_buffer.extend_from_slice(data);

            // While we have enough data for a full frame, hand it on.
            while audio_buffer.len() >= BUFFER_SIZE {
                let frame_to_send = audio_buffer[..BUFFER_SIZE].to_vec();

                // Send the frame, ignoring errors if the channel is full.
                let _ = sender.try_send(frame_to_send);

                // Remove the processed samples from the front of the buffer.
                audio_buffer.drain(..BUFFER_SIZE);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate_val))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// This function searches through available audio configurations and selects
/// the one that best matches our requirements:
/// - Mono channel (1 channel)
/// - 32-bit float format
/// - Closest sample rate to target
///
/// # Arguments
/// * `configs` - List of supported audio configurations from the device
/// * `target_rate` - Desired sample rate in Hz
///
/// # Returns
/// * `Some(config)` - Best matching configuration
/// * `None` - No suitable configuration found
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
            let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
            min_diff.min(max_diff)
        })
}
