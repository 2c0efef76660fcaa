//! Conversion pipeline orchestrator

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use brr::{gaussian_filter, BrrStream};

use crate::data::ConversionConfig;
use crate::errors::PipelineError;
use crate::resampler::{downsample, upsample, HostResampler};
use crate::signal::StereoSignal;
use crate::transform::{normalize_coupled, recombine, split};

/// The primary output of the pipeline: one BRR stream per Mid/Side channel
/// and the coupled normalization gain, if one was applied.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub mid: BrrStream,
    pub side: BrrStream,
    pub normalization_gain: Option<f32>,
}

fn encode_channel(
    samples: &[f32],
    from: u32,
    to: u32,
    host: &dyn HostResampler,
) -> Result<BrrStream, PipelineError> {
    let resampled = downsample(host, samples, from, to)?;
    log::debug!("encoding {} samples at {to}Hz", resampled.len());
    Ok(BrrStream::encode(&resampled, to))
}

/// Converts stereo PCM into a pair of BRR streams.
///
/// Stages: split, coupled normalization, then per-channel downsample and
/// encode.  The Mid and Side paths share no state after the split and run
/// on separate threads.
pub fn convert(
    stereo: &StereoSignal,
    config: &ConversionConfig,
    host: &dyn HostResampler,
) -> Result<ConversionOutput, PipelineError> {
    config.validate()?;

    let mut ms = split(stereo)?;
    let normalization_gain = normalize_coupled(&mut ms);

    let sr = ms.sample_rate;
    let (mid, side) = std::thread::scope(|scope| {
        let mid_thread =
            scope.spawn(|| encode_channel(&ms.mid, sr, config.mid_sample_rate, host));

        let side = encode_channel(&ms.side, sr, config.side_sample_rate, host);

        let mid = match mid_thread.join() {
            Ok(r) => r,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        (mid, side)
    });

    Ok(ConversionOutput {
        mid: mid?,
        side: side?,
        normalization_gain,
    })
}

/// Decodes a Mid/Side BRR pair back to stereo PCM at `target_sample_rate`.
///
/// Each stream is decoded at its own rate, upsampled, optionally run
/// through the Gaussian output filter, then recombined.  If the two
/// reconstructions differ in length the shorter is zero-padded.
pub fn reconstruct(
    mid: &BrrStream,
    side: &BrrStream,
    target_sample_rate: u32,
    gauss: bool,
    host: &dyn HostResampler,
) -> Result<StereoSignal, PipelineError> {
    if target_sample_rate == 0 {
        return Err(PipelineError::InvalidSampleRate(0));
    }

    let decode_channel = |stream: &BrrStream| -> Result<Vec<f32>, PipelineError> {
        let pcm = stream.decode_to_f32();
        let up = upsample(host, &pcm, stream.sample_rate(), target_sample_rate)?;
        Ok(if gauss { gaussian_filter(&up) } else { up })
    };

    let mid = decode_channel(mid)?;
    let side = decode_channel(side)?;

    Ok(recombine(&mid, &side, target_sample_rate))
}
