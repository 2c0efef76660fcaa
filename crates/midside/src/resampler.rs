//! Sample rate conversion: windowed-sinc FIR decimator and host seam

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::f64::consts::PI;

use crate::errors::ResampleError;

pub const FIR_TAPS: usize = 64;

/// Below this target rate the internal FIR decimator is used; at or above
/// it the host resampler is good enough (aliasing risk is low).
pub const HOST_RESAMPLER_THRESHOLD: u32 = 8000;

/// The host-provided resampler seam.
///
/// A host implementation must behave as a linear, band-limited resampler
/// and uphold the output-length laws: `floor(n*to/from)` samples when
/// downsampling, `ceil(n*to/from)` when upsampling.  A host may decline a
/// conversion with [`ResampleError::Unavailable`]; the routers below
/// recover by falling back to an internal path.
pub trait HostResampler: Sync {
    fn resample(&self, samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>, ResampleError>;
}

/// Linear-interpolation resampler, the built-in stand-in for a host.
pub struct LinearResampler;

impl HostResampler for LinearResampler {
    fn resample(&self, samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>, ResampleError> {
        if from == 0 {
            return Err(ResampleError::InvalidRate(from));
        }
        if to == 0 {
            return Err(ResampleError::InvalidRate(to));
        }
        if from == to {
            return Ok(samples.to_vec());
        }

        let n = samples.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let scaled = n as u64 * u64::from(to);
        let out_len = if to > from {
            scaled.div_ceil(u64::from(from))
        } else {
            scaled / u64::from(from)
        } as usize;

        let ratio = f64::from(from) / f64::from(to);
        let mut out = Vec::with_capacity(out_len);

        for i in 0..out_len {
            let pos = i as f64 * ratio;
            let i0 = (pos as usize).min(n - 1);
            let i1 = (i0 + 1).min(n - 1);
            let frac = (pos - pos.floor()) as f32;

            out.push(samples[i0] + (samples[i1] - samples[i0]) * frac);
        }

        Ok(out)
    }
}

/// Generates the Blackman-windowed sinc low-pass kernel, cutoff at the
/// target Nyquist frequency, normalized to unity DC gain.
fn sinc_kernel(from: u32, to: u32) -> [f64; FIR_TAPS] {
    let fc = (f64::from(to) / 2.0) / f64::from(from);
    let m = (FIR_TAPS - 1) as f64;

    let mut h = [0.0; FIR_TAPS];

    for (i, h) in h.iter_mut().enumerate() {
        let x = i as f64 - m / 2.0;
        let sinc = if x == 0.0 {
            1.0
        } else {
            (2.0 * PI * fc * x).sin() / (2.0 * PI * fc * x)
        };
        let blackman = 0.42 - 0.5 * (2.0 * PI * i as f64 / m).cos()
            + 0.08 * (4.0 * PI * i as f64 / m).cos();
        *h = sinc * blackman;
    }

    let sum: f64 = h.iter().sum();
    for h in &mut h {
        *h /= sum;
    }

    h
}

/// FIR low-pass and decimate.
///
/// Convolves with the zero-padded input (the kernel is regenerated per call
/// as the cutoff depends on the target rate), evaluating only at the
/// decimation points `floor(i * from/to)`.  Output length is
/// `floor(n * to / from)`.
pub fn manual_downsample(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    let n = samples.len();
    let out_len = (n as u64 * u64::from(to) / u64::from(from)) as usize;
    if out_len == 0 {
        return Vec::new();
    }

    let h = sinc_kernel(from, to);
    let ratio = f64::from(from) / f64::from(to);
    let half = FIR_TAPS / 2;

    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src = ((i as f64 * ratio) as usize).min(n - 1);

        let mut acc = 0.0;
        for (j, h) in h.iter().enumerate() {
            if let Some(k) = (src + j).checked_sub(half) {
                if let Some(s) = samples.get(k) {
                    acc += f64::from(*s) * h;
                }
            }
        }
        out.push(acc as f32);
    }

    out
}

/// Downsampling router.
///
/// Targets below [`HOST_RESAMPLER_THRESHOLD`] always use the internal FIR
/// path; otherwise the host resampler is used, with a one-shot FIR fallback
/// if the host declines the rate.
pub fn downsample(
    host: &dyn HostResampler,
    samples: &[f32],
    from: u32,
    to: u32,
) -> Result<Vec<f32>, ResampleError> {
    if from == 0 {
        return Err(ResampleError::InvalidRate(from));
    }
    if to == 0 {
        return Err(ResampleError::InvalidRate(to));
    }

    if to < HOST_RESAMPLER_THRESHOLD {
        return Ok(manual_downsample(samples, from, to));
    }

    match host.resample(samples, from, to) {
        Err(ResampleError::Unavailable { .. }) => {
            log::debug!("host resampler declined {from}Hz -> {to}Hz, using FIR path");
            Ok(manual_downsample(samples, from, to))
        }
        r => r,
    }
}

/// Upsampling router (preview path).
///
/// Delegates to the host resampler, falling back to the internal linear
/// interpolator if the host declines the rate.
pub fn upsample(
    host: &dyn HostResampler,
    samples: &[f32],
    from: u32,
    to: u32,
) -> Result<Vec<f32>, ResampleError> {
    if from == 0 {
        return Err(ResampleError::InvalidRate(from));
    }
    if to == 0 {
        return Err(ResampleError::InvalidRate(to));
    }

    match host.resample(samples, from, to) {
        Err(ResampleError::Unavailable { .. }) => {
            log::debug!("host resampler declined {from}Hz -> {to}Hz, interpolating");
            LinearResampler.resample(samples, from, to)
        }
        r => r,
    }
}
