//! SPC700 Gaussian output filter emulation

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

// Center and neighbour weights of the S-DSP output low-pass, out of 2048.
const C0: f32 = 372.0 / 2048.0;
const C1: f32 = 1304.0 / 2048.0;

/// Three-tap symmetric FIR approximating the SPC700 Gaussian output filter.
///
/// `y[i] = c0*x[i-1] + c1*x[i] + c0*x[i+1]`, with the missing neighbour at
/// each edge folded into the centre tap.  Output length equals input length;
/// inputs shorter than two samples are returned unchanged.
pub fn gaussian_filter(samples: &[f32]) -> Vec<f32> {
    let n = samples.len();
    if n < 2 {
        return samples.to_vec();
    }

    let mut out = Vec::with_capacity(n);

    out.push((C1 + C0) * samples[0] + C0 * samples[1]);
    for w in samples.windows(3) {
        out.push(C0 * w[0] + C1 * w[1] + C0 * w[2]);
    }
    out.push(C0 * samples[n - 2] + (C1 + C0) * samples[n - 1]);

    out
}
