//! PCM signal value types

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

/// A mono float PCM signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// A stereo float PCM signal.  `left` and `right` must be equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoSignal {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: u32,
}

impl StereoSignal {
    pub fn n_samples(&self) -> usize {
        self.left.len()
    }
}

/// A decorrelated Mid/Side pair.  `mid` and `side` are equal length and
/// share a sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct MidSideSignal {
    pub mid: Vec<f32>,
    pub side: Vec<f32>,
    pub sample_rate: u32,
}

/// Largest absolute sample value, 0.0 for an empty signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0, |m, s| m.max(s.abs()))
}
