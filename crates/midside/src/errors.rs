//! A single location for all of the errors in the conversion pipeline

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::fmt::Display;
use std::io;

#[derive(Debug)]
pub enum WavError {
    NotAWaveFile,
    WaveFileTooLarge,
    NotAPcmWaveFile,
    NoSamples,
    Not16Bit,
    UnsupportedChannelCount(u16),

    InvalidWaveFile,
    InvalidDataChunkSize,

    IoError(io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResampleError {
    InvalidRate(u32),
    Unavailable { from: u32, to: u32 },
}

#[derive(Debug)]
pub enum PipelineError {
    ChannelLengthMismatch(usize, usize),
    InvalidSampleRate(u32),
    Resample(ResampleError),
}

#[derive(Debug)]
pub enum DeserializeError {
    OpenError(String, io::Error),
    SerdeError(String, serde_json::Error),
}

impl Display for WavError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WavError::NotAWaveFile => write!(f, "not a .wav file"),
            WavError::WaveFileTooLarge => write!(f, "wave file is too large"),
            WavError::NotAPcmWaveFile => write!(f, "not a PCM (uncompressed) wave file"),
            WavError::NoSamples => write!(f, "wave file is empty (no samples)"),
            WavError::Not16Bit => write!(f, "not a 16-bit PCM wave file"),
            WavError::UnsupportedChannelCount(c) => {
                write!(f, "unsupported channel count ({c}, expected 1 or 2)")
            }
            WavError::InvalidWaveFile => write!(f, "invalid wave file"),
            WavError::InvalidDataChunkSize => {
                write!(f, "invalid wave file: invalid data chunk size")
            }
            WavError::IoError(io_error) => io_error.fmt(f),
        }
    }
}

impl From<io::Error> for WavError {
    fn from(e: io::Error) -> Self {
        Self::IoError(e)
    }
}

impl Display for ResampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResampleError::InvalidRate(r) => write!(f, "invalid sample rate ({r})"),
            ResampleError::Unavailable { from, to } => {
                write!(f, "resampler cannot convert {from}Hz to {to}Hz")
            }
        }
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::ChannelLengthMismatch(l, r) => {
                write!(f, "not a stereo signal: channel lengths differ ({l}, {r})")
            }
            PipelineError::InvalidSampleRate(sr) => write!(f, "invalid sample rate ({sr})"),
            PipelineError::Resample(e) => e.fmt(f),
        }
    }
}

impl From<ResampleError> for PipelineError {
    fn from(e: ResampleError) -> Self {
        Self::Resample(e)
    }
}

impl Display for DeserializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeserializeError::OpenError(name, e) => {
                write!(f, "unable to open {name}: {e}")
            }
            DeserializeError::SerdeError(name, e) => write!(f, "unable to read {name}: {e}"),
        }
    }
}
