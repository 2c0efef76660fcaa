//! A BRR data format library

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

mod decoder;
mod encoder;
mod gaussian;
mod predictor;

use std::fmt::Display;

pub use decoder::{decode_brr_block, decode_brr_data, decode_brr_data_to_f32};
pub use encoder::{encode_brr, BrrEncoder, EncodeError};
pub use gaussian::gaussian_filter;
pub use predictor::{clamp16, predict, wrap16};

pub const SAMPLES_PER_BLOCK: usize = 16;
pub const BYTES_PER_BRR_BLOCK: usize = 9;

pub const BRR_HEADER_END_FLAG: u8 = 0x01;
pub const BRR_HEADER_LOOP_FLAG: u8 = 0x02;

pub const MAX_SHIFT: u8 = 12;

/// Two-sample predictor history, carried between consecutive BRR blocks.
///
/// At the start of a stream both samples are zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PredState {
    pub p1: i16,
    pub p2: i16,
}

impl PredState {
    pub const fn new(p1: i16, p2: i16) -> Self {
        Self { p1, p2 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    Empty,
    InvalidStreamSize,
    EndFlagNotSetInLastBlock,
    StreamEndsEarly,
    LoopFlagSet,
}

impl Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::Empty => write!(f, "BRR stream is empty"),
            StreamError::InvalidStreamSize => write!(
                f,
                "BRR stream size is not a multiple of {BYTES_PER_BRR_BLOCK}"
            ),
            StreamError::EndFlagNotSetInLastBlock => {
                write!(f, "end flag not set in the last BRR block")
            }
            StreamError::StreamEndsEarly => {
                write!(f, "end flag set before the last BRR block")
            }
            StreamError::LoopFlagSet => write!(f, "BRR stream has a loop flag set"),
        }
    }
}

/// Validates the byte layout of an encoded BRR stream.
///
/// A valid stream is a nonzero multiple of 9 bytes, has the end flag set on
/// exactly the final block and has no loop flags set anywhere.
pub fn validate_brr_stream(brr_data: &[u8]) -> Result<(), StreamError> {
    if brr_data.is_empty() {
        return Err(StreamError::Empty);
    }
    if brr_data.len() % BYTES_PER_BRR_BLOCK != 0 {
        return Err(StreamError::InvalidStreamSize);
    }

    let mut rblocks = brr_data.rchunks_exact(BYTES_PER_BRR_BLOCK);

    // safe - brr_data is a nonzero multiple of BYTES_PER_BRR_BLOCK long
    let last_block_header = rblocks.next().unwrap()[0];

    if last_block_header & BRR_HEADER_END_FLAG == 0 {
        return Err(StreamError::EndFlagNotSetInLastBlock);
    }
    if last_block_header & BRR_HEADER_LOOP_FLAG != 0 {
        return Err(StreamError::LoopFlagSet);
    }

    for block in rblocks {
        let header = block[0];
        if header & BRR_HEADER_END_FLAG != 0 {
            return Err(StreamError::StreamEndsEarly);
        }
        if header & BRR_HEADER_LOOP_FLAG != 0 {
            return Err(StreamError::LoopFlagSet);
        }
    }

    Ok(())
}

/// An encoded BRR bitstream, tagged with the sample rate of the PCM it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrrStream {
    sample_rate: u32,
    brr_data: Vec<u8>,
}

impl BrrStream {
    /// Encodes float PCM (nominally in `[-1, 1]`) into a BRR stream.
    ///
    /// The input is zero-padded on the right to a multiple of 16 samples.
    /// An empty input produces an empty stream with no end flag anywhere.
    pub fn encode(samples: &[f32], sample_rate: u32) -> Self {
        Self {
            sample_rate,
            brr_data: encode_brr(samples),
        }
    }

    /// Wraps already-encoded BRR data, validating the byte layout first.
    pub fn from_brr_data(brr_data: Vec<u8>, sample_rate: u32) -> Result<Self, StreamError> {
        validate_brr_stream(&brr_data)?;
        Ok(Self {
            sample_rate,
            brr_data,
        })
    }

    pub fn brr_data(&self) -> &[u8] {
        &self.brr_data
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn n_brr_blocks(&self) -> usize {
        self.brr_data.len() / BYTES_PER_BRR_BLOCK
    }

    pub fn n_samples(&self) -> usize {
        self.n_brr_blocks() * SAMPLES_PER_BLOCK
    }

    /// Decodes the stream to 16-bit PCM.
    ///
    /// Output length is always `n_brr_blocks() * 16`.
    pub fn decode(&self) -> Vec<i16> {
        decode_brr_data(&self.brr_data)
    }

    /// Decodes the stream to float PCM in `[-1, 1)`.
    pub fn decode_to_f32(&self) -> Vec<f32> {
        decode_brr_data_to_f32(&self.brr_data)
    }
}
