//! BRR decoder

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::predictor::{clamp16, predict, wrap16};
use crate::{PredState, BYTES_PER_BRR_BLOCK, MAX_SHIFT, SAMPLES_PER_BLOCK};

/// Sign-extends a 4-bit nibble.
fn nibble_to_i32(n: u8) -> i32 {
    let n = i32::from(n & 0xf);
    if n & 0x8 != 0 {
        n - 16
    } else {
        n
    }
}

/// Decodes a single 9-byte BRR block.
///
/// `state` holds the previous two 15-bit-domain samples (zero at the start
/// of a stream).  Returns the 16 output samples and the state to feed into
/// the next block.
pub fn decode_brr_block(
    block: &[u8; BYTES_PER_BRR_BLOCK],
    state: PredState,
) -> ([i16; SAMPLES_PER_BLOCK], PredState) {
    let header = block[0];
    let shift = header >> 4;
    let filter = (header >> 2) & 0x3;

    let mut p1 = i32::from(state.p1);
    let mut p2 = i32::from(state.p2);

    let mut out = [0; SAMPLES_PER_BLOCK];

    for (i, o) in out.iter_mut().enumerate() {
        let byte = block[1 + i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0xf };
        let signed = nibble_to_i32(nibble);

        let mut sample = if shift <= MAX_SHIFT {
            (signed << shift) >> 1
        } else {
            // shifts 13-15 collapse the nibble to its sign
            if signed < 0 {
                -2048
            } else {
                2048
            }
        };

        sample += predict(filter, p1, p2);
        sample = clamp16(sample);

        // SPC700 15-bit wrap after clamping
        if sample > 16383 {
            sample -= 32768;
        } else if sample < -16384 {
            sample += 32768;
        }

        p2 = p1;
        p1 = sample;

        *o = wrap16(sample * 2) as i16;
    }

    (out, PredState::new(p1 as i16, p2 as i16))
}

/// Decodes a whole BRR byte stream with a zeroed initial predictor state.
///
/// Every complete 9-byte block is decoded; the output length is always
/// `n_blocks * 16`.
pub fn decode_brr_data(brr_data: &[u8]) -> Vec<i16> {
    let n_blocks = brr_data.len() / BYTES_PER_BRR_BLOCK;

    let mut out = Vec::with_capacity(n_blocks * SAMPLES_PER_BLOCK);
    let mut state = PredState::default();

    for block in brr_data.chunks_exact(BYTES_PER_BRR_BLOCK) {
        // chunks_exact() guarantees the length
        let (samples, new_state) = decode_brr_block(block.try_into().unwrap(), state);

        out.extend(samples);
        state = new_state;
    }

    out
}

/// Decodes a BRR byte stream to float PCM in `[-1, 1)`.
pub fn decode_brr_data_to_f32(brr_data: &[u8]) -> Vec<f32> {
    decode_brr_data(brr_data)
        .into_iter()
        .map(|s| f32::from(s) / 32768.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Filter 0 decodes each nibble to `nibble << shift`, scaled back to
    /// 16 bits.
    #[test]
    fn filter0_block_is_verbatim() {
        #[rustfmt::skip]
        let block = [
            (10 << 4), 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef,
        ];

        let (samples, state) = decode_brr_block(&block, PredState::default());

        assert_eq!(
            samples,
            [
                0, 1024, 2048, 3072, 4096, 5120, 6144, 7168, -8192, -7168, -6144, -5120,
                -4096, -3072, -2048, -1024
            ]
        );
        assert_eq!(state, PredState::new(-512, -1024));
    }

    /// Shifts 13-15 ignore the nibble magnitude and decode only its sign.
    #[test]
    fn out_of_range_shift_collapses_to_sign() {
        #[rustfmt::skip]
        let block = [
            (13 << 4), 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef,
        ];

        let (samples, _) = decode_brr_block(&block, PredState::default());

        for (i, s) in samples.iter().enumerate() {
            // nibbles 0..=7 are non-negative, 8..=15 are negative
            let expected = if i < 8 { 4096 } else { -4096 };
            assert_eq!(*s, expected, "sample {i}");
        }
    }

    /// A large predictor overshoot is clamped, then wrapped into the 15-bit
    /// range, exactly as the S-DSP does.
    #[test]
    fn post_clamp_15_bit_wrap() {
        #[rustfmt::skip]
        let brr = [
            // shift 12, filter 0: alternating +14336 / -16384 samples
            0xc0, 0x78, 0x78, 0x78, 0x78, 0x78, 0x78, 0x78, 0x78,
            // shift 0, filter 2, zero nibbles: output is pure prediction
            0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let out = decode_brr_data(&brr);
        assert_eq!(out.len(), 32);

        // block 1 leaves state (p1, p2) = (-16384, 14336)
        assert_eq!(out[14], 28672);
        assert_eq!(out[15], -32768);

        // predict(2, -16384, 14336) wraps to 20864, then the 15-bit wrap
        // folds it to -11904
        assert_eq!(out[16], -23808);
        // predict(2, -11904, -16384) = -7332
        assert_eq!(out[17], -14664);
    }

    #[test]
    fn decode_length_is_always_full_blocks() {
        let brr = vec![0u8; 3 * BYTES_PER_BRR_BLOCK];
        assert_eq!(decode_brr_data(&brr).len(), 3 * SAMPLES_PER_BLOCK);
        assert!(decode_brr_data(&brr).iter().all(|&s| s == 0));
    }

    #[test]
    fn f32_output_is_scaled_by_32768() {
        let mut brr = vec![0u8; BYTES_PER_BRR_BLOCK];
        brr[0] = 12 << 4;
        brr[1] = 0x70;

        let ints = decode_brr_data(&brr);
        let floats = decode_brr_data_to_f32(&brr);

        assert_eq!(floats.len(), ints.len());
        assert_eq!(floats[0], f32::from(ints[0]) / 32768.0);
        assert_eq!(ints[0], 28672);
    }
}
