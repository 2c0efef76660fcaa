//! BRR encoder

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::predictor::{clamp16, predict, wrap16};
use crate::{
    PredState, BRR_HEADER_END_FLAG, BYTES_PER_BRR_BLOCK, MAX_SHIFT, SAMPLES_PER_BLOCK,
};

/// Added to a trial's squared-error accumulator for every reconstructed
/// sample that falls outside the int16 range.  Large enough to lose the
/// parameter search against any in-range trial.
const OUT_OF_RANGE_PENALTY: f64 = 1e12;

#[derive(Debug, Clone)]
pub enum EncodeError {
    NotAMultipleOfBlockSize(usize),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::NotAMultipleOfBlockSize(l) => write!(
                f,
                "number of samples ({l}) is not a multiple of {SAMPLES_PER_BLOCK}"
            ),
        }
    }
}

/// A trial encoding of one 16-sample block with fixed `(shift, filter)`.
struct CandidateBlock {
    shift: u8,
    filter: u8,
    // low 4 bits of each quantized differential
    nibbles: [u8; SAMPLES_PER_BLOCK],
    // what the SPC700 predictor state will hold after this block
    decoded_samples: [i16; SAMPLES_PER_BLOCK],
    squared_error: f64,
    clipped: bool,
}

/// Quantizes one block against the carried-in predictor state.
///
/// This is the hardware-faithful trial encode: the differential is formed in
/// the half-scale (15-bit) domain, biased by `step*4 + step/4` before the
/// divide, and the reconstruction is clamped to int16 then wrapped, exactly
/// as the decode path will reproduce it.
fn build_candidate(
    samples: &[i16; SAMPLES_PER_BLOCK],
    shift: u8,
    filter: u8,
    state: PredState,
) -> CandidateBlock {
    let step: i32 = 1 << shift;

    let mut p1 = i32::from(state.p1);
    let mut p2 = i32::from(state.p2);

    let mut nibbles = [0; SAMPLES_PER_BLOCK];
    let mut decoded_samples = [0; SAMPLES_PER_BLOCK];
    let mut squared_error = 0.0;
    let mut clipped = false;

    for (i, s) in samples.iter().enumerate() {
        let s = i32::from(*s);

        let vlin = predict(filter, p1, p2) >> 1;

        let mut diff = (s >> 1) - vlin;
        // 16-bit-domain wrap of the differential
        if diff > 16384 && diff < 32768 {
            diff -= 32768;
        } else if diff < -16384 && diff > -32768 {
            diff += 32768;
        }

        let d = diff + (step << 2) + (step >> 2);
        let c = if d > 0 {
            let c = if step > 1 { d / (step >> 1) } else { d << 1 };
            c.min(15)
        } else {
            0
        };
        let nibble = c - 8;

        let dp = (nibble << shift) >> 1;
        let half = clamp16(vlin + dp);
        let recon = half * 2;
        if recon > i16::MAX.into() || recon < i16::MIN.into() {
            squared_error += OUT_OF_RANGE_PENALTY;
            clipped = true;
        }
        let recon = wrap16(recon);

        let delta = f64::from(s - recon);
        squared_error += delta * delta;

        p2 = p1;
        p1 = recon;

        nibbles[i] = (nibble & 0x0f) as u8;
        decoded_samples[i] = recon as i16;
    }

    CandidateBlock {
        shift,
        filter,
        nibbles,
        decoded_samples,
        squared_error,
        clipped,
    }
}

/// Brute-force parameter search: 13 shifts x 4 filters, lowest squared error
/// wins, first-found wins ties (shift outer, filter inner).
fn find_best_candidate(samples: &[i16; SAMPLES_PER_BLOCK], state: PredState) -> CandidateBlock {
    let mut best: Option<CandidateBlock> = None;
    let mut best_error = f64::INFINITY;

    for shift in 0..=MAX_SHIFT {
        for filter in 0..4 {
            let candidate = build_candidate(samples, shift, filter, state);
            if candidate.squared_error < best_error {
                best_error = candidate.squared_error;
                best = Some(candidate);
            }
        }
    }

    // Cannot happen with real arithmetic, kept deterministic regardless.
    best.unwrap_or_else(|| build_candidate(samples, 0, 0, state))
}

fn pack_block(block: &CandidateBlock) -> [u8; BYTES_PER_BRR_BLOCK] {
    let mut out = [0; BYTES_PER_BRR_BLOCK];

    out[0] = ((block.shift & 0xf) << 4) | ((block.filter & 0x3) << 2);

    for (i, o) in out.iter_mut().skip(1).enumerate() {
        *o = (block.nibbles[i * 2] << 4) | block.nibbles[i * 2 + 1];
    }

    out
}

/// A streaming BRR encoder.
///
/// Accepts 16-sample-aligned chunks of 16-bit PCM with the predictor state
/// carried across calls, and sets the end flag on the final block only when
/// the stream is finished.  Encoding a signal in one call or in several
/// produces byte-identical output.
pub struct BrrEncoder {
    state: PredState,
    brr_data: Vec<u8>,
}

impl BrrEncoder {
    pub fn new() -> Self {
        Self::with_state(PredState::default())
    }

    pub fn with_state(state: PredState) -> Self {
        Self {
            state,
            brr_data: Vec::new(),
        }
    }

    pub fn state(&self) -> PredState {
        self.state
    }

    /// Encodes a chunk whose length must be a multiple of 16 samples.
    pub fn encode_chunk(&mut self, samples: &[i16]) -> Result<(), EncodeError> {
        if samples.len() % SAMPLES_PER_BLOCK != 0 {
            return Err(EncodeError::NotAMultipleOfBlockSize(samples.len()));
        }
        self.encode_blocks(samples);
        Ok(())
    }

    fn encode_blocks(&mut self, samples: &[i16]) {
        for block in samples.chunks_exact(SAMPLES_PER_BLOCK) {
            // chunks_exact() guarantees the length
            let block = block.try_into().unwrap();

            let best = find_best_candidate(block, self.state);
            if best.clipped {
                log::warn!(
                    "BRR block {} reconstruction exceeds int16 (shift {}, filter {})",
                    self.brr_data.len() / BYTES_PER_BRR_BLOCK,
                    best.shift,
                    best.filter,
                );
            }

            self.state = PredState::new(
                best.decoded_samples[SAMPLES_PER_BLOCK - 1],
                best.decoded_samples[SAMPLES_PER_BLOCK - 2],
            );
            self.brr_data.extend(pack_block(&best));
        }
    }

    /// Sets the end flag on the last block and returns the stream bytes.
    ///
    /// A stream with no samples stays empty, with no end flag anywhere.
    pub fn finish(mut self) -> Vec<u8> {
        if let Some(i) = self.brr_data.len().checked_sub(BYTES_PER_BRR_BLOCK) {
            self.brr_data[i] |= BRR_HEADER_END_FLAG;
        }
        self.brr_data
    }
}

impl Default for BrrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a float sample (nominally in `[-1, 1]`) to int16 with
/// round-half-up and saturation.
fn pcm16_from_f32(s: f32) -> i16 {
    let n = (f64::from(s) * 32767.0 + 0.5).floor() as i64;
    n.clamp(i16::MIN.into(), i16::MAX.into()) as i16
}

/// Encodes float PCM into a BRR byte stream.
///
/// The input is converted to int16, zero-padded on the right to a multiple
/// of 16 samples, and encoded with a zeroed initial predictor state.  The
/// end flag is set on the final block; an empty input yields an empty vec.
pub fn encode_brr(samples: &[f32]) -> Vec<u8> {
    let mut pcm: Vec<i16> = samples.iter().copied().map(pcm16_from_f32).collect();

    let partial = pcm.len() % SAMPLES_PER_BLOCK;
    if partial != 0 {
        pcm.resize(pcm.len() + SAMPLES_PER_BLOCK - partial, 0);
    }

    let mut encoder = BrrEncoder::new();
    encoder.encode_blocks(&pcm);
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_brr_data;

    fn test_signal(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.37).sin() * 0.6).collect()
    }

    #[test]
    fn empty_input_yields_empty_stream() {
        assert!(encode_brr(&[]).is_empty());
    }

    #[test]
    fn block_size_law() {
        // 100 samples pad to 112, so 7 blocks of 9 bytes
        let brr = encode_brr(&test_signal(100));
        assert_eq!(brr.len(), 7 * BYTES_PER_BRR_BLOCK);
        assert_eq!(decode_brr_data(&brr).len(), 7 * SAMPLES_PER_BLOCK);
    }

    #[test]
    fn header_bit_law() {
        let brr = encode_brr(&test_signal(64));

        let headers: Vec<u8> = brr.chunks_exact(BYTES_PER_BRR_BLOCK).map(|b| b[0]).collect();
        assert_eq!(headers.len(), 4);

        for h in &headers[..3] {
            assert_eq!(h & BRR_HEADER_END_FLAG, 0);
        }
        assert_eq!(headers[3] & BRR_HEADER_END_FLAG, BRR_HEADER_END_FLAG);

        for h in &headers {
            assert_eq!(h & crate::BRR_HEADER_LOOP_FLAG, 0);
        }
    }

    #[test]
    fn silence_encodes_to_zero_blocks() {
        let brr = encode_brr(&[0.0; 32]);

        // shift 0 / filter 0 wins every tie, so only the end flag is set
        assert_eq!(brr[0], 0);
        assert_eq!(brr[BYTES_PER_BRR_BLOCK], BRR_HEADER_END_FLAG);
        assert!(brr[1..BYTES_PER_BRR_BLOCK].iter().all(|&b| b == 0));

        assert!(decode_brr_data(&brr).iter().all(|&s| s == 0));
    }

    /// A block of `pcm[i] = 2 * nibble` values is encoded losslessly by
    /// shift 1 / filter 0, pinning the exact header and nibble layout.
    #[test]
    fn single_block_header_and_nibble_layout() {
        let mut samples = [0.0f32; SAMPLES_PER_BLOCK];
        samples[0] = 14.0 / 32767.0;
        samples[1] = -6.0 / 32767.0;

        let brr = encode_brr(&samples);
        assert_eq!(brr.len(), BYTES_PER_BRR_BLOCK);

        // header: shift=1, filter=0, end flag
        assert_eq!(brr[0], (1 << 4) | BRR_HEADER_END_FLAG);
        // sample 0 (nibble 7) in the high nibble, sample 1 (nibble -3) low
        assert_eq!(brr[1], 0x7d);
        assert!(brr[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn chunked_encoding_matches_one_shot() {
        let pcm: Vec<i16> = (0..48)
            .map(|i| ((i as f32 * 0.71).sin() * 20000.0) as i16)
            .collect();

        let mut one_shot = BrrEncoder::new();
        one_shot.encode_chunk(&pcm).unwrap();

        let mut chunked = BrrEncoder::new();
        chunked.encode_chunk(&pcm[..16]).unwrap();
        chunked.encode_chunk(&pcm[16..]).unwrap();

        assert_eq!(one_shot.finish(), chunked.finish());
    }

    #[test]
    fn unaligned_chunk_is_rejected() {
        let mut encoder = BrrEncoder::new();
        assert!(matches!(
            encoder.encode_chunk(&[0; 17]),
            Err(EncodeError::NotAMultipleOfBlockSize(17))
        ));
    }

    /// No `(shift, filter)` pair beats the winning candidate's error.
    #[test]
    fn search_is_locally_optimal() {
        let block: [i16; SAMPLES_PER_BLOCK] =
            std::array::from_fn(|i| ((i as f32 * 0.9).sin() * 17000.0) as i16);
        let state = PredState::new(1200, -700);

        let best = find_best_candidate(&block, state);

        for shift in 0..=MAX_SHIFT {
            for filter in 0..4 {
                let trial = build_candidate(&block, shift, filter, state);
                assert!(
                    best.squared_error <= trial.squared_error,
                    "({shift}, {filter}) beats winner ({}, {})",
                    best.shift,
                    best.filter
                );
            }
        }
    }

    /// Full-scale alternation pushes the predictor towards the wrap
    /// boundary; the chosen encoding must still decode inside int16 without
    /// runaway error.
    #[test]
    fn wrap_boundary_block_stays_bounded() {
        let samples: Vec<f32> = (0..SAMPLES_PER_BLOCK)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();

        let brr = encode_brr(&samples);
        let decoded = decode_brr_data(&brr);

        assert_eq!(decoded.len(), SAMPLES_PER_BLOCK);
        for (s, d) in samples.iter().zip(&decoded) {
            let err = (f64::from(*s) * 32767.0 - f64::from(*d)).abs();
            assert!(err < 32768.0, "wrap amplified the residual: {err}");
        }
    }
}
