//! Mid/Side transform with coupled peak normalization

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::errors::PipelineError;
use crate::signal::{peak, MidSideSignal, StereoSignal};

/// Both channels are scaled so neither exceeds this peak.
pub const NORMALIZE_PEAK: f32 = 0.95;

/// Splits a stereo signal into `mid = (L+R)/2` and `side = (L-R)/2`.
///
/// Fails unless the input is stereo: two channels of equal length with a
/// positive sample rate.
pub fn split(stereo: &StereoSignal) -> Result<MidSideSignal, PipelineError> {
    if stereo.left.len() != stereo.right.len() {
        return Err(PipelineError::ChannelLengthMismatch(
            stereo.left.len(),
            stereo.right.len(),
        ));
    }
    if stereo.sample_rate == 0 {
        return Err(PipelineError::InvalidSampleRate(0));
    }

    let mid = stereo
        .left
        .iter()
        .zip(&stereo.right)
        .map(|(l, r)| (l + r) / 2.0)
        .collect();
    let side = stereo
        .left
        .iter()
        .zip(&stereo.right)
        .map(|(l, r)| (l - r) / 2.0)
        .collect();

    Ok(MidSideSignal {
        mid,
        side,
        sample_rate: stereo.sample_rate,
    })
}

/// Recombines Mid/Side into `L = M+S`, `R = M-S`.
///
/// After independent resamplings the two signals may differ in length by a
/// sample; the shorter one is treated as zero-padded on the right.
pub fn recombine(mid: &[f32], side: &[f32], sample_rate: u32) -> StereoSignal {
    let n = mid.len().max(side.len());

    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);

    for i in 0..n {
        let m = mid.get(i).copied().unwrap_or(0.0);
        let s = side.get(i).copied().unwrap_or(0.0);
        left.push(m + s);
        right.push(m - s);
    }

    StereoSignal {
        left,
        right,
        sample_rate,
    }
}

/// Coupled peak normalization.
///
/// If either channel peaks above [`NORMALIZE_PEAK`], both are scaled by the
/// same multiplier so the louder one lands exactly on it.  A decoupled gain
/// would rotate the stereo image; an identical multiplier preserves the
/// Mid:Side ratio.  Returns the applied multiplier, if any.
pub fn normalize_coupled(ms: &mut MidSideSignal) -> Option<f32> {
    let p = peak(&ms.mid).max(peak(&ms.side));

    if p <= NORMALIZE_PEAK {
        return None;
    }

    let k = NORMALIZE_PEAK / p;
    log::info!("normalizing Mid/Side by {k:.4} (peak {p:.4})");

    for s in ms.mid.iter_mut().chain(ms.side.iter_mut()) {
        *s *= k;
    }

    Some(k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(left: Vec<f32>, right: Vec<f32>) -> StereoSignal {
        StereoSignal {
            left,
            right,
            sample_rate: 44100,
        }
    }

    #[test]
    fn split_requires_equal_channel_lengths() {
        let s = stereo(vec![0.0; 4], vec![0.0; 5]);
        assert!(matches!(
            split(&s),
            Err(PipelineError::ChannelLengthMismatch(4, 5))
        ));
    }

    #[test]
    fn split_requires_positive_sample_rate() {
        let mut s = stereo(vec![0.0; 4], vec![0.0; 4]);
        s.sample_rate = 0;
        assert!(matches!(split(&s), Err(PipelineError::InvalidSampleRate(0))));
    }

    /// recombine(split(x)) == x to within float rounding.
    #[test]
    fn split_recombine_round_trip_is_exact() {
        let left: Vec<f32> = (0..256).map(|i| (i as f32 * 0.13).sin() * 0.8).collect();
        let right: Vec<f32> = (0..256).map(|i| (i as f32 * 0.41).cos() * 0.5).collect();

        let s = stereo(left.clone(), right.clone());
        let ms = split(&s).unwrap();
        let out = recombine(&ms.mid, &ms.side, s.sample_rate);

        for i in 0..256 {
            assert!((out.left[i] - left[i]).abs() <= left[i].abs() * 1.2e-7 + 1e-9);
            assert!((out.right[i] - right[i]).abs() <= right[i].abs() * 1.2e-7 + 1e-9);
        }
    }

    #[test]
    fn recombine_zero_pads_the_shorter_signal() {
        let out = recombine(&[0.5, 0.5, 0.5], &[0.1], 32000);

        assert_eq!(out.left, vec![0.6, 0.5, 0.5]);
        assert_eq!(out.right, vec![0.4, 0.5, 0.5]);
    }

    #[test]
    fn normalize_leaves_quiet_signals_alone() {
        let s = stereo(vec![0.5; 8], vec![0.0; 8]);
        let mut ms = split(&s).unwrap();
        let before = ms.clone();

        assert_eq!(normalize_coupled(&mut ms), None);
        assert_eq!(ms, before);
    }

    /// A coupled gain scales both channels identically and lands the peak
    /// on NORMALIZE_PEAK.
    #[test]
    fn normalize_applies_coupled_gain() {
        let s = stereo(vec![0.99; 16], vec![0.99; 16]);
        let mut ms = split(&s).unwrap();
        // mid is 0.99 DC, side is silent

        let k = normalize_coupled(&mut ms).unwrap();
        assert!((k - 0.95 / 0.99).abs() < 1e-6);

        let p = peak(&ms.mid).max(peak(&ms.side));
        assert!((p - NORMALIZE_PEAK).abs() < 1e-6);
        assert!(ms.side.iter().all(|&s| s == 0.0));
    }

    /// The Mid:Side ratio is unchanged by normalization.
    #[test]
    fn normalize_preserves_ratio() {
        let left: Vec<f32> = (0..64).map(|i| (i as f32 * 0.3).sin() * 1.4).collect();
        let right: Vec<f32> = (0..64).map(|i| (i as f32 * 0.7).sin() * 1.1).collect();

        let mut ms = split(&stereo(left, right)).unwrap();
        let before = ms.clone();

        let k = normalize_coupled(&mut ms).unwrap();
        assert!(k < 1.0);

        for i in 0..64 {
            assert!((ms.mid[i] - before.mid[i] * k).abs() < 1e-6);
            assert!((ms.side[i] - before.side[i] * k).abs() < 1e-6);
        }
    }
}
