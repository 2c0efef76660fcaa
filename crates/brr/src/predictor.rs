//! Integer primitives and the fixed-point BRR predictor

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

/// Reduces `n` modulo 2^16 into the signed range `[-32768, 32767]`.
///
/// Equivalent to sign-extending the low 16 bits.  Avoids any reliance on
/// platform-defined overflow behaviour.
#[inline]
pub fn wrap16(n: i32) -> i32 {
    i32::from(n as i16)
}

/// Saturates `n` to the signed 16-bit range `[-32768, 32767]`.
#[inline]
pub fn clamp16(n: i32) -> i32 {
    n.clamp(i16::MIN.into(), i16::MAX.into())
}

/// Computes the fixed-point prediction for a BRR filter, wrapped to int16.
///
/// The coefficients are the hardware-exact rationals:
///
/// | filter | formula                    |
/// |--------|----------------------------|
/// | 0      | 0                          |
/// | 1      | p1 * 15/16                 |
/// | 2      | p1 * 61/32  - p2 * 15/16   |
/// | 3      | p1 * 115/64 - p2 * 13/16   |
///
/// Each is evaluated in integer fixed-point over a common power-of-two
/// denominator with round-half-up (`floor(x + 1/2)`), which matches the
/// rounded floating-point evaluation exactly.
#[inline]
pub fn predict(filter: u8, p1: i32, p2: i32) -> i32 {
    let n = match filter {
        0 => return 0,
        1 => (p1 * 15 + 8) >> 4,
        2 => (p1 * 122 - p2 * 60 + 32) >> 6,
        3 => (p1 * 115 - p2 * 52 + 32) >> 6,
        _ => unreachable!("BRR filter is two bits"),
    };
    wrap16(n)
}
