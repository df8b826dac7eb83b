//! Transfer functions
//!
//! This module provides:
//! - sRGB gamma encode/decode (IEC 61966-2-1)
//! - SMPTE ST 2084 (PQ) encode/decode

/// sRGB gamma decode (encoded → linear)
///
/// Converts sRGB-encoded value [0,1] to linear light [0,1].
#[inline]
pub fn srgb_gamma_decode(encoded: f64) -> f64 {
    if encoded <= 0.04045 {
        encoded / 12.92
    } else {
        ((encoded + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB gamma encode (linear → encoded)
///
/// Converts linear light [0,1] to sRGB-encoded value [0,1].
#[inline]
pub fn srgb_gamma_encode(linear: f64) -> f64 {
    if linear > 0.0031308 {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    } else {
        linear * 12.92
    }
}

// ============================================================================
// SMPTE ST 2084 (Perceptual Quantizer)
// ============================================================================

/// PQ exponent m1
pub const PQ_M1: f64 = (2610.0 / 4096.0) * 0.25;
/// PQ exponent m2
pub const PQ_M2: f64 = (2523.0 / 4096.0) * 128.0;
/// PQ constant c1
pub const PQ_C1: f64 = 3424.0 / 4096.0;
/// PQ constant c2
pub const PQ_C2: f64 = (2413.0 / 4096.0) * 32.0;
/// PQ constant c3
pub const PQ_C3: f64 = (2392.0 / 4096.0) * 32.0;

/// PQ encode: linear light (1.0 = 10000 cd/m²) → signal
#[inline]
pub fn pq_oetf(linear: f64) -> f64 {
    let v = linear.powf(PQ_M1);
    ((2413.0 * v + 107.0) / (2392.0 * v + 128.0)).powf(PQ_M2)
}

/// PQ decode: signal → linear light (1.0 = 10000 cd/m²)
#[inline]
pub fn pq_eotf(signal: f64) -> f64 {
    let v = signal.powf(1.0 / PQ_M2);
    ((v - PQ_C1).max(0.0) / (PQ_C2 - PQ_C3 * v)).powf(1.0 / PQ_M1)
}
