//! Rounding and formatting helpers for report values

/// Round half up (towards positive infinity on ties)
///
/// `round_half_up(2.5) == 3.0`, `round_half_up(-2.5) == -2.0`
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round to a number of decimal places, ties rounded up
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    round_half_up(value * factor) / factor
}

/// Left-pad a number with zeros to the given width
pub fn zero_pad(value: usize, width: usize) -> String {
    format!("{value:0width$}")
}
