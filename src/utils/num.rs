//! Numeric utilities: centralized, non-panicking conversions.
//!
//! Prefer saturating conversions where clamping is safer than truncating
//! (pixel dimensions, durations fed to metrics).

/// `num / den`, or `fallback` when `den` is zero.
#[inline]
#[must_use]
pub fn ratio_or(num: u64, den: u64, fallback: f64) -> f64 {
    if den == 0 { fallback } else { num as f64 / den as f64 }
}

/// Rounds and clamps a floating value into `[min, max]` as `u32`.
#[inline]
#[must_use]
pub fn f64_to_u32_clamped(v: f64, min: u32, max: u32) -> u32 {
    if !v.is_finite() {
        return min;
    }
    let r = v.round();
    if r <= f64::from(min) {
        min
    } else if r >= f64::from(max) {
        max
    } else {
        r as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio_or(5, 0, 1.0), 1.0);
        assert!((ratio_or(1, 4, 0.0) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn clamped_rounding() {
        assert_eq!(f64_to_u32_clamped(0.2, 1, 10), 1);
        assert_eq!(f64_to_u32_clamped(4.5, 1, 10), 5);
        assert_eq!(f64_to_u32_clamped(99.0, 1, 10), 10);
        assert_eq!(f64_to_u32_clamped(f64::NAN, 1, 10), 1);
    }
}
