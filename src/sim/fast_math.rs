//! Approximate inverse square root
//!
//! The launch velocity is normalized with the classic bit-trick estimate
//! refined by one Newton-Raphson step. Relative error is bounded by about
//! 0.175%, and recorded trajectories were produced with exactly this
//! approximation, so it must not be swapped for `1.0 / x.sqrt()`.

/// Magic seed constant for the initial estimate
const INV_SQRT_MAGIC: u32 = 0x5f37_59df;

/// `1 / sqrt(x)` to within ~0.175% for positive, finite `x`
#[inline]
pub fn approx_inv_sqrt(x: f32) -> f32 {
    let half = 0.5 * x;
    let seed = f32::from_bits(INV_SQRT_MAGIC.wrapping_sub(x.to_bits() >> 1));
    seed * (1.5 - half * seed * seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inv_sqrt_of_one() {
        let y = approx_inv_sqrt(1.0);
        assert!((y - 0.998_307).abs() < 1e-5, "got {}", y);
    }

    #[test]
    fn test_inv_sqrt_relative_error_bound() {
        let mut x = 1e-3f32;
        while x < 1e6 {
            let exact = 1.0 / x.sqrt();
            let rel = ((approx_inv_sqrt(x) - exact) / exact).abs();
            assert!(rel < 0.00176, "x={} rel={}", x, rel);
            x *= 1.37;
        }
    }

    #[test]
    fn test_inv_sqrt_is_not_exact() {
        // 25 -> 0.2 exactly; the estimate must land close but not on it
        let y = approx_inv_sqrt(25.0);
        assert!((y - 0.2).abs() < 0.2 * 0.002);
        assert_ne!(y, 0.2);
    }
}
