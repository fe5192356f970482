use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits. Every derived
/// statistic (utilization, average times) is reported in this type.
pub type Fixed64 = I32F32;

/// Logical simulation time. Signed so that a negative random deviation can be
/// detected before it is scheduled.
pub type SimTime = i64;

/// Convert Fixed64 to f64. Use only for display, never in the sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// `num / den` as Fixed64, computed in 128-bit integer space so large
/// cumulative times do not overflow the 32 integer bits before dividing.
///
/// Returns zero when `den` is zero; saturates when the quotient does not fit.
pub fn ratio(num: i64, den: i64) -> Fixed64 {
    ratio_wide(num as i128, den as i128)
}

/// [`ratio`] for operands that are themselves products of times and counts.
pub fn ratio_wide(num: i128, den: i128) -> Fixed64 {
    if den == 0 {
        return Fixed64::ZERO;
    }
    let bits = num.saturating_mul(1 << 32) / den;
    let clamped = bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
    Fixed64::from_bits(clamped)
}
