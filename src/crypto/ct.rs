use subtle::ConstantTimeEq;

/// Compares two byte strings in time independent of where they differ.
///
/// Slices of different lengths compare unequal; only the length itself leaks.
///
/// 以与差异位置无关的时间比较两个字节串。
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
