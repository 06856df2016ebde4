//! Constant-Time Comparison
//!
//! Tag comparison for the AEAD modes and MACs. Timing depends only on the
//! lengths of the inputs, never on their contents.

use subtle::ConstantTimeEq;

/// Constant-time comparison of two byte slices
///
/// Returns true if slices are equal, false otherwise. Slices of different
/// length compare unequal.
#[inline(never)]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
