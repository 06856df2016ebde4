//! Binary Field Arithmetic
//!
//! GF(2^128) multiplication in the bit-reflected convention used by GHASH
//! (reduction polynomial x^128 + x^7 + x^2 + x + 1), and multiplication by
//! `x` / `x^-1` in the big-endian convention used to derive CMAC and OMAC2
//! subkeys for 64- and 128-bit blocks.

use crate::error::{Error, Result};

/// Low byte of the reducing polynomial for 64-bit blocks (x^64 + x^4 + x^3 + x + 1)
pub const R64: u8 = 0x1b;
/// Low byte of the reducing polynomial for 128-bit blocks (x^128 + x^7 + x^2 + x + 1)
pub const R128: u8 = 0x87;

// Top byte of the bit-reflected GHASH polynomial
const GHASH_R: u8 = 0xe1;

/// Multiply two field elements in GF(2^128) as defined for GHASH (SP 800-38D).
pub fn gf128_mul(x: &[u8; 16], y: &[u8; 16]) -> [u8; 16] {
    let mut z = [0u8; 16];
    let mut v = *y;

    for i in 0..128 {
        let byte_idx = i / 8;
        let bit_idx = 7 - (i % 8);

        if (x[byte_idx] >> bit_idx) & 1 == 1 {
            for j in 0..16 {
                z[j] ^= v[j];
            }
        }

        // Right shift V and reduce if needed
        let lsb = v[15] & 1;
        for j in (1..16).rev() {
            v[j] = (v[j] >> 1) | ((v[j - 1] & 1) << 7);
        }
        v[0] >>= 1;

        if lsb == 1 {
            v[0] ^= GHASH_R;
        }
    }

    z
}

fn reduction_byte(len: usize) -> Result<u8> {
    match len {
        8 => Ok(R64),
        16 => Ok(R128),
        n => Err(Error::length("field element", "8 or 16", n)),
    }
}

/// Multiply `block` by `x` (left shift with reduction). Returns a new element.
pub fn dbl(block: &[u8]) -> Result<Vec<u8>> {
    let r = reduction_byte(block.len())?;
    let mut out = vec![0u8; block.len()];

    let carry = block[0] >> 7;
    for i in 0..block.len() - 1 {
        out[i] = (block[i] << 1) | (block[i + 1] >> 7);
    }
    out[block.len() - 1] = block[block.len() - 1] << 1;

    // carry is 0 or 1; the mask keeps the branch out of the data path
    let last = out.len() - 1;
    out[last] ^= r & 0u8.wrapping_sub(carry);
    Ok(out)
}

/// Multiply `block` by `x^-1` (right shift with reduction), the inverse of [`dbl`].
pub fn halve(block: &[u8]) -> Result<Vec<u8>> {
    let r = reduction_byte(block.len())?;
    let mut out = vec![0u8; block.len()];
    let last = block.len() - 1;

    let mask = 0u8.wrapping_sub(block[last] & 1);
    out[0] = block[0] >> 1;
    for i in 1..block.len() {
        out[i] = (block[i] >> 1) | (block[i - 1] << 7);
    }

    // Undo the reduction: add (x^n + R) / x, i.e. set the top bit and R >> 1
    out[0] ^= 0x80 & mask;
    out[last] ^= (r >> 1) & mask;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn test_dbl_rfc4493_subkeys() {
        let l = h("7df76b0c1ab899b33e42f047b91b546f");
        let k1 = dbl(&l).unwrap();
        assert_eq!(k1, h("fbeed618357133667c85e08f7236a8de"));
        let k2 = dbl(&k1).unwrap();
        assert_eq!(k2, h("f7ddac306ae266ccf90bc11ee46d513b"));
    }

    #[test]
    fn test_halve_inverts_dbl() {
        let l = h("7df76b0c1ab899b33e42f047b91b546f");
        let half = halve(&l).unwrap();
        assert_eq!(half, h("befbb5860d5c4cd99f217823dc8daa74"));
        assert_eq!(dbl(&half).unwrap(), l);
        assert_eq!(halve(&dbl(&l).unwrap()).unwrap(), l);
    }

    #[test]
    fn test_dbl_64bit_block() {
        let block = [0x80, 0, 0, 0, 0, 0, 0, 0x01];
        assert_eq!(dbl(&block).unwrap(), vec![0, 0, 0, 0, 0, 0, 0, 0x02 ^ R64]);
        assert_eq!(halve(&dbl(&block).unwrap()).unwrap(), block.to_vec());
    }

    #[test]
    fn test_dbl_rejects_odd_width() {
        assert!(dbl(&[0u8; 12]).is_err());
        assert!(halve(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_gf128_mul_identity() {
        // 1 in the reflected convention is the MSB of the first byte
        let mut one = [0u8; 16];
        one[0] = 0x80;
        let a: [u8; 16] = [
            0x66, 0xe9, 0x4b, 0xd4, 0xef, 0x8a, 0x2c, 0x3b, 0x88, 0x4c, 0xfa, 0x59, 0xca, 0x34,
            0x2b, 0x2e,
        ];
        assert_eq!(gf128_mul(&a, &one), a);
        assert_eq!(gf128_mul(&one, &a), a);
        assert_eq!(gf128_mul(&a, &[0u8; 16]), [0u8; 16]);
    }

    #[test]
    fn test_gf128_mul_commutes() {
        let a = [0x3cu8; 16];
        let mut b = [0u8; 16];
        for (i, v) in b.iter_mut().enumerate() {
            *v = i as u8 * 17;
        }
        assert_eq!(gf128_mul(&a, &b), gf128_mul(&b, &a));
    }
}
