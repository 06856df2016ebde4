//! Block Cipher Interface
//!
//! Modes and MACs are written against [`BlockCipher`] only. A concrete cipher
//! is created unkeyed, keyed with [`BlockCipher::init`], and then owned by the
//! single mode or MAC instance that wraps it.

use crate::error::{Error, Result};

/// A keyed permutation over fixed-size blocks.
pub trait BlockCipher {
    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Block size in bits.
    fn block_length_bits(&self) -> u32 {
        (self.block_size() * 8) as u32
    }

    /// Whether [`BlockCipher::init`] has installed a key schedule.
    fn is_initialized(&self) -> bool;

    /// Install (or replace) the key schedule.
    fn init(&mut self, key: &[u8]) -> Result<()>;

    /// Encrypt exactly one block in place.
    ///
    /// Fails with [`Error::NotInitialized`] before a key is installed and
    /// with [`Error::IncompleteBlock`] unless `block` is one block long.
    fn encrypt_block(&self, block: &mut [u8]) -> Result<()>;

    /// Decrypt exactly one block in place. Fails like
    /// [`BlockCipher::encrypt_block`].
    fn decrypt_block(&self, block: &mut [u8]) -> Result<()>;
}

/// XOR `src` into `dst` byte by byte over the shorter of the two.
#[inline]
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

/// Fail with `NotInitialized` unless the cipher holds a key schedule.
pub(crate) fn ensure_keyed<C: BlockCipher + ?Sized>(cipher: &C) -> Result<()> {
    if cipher.is_initialized() {
        Ok(())
    } else {
        Err(Error::NotInitialized)
    }
}

/// Fail with `IncompleteBlock` unless `len` is a whole number of blocks.
pub(crate) fn ensure_whole_blocks(len: usize, block_size: usize) -> Result<()> {
    if len % block_size == 0 {
        Ok(())
    } else {
        Err(Error::IncompleteBlock { len, block_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_in_place() {
        let mut a = [0x0f, 0xf0, 0xaa];
        xor_in_place(&mut a, &[0xff, 0xff]);
        assert_eq!(a, [0xf0, 0x0f, 0xaa]);
    }

    #[test]
    fn test_whole_blocks() {
        assert!(ensure_whole_blocks(32, 16).is_ok());
        assert!(ensure_whole_blocks(0, 16).is_ok());
        assert!(matches!(
            ensure_whole_blocks(17, 16),
            Err(Error::IncompleteBlock { len: 17, block_size: 16 })
        ));
    }
}
