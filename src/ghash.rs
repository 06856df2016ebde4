//! GHASH Universal Hash (SP 800-38D §6.4)
//!
//! Accumulates `X = (X ^ block) · H` over the associated data, then the
//! ciphertext, each zero-padded to a block boundary, and finally over the
//! block `[bitlen(A)]_64 || [bitlen(C)]_64`. Padding never counts toward
//! the encoded lengths.

use zeroize::Zeroize;

use crate::buffer::BlockBuffer;
use crate::cipher::xor_in_place;
use crate::error::{Error, Result};
use crate::gf::gf128_mul;

/// GHASH block size in bytes
pub const GHASH_BLOCK_SIZE: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Aad,
    Data,
}

/// Streaming GHASH keyed with the hash subkey `H`.
pub struct GHash {
    h: [u8; 16],
    x: [u8; 16],
    buffer: BlockBuffer,
    aad_len: u64,
    data_len: u64,
    phase: Phase,
}

impl GHash {
    /// Start a new hash under subkey `h`
    pub fn new(h: [u8; 16]) -> Self {
        Self {
            h,
            x: [0u8; 16],
            buffer: BlockBuffer::fixed(GHASH_BLOCK_SIZE),
            aad_len: 0,
            data_len: 0,
            phase: Phase::Aad,
        }
    }

    /// Bytes of associated data absorbed so far
    pub fn aad_len(&self) -> u64 {
        self.aad_len
    }

    /// Bytes of ciphertext absorbed so far
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    /// Absorb associated data. Must precede all ciphertext.
    pub fn update_aad(&mut self, aad: &[u8]) -> Result<()> {
        if self.phase != Phase::Aad {
            return Err(Error::InvalidState("associated data after ciphertext"));
        }
        self.aad_len = add_len(self.aad_len, aad.len(), "associated data")?;
        let (x, h) = (&mut self.x, &self.h);
        self.buffer.put(aad, |block| {
            absorb(x, h, block);
            Ok(())
        })
    }

    /// Absorb ciphertext. The first call closes the associated data.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        if self.phase == Phase::Aad {
            self.pad_partial()?;
            self.phase = Phase::Data;
        }
        self.data_len = add_len(self.data_len, data.len(), "ciphertext")?;
        let (x, h) = (&mut self.x, &self.h);
        self.buffer.put(data, |block| {
            absorb(x, h, block);
            Ok(())
        })
    }

    /// Fold in the length block and return the hash. Consumes the state.
    pub fn finalize(mut self) -> Result<[u8; 16]> {
        self.pad_partial()?;

        let mut len_block = [0u8; 16];
        len_block[..8].copy_from_slice(&(self.aad_len * 8).to_be_bytes());
        len_block[8..].copy_from_slice(&(self.data_len * 8).to_be_bytes());
        absorb(&mut self.x, &self.h, &len_block);

        Ok(self.x)
    }

    fn pad_partial(&mut self) -> Result<()> {
        let (x, h) = (&mut self.x, &self.h);
        self.buffer.flush(|partial| {
            if !partial.is_empty() {
                let mut block = [0u8; 16];
                block[..partial.len()].copy_from_slice(partial);
                absorb(x, h, &block);
                block.zeroize();
            }
            Ok(())
        })
    }
}

impl Drop for GHash {
    fn drop(&mut self) {
        self.h.zeroize();
        self.x.zeroize();
    }
}

/// One-shot GHASH over `aad` and `data`.
pub fn ghash(h: &[u8; 16], aad: &[u8], data: &[u8]) -> Result<[u8; 16]> {
    let mut hasher = GHash::new(*h);
    hasher.update_aad(aad)?;
    hasher.update(data)?;
    hasher.finalize()
}

fn absorb(x: &mut [u8; 16], h: &[u8; 16], block: &[u8]) {
    xor_in_place(x, block);
    *x = gf128_mul(x, h);
}

// Bit lengths are encoded in 64 bits, so byte counts stay below 2^61
fn add_len(current: u64, extra: usize, what: &'static str) -> Result<u64> {
    const LIMIT: u64 = (1 << 61) - 1;
    current
        .checked_add(extra as u64)
        .filter(|&total| total <= LIMIT)
        .ok_or(Error::MessageTooLong { what, limit: LIMIT })
}
