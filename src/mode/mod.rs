//! Block Cipher Modes of Operation (SP 800-38A)
//!
//! Each mode owns its cipher and a block-length state vector (IV, counter or
//! feedback register) that evolves with every block processed.
//!
//! - [`Cbc`]: whole blocks only; padding is the caller's concern
//! - [`Ctr`], [`Ofb`], [`Cfb`]: keystream modes, safe for any byte length
//!
//! Instances are not thread-safe; create one instance per stream.

mod cbc;
mod cfb;
mod ctr;
mod ofb;

pub use cbc::Cbc;
pub use cfb::Cfb;
pub use ctr::Ctr;
pub use ofb::Ofb;

use crate::cipher::ensure_whole_blocks;
use crate::error::{Error, Result};

/// A block cipher chained across successive blocks.
pub trait BlockMode {
    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Key the cipher and set the state vector to `iv`.
    ///
    /// `iv` must be exactly one block long.
    fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<()>;

    /// Encrypt one block in place.
    fn encrypt_block(&mut self, block: &mut [u8]) -> Result<()>;

    /// Decrypt one block in place.
    fn decrypt_block(&mut self, block: &mut [u8]) -> Result<()>;

    /// Encrypt a whole number of blocks in place.
    fn encrypt_blocks(&mut self, data: &mut [u8]) -> Result<()> {
        let bs = self.block_size();
        ensure_whole_blocks(data.len(), bs)?;
        for block in data.chunks_exact_mut(bs) {
            self.encrypt_block(block)?;
        }
        Ok(())
    }

    /// Decrypt a whole number of blocks in place.
    fn decrypt_blocks(&mut self, data: &mut [u8]) -> Result<()> {
        let bs = self.block_size();
        ensure_whole_blocks(data.len(), bs)?;
        for block in data.chunks_exact_mut(bs) {
            self.decrypt_block(block)?;
        }
        Ok(())
    }
}

/// A mode that turns the cipher into a keystream and accepts any length.
///
/// Successive calls continue the keystream where the previous call stopped,
/// so splitting the input never changes the output.
pub trait StreamMode: BlockMode {
    /// Encrypt `data` in place.
    fn encrypt_stream(&mut self, data: &mut [u8]) -> Result<()>;

    /// Decrypt `data` in place.
    fn decrypt_stream(&mut self, data: &mut [u8]) -> Result<()>;
}

pub(crate) fn check_iv(iv: &[u8], block_size: usize) -> Result<()> {
    if iv.len() != block_size {
        return Err(Error::length("IV", "one block", iv.len()));
    }
    Ok(())
}

pub(crate) fn check_block(block: &[u8], block_size: usize) -> Result<()> {
    if block.len() != block_size {
        return Err(Error::IncompleteBlock {
            len: block.len(),
            block_size,
        });
    }
    Ok(())
}
