//! Block Buffering
//!
//! [`BlockBuffer`] turns arbitrary-length writes into whole blocks for a
//! block-oriented consumer. Full blocks are handed to a write callback as soon
//! as they are complete; the 0..block_size-1 trailing bytes stay in a carry
//! buffer until [`BlockBuffer::flush`] hands them to a separate callback that
//! can pad them.
//!
//! Callbacks run synchronously and only borrow the block for the duration of
//! the call. An error returned by a callback aborts the operation and is
//! returned to the caller unchanged.

use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Carry buffer between streaming input and a block-oriented consumer.
///
/// Invariant: `0 <= pending() < block_size()`.
#[derive(Debug, Clone)]
pub struct BlockBuffer {
    block_size: usize,
    carry: Vec<u8>,
}

impl BlockBuffer {
    /// Create a buffer for `block_size`-byte blocks.
    pub fn new(block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::length("block", "non-zero", 0));
        }
        Ok(Self {
            block_size,
            carry: Vec::with_capacity(block_size),
        })
    }

    // Block sizes fixed by the algorithm; never zero
    pub(crate) const fn fixed(block_size: usize) -> Self {
        Self {
            block_size,
            carry: Vec::new(),
        }
    }

    /// Block size in bytes
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of bytes waiting for the rest of their block
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Bytes waiting for the rest of their block
    pub fn pending_bytes(&self) -> &[u8] {
        &self.carry
    }

    /// Append `data`, forwarding every completed block to `write_block`.
    ///
    /// Blocks that can be taken directly from `data` are forwarded without
    /// being copied into the carry buffer.
    pub fn put<F>(&mut self, mut data: &[u8], mut write_block: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        if data.is_empty() {
            return Ok(());
        }

        // Top up a pending partial block first
        if !self.carry.is_empty() {
            let need = self.block_size - self.carry.len();
            let take = need.min(data.len());
            self.carry.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.carry.len() < self.block_size {
                return Ok(());
            }

            let result = write_block(&self.carry);
            self.carry.zeroize();
            result?;
        }

        let whole = data.len() - data.len() % self.block_size;
        for block in data[..whole].chunks_exact(self.block_size) {
            write_block(block)?;
        }

        self.carry.extend_from_slice(&data[whole..]);
        Ok(())
    }

    /// Hand the 0..block_size-1 pending bytes to `flush_partial` and empty the
    /// buffer. The callback runs even when nothing is pending so the caller
    /// can emit a full padding block.
    pub fn flush<F>(&mut self, flush_partial: F) -> Result<()>
    where
        F: FnOnce(&[u8]) -> Result<()>,
    {
        let result = flush_partial(&self.carry);
        self.carry.zeroize();
        result
    }

    /// Drop pending bytes without forwarding them
    pub fn reset(&mut self) {
        self.carry.zeroize();
    }
}

impl Drop for BlockBuffer {
    fn drop(&mut self) {
        self.carry.zeroize();
    }
}
