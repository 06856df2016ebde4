//! CBC-MAC Core
//!
//! [`CbcMacState`] is the bare chaining value `X = E(X ^ block)` shared by CCM
//! and every MAC in this module. [`LastBlockChain`] adds the streaming logic
//! of the CMAC family: the final complete block is held back until the
//! message is known to have ended.

use log::debug;
use zeroize::Zeroize;

use super::{check_mac_len, Mac};
use crate::buffer::BlockBuffer;
use crate::cipher::{ensure_keyed, xor_in_place, BlockCipher};
use crate::error::{Error, Result};
use crate::padding::iso7816_pad;

/// Running CBC-MAC value.
pub(crate) struct CbcMacState {
    x: Vec<u8>,
}

impl CbcMacState {
    pub(crate) fn new(block_size: usize) -> Self {
        Self {
            x: vec![0u8; block_size],
        }
    }

    /// Chain one full block
    pub(crate) fn absorb<C: BlockCipher + ?Sized>(&mut self, cipher: &C, block: &[u8]) -> Result<()> {
        xor_in_place(&mut self.x, block);
        cipher.encrypt_block(&mut self.x)
    }

    /// Chain `data`, zero-padding the final partial block
    pub(crate) fn absorb_zero_padded<C: BlockCipher + ?Sized>(
        &mut self,
        cipher: &C,
        data: &[u8],
    ) -> Result<()> {
        let bs = self.x.len();
        for chunk in data.chunks(bs) {
            // Zero padding leaves the tail of X unchanged under XOR
            xor_in_place(&mut self.x[..chunk.len()], chunk);
            cipher.encrypt_block(&mut self.x)?;
        }
        Ok(())
    }

    pub(crate) fn value(&self) -> &[u8] {
        &self.x
    }

    pub(crate) fn reset(&mut self) {
        self.x.iter_mut().for_each(|b| *b = 0);
    }
}

impl Drop for CbcMacState {
    fn drop(&mut self) {
        self.x.zeroize();
    }
}

/// CBC chain that withholds the last complete block for subkey masking.
pub(crate) struct LastBlockChain {
    state: CbcMacState,
    buffer: BlockBuffer,
    held: Vec<u8>,
}

impl LastBlockChain {
    pub(crate) fn new(block_size: usize) -> Result<Self> {
        Ok(Self {
            state: CbcMacState::new(block_size),
            buffer: BlockBuffer::new(block_size)?,
            held: Vec::with_capacity(block_size),
        })
    }

    pub(crate) fn update<C: BlockCipher + ?Sized>(&mut self, cipher: &C, data: &[u8]) -> Result<()> {
        let (state, held) = (&mut self.state, &mut self.held);
        self.buffer.put(data, |block| {
            if !held.is_empty() {
                state.absorb(cipher, held)?;
            }
            held.clear();
            held.extend_from_slice(block);
            Ok(())
        })
    }

    /// Finish the message: a complete last block is masked with `k_complete`,
    /// a short or empty one is padded with `0x80 00..` and masked with `k_partial`.
    /// The chain is left empty for the next message.
    pub(crate) fn finish<C: BlockCipher + ?Sized>(
        &mut self,
        cipher: &C,
        k_complete: &[u8],
        k_partial: &[u8],
    ) -> Result<Vec<u8>> {
        let bs = self.buffer.block_size();
        let (state, held) = (&mut self.state, &mut self.held);
        let mut last = Vec::with_capacity(bs);

        self.buffer.flush(|partial| {
            if partial.is_empty() && !held.is_empty() {
                last.extend_from_slice(held);
                xor_in_place(&mut last, k_complete);
            } else {
                if !held.is_empty() {
                    state.absorb(cipher, held)?;
                }
                last = iso7816_pad(partial, bs)?;
                xor_in_place(&mut last, k_partial);
            }
            Ok(())
        })?;

        let absorbed = self.state.absorb(cipher, &last);
        last.zeroize();
        absorbed?;
        let mac = self.state.value().to_vec();
        self.reset();
        Ok(mac)
    }

    pub(crate) fn reset(&mut self) {
        self.state.reset();
        self.buffer.reset();
        self.held.zeroize();
    }
}

impl Drop for LastBlockChain {
    fn drop(&mut self) {
        self.held.zeroize();
    }
}

/// Plain CBC-MAC with zero padding (ISO/IEC 9797-1 MAC algorithm 1, padding
/// method 1). Only safe for messages of one fixed length per key; prefer
/// [`Cmac`](super::Cmac) elsewhere.
///
/// The empty message pads to one zero block, so its MAC is `E_K(0^n)`.
/// Not thread-safe; use one instance per message stream.
pub struct CbcMac<C: BlockCipher> {
    cipher: C,
    state: Option<CbcMacState>,
    buffer: Option<BlockBuffer>,
    mac_len: Option<usize>,
    // Whether the current message has chained at least one block
    absorbed: bool,
}

impl<C: BlockCipher> CbcMac<C> {
    /// Wrap an unkeyed cipher; the MAC is one block unless truncated
    pub fn new(cipher: C) -> Self {
        Self {
            cipher,
            state: None,
            buffer: None,
            mac_len: None,
            absorbed: false,
        }
    }

    /// Truncate the MAC to `len` bytes; checked at `init`
    pub fn with_mac_len(mut self, len: usize) -> Self {
        self.mac_len = Some(len);
        self
    }
}

impl<C: BlockCipher> Mac for CbcMac<C> {
    fn mac_len(&self) -> usize {
        self.mac_len.unwrap_or(self.cipher.block_size())
    }

    fn is_initialized(&self) -> bool {
        self.state.is_some() && self.cipher.is_initialized()
    }

    fn init(&mut self, key: &[u8]) -> Result<()> {
        self.state = None;
        self.buffer = None;
        self.absorbed = false;
        let bs = self.cipher.block_size();
        check_mac_len(self.mac_len(), bs)?;
        self.cipher.init(key)?;
        self.state = Some(CbcMacState::new(bs));
        self.buffer = Some(BlockBuffer::new(bs)?);
        debug!("cbc-mac: initialized, {}-byte mac", self.mac_len());
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        ensure_keyed(&self.cipher)?;
        let cipher = &self.cipher;
        let absorbed = &mut self.absorbed;
        match (self.state.as_mut(), self.buffer.as_mut()) {
            (Some(state), Some(buffer)) => buffer.put(data, |block| {
                *absorbed = true;
                state.absorb(cipher, block)
            }),
            _ => Err(Error::NotInitialized),
        }
    }

    fn sign(&mut self) -> Result<Vec<u8>> {
        ensure_keyed(&self.cipher)?;
        let mac_len = self.mac_len();
        let cipher = &self.cipher;
        let absorbed = std::mem::replace(&mut self.absorbed, false);
        match (self.state.as_mut(), self.buffer.as_mut()) {
            (Some(state), Some(buffer)) => {
                let tail = buffer.flush(|partial| {
                    if !partial.is_empty() {
                        state.absorb_zero_padded(cipher, partial)
                    } else if !absorbed {
                        state.absorb(cipher, &vec![0u8; cipher.block_size()])
                    } else {
                        Ok(())
                    }
                });
                if let Err(e) = tail {
                    state.reset();
                    return Err(e);
                }
                let mac = state.value()[..mac_len].to_vec();
                state.reset();
                Ok(mac)
            }
            _ => Err(Error::NotInitialized),
        }
    }

    fn reset(&mut self) {
        self.absorbed = false;
        if let Some(state) = self.state.as_mut() {
            state.reset();
        }
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.reset();
        }
    }
}
