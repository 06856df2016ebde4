//! AES-XCBC-MAC (RFC 3566)
//!
//! Three keys are derived from the 128-bit master key K:
//! `K1 = E_K(0x01^16)`, `K2 = E_K(0x02^16)`, `K3 = E_K(0x03^16)`.
//! The message is CBC-MACed under K1; a complete last block is XORed with
//! K2 and a `0x80 00..` padded one with K3. XCBC-MAC-96 (RFC 3566 §4) is the
//! same MAC truncated to 12 bytes.

use log::debug;
use zeroize::Zeroize;

use super::{check_mac_len, LastBlockChain, Mac};
use crate::cipher::{ensure_keyed, BlockCipher};
use crate::error::{Error, Result};

const XCBC_BLOCK_SIZE: usize = 16;
/// Truncated MAC length for IPsec (XCBC-MAC-96)
pub const XCBC_MAC_96_LEN: usize = 12;

/// AES-XCBC-MAC over a 128-bit block cipher keyed with a 16-byte key.
///
/// Not thread-safe; use one instance per message stream.
pub struct Xcbc<C: BlockCipher> {
    cipher: C,
    mac_len: Option<usize>,
    k2: [u8; XCBC_BLOCK_SIZE],
    k3: [u8; XCBC_BLOCK_SIZE],
    chain: Option<LastBlockChain>,
}

impl<C: BlockCipher> Xcbc<C> {
    /// Wrap an unkeyed cipher; the MAC is the full 16 bytes
    pub fn new(cipher: C) -> Self {
        Self {
            cipher,
            mac_len: None,
            k2: [0; XCBC_BLOCK_SIZE],
            k3: [0; XCBC_BLOCK_SIZE],
            chain: None,
        }
    }

    /// Truncate the MAC to `len` bytes; checked at `init`
    pub fn with_mac_len(mut self, len: usize) -> Self {
        self.mac_len = Some(len);
        self
    }

    /// XCBC-MAC-96
    pub fn mac_96(cipher: C) -> Self {
        Self::new(cipher).with_mac_len(XCBC_MAC_96_LEN)
    }

    fn derive(&self, fill: u8) -> Result<[u8; XCBC_BLOCK_SIZE]> {
        let mut block = [fill; XCBC_BLOCK_SIZE];
        self.cipher.encrypt_block(&mut block)?;
        Ok(block)
    }
}

impl<C: BlockCipher> Mac for Xcbc<C> {
    fn mac_len(&self) -> usize {
        self.mac_len.unwrap_or(XCBC_BLOCK_SIZE)
    }

    fn is_initialized(&self) -> bool {
        self.chain.is_some() && self.cipher.is_initialized()
    }

    fn init(&mut self, key: &[u8]) -> Result<()> {
        self.chain = None;
        self.k2.zeroize();
        self.k3.zeroize();

        let bs = self.cipher.block_size();
        if bs != XCBC_BLOCK_SIZE {
            return Err(Error::length("XCBC block", "16", bs));
        }
        if key.len() != XCBC_BLOCK_SIZE {
            return Err(Error::length("XCBC key", "16", key.len()));
        }
        check_mac_len(self.mac_len(), bs)?;

        self.cipher.init(key)?;
        let mut k1 = self.derive(0x01)?;
        let derived = self
            .derive(0x02)
            .and_then(|k2| self.derive(0x03).map(|k3| (k2, k3)));
        let (k2, k3) = match derived {
            Ok(keys) => keys,
            Err(e) => {
                k1.zeroize();
                return Err(e);
            }
        };
        self.k2 = k2;
        self.k3 = k3;

        // The cipher is re-keyed with K1 for the CBC chain
        let rekeyed = self.cipher.init(&k1);
        k1.zeroize();
        rekeyed?;

        self.chain = Some(LastBlockChain::new(bs)?);
        debug!("xcbc: initialized, {}-byte mac", self.mac_len());
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        ensure_keyed(&self.cipher)?;
        let chain = self.chain.as_mut().ok_or(Error::NotInitialized)?;
        chain.update(&self.cipher, data)
    }

    fn sign(&mut self) -> Result<Vec<u8>> {
        ensure_keyed(&self.cipher)?;
        let mac_len = self.mac_len();
        let chain = self.chain.as_mut().ok_or(Error::NotInitialized)?;
        let mut mac = chain.finish(&self.cipher, &self.k2, &self.k3)?;
        mac.truncate(mac_len);
        Ok(mac)
    }

    fn reset(&mut self) {
        if let Some(chain) = self.chain.as_mut() {
            chain.reset();
        }
    }
}

impl<C: BlockCipher> Drop for Xcbc<C> {
    fn drop(&mut self) {
        self.k2.zeroize();
        self.k3.zeroize();
    }
}
