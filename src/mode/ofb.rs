//! Output Feedback Mode

use log::debug;
use zeroize::Zeroize;

use super::{check_block, check_iv, BlockMode, StreamMode};
use crate::cipher::{ensure_keyed, BlockCipher};
use crate::error::{Error, Result};

/// OFB mode: `O_i = E(O_{i-1})`, `O_0 = IV`, output `P_i ^ O_i`.
pub struct Ofb<C: BlockCipher> {
    cipher: C,
    vector: Vec<u8>,
    used: usize,
}

impl<C: BlockCipher> Ofb<C> {
    /// Wrap an unkeyed cipher
    pub fn new(cipher: C) -> Self {
        Self {
            cipher,
            vector: Vec::new(),
            used: 0,
        }
    }

    fn apply(&mut self, data: &mut [u8]) -> Result<()> {
        ensure_keyed(&self.cipher)?;
        if self.vector.is_empty() {
            return Err(Error::NotInitialized);
        }

        for byte in data.iter_mut() {
            if self.used == self.vector.len() {
                // The feedback register doubles as the keystream block
                self.cipher.encrypt_block(&mut self.vector)?;
                self.used = 0;
            }
            *byte ^= self.vector[self.used];
            self.used += 1;
        }
        Ok(())
    }
}

impl<C: BlockCipher> BlockMode for Ofb<C> {
    fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<()> {
        self.vector.zeroize();
        check_iv(iv, self.block_size())?;
        self.cipher.init(key)?;
        self.vector = iv.to_vec();
        self.used = iv.len();
        debug!("ofb: initialized, block size {}", self.block_size());
        Ok(())
    }

    fn encrypt_block(&mut self, block: &mut [u8]) -> Result<()> {
        check_block(block, self.block_size())?;
        self.apply(block)
    }

    fn decrypt_block(&mut self, block: &mut [u8]) -> Result<()> {
        check_block(block, self.block_size())?;
        self.apply(block)
    }
}

impl<C: BlockCipher> StreamMode for Ofb<C> {
    fn encrypt_stream(&mut self, data: &mut [u8]) -> Result<()> {
        self.apply(data)
    }

    fn decrypt_stream(&mut self, data: &mut [u8]) -> Result<()> {
        self.apply(data)
    }
}

impl<C: BlockCipher> Drop for Ofb<C> {
    fn drop(&mut self) {
        self.vector.zeroize();
    }
}
