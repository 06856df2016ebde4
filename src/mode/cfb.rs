//! Cipher Feedback Mode (full-block feedback)

use log::debug;
use zeroize::Zeroize;

use super::{check_block, check_iv, BlockMode, StreamMode};
use crate::cipher::{ensure_keyed, BlockCipher};
use crate::error::{Error, Result};

/// CFB mode with a feedback width equal to the block size:
/// `C_i = P_i ^ E(C_{i-1})`, `C_0 = IV`.
///
/// A partial final block is processed byte by byte; the ciphertext bytes
/// produced so far are fed back once the block completes.
pub struct Cfb<C: BlockCipher> {
    cipher: C,
    register: Vec<u8>,
    keystream: Vec<u8>,
    used: usize,
}

impl<C: BlockCipher> Cfb<C> {
    /// Wrap an unkeyed cipher
    pub fn new(cipher: C) -> Self {
        Self {
            cipher,
            register: Vec::new(),
            keystream: Vec::new(),
            used: 0,
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        ensure_keyed(&self.cipher)?;
        if self.register.is_empty() {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    fn next_keystream_byte(&mut self) -> Result<u8> {
        if self.used == self.register.len() {
            self.keystream.copy_from_slice(&self.register);
            self.cipher.encrypt_block(&mut self.keystream)?;
            self.used = 0;
        }
        Ok(self.keystream[self.used])
    }
}

impl<C: BlockCipher> BlockMode for Cfb<C> {
    fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<()> {
        self.register.zeroize();
        self.keystream.zeroize();
        check_iv(iv, self.block_size())?;
        self.cipher.init(key)?;
        self.register = iv.to_vec();
        self.keystream = vec![0u8; iv.len()];
        self.used = iv.len();
        debug!("cfb: initialized, block size {}", self.block_size());
        Ok(())
    }

    fn encrypt_block(&mut self, block: &mut [u8]) -> Result<()> {
        check_block(block, self.block_size())?;
        self.encrypt_stream(block)
    }

    fn decrypt_block(&mut self, block: &mut [u8]) -> Result<()> {
        check_block(block, self.block_size())?;
        self.decrypt_stream(block)
    }
}

impl<C: BlockCipher> StreamMode for Cfb<C> {
    fn encrypt_stream(&mut self, data: &mut [u8]) -> Result<()> {
        self.ensure_ready()?;
        for byte in data.iter_mut() {
            let ks = self.next_keystream_byte()?;
            *byte ^= ks;
            self.register[self.used] = *byte;
            self.used += 1;
        }
        Ok(())
    }

    fn decrypt_stream(&mut self, data: &mut [u8]) -> Result<()> {
        self.ensure_ready()?;
        for byte in data.iter_mut() {
            let ks = self.next_keystream_byte()?;
            self.register[self.used] = *byte;
            *byte ^= ks;
            self.used += 1;
        }
        Ok(())
    }
}

impl<C: BlockCipher> Drop for Cfb<C> {
    fn drop(&mut self) {
        self.register.zeroize();
        self.keystream.zeroize();
    }
}
