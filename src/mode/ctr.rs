//! Counter Mode

use log::debug;
use zeroize::Zeroize;

use super::{check_block, check_iv, BlockMode, StreamMode};
use crate::cipher::{ensure_keyed, BlockCipher};
use crate::error::{Error, Result};

/// CTR mode: `O_i = P_i ^ E(T_i)`, `T_{i+1} = T_i + 1`.
///
/// The counter is the low-order `counter_len` bytes of the block, incremented
/// big-endian and wrapping; the remaining high-order bytes are fixed by the
/// initial counter block.
pub struct Ctr<C: BlockCipher> {
    cipher: C,
    counter: Vec<u8>,
    keystream: Vec<u8>,
    used: usize,
    counter_len: Option<usize>,
}

impl<C: BlockCipher> Ctr<C> {
    /// Wrap an unkeyed cipher; the whole block is the counter
    pub fn new(cipher: C) -> Self {
        Self {
            cipher,
            counter: Vec::new(),
            keystream: Vec::new(),
            used: 0,
            counter_len: None,
        }
    }

    /// Increment only the low-order `len` bytes of the counter block
    pub fn with_counter_len(mut self, len: usize) -> Self {
        self.counter_len = Some(len);
        self
    }

    /// The wrapped cipher
    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Key the cipher without setting a counter
    pub(crate) fn init_key(&mut self, key: &[u8]) -> Result<()> {
        self.counter.zeroize();
        self.keystream.zeroize();
        self.check_counter_len()?;
        self.cipher.init(key)
    }

    /// Replace the counter block, keeping the key
    pub fn set_counter(&mut self, counter: &[u8]) -> Result<()> {
        ensure_keyed(&self.cipher)?;
        check_iv(counter, self.block_size())?;
        self.counter.zeroize();
        self.counter = counter.to_vec();
        self.keystream = vec![0u8; counter.len()];
        // Force a refill on the next byte
        self.used = counter.len();
        Ok(())
    }

    /// Counter block that will produce the next keystream block
    pub fn counter(&self) -> &[u8] {
        &self.counter
    }

    /// Encrypt or decrypt `data` in place (the two are the same in CTR).
    pub fn apply_keystream(&mut self, data: &mut [u8]) -> Result<()> {
        ensure_keyed(&self.cipher)?;
        if self.counter.is_empty() {
            return Err(Error::NotInitialized);
        }

        for byte in data.iter_mut() {
            if self.used == self.keystream.len() {
                self.refill()?;
            }
            *byte ^= self.keystream[self.used];
            self.used += 1;
        }
        Ok(())
    }

    fn refill(&mut self) -> Result<()> {
        self.keystream.copy_from_slice(&self.counter);
        self.cipher.encrypt_block(&mut self.keystream)?;
        self.increment();
        self.used = 0;
        Ok(())
    }

    fn increment(&mut self) {
        let width = self.counter_len.unwrap_or(self.counter.len());
        let start = self.counter.len() - width;
        for byte in self.counter[start..].iter_mut().rev() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                break;
            }
        }
    }

    fn check_counter_len(&self) -> Result<()> {
        match self.counter_len {
            Some(n) if n == 0 || n > self.block_size() => {
                Err(Error::length("counter", "1..=block size", n))
            }
            _ => Ok(()),
        }
    }
}

impl<C: BlockCipher> BlockMode for Ctr<C> {
    fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<()> {
        self.counter.zeroize();
        check_iv(iv, self.block_size())?;
        self.init_key(key)?;
        self.set_counter(iv)?;
        debug!(
            "ctr: initialized, block size {}, counter width {}",
            self.block_size(),
            self.counter_len.unwrap_or(self.block_size())
        );
        Ok(())
    }

    fn encrypt_block(&mut self, block: &mut [u8]) -> Result<()> {
        check_block(block, self.block_size())?;
        self.apply_keystream(block)
    }

    fn decrypt_block(&mut self, block: &mut [u8]) -> Result<()> {
        check_block(block, self.block_size())?;
        self.apply_keystream(block)
    }
}

impl<C: BlockCipher> StreamMode for Ctr<C> {
    fn encrypt_stream(&mut self, data: &mut [u8]) -> Result<()> {
        self.apply_keystream(data)
    }

    fn decrypt_stream(&mut self, data: &mut [u8]) -> Result<()> {
        self.apply_keystream(data)
    }
}

impl<C: BlockCipher> Drop for Ctr<C> {
    fn drop(&mut self) {
        self.counter.zeroize();
        self.keystream.zeroize();
    }
}

#[cfg(all(test, feature = "aes"))]
mod tests {
    use super::*;
    use crate::aes::Aes;

    fn keyed(counter: &[u8]) -> Ctr<Aes> {
        let mut ctr = Ctr::new(Aes::new());
        ctr.init(&[0x11u8; 16], counter).unwrap();
        ctr
    }

    #[test]
    fn test_counter_wraps_full_block() {
        let mut ctr = keyed(&[0xffu8; 16]);
        let mut data = [0u8; 16];
        ctr.apply_keystream(&mut data).unwrap();
        assert_eq!(ctr.counter(), &[0u8; 16]);
    }

    #[test]
    fn test_counter_width_limits_carry() {
        let mut ctr = Ctr::new(Aes::new()).with_counter_len(4);
        let mut start = [0xffu8; 16];
        start[0] = 0x42;
        ctr.init(&[0x11u8; 16], &start).unwrap();

        let mut data = [0u8; 16];
        ctr.apply_keystream(&mut data).unwrap();

        let mut expected = [0xffu8; 16];
        expected[0] = 0x42;
        expected[12..].copy_from_slice(&[0, 0, 0, 0]);
        assert_eq!(ctr.counter(), &expected);
    }

    #[test]
    fn test_split_calls_match_single_call() {
        let plain: Vec<u8> = (0..57).collect();

        let mut whole = plain.clone();
        keyed(&[3u8; 16]).apply_keystream(&mut whole).unwrap();

        let mut pieces = plain.clone();
        let mut ctr = keyed(&[3u8; 16]);
        let (a, rest) = pieces.split_at_mut(5);
        let (b, c) = rest.split_at_mut(20);
        ctr.apply_keystream(a).unwrap();
        ctr.apply_keystream(b).unwrap();
        ctr.apply_keystream(c).unwrap();
        assert_eq!(whole, pieces);
    }

    #[test]
    fn test_bad_counter_width() {
        let mut ctr = Ctr::new(Aes::new()).with_counter_len(17);
        assert!(ctr.init(&[0u8; 16], &[0u8; 16]).is_err());
    }

    #[test]
    fn test_uninitialized() {
        let mut ctr = Ctr::new(Aes::new());
        let mut data = [0u8; 3];
        assert!(matches!(ctr.apply_keystream(&mut data), Err(Error::NotInitialized)));
    }
}
