//! Cipher Block Chaining

use log::debug;
use zeroize::Zeroize;

use super::{check_block, check_iv, BlockMode};
use crate::cipher::{ensure_keyed, xor_in_place, BlockCipher};
use crate::error::{Error, Result};

/// CBC mode: `C_i = E(P_i ^ C_{i-1})`, `C_0 = IV`.
pub struct Cbc<C: BlockCipher> {
    cipher: C,
    iv: Vec<u8>,
    vector: Vec<u8>,
}

impl<C: BlockCipher> Cbc<C> {
    /// Wrap an unkeyed cipher
    pub fn new(cipher: C) -> Self {
        Self {
            cipher,
            iv: Vec::new(),
            vector: Vec::new(),
        }
    }

    /// Restart the chain from the IV given to `init`, keeping the key
    pub fn reset(&mut self) -> Result<()> {
        if self.iv.is_empty() {
            return Err(Error::NotInitialized);
        }
        self.vector.copy_from_slice(&self.iv);
        Ok(())
    }

    /// Current chaining vector (last ciphertext block, or the IV)
    pub fn vector(&self) -> &[u8] {
        &self.vector
    }

    fn ensure_ready(&self) -> Result<()> {
        ensure_keyed(&self.cipher)?;
        if self.vector.is_empty() {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }
}

impl<C: BlockCipher> BlockMode for Cbc<C> {
    fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<()> {
        self.iv.zeroize();
        self.vector.zeroize();
        check_iv(iv, self.block_size())?;
        self.cipher.init(key)?;
        self.iv = iv.to_vec();
        self.vector = iv.to_vec();
        debug!("cbc: initialized, block size {}", self.block_size());
        Ok(())
    }

    fn encrypt_block(&mut self, block: &mut [u8]) -> Result<()> {
        self.ensure_ready()?;
        check_block(block, self.block_size())?;

        xor_in_place(block, &self.vector);
        self.cipher.encrypt_block(block)?;
        self.vector.copy_from_slice(block);
        Ok(())
    }

    fn decrypt_block(&mut self, block: &mut [u8]) -> Result<()> {
        self.ensure_ready()?;
        check_block(block, self.block_size())?;

        let mut saved = block.to_vec();
        self.cipher.decrypt_block(block)?;
        xor_in_place(block, &self.vector);
        self.vector.copy_from_slice(&saved);
        saved.zeroize();
        Ok(())
    }
}

impl<C: BlockCipher> Drop for Cbc<C> {
    fn drop(&mut self) {
        self.iv.zeroize();
        self.vector.zeroize();
    }
}

#[cfg(all(test, feature = "aes"))]
mod tests {
    use super::*;
    use crate::aes::Aes;

    const KEY: [u8; 16] = [
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f, 0x3c,
    ];

    fn iv() -> Vec<u8> {
        (0..16).collect()
    }

    #[test]
    fn test_roundtrip_multiple_blocks() {
        let mut data: Vec<u8> = (0..48).collect();
        let original = data.clone();

        let mut enc = Cbc::new(Aes::new());
        enc.init(&KEY, &iv()).unwrap();
        enc.encrypt_blocks(&mut data).unwrap();
        assert_ne!(data, original);
        assert_eq!(enc.vector(), &data[32..]);

        let mut dec = Cbc::new(Aes::new());
        dec.init(&KEY, &iv()).unwrap();
        dec.decrypt_blocks(&mut data).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn test_partial_block_rejected() {
        let mut cbc = Cbc::new(Aes::new());
        cbc.init(&KEY, &iv()).unwrap();
        let mut data = [0u8; 20];
        assert!(matches!(
            cbc.encrypt_blocks(&mut data),
            Err(Error::IncompleteBlock { len: 20, block_size: 16 })
        ));
    }

    #[test]
    fn test_bad_iv_rejected() {
        let mut cbc = Cbc::new(Aes::new());
        assert!(matches!(
            cbc.init(&KEY, &[0u8; 12]),
            Err(Error::InvalidParameterLength { actual: 12, .. })
        ));
        let mut block = [0u8; 16];
        assert!(matches!(cbc.encrypt_block(&mut block), Err(Error::NotInitialized)));
    }

    #[test]
    fn test_reset_restarts_chain() {
        let mut cbc = Cbc::new(Aes::new());
        cbc.init(&KEY, &iv()).unwrap();
        let mut first = [7u8; 16];
        cbc.encrypt_block(&mut first).unwrap();

        cbc.reset().unwrap();
        let mut again = [7u8; 16];
        cbc.encrypt_block(&mut again).unwrap();
        assert_eq!(first, again);
    }
}
