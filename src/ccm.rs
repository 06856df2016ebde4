//! Counter with CBC-MAC (RFC 3610, SP 800-38C)
//!
//! The nonce is 7..=13 bytes, which fixes the width of the message length
//! field at `L = 15 - nonce_len` bytes. The MAC is a CBC-MAC over
//!
//! ```text
//! B0 = flags || nonce || [len(P)]_L
//!      [len(A)] || A || 0-pad          (only if A is non-empty)
//!      P || 0-pad
//! ```
//!
//! and is encrypted with counter block `A_0`; the payload uses `A_1, A_2, ..`.
//! B0 needs the final message length, so the MAC is computed when the
//! message ends and the payload is buffered until then.

use log::{debug, trace};
use zeroize::Zeroize;

use crate::aead::{Aead, Stage};
use crate::cipher::{xor_in_place, BlockCipher};
use crate::constant_time::ct_eq;
use crate::error::{Error, Result};
use crate::mac::CbcMacState;
use crate::mode::{BlockMode, Ctr};

/// Default tag length (RFC 3610 packet vectors 1-12)
pub const CCM_DEFAULT_TAG_SIZE: usize = 8;
/// Shortest accepted nonce
pub const CCM_MIN_NONCE_SIZE: usize = 7;
/// Longest accepted nonce
pub const CCM_MAX_NONCE_SIZE: usize = 13;

const CCM_BLOCK_SIZE: usize = 16;

/// CCM over any 128-bit block cipher.
///
/// Not thread-safe; use one instance per message stream.
pub struct Ccm<C: BlockCipher> {
    ctr: Ctr<C>,
    tag_len: usize,
    nonce: Vec<u8>,
    aad: Vec<u8>,
    // Plaintext while encrypting, ciphertext while decrypting
    payload: Vec<u8>,
    stage: Stage,
}

impl<C: BlockCipher> Ccm<C> {
    /// Wrap an unkeyed cipher with the default 8-byte tag
    pub fn new(cipher: C) -> Self {
        Self {
            ctr: Ctr::new(cipher),
            tag_len: CCM_DEFAULT_TAG_SIZE,
            nonce: Vec::new(),
            aad: Vec::new(),
            payload: Vec::new(),
            stage: Stage::Uninitialized,
        }
    }

    /// Tag length in bytes: even, 4..=16. Checked at `init`.
    pub fn with_tag_len(mut self, len: usize) -> Self {
        self.tag_len = len;
        self
    }

    /// Width of the length field, `L`
    fn length_field(&self) -> usize {
        CCM_BLOCK_SIZE - 1 - self.nonce.len()
    }

    /// Largest payload the length field can describe
    fn max_payload(&self) -> u64 {
        match self.length_field() {
            l if l >= 8 => u64::MAX,
            l => (1u64 << (8 * l)) - 1,
        }
    }

    /// Counter block `A_i`
    fn counter_block(&self, i: u64) -> [u8; CCM_BLOCK_SIZE] {
        let l = self.length_field();
        let mut block = [0u8; CCM_BLOCK_SIZE];
        block[0] = (l - 1) as u8;
        block[1..1 + self.nonce.len()].copy_from_slice(&self.nonce);
        block[CCM_BLOCK_SIZE - l..].copy_from_slice(&i.to_be_bytes()[8 - l..]);
        block
    }

    fn reset_message(&mut self) {
        self.nonce.clear();
        self.aad.zeroize();
        self.payload.zeroize();
        self.stage = Stage::Uninitialized;
    }

    fn check_payload_len(&self, extra: usize) -> Result<()> {
        let limit = self.max_payload();
        match (self.payload.len() as u64).checked_add(extra as u64) {
            Some(total) if total <= limit => Ok(()),
            _ => Err(Error::MessageTooLong {
                what: "CCM payload",
                limit,
            }),
        }
    }

    /// Encrypted MAC over the buffered AAD and `plaintext`
    fn compute_tag(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = self.ctr.cipher();
        let l = self.length_field();
        let mut mac = CbcMacState::new(CCM_BLOCK_SIZE);

        let mut b0 = [0u8; CCM_BLOCK_SIZE];
        b0[0] = ((!self.aad.is_empty() as u8) << 6)
            | ((((self.tag_len - 2) / 2) as u8) << 3)
            | (l - 1) as u8;
        b0[1..1 + self.nonce.len()].copy_from_slice(&self.nonce);
        b0[CCM_BLOCK_SIZE - l..].copy_from_slice(&(plaintext.len() as u64).to_be_bytes()[8 - l..]);
        mac.absorb(cipher, &b0)?;

        if !self.aad.is_empty() {
            let mut encoded = encode_aad_len(self.aad.len() as u64);
            encoded.extend_from_slice(&self.aad);
            let absorbed = mac.absorb_zero_padded(cipher, &encoded);
            encoded.zeroize();
            absorbed?;
        }
        mac.absorb_zero_padded(cipher, plaintext)?;

        let mut s0 = self.counter_block(0);
        cipher.encrypt_block(&mut s0)?;
        let mut tag = mac.value()[..self.tag_len].to_vec();
        xor_in_place(&mut tag, &s0);
        s0.zeroize();

        trace!(
            "ccm: tag over {} aad bytes, {} payload bytes",
            self.aad.len(),
            plaintext.len()
        );
        Ok(tag)
    }
}

/// Length prefix for the associated data (RFC 3610 §2.2)
fn encode_aad_len(len: u64) -> Vec<u8> {
    if len < 0xff00 {
        (len as u16).to_be_bytes().to_vec()
    } else if len <= u32::MAX as u64 {
        let mut out = vec![0xff, 0xfe];
        out.extend_from_slice(&(len as u32).to_be_bytes());
        out
    } else {
        let mut out = vec![0xff, 0xff];
        out.extend_from_slice(&len.to_be_bytes());
        out
    }
}

impl<C: BlockCipher> Aead for Ccm<C> {
    fn tag_len(&self) -> usize {
        self.tag_len
    }

    fn init(&mut self, key: &[u8], nonce: &[u8]) -> Result<()> {
        self.reset_message();

        if self.ctr.block_size() != CCM_BLOCK_SIZE {
            return Err(Error::length("CCM block", "16", self.ctr.block_size()));
        }
        if !(4..=16).contains(&self.tag_len) || self.tag_len % 2 != 0 {
            return Err(Error::length("CCM tag", "4, 6, .., 16", self.tag_len));
        }
        if !(CCM_MIN_NONCE_SIZE..=CCM_MAX_NONCE_SIZE).contains(&nonce.len()) {
            return Err(Error::length("CCM nonce", "7..=13", nonce.len()));
        }

        self.ctr.init_key(key)?;
        self.nonce = nonce.to_vec();
        let first = self.counter_block(1);
        self.ctr.set_counter(&first)?;
        self.stage = Stage::Ready;

        debug!(
            "ccm: initialized, {}-byte nonce, {}-byte tag",
            nonce.len(),
            self.tag_len
        );
        Ok(())
    }

    fn update_aad(&mut self, aad: &[u8]) -> Result<()> {
        self.stage.check_aad()?;
        self.aad.extend_from_slice(aad);
        Ok(())
    }

    fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.stage.advance(Stage::Encrypting)?;
        self.check_payload_len(plaintext.len())?;

        self.payload.extend_from_slice(plaintext);
        let mut out = plaintext.to_vec();
        self.ctr.apply_keystream(&mut out)?;
        Ok(out)
    }

    fn tag(&mut self) -> Result<Vec<u8>> {
        self.stage.advance(Stage::Encrypting)?;
        let tag = self.compute_tag(&self.payload)?;
        self.payload.zeroize();
        self.aad.zeroize();
        self.stage = Stage::Finished;
        Ok(tag)
    }

    fn decrypt_update(&mut self, ciphertext: &[u8]) -> Result<()> {
        self.stage.advance(Stage::Decrypting)?;
        self.check_payload_len(ciphertext.len())?;
        self.payload.extend_from_slice(ciphertext);
        Ok(())
    }

    fn decrypt_finish(&mut self, tag: &[u8]) -> Result<Vec<u8>> {
        self.stage.advance(Stage::Decrypting)?;
        if tag.len() != self.tag_len {
            return Err(Error::length("CCM tag", "the configured tag length", tag.len()));
        }

        let mut plaintext = std::mem::take(&mut self.payload);
        self.ctr.apply_keystream(&mut plaintext)?;
        let expected = self.compute_tag(&plaintext);
        self.aad.zeroize();
        self.stage = Stage::Finished;

        match expected {
            Ok(expected) if ct_eq(&expected, tag) => Ok(plaintext),
            Ok(_) => {
                debug!(
                    "ccm: tag mismatch, discarding {} payload bytes",
                    plaintext.len()
                );
                plaintext.zeroize();
                Err(Error::AuthenticationFailure)
            }
            Err(e) => {
                plaintext.zeroize();
                Err(e)
            }
        }
    }
}

impl<C: BlockCipher> Drop for Ccm<C> {
    fn drop(&mut self) {
        self.aad.zeroize();
        self.payload.zeroize();
    }
}
