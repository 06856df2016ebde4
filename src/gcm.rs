//! Galois/Counter Mode (SP 800-38D)
//!
//! GCM combines CTR encryption (32-bit counter, starting at `inc32(J0)`) with
//! GHASH over the associated data and the *ciphertext*. The tag is
//! `GHASH(A, C) ^ E(J0)`, optionally truncated.
//!
//! - 96-bit IVs give `J0 = IV || 0^31 || 1`
//! - any other IV length gives `J0 = GHASH(IV || 0^s || [len(IV)]_64)`
//!
//! [`Gmac`] is GCM with an empty message: a MAC over associated data only.

use log::{debug, trace};
use zeroize::Zeroize;

use crate::aead::{Aead, Stage};
use crate::cipher::{xor_in_place, BlockCipher};
use crate::constant_time::ct_eq;
use crate::error::{Error, Result};
use crate::ghash::{ghash, GHash, GHASH_BLOCK_SIZE};
use crate::mode::{BlockMode, Ctr};

// ============================================================================
// GCM Constants
// ============================================================================

/// GCM tag size
pub const GCM_TAG_SIZE: usize = 16;
/// GCM nonce size (recommended)
pub const GCM_NONCE_SIZE: usize = 12;
/// Largest plaintext GCM can protect under one IV: 2^39 - 256 bits
pub const GCM_MAX_PLAINTEXT: u64 = (1 << 36) - 32;

const GCM_TAG_LENGTHS: [usize; 7] = [4, 8, 12, 13, 14, 15, 16];

// ============================================================================
// AES-GCM (Galois/Counter Mode)
// ============================================================================

/// GCM over any 128-bit block cipher.
///
/// Not thread-safe; use one instance per message stream.
pub struct Gcm<C: BlockCipher> {
    ctr: Ctr<C>,
    ghash: Option<GHash>,
    tag_mask: [u8; 16],
    pending: Vec<u8>,
    tag_len: usize,
    stage: Stage,
}

impl<C: BlockCipher> Gcm<C> {
    /// Wrap an unkeyed cipher. The tag is 16 bytes unless changed.
    pub fn new(cipher: C) -> Self {
        Self {
            ctr: Ctr::new(cipher).with_counter_len(4),
            ghash: None,
            tag_mask: [0u8; 16],
            pending: Vec::new(),
            tag_len: GCM_TAG_SIZE,
            stage: Stage::Uninitialized,
        }
    }

    /// Truncate tags to `len` bytes (4, 8 or 12..=16); checked at `init`
    pub fn with_tag_len(mut self, len: usize) -> Self {
        self.tag_len = len;
        self
    }

    fn reset_message(&mut self) {
        self.ghash = None;
        self.tag_mask.zeroize();
        self.pending.zeroize();
        self.stage = Stage::Uninitialized;
    }

    fn hasher(&mut self) -> Result<&mut GHash> {
        self.ghash.as_mut().ok_or(Error::NotInitialized)
    }

    fn check_message_len(&self, extra: usize) -> Result<()> {
        let so_far = self.ghash.as_ref().map_or(0, GHash::data_len);
        match so_far.checked_add(extra as u64) {
            Some(total) if total <= GCM_MAX_PLAINTEXT => Ok(()),
            _ => Err(Error::MessageTooLong {
                what: "GCM message",
                limit: GCM_MAX_PLAINTEXT,
            }),
        }
    }

    fn compute_tag(&mut self) -> Result<Vec<u8>> {
        let hasher = self.ghash.take().ok_or(Error::NotInitialized)?;
        trace!(
            "gcm: finalizing after {} aad bytes, {} message bytes",
            hasher.aad_len(),
            hasher.data_len()
        );
        let mut s = hasher.finalize()?;
        xor_in_place(&mut s, &self.tag_mask);
        let tag = s[..self.tag_len].to_vec();
        s.zeroize();
        Ok(tag)
    }
}

impl<C: BlockCipher> Aead for Gcm<C> {
    fn tag_len(&self) -> usize {
        self.tag_len
    }

    fn init(&mut self, key: &[u8], nonce: &[u8]) -> Result<()> {
        self.reset_message();

        if self.ctr.block_size() != GHASH_BLOCK_SIZE {
            return Err(Error::length("GCM block", "16", self.ctr.block_size()));
        }
        if !GCM_TAG_LENGTHS.contains(&self.tag_len) {
            return Err(Error::length("GCM tag", "4, 8 or 12..=16", self.tag_len));
        }
        if nonce.is_empty() {
            return Err(Error::length("GCM IV", "at least 1", 0));
        }

        self.ctr.init_key(key)?;

        // Hash subkey H = E(0^128)
        let mut h = [0u8; 16];
        self.ctr.cipher().encrypt_block(&mut h)?;

        let mut j0 = [0u8; 16];
        if nonce.len() == GCM_NONCE_SIZE {
            j0[..12].copy_from_slice(nonce);
            j0[15] = 1;
        } else {
            j0 = ghash(&h, &[], nonce)?;
        }

        self.tag_mask = j0;
        self.ctr.cipher().encrypt_block(&mut self.tag_mask)?;

        // Message counters start at inc32(J0)
        let mut first = j0;
        let ctr = u32::from_be_bytes([j0[12], j0[13], j0[14], j0[15]]);
        first[12..].copy_from_slice(&ctr.wrapping_add(1).to_be_bytes());
        self.ctr.set_counter(&first)?;

        self.ghash = Some(GHash::new(h));
        h.zeroize();
        j0.zeroize();
        self.stage = Stage::Ready;

        debug!(
            "gcm: initialized, {}-bit iv, {}-byte tag",
            nonce.len() * 8,
            self.tag_len
        );
        Ok(())
    }

    fn update_aad(&mut self, aad: &[u8]) -> Result<()> {
        self.stage.check_aad()?;
        self.hasher()?.update_aad(aad)
    }

    fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.stage.advance(Stage::Encrypting)?;
        self.check_message_len(plaintext.len())?;

        let mut out = plaintext.to_vec();
        self.ctr.apply_keystream(&mut out)?;
        self.hasher()?.update(&out)?;
        Ok(out)
    }

    fn tag(&mut self) -> Result<Vec<u8>> {
        self.stage.advance(Stage::Encrypting)?;
        let tag = self.compute_tag()?;
        self.stage = Stage::Finished;
        Ok(tag)
    }

    fn decrypt_update(&mut self, ciphertext: &[u8]) -> Result<()> {
        self.stage.advance(Stage::Decrypting)?;
        self.check_message_len(ciphertext.len())?;

        self.hasher()?.update(ciphertext)?;
        self.pending.extend_from_slice(ciphertext);
        Ok(())
    }

    fn decrypt_finish(&mut self, tag: &[u8]) -> Result<Vec<u8>> {
        self.stage.advance(Stage::Decrypting)?;
        if tag.len() != self.tag_len {
            return Err(Error::length("GCM tag", "the configured tag length", tag.len()));
        }

        let expected = self.compute_tag()?;
        self.stage = Stage::Finished;

        if !ct_eq(&expected, tag) {
            debug!(
                "gcm: tag mismatch, discarding {} ciphertext bytes",
                self.pending.len()
            );
            self.pending.zeroize();
            return Err(Error::AuthenticationFailure);
        }

        let mut plaintext = std::mem::take(&mut self.pending);
        self.ctr.apply_keystream(&mut plaintext)?;
        Ok(plaintext)
    }
}

impl<C: BlockCipher> Drop for Gcm<C> {
    fn drop(&mut self) {
        self.tag_mask.zeroize();
        self.pending.zeroize();
    }
}

// ============================================================================
// GMAC
// ============================================================================

/// GMAC: GCM authentication of associated data with an empty message.
pub struct Gmac<C: BlockCipher> {
    gcm: Gcm<C>,
    mac_len: usize,
}

impl<C: BlockCipher> Gmac<C> {
    /// Wrap an unkeyed cipher; full 16-byte tags
    pub fn new(cipher: C) -> Self {
        Self {
            gcm: Gcm::new(cipher),
            mac_len: GCM_TAG_SIZE,
        }
    }

    /// Truncate the MAC to `len` bytes (GMAC-96 uses 12); checked at `init`
    pub fn with_mac_len(mut self, len: usize) -> Self {
        self.mac_len = len;
        self
    }

    /// MAC length in bytes
    pub fn mac_len(&self) -> usize {
        self.mac_len
    }

    /// Key the cipher and fix the IV for one message
    pub fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<()> {
        if self.mac_len == 0 || self.mac_len > GCM_TAG_SIZE {
            return Err(Error::length("GMAC", "1..=16", self.mac_len));
        }
        self.gcm.init(key, iv)
    }

    /// Authenticate more data
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        self.gcm.update_aad(data)
    }

    /// Finish and return the MAC
    pub fn sign(&mut self) -> Result<Vec<u8>> {
        let mut tag = self.gcm.tag()?;
        tag.truncate(self.mac_len);
        Ok(tag)
    }

    /// Finish and compare against `expected` in constant time
    pub fn verify(&mut self, expected: &[u8]) -> Result<bool> {
        let tag = self.sign()?;
        Ok(ct_eq(&tag, expected))
    }
}

#[cfg(all(test, feature = "aes"))]
mod tests {
    use super::*;
    use crate::aes::Aes;

    fn h(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn test_empty_message_tag() {
        let mut gcm = Gcm::new(Aes::new());
        let out = gcm.seal(&[0u8; 16], &[0u8; 12], &[], &[]).unwrap();
        assert_eq!(out, h("58e2fccefa7e3061367f1d57a4e7455a"));
    }

    #[test]
    fn test_aes_gcm_roundtrip() {
        let key = [0x42u8; 16];
        let nonce = [0x24u8; 12];
        let plaintext = b"Hello, World! This is a test message.";
        let aad = b"additional data";

        let mut gcm = Gcm::new(Aes::new());
        let sealed = gcm.seal(&key, &nonce, aad, plaintext).unwrap();
        assert_eq!(sealed.len(), plaintext.len() + GCM_TAG_SIZE);

        let mut gcm = Gcm::new(Aes::new());
        let opened = gcm.open(&key, &nonce, aad, &sealed).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_tampered_tag_releases_nothing() {
        let key = [0x42u8; 32];
        let nonce = [0x24u8; 12];

        let mut gcm = Gcm::new(Aes::new());
        let mut sealed = gcm.seal(&key, &nonce, b"", b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;

        let mut gcm = Gcm::new(Aes::new());
        gcm.init(&key, &nonce).unwrap();
        assert!(matches!(gcm.decrypt(&sealed), Err(Error::AuthenticationFailure)));
        assert!(gcm.pending.is_empty());
        assert!(matches!(gcm.decrypt_update(b"x"), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_truncated_tag() {
        let mut gcm = Gcm::new(Aes::new()).with_tag_len(12);
        let sealed = gcm.seal(&[0u8; 16], &[0u8; 12], &[], &[]).unwrap();
        assert_eq!(sealed, h("58e2fccefa7e3061367f1d57"));

        let mut bad = Gcm::new(Aes::new()).with_tag_len(10);
        assert!(matches!(
            bad.init(&[0u8; 16], &[0u8; 12]),
            Err(Error::InvalidParameterLength { actual: 10, .. })
        ));
    }

    #[test]
    fn test_aad_after_data_rejected() {
        let mut gcm = Gcm::new(Aes::new());
        gcm.init(&[1u8; 16], &[2u8; 12]).unwrap();
        gcm.encrypt(b"data").unwrap();
        assert!(matches!(gcm.update_aad(b"late"), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_gmac_matches_gcm_aad_only() {
        let key = h("feffe9928665731c6d6a8f9467308308");
        let iv = h("cafebabefacedbaddecaf888");
        let aad = h("feedfacedeadbeeffeedfacedeadbeefabaddad2");

        let mut gmac = Gmac::new(Aes::new());
        gmac.init(&key, &iv).unwrap();
        gmac.update(&aad[..7]).unwrap();
        gmac.update(&aad[7..]).unwrap();
        assert_eq!(gmac.sign().unwrap(), h("346434fd51d5cd0c5887ec63e39b907a"));

        let mut gmac96 = Gmac::new(Aes::new()).with_mac_len(12);
        gmac96.init(&key, &iv).unwrap();
        gmac96.update(&aad).unwrap();
        assert!(gmac96.verify(&h("346434fd51d5cd0c5887ec63")).unwrap());
    }
}
