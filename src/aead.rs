//! Authenticated Encryption Interface
//!
//! Common contract for [`Gcm`](crate::gcm::Gcm) and [`Ccm`](crate::ccm::Ccm).
//!
//! Lifecycle: `init(key, nonce)`, any number of `update_aad` calls, then either
//! `encrypt` calls followed by one `tag`, or `decrypt_update` calls followed by
//! one `decrypt_finish`. Decryption never releases plaintext before the tag
//! has been verified. After finishing, the context must be re-initialized.

use crate::error::{Error, Result};

/// Authenticated encryption with associated data.
pub trait Aead {
    /// Tag length in bytes
    fn tag_len(&self) -> usize;

    /// Key the cipher and fix the nonce for one message
    fn init(&mut self, key: &[u8], nonce: &[u8]) -> Result<()>;

    /// Add associated (authenticated, unencrypted) data
    fn update_aad(&mut self, aad: &[u8]) -> Result<()>;

    /// Encrypt the next piece of the message
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Finish encryption and return the tag
    fn tag(&mut self) -> Result<Vec<u8>>;

    /// Absorb the next piece of ciphertext; output is withheld until verification
    fn decrypt_update(&mut self, ciphertext: &[u8]) -> Result<()>;

    /// Verify `tag` and, only on success, return the whole plaintext
    fn decrypt_finish(&mut self, tag: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext || tag` in one call
    fn decrypt(&mut self, ciphertext_and_tag: &[u8]) -> Result<Vec<u8>> {
        let tag_len = self.tag_len();
        if ciphertext_and_tag.len() < tag_len {
            return Err(Error::length(
                "ciphertext",
                "at least the tag length",
                ciphertext_and_tag.len(),
            ));
        }
        let (ciphertext, tag) = ciphertext_and_tag.split_at(ciphertext_and_tag.len() - tag_len);
        self.decrypt_update(ciphertext)?;
        self.decrypt_finish(tag)
    }

    /// One-shot encryption returning `ciphertext || tag`
    fn seal(&mut self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.init(key, nonce)?;
        self.update_aad(aad)?;
        let mut out = self.encrypt(plaintext)?;
        out.extend_from_slice(&self.tag()?);
        Ok(out)
    }

    /// One-shot decryption of `ciphertext || tag`
    fn open(
        &mut self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext_and_tag: &[u8],
    ) -> Result<Vec<u8>> {
        self.init(key, nonce)?;
        self.update_aad(aad)?;
        self.decrypt(ciphertext_and_tag)
    }
}

/// Which way an AEAD context is being driven
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stage {
    Uninitialized,
    Ready,
    Encrypting,
    Decrypting,
    Finished,
}

impl Stage {
    /// Move to `next` if the call is legal from the current stage
    pub(crate) fn advance(&mut self, next: Stage) -> Result<()> {
        let ok = match (*self, next) {
            (Stage::Uninitialized, _) => return Err(Error::NotInitialized),
            (Stage::Finished, _) => {
                return Err(Error::InvalidState("message finished; call init again"))
            }
            (Stage::Ready, _) | (_, Stage::Finished) => true,
            (current, next) => current == next,
        };
        if !ok {
            return Err(Error::InvalidState("cannot mix encryption and decryption"));
        }
        *self = next;
        Ok(())
    }

    /// Associated data is accepted only before any message bytes
    pub(crate) fn check_aad(&self) -> Result<()> {
        match self {
            Stage::Uninitialized => Err(Error::NotInitialized),
            Stage::Ready => Ok(()),
            Stage::Finished => Err(Error::InvalidState("message finished; call init again")),
            _ => Err(Error::InvalidState("associated data after message data")),
        }
    }
}
