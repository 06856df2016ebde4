//! CMAC / OMAC
//!
//! `L = E_K(0^b)`, `K1 = L·x`. OMAC1 (CMAC, RFC 4493 / SP 800-38B) uses
//! `K2 = L·x^2`; OMAC2 uses `K2 = L·x^-1`. A complete last block is XORed with
//! K1, a padded one with K2. Block sizes of 64 and 128 bits are supported.

use log::{debug, trace};
use zeroize::Zeroize;

use super::{check_mac_len, LastBlockChain, Mac};
use crate::cipher::{ensure_keyed, BlockCipher};
use crate::error::{Error, Result};
use crate::gf::{dbl, halve};

/// How the second subkey is derived from `L`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CmacVariant {
    /// `K2 = L·x^2` (CMAC)
    #[default]
    Omac1,
    /// `K2 = L·x^-1`
    Omac2,
}

/// CMAC/OMAC1 or OMAC2 over a 64- or 128-bit block cipher.
///
/// Subkeys are derived at `init` and kept across messages; `sign` resets
/// only the chaining state. Not thread-safe; use one instance per message
/// stream.
pub struct Cmac<C: BlockCipher> {
    cipher: C,
    variant: CmacVariant,
    mac_len: Option<usize>,
    k1: Vec<u8>,
    k2: Vec<u8>,
    chain: Option<LastBlockChain>,
}

impl<C: BlockCipher> Cmac<C> {
    /// CMAC (OMAC1) over an unkeyed cipher
    pub fn new(cipher: C) -> Self {
        Self::with_variant(cipher, CmacVariant::Omac1)
    }

    /// OMAC2 over an unkeyed cipher
    pub fn omac2(cipher: C) -> Self {
        Self::with_variant(cipher, CmacVariant::Omac2)
    }

    /// Wrap an unkeyed cipher, deriving the second subkey per `variant`
    pub fn with_variant(cipher: C, variant: CmacVariant) -> Self {
        Self {
            cipher,
            variant,
            mac_len: None,
            k1: Vec::new(),
            k2: Vec::new(),
            chain: None,
        }
    }

    /// Truncate the MAC to `len` bytes; checked at `init`
    pub fn with_mac_len(mut self, len: usize) -> Self {
        self.mac_len = Some(len);
        self
    }

    /// Subkey derivation in use
    pub fn variant(&self) -> CmacVariant {
        self.variant
    }

    /// Encrypt the zero block in `l` and derive K1 and K2 from it
    fn derive_subkeys(&self, l: &mut [u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        self.cipher.encrypt_block(l)?;
        let k1 = dbl(l)?;
        let k2 = match self.variant {
            CmacVariant::Omac1 => dbl(&k1)?,
            CmacVariant::Omac2 => halve(l)?,
        };
        Ok((k1, k2))
    }

    fn clear_subkeys(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
        self.chain = None;
    }
}

impl<C: BlockCipher> Mac for Cmac<C> {
    fn mac_len(&self) -> usize {
        self.mac_len.unwrap_or(self.cipher.block_size())
    }

    fn is_initialized(&self) -> bool {
        self.chain.is_some() && self.cipher.is_initialized()
    }

    fn init(&mut self, key: &[u8]) -> Result<()> {
        self.clear_subkeys();
        let bs = self.cipher.block_size();
        check_mac_len(self.mac_len(), bs)?;
        if bs != 8 && bs != 16 {
            return Err(Error::length("CMAC block", "8 or 16", bs));
        }
        self.cipher.init(key)?;

        let mut l = vec![0u8; bs];
        let subkeys = self.derive_subkeys(&mut l);
        l.zeroize();
        let (k1, k2) = subkeys?;

        self.k1 = k1;
        self.k2 = k2;
        self.chain = Some(LastBlockChain::new(bs)?);
        debug!(
            "cmac: initialized {:?}, block size {}, {}-byte mac",
            self.variant,
            bs,
            self.mac_len()
        );
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
        let mut mac = chain.finish(&self.cipher, &self.k1, &self.k2)?;
        mac.truncate(mac_len);
        trace!("cmac: message finished");
        Ok(mac)
    }

    fn reset(&mut self) {
        if let Some(chain) = self.chain.as_mut() {
            chain.reset();
        }
    }
}

impl<C: BlockCipher> Drop for Cmac<C> {
    fn drop(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
    }
}

#[cfg(all(test, feature = "aes"))]
mod tests {
    use super::*;
    use crate::aes::Aes;

    const KEY: [u8; 16] = [
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f,
        0x3c,
    ];

    const MESSAGE: [u8; 40] = [
        0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93, 0x17,
        0x2a, 0xae, 0x2d, 0x8a, 0x57, 0x1e, 0x03, 0xac, 0x9c, 0x9e, 0xb7, 0x6f, 0xac, 0x45, 0xaf,
        0x8e, 0x51, 0x30, 0xc8, 0x1c, 0x46, 0xa3, 0x5c, 0xe4, 0x11,
    ];

    fn cmac(variant: CmacVariant) -> Cmac<Aes> {
        let mut mac = Cmac::with_variant(Aes::new(), variant);
        mac.init(&KEY).unwrap();
        mac
    }

    #[test]
    fn test_rfc4493_subkeys() {
        let mac = cmac(CmacVariant::Omac1);
        assert_eq!(
            mac.k1,
            [
                0xfb, 0xee, 0xd6, 0x18, 0x35, 0x71, 0x33, 0x66, 0x7c, 0x85, 0xe0, 0x8f, 0x72, 0x36,
                0xa8, 0xde
            ]
        );
        assert_eq!(
            mac.k2,
            [
                0xf7, 0xdd, 0xac, 0x30, 0x6a, 0xe2, 0x66, 0xcc, 0xf9, 0x0b, 0xc1, 0x1e, 0xe4, 0x6d,
                0x51, 0x3b
            ]
        );
    }

    #[test]
    fn test_rfc4493_examples() {
        let mut mac = cmac(CmacVariant::Omac1);
        assert_eq!(
            mac.do_final(&[]).unwrap(),
            [
                0xbb, 0x1d, 0x69, 0x29, 0xe9, 0x59, 0x37, 0x28, 0x7f, 0xa3, 0x7d, 0x12, 0x9b, 0x75,
                0x67, 0x46
            ]
        );
        assert_eq!(
            mac.do_final(&MESSAGE[..16]).unwrap(),
            [
                0x07, 0x0a, 0x16, 0xb4, 0x6b, 0x4d, 0x41, 0x44, 0xf7, 0x9b, 0xdd, 0x9d, 0xd0, 0x4a,
                0x28, 0x7c
            ]
        );
        assert_eq!(
            mac.do_final(&MESSAGE).unwrap(),
            [
                0xdf, 0xa6, 0x67, 0x47, 0xde, 0x9a, 0xe6, 0x30, 0x30, 0xca, 0x32, 0x61, 0x14, 0x97,
                0xc8, 0x27
            ]
        );
    }

    #[test]
    fn test_omac2_differs_only_on_padded_messages() {
        let mut omac1 = cmac(CmacVariant::Omac1);
        let mut omac2 = cmac(CmacVariant::Omac2);

        assert_eq!(
            omac1.do_final(&MESSAGE[..16]).unwrap(),
            omac2.do_final(&MESSAGE[..16]).unwrap()
        );
        assert_eq!(
            omac2.do_final(&[]).unwrap(),
            [
                0xf6, 0xbc, 0x6a, 0x41, 0xf4, 0xf8, 0x45, 0x93, 0x80, 0x9e, 0x59, 0xb7, 0x19, 0x29,
                0x9c, 0xfe
            ]
        );
        assert_eq!(
            omac2.do_final(&MESSAGE).unwrap(),
            [
                0x23, 0xfd, 0xaa, 0x08, 0x31, 0xcd, 0x31, 0x44, 0x91, 0xce, 0x4b, 0x25, 0xac, 0xb6,
                0x02, 0x3b
            ]
        );
    }

    #[test]
    fn test_split_updates_match_one_shot() {
        let mut mac = cmac(CmacVariant::Omac1);
        let expected = mac.do_final(&MESSAGE).unwrap();
        for split in [1, 15, 16, 17, 32, 39] {
            mac.update(&MESSAGE[..split]).unwrap();
            mac.update(&MESSAGE[split..]).unwrap();
            assert_eq!(mac.sign().unwrap(), expected, "split at {}", split);
        }
    }

    #[test]
    fn test_truncated_mac_and_verify() {
        let mut full = cmac(CmacVariant::Omac1);
        let mut short = Cmac::new(Aes::new()).with_mac_len(8);
        short.init(&KEY).unwrap();

        let tag = full.do_final(&MESSAGE).unwrap();
        short.update(&MESSAGE).unwrap();
        assert!(short.verify(&tag[..8]).unwrap());
        short.update(&MESSAGE).unwrap();
        assert!(!short.verify(&tag).unwrap());
    }

    #[test]
    fn test_reset_discards_message() {
        let mut mac = cmac(CmacVariant::Omac1);
        let expected = mac.do_final(&MESSAGE[..16]).unwrap();
        mac.update(b"garbage").unwrap();
        mac.reset();
        assert_eq!(mac.do_final(&MESSAGE[..16]).unwrap(), expected);
    }

    #[test]
    fn test_bad_parameters() {
        let mut mac = Cmac::new(Aes::new()).with_mac_len(17);
        assert!(matches!(
            mac.init(&KEY),
            Err(Error::InvalidParameterLength { what: "MAC", .. })
        ));
        let mut mac = Cmac::new(Aes::new());
        assert!(matches!(mac.update(b"x"), Err(Error::NotInitialized)));
        assert!(mac.init(&KEY[..10]).is_err());
    }
}
