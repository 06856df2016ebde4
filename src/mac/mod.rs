//! Block-Cipher MACs
//!
//! - [`CbcMac`]: plain CBC-MAC with zero padding (ISO/IEC 9797-1 MAC 1)
//! - [`Cmac`]: CMAC / OMAC1 (RFC 4493) and OMAC2
//! - [`Xcbc`]: AES-XCBC-MAC (RFC 3566), including the 96-bit variant
//!
//! The CMAC family chains every block but the last through CBC, then XORs the
//! last block with a subkey chosen by whether it is complete or padded.

mod cbc_mac;
mod cmac;
mod xcbc;

pub use cbc_mac::CbcMac;
pub use cmac::{Cmac, CmacVariant};
pub use xcbc::{Xcbc, XCBC_MAC_96_LEN};

pub(crate) use cbc_mac::{CbcMacState, LastBlockChain};

use crate::constant_time::ct_eq;
use crate::error::{Error, Result};

/// A keyed message authentication code.
///
/// `sign` finishes the current message and leaves the object ready for a new
/// message under the same key. Instances are not thread-safe.
pub trait Mac {
    /// MAC length in bytes
    fn mac_len(&self) -> usize;

    /// Whether [`Mac::init`] has installed a key
    fn is_initialized(&self) -> bool;

    /// Install the key and derive any subkeys
    fn init(&mut self, key: &[u8]) -> Result<()>;

    /// Feed message bytes
    fn update(&mut self, data: &[u8]) -> Result<()>;

    /// Finish the message and return the MAC
    fn sign(&mut self) -> Result<Vec<u8>>;

    /// Discard the current message, keeping the key
    fn reset(&mut self);

    /// Finish the message and compare against `expected` in constant time
    fn verify(&mut self, expected: &[u8]) -> Result<bool> {
        let mac = self.sign()?;
        Ok(ct_eq(&mac, expected))
    }

    /// Feed the last piece of the message and finish it
    fn do_final(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.update(data)?;
        self.sign()
    }
}

pub(crate) fn check_mac_len(mac_len: usize, block_size: usize) -> Result<()> {
    if mac_len == 0 || mac_len > block_size {
        return Err(Error::length("MAC", "1..=block size", mac_len));
    }
    Ok(())
}
