//! Block-Cipher Modes and MACs (ncipher)
//!
//! Confidentiality modes, authenticated encryption and message authentication
//! codes built on top of any block cipher implementing [`BlockCipher`].
//!
//! - **Block Cipher**: AES-128/192/256 (feature `aes`, on by default)
//! - **Confidentiality Modes**: CBC, CTR, OFB, CFB-128
//! - **Authenticated Encryption**: GCM (with GMAC), CCM
//! - **MACs**: CMAC/OMAC1, OMAC2, XCBC-MAC(-96), plain CBC-MAC
//! - **Plumbing**: [`BlockBuffer`], PKCS#7 / ISO 7816-4 padding, `io::Write`
//!   adapters, constant-time comparison
//!
//! # Design Philosophy
//! - Modes and MACs are generic over the cipher; AES is one implementation
//! - Streaming first: every operation accepts input in arbitrary pieces
//! - AEAD decryption never releases plaintext before the tag verifies
//! - Key material is zeroized on drop and on re-keying
//! - Logging goes through the `log` facade and never includes key bytes
//!
//! # Supported Standards
//! - FIPS 197 (AES)
//! - SP 800-38A (CBC, CFB, OFB, CTR)
//! - SP 800-38B / RFC 4493 (CMAC)
//! - SP 800-38C / RFC 3610 (CCM)
//! - SP 800-38D (GCM, GMAC)
//! - RFC 3566 (AES-XCBC-MAC-96)

// ============================================================================
// Module Declarations
// ============================================================================

pub mod aead;
#[cfg(feature = "aes")]
pub mod aes;
pub mod buffer;
pub mod ccm;
pub mod cipher;
pub mod constant_time;
pub mod error;
pub mod gcm;
pub mod gf;
pub mod ghash;
pub mod mac;
pub mod mode;
pub mod padding;
pub mod stream;

// ============================================================================
// Re-exports
// ============================================================================

pub use aead::Aead;
#[cfg(feature = "aes")]
pub use aes::Aes;
pub use buffer::BlockBuffer;
pub use ccm::Ccm;
pub use cipher::BlockCipher;
pub use error::{Error, Result};
pub use gcm::{Gcm, Gmac};
pub use mac::{CbcMac, Cmac, CmacVariant, Mac, Xcbc};
pub use mode::{BlockMode, Cbc, Cfb, Ctr, Ofb, StreamMode};
pub use stream::{CbcWriter, Direction, MacWriter};

// ============================================================================
// Convenience Aliases
// ============================================================================

#[cfg(feature = "aes")]
pub type AesGcm = Gcm<Aes>;
#[cfg(feature = "aes")]
pub type AesCcm = Ccm<Aes>;
#[cfg(feature = "aes")]
pub type AesCmac = Cmac<Aes>;
#[cfg(feature = "aes")]
pub type AesXcbc = Xcbc<Aes>;

// ============================================================================
// Library Version Information
// ============================================================================

/// Library version string
pub const NCIPHER_VERSION: &str = concat!("ncipher ", env!("CARGO_PKG_VERSION"));
