//! AES Block Cipher (AES-128, AES-192, AES-256)
//!
//! FIPS 197 implementation of the [`BlockCipher`] interface. This is the
//! reference cipher every mode and MAC in this crate is tested against.

use log::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::{ensure_keyed, BlockCipher};
use crate::error::{Error, Result};

// ============================================================================
// AES Constants
// ============================================================================

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// AES-128 key size
pub const AES_128_KEY_SIZE: usize = 16;
/// AES-192 key size
pub const AES_192_KEY_SIZE: usize = 24;
/// AES-256 key size
pub const AES_256_KEY_SIZE: usize = 32;

// AES S-box
const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

// Inverse S-box for decryption
const INV_SBOX: [u8; 256] = [
    0x52, 0x09, 0x6a, 0xd5, 0x30, 0x36, 0xa5, 0x38, 0xbf, 0x40, 0xa3, 0x9e, 0x81, 0xf3, 0xd7, 0xfb,
    0x7c, 0xe3, 0x39, 0x82, 0x9b, 0x2f, 0xff, 0x87, 0x34, 0x8e, 0x43, 0x44, 0xc4, 0xde, 0xe9, 0xcb,
    0x54, 0x7b, 0x94, 0x32, 0xa6, 0xc2, 0x23, 0x3d, 0xee, 0x4c, 0x95, 0x0b, 0x42, 0xfa, 0xc3, 0x4e,
    0x08, 0x2e, 0xa1, 0x66, 0x28, 0xd9, 0x24, 0xb2, 0x76, 0x5b, 0xa2, 0x49, 0x6d, 0x8b, 0xd1, 0x25,
    0x72, 0xf8, 0xf6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xd4, 0xa4, 0x5c, 0xcc, 0x5d, 0x65, 0xb6, 0x92,
    0x6c, 0x70, 0x48, 0x50, 0xfd, 0xed, 0xb9, 0xda, 0x5e, 0x15, 0x46, 0x57, 0xa7, 0x8d, 0x9d, 0x84,
    0x90, 0xd8, 0xab, 0x00, 0x8c, 0xbc, 0xd3, 0x0a, 0xf7, 0xe4, 0x58, 0x05, 0xb8, 0xb3, 0x45, 0x06,
    0xd0, 0x2c, 0x1e, 0x8f, 0xca, 0x3f, 0x0f, 0x02, 0xc1, 0xaf, 0xbd, 0x03, 0x01, 0x13, 0x8a, 0x6b,
    0x3a, 0x91, 0x11, 0x41, 0x4f, 0x67, 0xdc, 0xea, 0x97, 0xf2, 0xcf, 0xce, 0xf0, 0xb4, 0xe6, 0x73,
    0x96, 0xac, 0x74, 0x22, 0xe7, 0xad, 0x35, 0x85, 0xe2, 0xf9, 0x37, 0xe8, 0x1c, 0x75, 0xdf, 0x6e,
    0x47, 0xf1, 0x1a, 0x71, 0x1d, 0x29, 0xc5, 0x89, 0x6f, 0xb7, 0x62, 0x0e, 0xaa, 0x18, 0xbe, 0x1b,
    0xfc, 0x56, 0x3e, 0x4b, 0xc6, 0xd2, 0x79, 0x20, 0x9a, 0xdb, 0xc0, 0xfe, 0x78, 0xcd, 0x5a, 0xf4,
    0x1f, 0xdd, 0xa8, 0x33, 0x88, 0x07, 0xc7, 0x31, 0xb1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xec, 0x5f,
    0x60, 0x51, 0x7f, 0xa9, 0x19, 0xb5, 0x4a, 0x0d, 0x2d, 0xe5, 0x7a, 0x9f, 0x93, 0xc9, 0x9c, 0xef,
    0xa0, 0xe0, 0x3b, 0x4d, 0xae, 0x2a, 0xf5, 0xb0, 0xc8, 0xeb, 0xbb, 0x3c, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2b, 0x04, 0x7e, 0xba, 0x77, 0xd6, 0x26, 0xe1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0c, 0x7d,
];

// Round constants
const RCON: [u8; 11] = [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

// ============================================================================
// AES Core Implementation
// ============================================================================

/// AES with a 128, 192 or 256-bit key, selected by the key passed to `init`.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Aes {
    round_keys: Vec<[u8; 16]>,
}

impl Aes {
    /// Create an unkeyed AES instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an AES instance keyed with `key`
    pub fn with_key(key: &[u8]) -> Result<Self> {
        let mut aes = Self::new();
        aes.init(key)?;
        Ok(aes)
    }

    /// Number of rounds for the installed key (0 when unkeyed)
    pub fn rounds(&self) -> usize {
        self.round_keys.len().saturating_sub(1)
    }

    fn key_expansion(key: &[u8]) -> Vec<[u8; 16]> {
        let nk = key.len() / 4;
        let rounds = nk + 6;
        let total_words = 4 * (rounds + 1);

        let mut words = vec![[0u8; 4]; total_words];
        for (i, word) in words.iter_mut().take(nk).enumerate() {
            word.copy_from_slice(&key[i * 4..(i + 1) * 4]);
        }

        for i in nk..total_words {
            let mut temp = words[i - 1];

            if i % nk == 0 {
                // RotWord
                temp.rotate_left(1);
                // SubWord
                for b in temp.iter_mut() {
                    *b = SBOX[*b as usize];
                }
                temp[0] ^= RCON[i / nk];
            } else if nk > 6 && i % nk == 4 {
                for b in temp.iter_mut() {
                    *b = SBOX[*b as usize];
                }
            }

            for k in 0..4 {
                words[i][k] = words[i - nk][k] ^ temp[k];
            }
        }

        let round_keys = words
            .chunks_exact(4)
            .map(|chunk| {
                let mut rk = [0u8; 16];
                for (j, word) in chunk.iter().enumerate() {
                    rk[j * 4..(j + 1) * 4].copy_from_slice(word);
                }
                rk
            })
            .collect();

        words.zeroize();
        round_keys
    }

    /// Copy one block into a state array once the key and length are checked
    fn load_state(&self, block: &[u8]) -> Result<[u8; 16]> {
        ensure_keyed(self)?;
        if block.len() != AES_BLOCK_SIZE {
            return Err(Error::IncompleteBlock {
                len: block.len(),
                block_size: AES_BLOCK_SIZE,
            });
        }
        let mut state = [0u8; 16];
        state.copy_from_slice(block);
        Ok(state)
    }

    fn encrypt_state(&self, state: &mut [u8; 16]) {
        let rounds = self.rounds();

        // Initial round key addition
        xor_block(state, &self.round_keys[0]);

        // Main rounds
        for round in 1..rounds {
            sub_bytes(state);
            shift_rows(state);
            mix_columns(state);
            xor_block(state, &self.round_keys[round]);
        }

        // Final round (no MixColumns)
        sub_bytes(state);
        shift_rows(state);
        xor_block(state, &self.round_keys[rounds]);
    }

    fn decrypt_state(&self, state: &mut [u8; 16]) {
        let rounds = self.rounds();

        xor_block(state, &self.round_keys[rounds]);

        for round in (1..rounds).rev() {
            inv_shift_rows(state);
            inv_sub_bytes(state);
            xor_block(state, &self.round_keys[round]);
            inv_mix_columns(state);
        }

        inv_shift_rows(state);
        inv_sub_bytes(state);
        xor_block(state, &self.round_keys[0]);
    }
}

impl BlockCipher for Aes {
    fn block_size(&self) -> usize {
        AES_BLOCK_SIZE
    }

    fn is_initialized(&self) -> bool {
        !self.round_keys.is_empty()
    }

    fn init(&mut self, key: &[u8]) -> Result<()> {
        match key.len() {
            AES_128_KEY_SIZE | AES_192_KEY_SIZE | AES_256_KEY_SIZE => {}
            n => return Err(Error::length("AES key", "16, 24 or 32", n)),
        }
        self.round_keys.zeroize();
        self.round_keys = Self::key_expansion(key);
        debug!("aes: keyed with {}-bit key, {} rounds", key.len() * 8, self.rounds());
        Ok(())
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        let mut state = self.load_state(block)?;
        self.encrypt_state(&mut state);
        block.copy_from_slice(&state);
        state.zeroize();
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        let mut state = self.load_state(block)?;
        self.decrypt_state(&mut state);
        block.copy_from_slice(&state);
        state.zeroize();
        Ok(())
    }
}

// ============================================================================
// AES Helper Functions
// ============================================================================

#[inline]
fn xor_block(state: &mut [u8; 16], key: &[u8; 16]) {
    for i in 0..16 {
        state[i] ^= key[i];
    }
}

#[inline]
fn sub_bytes(state: &mut [u8; 16]) {
    for b in state.iter_mut() {
        *b = SBOX[*b as usize];
    }
}

#[inline]
fn inv_sub_bytes(state: &mut [u8; 16]) {
    for b in state.iter_mut() {
        *b = INV_SBOX[*b as usize];
    }
}

#[inline]
fn shift_rows(state: &mut [u8; 16]) {
    // Row 1: shift left by 1
    let tmp = state[1];
    state[1] = state[5];
    state[5] = state[9];
    state[9] = state[13];
    state[13] = tmp;

    // Row 2: shift left by 2
    state.swap(2, 10);
    state.swap(6, 14);

    // Row 3: shift left by 3 (= right by 1)
    let tmp = state[15];
    state[15] = state[11];
    state[11] = state[7];
    state[7] = state[3];
    state[3] = tmp;
}

#[inline]
fn inv_shift_rows(state: &mut [u8; 16]) {
    // Row 1: shift right by 1
    let tmp = state[13];
    state[13] = state[9];
    state[9] = state[5];
    state[5] = state[1];
    state[1] = tmp;

    // Row 2: shift right by 2
    state.swap(2, 10);
    state.swap(6, 14);

    // Row 3: shift right by 3 (= left by 1)
    let tmp = state[3];
    state[3] = state[7];
    state[7] = state[11];
    state[11] = state[15];
    state[15] = tmp;
}

#[inline]
fn xtime(x: u8) -> u8 {
    (x << 1) ^ (((x >> 7) & 1) * 0x1b)
}

#[inline]
fn mix_columns(state: &mut [u8; 16]) {
    for i in 0..4 {
        let col = i * 4;
        let a = state[col];
        let b = state[col + 1];
        let c = state[col + 2];
        let d = state[col + 3];
        let e = a ^ b ^ c ^ d;

        state[col] ^= e ^ xtime(a ^ b);
        state[col + 1] ^= e ^ xtime(b ^ c);
        state[col + 2] ^= e ^ xtime(c ^ d);
        state[col + 3] ^= e ^ xtime(d ^ a);
    }
}

#[inline]
fn multiply(x: u8, y: u8) -> u8 {
    let mut result = 0u8;
    let mut a = x;
    let mut b = y;

    for _ in 0..8 {
        if (b & 1) != 0 {
            result ^= a;
        }
        a = xtime(a);
        b >>= 1;
    }
    result
}

#[inline]
fn inv_mix_columns(state: &mut [u8; 16]) {
    for i in 0..4 {
        let col = i * 4;
        let a = state[col];
        let b = state[col + 1];
        let c = state[col + 2];
        let d = state[col + 3];

        state[col] = multiply(a, 0x0e) ^ multiply(b, 0x0b) ^ multiply(c, 0x0d) ^ multiply(d, 0x09);
        state[col + 1] = multiply(a, 0x09) ^ multiply(b, 0x0e) ^ multiply(c, 0x0b) ^ multiply(d, 0x0d);
        state[col + 2] = multiply(a, 0x0d) ^ multiply(b, 0x09) ^ multiply(c, 0x0e) ^ multiply(d, 0x0b);
        state[col + 3] = multiply(a, 0x0b) ^ multiply(b, 0x0d) ^ multiply(c, 0x09) ^ multiply(d, 0x0e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAINTEXT: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
    ];

    fn sequential_key(len: usize) -> Vec<u8> {
        (0..len as u8).collect()
    }

    fn check_fips197(key_len: usize, expected: [u8; 16], rounds: usize) {
        let cipher = Aes::with_key(&sequential_key(key_len)).unwrap();
        assert_eq!(cipher.rounds(), rounds);

        let mut block = PLAINTEXT;
        cipher.encrypt_block(&mut block).unwrap();
        assert_eq!(block, expected);

        cipher.decrypt_block(&mut block).unwrap();
        assert_eq!(block, PLAINTEXT);
    }

    #[test]
    fn test_aes128_fips197() {
        check_fips197(
            16,
            [
                0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4,
                0xc5, 0x5a,
            ],
            10,
        );
    }

    #[test]
    fn test_aes192_fips197() {
        check_fips197(
            24,
            [
                0xdd, 0xa9, 0x7c, 0xa4, 0x86, 0x4c, 0xdf, 0xe0, 0x6e, 0xaf, 0x70, 0xa0, 0xec, 0x0d,
                0x71, 0x91,
            ],
            12,
        );
    }

    #[test]
    fn test_aes256_fips197() {
        check_fips197(
            32,
            [
                0x8e, 0xa2, 0xb7, 0xca, 0x51, 0x67, 0x45, 0xbf, 0xea, 0xfc, 0x49, 0x90, 0x4b, 0x49,
                0x60, 0x89,
            ],
            14,
        );
    }

    #[test]
    fn test_rejects_bad_key_length() {
        let mut cipher = Aes::new();
        assert!(!cipher.is_initialized());
        assert!(matches!(
            cipher.init(&[0u8; 20]),
            Err(Error::InvalidParameterLength { actual: 20, .. })
        ));
        assert!(!cipher.is_initialized());
    }

    #[test]
    fn test_unkeyed_block_call_fails() {
        let cipher = Aes::new();
        let mut block = [0u8; 16];
        assert!(matches!(cipher.encrypt_block(&mut block), Err(Error::NotInitialized)));
        assert!(matches!(cipher.decrypt_block(&mut block), Err(Error::NotInitialized)));
        assert_eq!(block, [0u8; 16]);
    }

    #[test]
    fn test_wrong_block_length_fails() {
        let cipher = Aes::with_key(&[7u8; 16]).unwrap();
        let mut short = [0u8; 15];
        assert!(matches!(
            cipher.encrypt_block(&mut short),
            Err(Error::IncompleteBlock { len: 15, block_size: 16 })
        ));
        let mut long = [0u8; 17];
        assert!(matches!(
            cipher.decrypt_block(&mut long),
            Err(Error::IncompleteBlock { len: 17, block_size: 16 })
        ));
    }

    #[test]
    fn test_rekey_replaces_schedule() {
        let mut cipher = Aes::with_key(&[0u8; 32]).unwrap();
        cipher.init(&sequential_key(16)).unwrap();
        assert_eq!(cipher.rounds(), 10);
        assert_eq!(cipher.block_length_bits(), 128);
    }
}
