//! Block Padding Schemes
//!
//! - PKCS#7 (RFC 5652 §6.3): `n` bytes of value `n`, always at least one byte
//! - ISO/IEC 7816-4 (bit padding): `0x80` followed by zeros, used to complete
//!   a short final block in the CMAC family

use crate::error::{Error, Result};

/// Pad `data` to a whole number of blocks with PKCS#7.
///
/// A full padding block is appended when `data` is already block-aligned.
pub fn pkcs7_pad(data: &[u8], block_size: usize) -> Result<Vec<u8>> {
    check_block_size(block_size, 255, "1..=255")?;
    let padding_len = block_size - (data.len() % block_size);
    let mut padded = Vec::with_capacity(data.len() + padding_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + padding_len, padding_len as u8);
    Ok(padded)
}

/// Strip and verify PKCS#7 padding, returning the unpadded prefix.
pub fn pkcs7_unpad(data: &[u8], block_size: usize) -> Result<&[u8]> {
    check_block_size(block_size, 255, "1..=255")?;
    if data.is_empty() || data.len() % block_size != 0 {
        return Err(Error::InvalidPadding);
    }

    let padding_len = data[data.len() - 1] as usize;
    if padding_len == 0 || padding_len > block_size {
        return Err(Error::InvalidPadding);
    }

    let (body, pad) = data.split_at(data.len() - padding_len);
    if pad.iter().any(|&b| b as usize != padding_len) {
        return Err(Error::InvalidPadding);
    }
    Ok(body)
}

/// Complete a short block (`partial.len() < block_size`) with `0x80 00..00`.
pub fn iso7816_pad(partial: &[u8], block_size: usize) -> Result<Vec<u8>> {
    check_block_size(block_size, usize::MAX, "non-zero")?;
    if partial.len() >= block_size {
        return Err(Error::length("partial block", "less than one block", partial.len()));
    }
    let mut block = vec![0u8; block_size];
    block[..partial.len()].copy_from_slice(partial);
    block[partial.len()] = 0x80;
    Ok(block)
}

/// Strip ISO/IEC 7816-4 padding from the end of `data`.
pub fn iso7816_unpad(data: &[u8]) -> Result<&[u8]> {
    match data.iter().rposition(|&b| b != 0) {
        Some(pos) if data[pos] == 0x80 => Ok(&data[..pos]),
        _ => Err(Error::InvalidPadding),
    }
}

fn check_block_size(block_size: usize, max: usize, expected: &'static str) -> Result<()> {
    if block_size == 0 || block_size > max {
        return Err(Error::length("block", expected, block_size));
    }
    Ok(())
}
