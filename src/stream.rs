//! `std::io::Write` Adapters
//!
//! [`CbcWriter`] encrypts or decrypts CBC with PKCS#7 padding as bytes are
//! written, using a [`BlockBuffer`] to cut the input into blocks.
//! [`MacWriter`] feeds everything written through it into a [`Mac`] while
//! passing it on unchanged.
//!
//! Both must be completed with `finish`; dropping them loses the final block
//! or MAC. Failures of the wrapped writer surface as [`Error::IoFailure`].

use std::io::{self, Write};

use log::trace;
use zeroize::Zeroizing;

use crate::buffer::BlockBuffer;
use crate::cipher::BlockCipher;
use crate::error::{Error, Result};
use crate::mac::Mac;
use crate::mode::{BlockMode, Cbc};
use crate::padding::{pkcs7_pad, pkcs7_unpad};

/// Which way a [`CbcWriter`] transforms its input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, padded ciphertext out
    Encrypt,
    /// Ciphertext in, unpadded plaintext out
    Decrypt,
}

/// CBC with PKCS#7 padding over any writer.
///
/// When decrypting, the most recent ciphertext block is held back until
/// `finish` because it carries the padding.
///
/// An error from `update` or `write` can arrive after earlier blocks of the
/// same call already went downstream. The chaining state is then out of step
/// with the output, so the writer must be dropped rather than written to again.
pub struct CbcWriter<C: BlockCipher, W: Write> {
    cbc: Cbc<C>,
    buffer: BlockBuffer,
    held: Zeroizing<Vec<u8>>,
    direction: Direction,
    inner: W,
}

impl<C: BlockCipher, W: Write> CbcWriter<C, W> {
    /// Encrypt everything written, appending padding on `finish`
    pub fn encrypting(cipher: C, key: &[u8], iv: &[u8], inner: W) -> Result<Self> {
        Self::new(cipher, key, iv, inner, Direction::Encrypt)
    }

    /// Decrypt everything written, verifying and removing padding on `finish`
    pub fn decrypting(cipher: C, key: &[u8], iv: &[u8], inner: W) -> Result<Self> {
        Self::new(cipher, key, iv, inner, Direction::Decrypt)
    }

    fn new(cipher: C, key: &[u8], iv: &[u8], inner: W, direction: Direction) -> Result<Self> {
        let mut cbc = Cbc::new(cipher);
        cbc.init(key, iv)?;
        let block_size = cbc.block_size();
        Ok(Self {
            cbc,
            buffer: BlockBuffer::new(block_size)?,
            held: Zeroizing::new(Vec::with_capacity(block_size)),
            direction,
            inner,
        })
    }

    /// Whether this writer encrypts or decrypts
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Transform `data`, writing every completed block downstream.
    /// After an error the writer is unusable.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let (cbc, held, inner) = (&mut self.cbc, &mut self.held, &mut self.inner);
        let direction = self.direction;

        self.buffer.put(data, |block| match direction {
            Direction::Encrypt => {
                let mut out = block.to_vec();
                cbc.encrypt_block(&mut out)?;
                inner.write_all(&out)?;
                Ok(())
            }
            Direction::Decrypt => {
                if !held.is_empty() {
                    cbc.decrypt_block(held.as_mut_slice())?;
                    inner.write_all(held.as_slice())?;
                }
                held.clear();
                held.extend_from_slice(block);
                Ok(())
            }
        })
    }

    /// Emit the final block, flush the writer and hand it back
    pub fn finish(self) -> Result<W> {
        let Self {
            mut cbc,
            mut buffer,
            mut held,
            direction,
            mut inner,
        } = self;
        let block_size = buffer.block_size();

        buffer.flush(|partial| match direction {
            Direction::Encrypt => {
                let mut last = pkcs7_pad(partial, block_size)?;
                cbc.encrypt_blocks(&mut last)?;
                inner.write_all(&last)?;
                Ok(())
            }
            Direction::Decrypt => {
                if !partial.is_empty() {
                    return Err(Error::IncompleteBlock {
                        len: partial.len(),
                        block_size,
                    });
                }
                if held.is_empty() {
                    return Err(Error::InvalidPadding);
                }
                cbc.decrypt_block(held.as_mut_slice())?;
                inner.write_all(pkcs7_unpad(&held, block_size)?)?;
                Ok(())
            }
        })?;

        inner.flush()?;
        trace!("cbc writer: finished {:?}", direction);
        Ok(inner)
    }
}

impl<C: BlockCipher, W: Write> Write for CbcWriter<C, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf).map_err(into_io_error)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Tee that authenticates everything passed to the wrapped writer.
///
/// The MAC only sees the bytes the wrapped writer accepted. If the wrapped
/// writer fails, the tag no longer matches any output and the tee must be
/// dropped.
pub struct MacWriter<M: Mac, W: Write> {
    mac: M,
    inner: W,
}

impl<M: Mac> MacWriter<M, io::Sink> {
    /// MAC the written bytes without forwarding them
    pub fn discarding(mac: M) -> Result<Self> {
        Self::new(mac, io::sink())
    }
}

impl<M: Mac, W: Write> MacWriter<M, W> {
    /// Wrap `inner`; fails with `NotInitialized` unless `mac` is keyed
    pub fn new(mac: M, inner: W) -> Result<Self> {
        if !mac.is_initialized() {
            return Err(Error::NotInitialized);
        }
        Ok(Self { mac, inner })
    }

    /// Finish the MAC and return it with the writer
    pub fn finish(mut self) -> Result<(W, Vec<u8>)> {
        self.inner.flush()?;
        let tag = self.mac.sign()?;
        Ok((self.inner, tag))
    }
}

impl<M: Mac, W: Write> Write for MacWriter<M, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.mac.update(&buf[..n]).map_err(into_io_error)?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn into_io_error(err: Error) -> io::Error {
    match err {
        Error::IoFailure(inner) => inner,
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}

#[cfg(all(test, feature = "aes"))]
mod tests {
    use super::*;
    use crate::aes::Aes;
    use crate::mac::Cmac;

    const KEY: [u8; 16] = [0x11; 16];
    const IV: [u8; 16] = [0x22; 16];

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn encrypt(data: &[u8]) -> Vec<u8> {
        let mut writer = CbcWriter::encrypting(Aes::new(), &KEY, &IV, Vec::new()).unwrap();
        writer.write_all(data).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_roundtrip_through_writers() {
        let data: Vec<u8> = (0..100u8).collect();
        let ciphertext = encrypt(&data);
        assert_eq!(ciphertext.len(), 112);

        let mut writer = CbcWriter::decrypting(Aes::new(), &KEY, &IV, Vec::new()).unwrap();
        for chunk in ciphertext.chunks(7) {
            writer.write_all(chunk).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), data);
    }

    #[test]
    fn test_aligned_input_gets_full_padding_block() {
        assert_eq!(encrypt(&[0u8; 32]).len(), 48);
        assert_eq!(encrypt(&[]).len(), 16);
    }

    #[test]
    fn test_matches_block_mode() {
        let data = b"sixteen byte msg";
        let mut padded = pkcs7_pad(data, 16).unwrap();
        let mut cbc = Cbc::new(Aes::new());
        cbc.init(&KEY, &IV).unwrap();
        cbc.encrypt_blocks(&mut padded).unwrap();
        assert_eq!(encrypt(data), padded);
    }

    #[test]
    fn test_bad_padding_rejected() {
        // A block whose plaintext ends in 0x00 can never carry PKCS#7 padding
        let mut block = [0u8; 16];
        let mut cbc = Cbc::new(Aes::new());
        cbc.init(&KEY, &IV).unwrap();
        cbc.encrypt_block(&mut block).unwrap();

        let mut writer = CbcWriter::decrypting(Aes::new(), &KEY, &IV, Vec::new()).unwrap();
        writer.update(&block).unwrap();
        assert!(matches!(writer.finish(), Err(Error::InvalidPadding)));
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let ciphertext = encrypt(b"hello");
        let mut writer = CbcWriter::decrypting(Aes::new(), &KEY, &IV, Vec::new()).unwrap();
        writer.update(&ciphertext[..15]).unwrap();
        assert!(matches!(
            writer.finish(),
            Err(Error::IncompleteBlock { len: 15, block_size: 16 })
        ));
    }

    #[test]
    fn test_writer_failure_surfaces_as_io_failure() {
        let mut writer = CbcWriter::encrypting(Aes::new(), &KEY, &IV, BrokenPipe).unwrap();
        assert!(matches!(writer.update(&[0u8; 16]), Err(Error::IoFailure(_))));

        let err = writer.write(&[0u8; 16]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_mac_writer_matches_one_shot() {
        let data: Vec<u8> = (0..77u8).collect();
        let mut expected = Cmac::new(Aes::new());
        expected.init(&KEY).unwrap();
        let expected = expected.do_final(&data).unwrap();

        let mut mac = Cmac::new(Aes::new());
        mac.init(&KEY).unwrap();
        let mut writer = MacWriter::new(mac, Vec::new()).unwrap();
        writer.write_all(&data[..10]).unwrap();
        writer.write_all(&data[10..]).unwrap();
        let (copy, tag) = writer.finish().unwrap();
        assert_eq!(copy, data);
        assert_eq!(tag, expected);
    }

    #[test]
    fn test_mac_writer_rejects_unkeyed_mac() {
        assert!(matches!(
            MacWriter::discarding(Cmac::new(Aes::new())),
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            MacWriter::new(Cmac::new(Aes::new()), Vec::new()),
            Err(Error::NotInitialized)
        ));
    }

    /// Accepts at most five bytes per call
    struct Trickle(Vec<u8>);

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(5);
            self.0.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_mac_writer_authenticates_only_accepted_bytes() {
        let mut mac = Cmac::new(Aes::new());
        mac.init(&KEY).unwrap();
        let mut writer = MacWriter::new(mac, Trickle(Vec::new())).unwrap();
        assert_eq!(writer.write(&[7u8; 12]).unwrap(), 5);
        let (Trickle(seen), tag) = writer.finish().unwrap();

        let mut expected = Cmac::new(Aes::new());
        expected.init(&KEY).unwrap();
        assert_eq!(seen, vec![7u8; 5]);
        assert_eq!(tag, expected.do_final(&seen).unwrap());
    }

    #[test]
    fn test_mac_writer_failed_write_leaves_mac_untouched() {
        let mut mac = Cmac::new(Aes::new());
        mac.init(&KEY).unwrap();
        let mut writer = MacWriter::new(mac, BrokenPipe).unwrap();
        assert!(writer.write(b"lost").is_err());

        let mut expected = Cmac::new(Aes::new());
        expected.init(&KEY).unwrap();
        assert_eq!(writer.mac.sign().unwrap(), expected.do_final(&[]).unwrap());
    }
}
