// Copyright (c) 2017 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::cmp::min;

use byteorder::{ByteOrder, LittleEndian as LE};
use bytes::BufMut;

use crate::error::{DecodeError, Result};

/// Bounds-checked cursor over an event body.
///
/// Every `checked_*` method either consumes the requested prefix of the buffer
/// or leaves the buffer untouched and returns [`DecodeError::UnexpectedEof`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ParseBuf<'a>(pub &'a [u8]);

impl<'a> ParseBuf<'a> {
    /// Returns the number of remaining bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no remaining bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn eof(&self, needed: usize) -> DecodeError {
        DecodeError::UnexpectedEof {
            needed,
            remaining: self.len(),
        }
    }

    /// Consumes `n` bytes.
    pub fn checked_eat(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.len() {
            return Err(self.eof(n));
        }
        let (head, tail) = self.0.split_at(n);
        self.0 = tail;
        Ok(head)
    }

    /// Skips `n` bytes.
    pub fn checked_skip(&mut self, n: usize) -> Result<()> {
        self.checked_eat(n).map(drop)
    }

    /// Consumes the rest of the buffer.
    pub fn eat_all(&mut self) -> &'a [u8] {
        let all = self.0;
        self.0 = &[];
        all
    }

    pub fn checked_eat_u8(&mut self) -> Result<u8> {
        self.checked_eat(1).map(|bytes| bytes[0])
    }

    pub fn checked_eat_u16_le(&mut self) -> Result<u16> {
        self.checked_eat(2).map(LE::read_u16)
    }

    /// Consumes a little-endian unsigned integer of `n` bytes (`1..=8`).
    pub fn checked_eat_uint_le(&mut self, n: usize) -> Result<u64> {
        debug_assert!((1..=8).contains(&n));
        self.checked_eat(n).map(|bytes| LE::read_uint(bytes, n))
    }

    /// Consumes a length-encoded integer.
    pub fn checked_eat_lenenc_int(&mut self) -> Result<u64> {
        let mut buf = *self;
        let value = match buf.checked_eat_u8()? {
            0xfc => buf.checked_eat_uint_le(2)?,
            0xfd => buf.checked_eat_uint_le(3)?,
            0xfe => buf.checked_eat_uint_le(8)?,
            0xff => {
                return Err(DecodeError::malformed(
                    "Invalid length-encoded integer value",
                ))
            }
            x => x as u64,
        };
        *self = buf;
        Ok(value)
    }

    /// Consumes a string prefixed by its length as a length-encoded integer.
    pub fn checked_eat_lenenc_str(&mut self) -> Result<&'a [u8]> {
        let mut buf = *self;
        let len = buf.checked_eat_lenenc_int()?;
        if len > buf.len() as u64 {
            return Err(DecodeError::UnexpectedEof {
                needed: min(len, usize::MAX as u64) as usize,
                remaining: buf.len(),
            });
        }
        let value = buf.checked_eat(len as usize)?;
        *self = buf;
        Ok(value)
    }

    /// Consumes a string prefixed by its length as a single byte.
    pub fn checked_eat_u8_str(&mut self) -> Result<&'a [u8]> {
        let mut buf = *self;
        let len = buf.checked_eat_u8()? as usize;
        let value = buf.checked_eat(len)?;
        *self = buf;
        Ok(value)
    }
}

pub trait BufMutExt: BufMut {
    /// Writes a length-encoded integer.
    fn put_lenenc_int(&mut self, n: u64) {
        if n < 251 {
            self.put_u8(n as u8);
        } else if n < 65_536 {
            self.put_u8(0xFC);
            self.put_uint_le(n, 2);
        } else if n < 16_777_216 {
            self.put_u8(0xFD);
            self.put_uint_le(n, 3);
        } else {
            self.put_u8(0xFE);
            self.put_uint_le(n, 8);
        }
    }

    /// Writes a string prefixed by its length as a length-encoded integer.
    fn put_lenenc_str(&mut self, s: &[u8]) {
        self.put_lenenc_int(s.len() as u64);
        self.put_slice(s);
    }

    /// Writes a string prefixed by its length as a single byte.
    ///
    /// Truncates the string if it's longer than 255 bytes.
    fn put_u8_str(&mut self, s: &[u8]) {
        let len = min(s.len(), u8::MAX as usize);
        self.put_u8(len as u8);
        self.put_slice(&s[..len]);
    }
}

impl<T> BufMutExt for T where T: BufMut {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_eat_lenenc_int() -> Result<()> {
        let cases: &[(&[u8], u64)] = &[
            (&[0xfa], 250),
            (&[0xfb], 251),
            (&[0xfc, 0xfb, 0x00], 251),
            (&[0xfd, 0x00, 0x00, 0x01], 65_536),
            (&[0xfe, 1, 0, 0, 0, 0, 0, 0, 0], 1),
        ];
        for (input, expected) in cases {
            let mut buf = ParseBuf(input);
            assert_eq!(buf.checked_eat_lenenc_int()?, *expected);
            assert!(buf.is_empty());
        }
        Ok(())
    }

    #[test]
    fn should_write_lenenc_int() -> Result<()> {
        for n in [0, 250, 251, 65_535, 65_536, 16_777_215, 16_777_216, u64::MAX] {
            let mut out = Vec::new();
            out.put_lenenc_int(n);
            assert_eq!(out.len() as u64, crate::misc::lenenc_int_len(n));
            assert_eq!(ParseBuf(&out).checked_eat_lenenc_int()?, n);
        }
        Ok(())
    }

    #[test]
    fn truncated_input_leaves_buffer_untouched() {
        let mut buf = ParseBuf(&[0xfc, 0x01]);
        match buf.checked_eat_lenenc_int() {
            Err(DecodeError::UnexpectedEof { needed, remaining }) => {
                assert_eq!(needed, 2);
                assert_eq!(remaining, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(buf.len(), 2);

        let mut buf = ParseBuf(&[0x05, b'a', b'b']);
        assert!(buf.checked_eat_lenenc_str().is_err());
        assert!(buf.checked_eat_u8_str().is_err());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn should_reject_invalid_lenenc_int() {
        let mut buf = ParseBuf(&[0xff]);
        assert!(matches!(
            buf.checked_eat_lenenc_int(),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn should_eat_strings() -> Result<()> {
        let mut out = Vec::new();
        out.put_lenenc_str(b"foo");
        out.put_u8_str(b"bar");
        out.extend_from_slice(&[0x2a, 0x00, 0x01, 0x02, 0x03]);

        let mut buf = ParseBuf(&out);
        assert_eq!(buf.checked_eat_lenenc_str()?, b"foo");
        assert_eq!(buf.checked_eat_u8_str()?, b"bar");
        assert_eq!(buf.checked_eat_u16_le()?, 0x002a);
        assert_eq!(buf.checked_eat_uint_le(3)?, 0x030201);
        assert!(buf.is_empty());
        Ok(())
    }
}
