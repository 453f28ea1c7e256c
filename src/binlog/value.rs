// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::{borrow::Cow, convert::TryFrom};

use serde::Serialize;

use crate::{
    constants::ColumnType,
    error::{DecodeError, Result},
    io::ParseBuf,
};

use super::{decimal::decimal_len, metadata::ColumnMeta, time::packed_temporal_len};

/// Raw binlog representation of a single column value.
///
/// Contains the exact wire bytes of the value (including a length prefix, if any)
/// together with the type information needed to interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnValue<'a> {
    /// Effective column type.
    ///
    /// For `MYSQL_TYPE_STRING` columns this is the real type unpacked from metadata,
    /// i.e. `MYSQL_TYPE_ENUM` or `MYSQL_TYPE_SET` for enum and set columns.
    column_type: ColumnType,
    metadata: ColumnMeta,
    /// Width of the length prefix at the beginning of `raw`.
    prefix_len: u8,
    raw: Cow<'a, [u8]>,
}

impl<'a> ColumnValue<'a> {
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Metadata of the column as found in the table map event.
    pub fn metadata(&self) -> ColumnMeta {
        self.metadata
    }

    /// Returns the raw wire representation of the value.
    pub fn as_bytes(&self) -> &[u8] {
        self.raw.as_ref()
    }

    /// Returns the value without its length prefix.
    pub fn payload(&self) -> &[u8] {
        &self.raw[self.prefix_len as usize..]
    }

    /// Returns the number of bytes this value occupies in the row image.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns a `'static` version of `self`.
    pub fn into_owned(self) -> ColumnValue<'static> {
        ColumnValue {
            column_type: self.column_type,
            metadata: self.metadata,
            prefix_len: self.prefix_len,
            raw: Cow::Owned(self.raw.into_owned()),
        }
    }

    /// Decodes a value of the given column from the row image.
    ///
    /// Only segmentation is performed: the value bytes are returned as is.
    pub fn deserialize(
        column_type: ColumnType,
        metadata: ColumnMeta,
        buf: &mut ParseBuf<'a>,
    ) -> Result<Self> {
        let (column_type, layout) = value_layout(column_type, metadata)?;

        let (prefix_len, raw) = match layout {
            ValueLayout::Fixed(len) => (0, buf.checked_eat(len)?),
            ValueLayout::Prefixed(prefix_len) => {
                let mut peek = *buf;
                let len = peek.checked_eat_uint_le(prefix_len)?;
                let total = usize::try_from(len)
                    .ok()
                    .and_then(|len| len.checked_add(prefix_len))
                    .ok_or(DecodeError::UnexpectedEof {
                        needed: usize::MAX,
                        remaining: buf.len(),
                    })?;
                (prefix_len as u8, buf.checked_eat(total)?)
            }
        };

        Ok(ColumnValue {
            column_type,
            metadata,
            prefix_len,
            raw: Cow::Borrowed(raw),
        })
    }
}

/// Wire layout of a column value.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ValueLayout {
    /// Value of a fixed number of bytes.
    Fixed(usize),
    /// Value prefixed by its little-endian length of the given width.
    Prefixed(usize),
}

/// Splits `MYSQL_TYPE_STRING` metadata into the real type and the field length.
///
/// Field length of a `CHAR` column may exceed 255 bytes (multibyte charsets),
/// so its two high bits are stored XOR-ed in the real type byte.
pub fn unpack_string_metadata(metadata: ColumnMeta) -> Result<(ColumnType, u16)> {
    if metadata.0 < 256 {
        return Ok((ColumnType::MYSQL_TYPE_STRING, metadata.0));
    }

    let byte0 = metadata.high_byte();
    let byte1 = metadata.low_byte();

    if byte0 & 0x30 != 0x30 {
        let len = byte1 as u16 | ((((byte0 & 0x30) ^ 0x30) as u16) << 4);
        Ok((ColumnType::try_from(byte0 | 0x30)?, len))
    } else {
        Ok((ColumnType::try_from(byte0)?, byte1 as u16))
    }
}

/// Returns the length prefix width of a string with the given maximum length.
fn string_prefix_len(max_len: u16) -> usize {
    if max_len < 256 {
        1
    } else {
        2
    }
}

/// Returns the effective column type and the wire layout of a value.
pub fn value_layout(
    column_type: ColumnType,
    metadata: ColumnMeta,
) -> Result<(ColumnType, ValueLayout)> {
    use ColumnType::*;
    use ValueLayout::*;

    let (column_type, string_len) = match column_type {
        MYSQL_TYPE_STRING => unpack_string_metadata(metadata)?,
        other => (other, 0),
    };

    let layout = match column_type {
        MYSQL_TYPE_NULL => Fixed(0),
        MYSQL_TYPE_TINY | MYSQL_TYPE_YEAR => Fixed(1),
        MYSQL_TYPE_SHORT => Fixed(2),
        MYSQL_TYPE_INT24 | MYSQL_TYPE_TIME | MYSQL_TYPE_DATE => Fixed(3),
        MYSQL_TYPE_LONG | MYSQL_TYPE_FLOAT | MYSQL_TYPE_TIMESTAMP => Fixed(4),
        MYSQL_TYPE_LONGLONG | MYSQL_TYPE_DOUBLE | MYSQL_TYPE_DATETIME => Fixed(8),
        MYSQL_TYPE_NEWDECIMAL => Fixed(decimal_len(metadata)?),
        MYSQL_TYPE_BIT => {
            let nbits = metadata.high_byte() as usize * 8 + metadata.low_byte() as usize;
            Fixed((nbits + 7) / 8)
        }
        ty if ty.is_packed_temporal() => Fixed(packed_temporal_len(ty, metadata)?),
        MYSQL_TYPE_ENUM => match metadata.low_byte() {
            1 => Fixed(1),
            2 => Fixed(2),
            _ => return Err(DecodeError::unsupported_metadata(column_type, metadata.0)),
        },
        MYSQL_TYPE_SET => Fixed((metadata.low_byte() as usize + 7) / 8),
        ty if ty.is_blob_like() => match metadata.0 {
            1..=4 => Prefixed(metadata.0 as usize),
            _ => return Err(DecodeError::unsupported_metadata(column_type, metadata.0)),
        },
        MYSQL_TYPE_VARCHAR | MYSQL_TYPE_VAR_STRING => Prefixed(string_prefix_len(metadata.0)),
        MYSQL_TYPE_STRING => Prefixed(string_prefix_len(string_len)),
        // DECIMAL, NEWDATE, TYPED_ARRAY and the internal blob types
        _ => return Err(DecodeError::UnsupportedColumnType(column_type)),
    };

    Ok((column_type, layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    use ColumnType::*;

    fn decode(ty: ColumnType, meta: u16, input: &[u8]) -> Result<(ColumnValue<'_>, usize)> {
        let mut buf = ParseBuf(input);
        let value = ColumnValue::deserialize(ty, ColumnMeta(meta), &mut buf)?;
        Ok((value, buf.len()))
    }

    #[test]
    fn should_segment_fixed_width_types() -> Result<()> {
        let input = [0x11_u8; 16];
        let cases = [
            (MYSQL_TYPE_NULL, 0, 0),
            (MYSQL_TYPE_TINY, 0, 1),
            (MYSQL_TYPE_YEAR, 0, 1),
            (MYSQL_TYPE_SHORT, 0, 2),
            (MYSQL_TYPE_INT24, 0, 3),
            (MYSQL_TYPE_TIME, 0, 3),
            (MYSQL_TYPE_DATE, 0, 3),
            (MYSQL_TYPE_LONG, 0, 4),
            (MYSQL_TYPE_FLOAT, 4, 4),
            (MYSQL_TYPE_TIMESTAMP, 0, 4),
            (MYSQL_TYPE_LONGLONG, 0, 8),
            (MYSQL_TYPE_DOUBLE, 8, 8),
            (MYSQL_TYPE_DATETIME, 0, 8),
            (MYSQL_TYPE_TIMESTAMP2, 3, 6),
            (MYSQL_TYPE_DATETIME2, 0, 5),
            (MYSQL_TYPE_DATETIME2, 6, 8),
            (MYSQL_TYPE_TIME2, 4, 5),
            (MYSQL_TYPE_BIT, 0x0001, 1),
            (MYSQL_TYPE_BIT, 0x0100, 1),
            (MYSQL_TYPE_BIT, 0x0103, 2),
            (MYSQL_TYPE_BIT, 0x0800, 8),
            (MYSQL_TYPE_NEWDECIMAL, 0x0a02, 5),
        ];

        for (ty, meta, len) in cases.iter().copied() {
            let (value, rest) = decode(ty, meta, &input)?;
            assert_eq!(value.len(), len, "{:?}", ty);
            assert_eq!(value.payload(), &input[..len]);
            assert_eq!(rest, input.len() - len);
            assert_eq!(value.column_type(), ty);
        }
        Ok(())
    }

    #[test]
    fn negative_decimal_has_the_same_length() -> Result<()> {
        // DECIMAL(10, 2): 1234.56 and -1234.56 followed by an unrelated byte
        let positive: [u8; 6] = [0x80, 0x00, 0x04, 0xd2, 0x38, 0xff];
        let negative: [u8; 6] = [0x7f, 0xff, 0xfb, 0x2d, 0xc7, 0xff];

        for input in [&positive, &negative] {
            let (value, rest) = decode(MYSQL_TYPE_NEWDECIMAL, 0x0a02, input)?;
            assert_eq!(value.as_bytes(), &input[..5]);
            assert_eq!(rest, 1);
        }
        Ok(())
    }

    #[test]
    fn varchar_short_form() -> Result<()> {
        let (value, rest) = decode(MYSQL_TYPE_VARCHAR, 200, &[0x03, b'a', b'b', b'c'])?;
        assert_eq!(value.len(), 4);
        assert_eq!(value.payload(), b"abc");
        assert_eq!(value.as_bytes(), &[0x03, b'a', b'b', b'c']);
        assert_eq!(rest, 0);
        Ok(())
    }

    #[test]
    fn varchar_prefix_boundary() -> Result<()> {
        let input = [0x02, 0x00, b'h', b'i'];

        let (value, _) = decode(MYSQL_TYPE_VARCHAR, 255, &input)?;
        assert_eq!(value.as_bytes(), &[0x02, 0x00, b'h']);
        assert_eq!(value.payload(), &[0x00, b'h']);

        let (value, _) = decode(MYSQL_TYPE_VAR_STRING, 256, &input)?;
        assert_eq!(value.as_bytes(), &input);
        assert_eq!(value.payload(), b"hi");
        Ok(())
    }

    #[test]
    fn blob_prefix_widths() -> Result<()> {
        let cases: [(u16, &[u8]); 4] = [
            (1, &[0x02, b'h', b'i']),
            (2, &[0x02, 0x00, b'h', b'i']),
            (3, &[0x02, 0x00, 0x00, b'h', b'i']),
            (4, &[0x02, 0x00, 0x00, 0x00, b'h', b'i']),
        ];
        for (meta, input) in cases.iter() {
            for ty in [MYSQL_TYPE_BLOB, MYSQL_TYPE_GEOMETRY, MYSQL_TYPE_JSON] {
                let (value, rest) = decode(ty, *meta, input)?;
                assert_eq!(value.as_bytes(), *input);
                assert_eq!(value.payload(), b"hi");
                assert_eq!(rest, 0);
            }
        }
        Ok(())
    }

    #[test]
    fn blob_rejects_invalid_prefix_width() {
        for meta in [0, 5, 8] {
            let err = decode(MYSQL_TYPE_BLOB, meta, &[0; 16]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unsupported);
        }
    }

    #[test]
    fn blob_payload_must_be_present() {
        let err = decode(MYSQL_TYPE_BLOB, 2, &[0x10, 0x00, b'x']).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedEof {
                needed: 18,
                remaining: 3
            }
        ));
    }

    #[test]
    fn string_metadata_unpacking() -> Result<()> {
        // CHAR(40) latin1
        assert_eq!(
            unpack_string_metadata(ColumnMeta(0xfe28))?,
            (MYSQL_TYPE_STRING, 40)
        );
        // CHAR(100) utf8mb4, field length 400
        assert_eq!(
            unpack_string_metadata(ColumnMeta(0xee90))?,
            (MYSQL_TYPE_STRING, 400)
        );
        assert_eq!(
            unpack_string_metadata(ColumnMeta(0xf701))?,
            (MYSQL_TYPE_ENUM, 1)
        );
        assert_eq!(
            unpack_string_metadata(ColumnMeta(0xf810))?,
            (MYSQL_TYPE_SET, 16)
        );
        assert_eq!(
            unpack_string_metadata(ColumnMeta(0x00c8))?,
            (MYSQL_TYPE_STRING, 200)
        );
        Ok(())
    }

    #[test]
    fn should_segment_string_columns() -> Result<()> {
        let (value, _) = decode(MYSQL_TYPE_STRING, 0xfe28, &[0x02, b'h', b'i', 0xff])?;
        assert_eq!(value.column_type(), MYSQL_TYPE_STRING);
        assert_eq!(value.payload(), b"hi");

        let (value, _) = decode(MYSQL_TYPE_STRING, 0xee90, &[0x02, 0x00, b'h', b'i', 0xff])?;
        assert_eq!(value.payload(), b"hi");
        assert_eq!(value.len(), 4);

        let (value, rest) = decode(MYSQL_TYPE_STRING, 0xf702, &[0x01, 0x00, 0xff])?;
        assert_eq!(value.column_type(), MYSQL_TYPE_ENUM);
        assert_eq!(value.as_bytes(), &[0x01, 0x00]);
        assert_eq!(rest, 1);

        let (value, rest) = decode(MYSQL_TYPE_STRING, 0xf810, &[0x01, 0x00, 0xff])?;
        assert_eq!(value.column_type(), MYSQL_TYPE_SET);
        assert_eq!(value.len(), 2);
        assert_eq!(rest, 1);
        Ok(())
    }

    #[test]
    fn enum_rejects_invalid_pack_length() {
        let err = decode(MYSQL_TYPE_STRING, 0xf703, &[0; 4]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnsupportedMetadata {
                column_type: MYSQL_TYPE_ENUM,
                metadata: 0xf703,
            }
        ));
    }

    #[test]
    fn unsupported_types() {
        for ty in [
            MYSQL_TYPE_DECIMAL,
            MYSQL_TYPE_NEWDATE,
            MYSQL_TYPE_TYPED_ARRAY,
            MYSQL_TYPE_TINY_BLOB,
            MYSQL_TYPE_MEDIUM_BLOB,
            MYSQL_TYPE_LONG_BLOB,
        ] {
            let err = decode(ty, 0, &[0; 16]).unwrap_err();
            assert!(matches!(err, DecodeError::UnsupportedColumnType(x) if x == ty));
        }
        // real type byte that isn't a column type
        let err = decode(MYSQL_TYPE_STRING, 0x3501, &[0; 16]).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownColumnType(_)));
    }

    #[test]
    fn truncated_fixed_width_value() {
        let err = decode(MYSQL_TYPE_LONG, 0, &[0x01, 0x02]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedEof {
                needed: 4,
                remaining: 2
            }
        ));
    }

    #[test]
    fn into_owned_keeps_value() -> Result<()> {
        let input = vec![0x01, b'x'];
        let owned = {
            let (value, _) = decode(MYSQL_TYPE_VARCHAR, 10, &input)?;
            value.into_owned()
        };
        assert_eq!(owned.payload(), b"x");
        assert_eq!(owned.metadata(), ColumnMeta(10));
        Ok(())
    }
}
