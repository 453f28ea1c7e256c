// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Type-specific column metadata of a `TABLE_MAP_EVENT`.
//!
//! The metadata block is a flat concatenation of per-column chunks without any
//! length prefixes, so only the column type tells how many bytes belong to a column.

use bytes::BufMut;
use serde::Serialize;

use crate::{
    constants::ColumnType,
    error::{DecodeError, Result},
    io::ParseBuf,
};

/// Metadata value of a single column.
///
/// Interpretation depends on the column type:
///
/// * `MYSQL_TYPE_STRING` – real type in the high byte, packed field length in the low byte;
/// * `MYSQL_TYPE_NEWDECIMAL` – precision in the high byte, scale in the low byte;
/// * `MYSQL_TYPE_VARCHAR`, `MYSQL_TYPE_VAR_STRING` – maximum length in bytes;
/// * `MYSQL_TYPE_BIT` – number of full bytes in the high byte, remaining bits in the low byte;
/// * blob-like types – width of the length prefix;
/// * `MYSQL_TYPE_FLOAT`, `MYSQL_TYPE_DOUBLE` – storage width;
/// * `MYSQL_TYPE_TIME2`, `MYSQL_TYPE_DATETIME2`, `MYSQL_TYPE_TIMESTAMP2` – fractional
///   seconds precision.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ColumnMeta(pub u16);

impl ColumnMeta {
    pub fn high_byte(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn low_byte(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl From<u16> for ColumnMeta {
    fn from(x: u16) -> Self {
        ColumnMeta(x)
    }
}

/// How column metadata is stored in the metadata block.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MetadataLayout {
    /// No metadata.
    Empty,
    /// Single byte.
    OneByte,
    /// Two bytes, first byte is the high one.
    TwoBytesPacked,
    /// Little-endian u16.
    TwoBytesLe,
}

impl MetadataLayout {
    /// Returns the number of bytes occupied in the metadata block.
    pub fn len(self) -> usize {
        match self {
            MetadataLayout::Empty => 0,
            MetadataLayout::OneByte => 1,
            MetadataLayout::TwoBytesPacked | MetadataLayout::TwoBytesLe => 2,
        }
    }
}

impl ColumnType {
    /// Returns the layout of this column type's metadata.
    ///
    /// Errors for types that can't be a column type of a `TABLE_MAP_EVENT`.
    pub fn metadata_layout(&self) -> Result<MetadataLayout> {
        if self.is_internal() {
            return Err(DecodeError::UnsupportedColumnType(*self));
        }

        match self {
            ColumnType::MYSQL_TYPE_STRING | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                Ok(MetadataLayout::TwoBytesPacked)
            }
            ColumnType::MYSQL_TYPE_VAR_STRING
            | ColumnType::MYSQL_TYPE_VARCHAR
            | ColumnType::MYSQL_TYPE_BIT => Ok(MetadataLayout::TwoBytesLe),
            ColumnType::MYSQL_TYPE_DOUBLE | ColumnType::MYSQL_TYPE_FLOAT => {
                Ok(MetadataLayout::OneByte)
            }
            ty if ty.is_blob_like() || ty.is_packed_temporal() => Ok(MetadataLayout::OneByte),
            _ => Ok(MetadataLayout::Empty),
        }
    }
}

/// Decodes the metadata block of a `TABLE_MAP_EVENT`.
///
/// Returns one value per column. The whole block must be consumed.
pub fn decode_column_metadata(
    columns_type: &[ColumnType],
    metadata: &[u8],
) -> Result<Vec<ColumnMeta>> {
    let mut buf = ParseBuf(metadata);
    let mut values = Vec::with_capacity(columns_type.len());

    for column_type in columns_type {
        let value = match column_type.metadata_layout()? {
            MetadataLayout::Empty => 0,
            MetadataLayout::OneByte => buf.checked_eat_u8()? as u16,
            MetadataLayout::TwoBytesPacked => {
                let bytes = buf.checked_eat(2)?;
                ((bytes[0] as u16) << 8) + bytes[1] as u16
            }
            MetadataLayout::TwoBytesLe => buf.checked_eat_u16_le()?,
        };
        values.push(ColumnMeta(value));
    }

    if !buf.is_empty() {
        return Err(DecodeError::malformed(format!(
            "{} trailing bytes in column metadata block",
            buf.len()
        )));
    }

    Ok(values)
}

/// Encodes the metadata block of a `TABLE_MAP_EVENT` (without the length prefix).
pub fn encode_column_metadata(
    columns_type: &[ColumnType],
    metadata: &[ColumnMeta],
    buf: &mut Vec<u8>,
) -> Result<()> {
    if columns_type.len() != metadata.len() {
        return Err(DecodeError::malformed(format!(
            "{} column types but {} metadata values",
            columns_type.len(),
            metadata.len()
        )));
    }

    for (column_type, meta) in columns_type.iter().zip(metadata) {
        match column_type.metadata_layout()? {
            MetadataLayout::Empty => (),
            MetadataLayout::OneByte => buf.put_u8(meta.low_byte()),
            MetadataLayout::TwoBytesPacked => {
                buf.put_u8(meta.high_byte());
                buf.put_u8(meta.low_byte());
            }
            MetadataLayout::TwoBytesLe => buf.put_u16_le(meta.0),
        }
    }

    Ok(())
}
