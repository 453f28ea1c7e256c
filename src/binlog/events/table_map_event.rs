// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::{borrow::Cow, cmp::min, convert::TryFrom};

use bitvec::prelude::*;
use bytes::BufMut;
use serde::Serialize;

use crate::{
    binlog::{
        consts::TableIdWidth,
        metadata::{decode_column_metadata, encode_column_metadata, ColumnMeta},
    },
    constants::ColumnType,
    error::{DecodeError, Result},
    io::{BufMutExt, ParseBuf},
    misc::{bitmap_len, lenenc_int_len},
};

/// Table map event.
///
/// In row-based mode, every row operation event is preceded by a Table_map_event which maps
/// a table definition to a number.
///
/// Unlike rows events this one is always owned: it outlives the event body
/// because it's kept in the [`TableMapRegistry`](crate::binlog::registry::TableMapRegistry)
/// until the table id is reused.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct TableMapEvent {
    // post-header
    /// The number that identifies the table.
    ///
    /// It's 4 or 6 bytes long on the wire (see [`TableIdWidth`]).
    table_id: u64,
    /// Reserved for future use; currently always 0.
    flags: u16,

    // payload
    /// The name of the database in which the table resides.
    ///
    /// Length must be <= 64 bytes.
    database_name: Vec<u8>,
    /// The name of the table.
    ///
    /// Length must be <= 64 bytes.
    table_name: Vec<u8>,
    /// The type of each column in the table, listed from left to right.
    columns_type: Vec<ColumnType>,
    /// Metadata of each column in the table, listed from left to right.
    columns_metadata: Vec<ColumnMeta>,
    /// For each column, a bit indicating whether data in the column can be NULL or not.
    ///
    /// The number of bytes needed for this is int((column_count + 7) / 8).
    /// The flag for the first column from the left is in the least-significant bit
    /// of the first byte, the second is in the second least significant bit of the first byte,
    /// the ninth is in the least significant bit of the second byte, and so on.
    null_bitmask: Vec<u8>,
}

impl TableMapEvent {
    /// Creates a new table map event for a table of non-nullable columns.
    ///
    /// Errors if number of column types doesn't match the number of metadata values.
    pub fn new(
        table_id: u64,
        database_name: impl Into<Vec<u8>>,
        table_name: impl Into<Vec<u8>>,
        columns_type: Vec<ColumnType>,
        columns_metadata: Vec<ColumnMeta>,
    ) -> Result<Self> {
        if columns_type.len() != columns_metadata.len() {
            return Err(DecodeError::malformed(format!(
                "{} column types but {} metadata values",
                columns_type.len(),
                columns_metadata.len()
            )));
        }

        Ok(Self {
            table_id,
            flags: 0,
            database_name: database_name.into(),
            table_name: table_name.into(),
            null_bitmask: vec![0; bitmap_len(columns_type.len())],
            columns_type,
            columns_metadata,
        })
    }

    /// Sets the null-bitmap for this table.
    ///
    /// Errors if the bitmap length doesn't match the number of columns.
    pub fn with_null_bitmask(mut self, null_bitmask: impl Into<Vec<u8>>) -> Result<Self> {
        let null_bitmask = null_bitmask.into();
        check_null_bitmask_len(self.columns_type.len(), null_bitmask.len())?;
        self.null_bitmask = null_bitmask;
        Ok(self)
    }

    /// Sets the `flags` value.
    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the table identifier.
    pub fn table_id(&self) -> u64 {
        self.table_id
    }

    /// Returns the raw `flags` value.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns the number of columns
    pub fn columns_count(&self) -> usize {
        self.columns_type.len()
    }

    /// Returns types of all columns.
    pub fn columns_type(&self) -> &[ColumnType] {
        &self.columns_type
    }

    /// Returns metadata of all columns.
    pub fn columns_metadata(&self) -> &[ColumnMeta] {
        &self.columns_metadata
    }

    /// Returns null-bitmap for this table.
    ///
    /// For each column this null bitmap contains a bit indicating whether
    /// data in the column can be NULL or not.
    pub fn null_bitmask(&self) -> &BitSlice<u8, Lsb0> {
        &self.null_bitmask.view_bits::<Lsb0>()[..self.columns_count()]
    }

    /// Returns `true` if the given column is nullable.
    ///
    /// `None` means that the column index is out of range.
    pub fn is_nullable(&self, col_idx: usize) -> Option<bool> {
        self.null_bitmask().get(col_idx).map(|bit| *bit)
    }

    /// Returns raw database name value.
    pub fn database_name_raw(&self) -> &[u8] {
        &self.database_name
    }

    /// Returns database name as a string (lossy converted).
    pub fn database_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.database_name)
    }

    /// Returns raw table name value.
    pub fn table_name_raw(&self) -> &[u8] {
        &self.table_name
    }

    /// Returns table name as a string (lossy converted).
    pub fn table_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.table_name)
    }

    /// Returns a type of the given column.
    ///
    /// `None` means that the column index is out of range.
    pub fn get_column_type(&self, col_idx: usize) -> Option<ColumnType> {
        self.columns_type.get(col_idx).copied()
    }

    /// Returns metadata for the given column.
    ///
    /// `None` means that the column index is out of range.
    pub fn get_column_metadata(&self, col_idx: usize) -> Option<ColumnMeta> {
        self.columns_metadata.get(col_idx).copied()
    }

    /// Reads the table id of a `TABLE_MAP_EVENT` body without decoding the rest of it.
    pub fn peek_table_id(width: TableIdWidth, body: &[u8]) -> Result<u64> {
        ParseBuf(body).checked_eat_uint_le(width.len())
    }

    /// Decodes a `TABLE_MAP_EVENT` body (post-header included).
    pub fn deserialize(width: TableIdWidth, buf: &mut ParseBuf<'_>) -> Result<Self> {
        let table_id = buf.checked_eat_uint_le(width.len())?;
        let flags = buf.checked_eat_u16_le()?;

        // names are null-terminated even though they're preceded by the length
        let database_name = buf.checked_eat_u8_str()?.to_vec();
        buf.checked_skip(1)?;
        let table_name = buf.checked_eat_u8_str()?.to_vec();
        buf.checked_skip(1)?;

        let columns_count = buf.checked_eat_lenenc_int()?;
        let columns_count = usize::try_from(columns_count)
            .ok()
            .filter(|count| *count <= buf.len())
            .ok_or(DecodeError::UnexpectedEof {
                needed: min(columns_count, usize::MAX as u64) as usize,
                remaining: buf.len(),
            })?;

        let columns_type = buf
            .checked_eat(columns_count)?
            .iter()
            .map(|byte| ColumnType::try_from(*byte))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let metadata_block = buf.checked_eat_lenenc_str()?;
        let columns_metadata = decode_column_metadata(&columns_type, metadata_block)?;

        let null_bitmask = buf.eat_all();
        check_null_bitmask_len(columns_count, null_bitmask.len())?;

        Ok(Self {
            table_id,
            flags,
            database_name,
            table_name,
            columns_type,
            columns_metadata,
            null_bitmask: null_bitmask.to_vec(),
        })
    }

    /// Writes this event's body (post-header included).
    ///
    /// Names longer than 255 bytes are truncated.
    pub fn serialize(&self, width: TableIdWidth, buf: &mut Vec<u8>) -> Result<()> {
        let mut metadata_block = Vec::new();
        encode_column_metadata(&self.columns_type, &self.columns_metadata, &mut metadata_block)?;

        buf.put_uint_le(self.table_id, width.len());
        buf.put_u16_le(self.flags);
        buf.put_u8_str(&self.database_name);
        buf.put_u8(0);
        buf.put_u8_str(&self.table_name);
        buf.put_u8(0);
        buf.put_lenenc_int(self.columns_count() as u64);
        buf.extend(self.columns_type.iter().map(|ty| u8::from(*ty)));
        buf.put_lenenc_str(&metadata_block);
        buf.put_slice(&self.null_bitmask);

        Ok(())
    }

    /// Returns the length of this event's body.
    pub fn len(&self, width: TableIdWidth) -> Result<usize> {
        let mut metadata_len = 0;
        for ty in &self.columns_type {
            metadata_len += ty.metadata_layout()?.len();
        }

        let mut len = width.len();
        len += 2;
        len += 1 + min(self.database_name.len(), u8::MAX as usize) + 1;
        len += 1 + min(self.table_name.len(), u8::MAX as usize) + 1;
        len += lenenc_int_len(self.columns_count() as u64) as usize;
        len += self.columns_count();
        len += lenenc_int_len(metadata_len as u64) as usize + metadata_len;
        len += self.null_bitmask.len();

        Ok(len)
    }
}

fn check_null_bitmask_len(columns_count: usize, len: usize) -> Result<()> {
    if len != bitmap_len(columns_count) {
        return Err(DecodeError::malformed(format!(
            "null bitmap of {} bytes for {} columns",
            len, columns_count
        )));
    }
    Ok(())
}
