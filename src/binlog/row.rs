// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use bitvec::prelude::*;
use bytes::BufMut;
use serde::Serialize;

use crate::{
    error::{DecodeError, Result},
    io::ParseBuf,
    misc::{bitmap_bytes, bitmap_len},
};

use super::{events::TableMapEvent, value::ColumnValue};

/// State of a single column in a row image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnEntry<'a> {
    /// Column isn't included in the image (its bit in the columns bitmap is unset).
    Absent,
    /// Column is included in the image and its value is `NULL`.
    Null,
    /// Column is included in the image and has a value.
    Present(ColumnValue<'a>),
}

impl<'a> ColumnEntry<'a> {
    pub fn is_absent(&self) -> bool {
        matches!(self, ColumnEntry::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnEntry::Null)
    }

    /// Returns the value if the column is present and isn't `NULL`.
    pub fn as_value(&self) -> Option<&ColumnValue<'a>> {
        match self {
            ColumnEntry::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a `'static` version of `self`.
    pub fn into_owned(self) -> ColumnEntry<'static> {
        match self {
            ColumnEntry::Absent => ColumnEntry::Absent,
            ColumnEntry::Null => ColumnEntry::Null,
            ColumnEntry::Present(value) => ColumnEntry::Present(value.into_owned()),
        }
    }
}

/// Representation of a binlog row image.
///
/// Contains exactly one entry per column of the table, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RowImage<'a> {
    entries: Vec<ColumnEntry<'a>>,
}

impl<'a> RowImage<'a> {
    pub fn new(entries: Vec<ColumnEntry<'a>>) -> Self {
        Self { entries }
    }

    /// Returns length of a row.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the row has a length of 0.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry of a column with index `index` if it exists.
    pub fn get(&self, index: usize) -> Option<&ColumnEntry<'a>> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnEntry<'a>> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ColumnEntry<'a>] {
        &self.entries
    }

    /// Returns the number of columns included in the image (`NULL` or not).
    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|x| !x.is_absent()).count()
    }

    pub fn null_count(&self) -> usize {
        self.entries.iter().filter(|x| x.is_null()).count()
    }

    pub fn absent_count(&self) -> usize {
        self.entries.iter().filter(|x| x.is_absent()).count()
    }

    /// Unwraps entries of a row.
    pub fn unwrap(self) -> Vec<ColumnEntry<'a>> {
        self.entries
    }

    /// Returns a `'static` version of `self`.
    pub fn into_owned(self) -> RowImage<'static> {
        RowImage {
            entries: self
                .entries
                .into_iter()
                .map(ColumnEntry::into_owned)
                .collect(),
        }
    }

    /// Decodes a row image.
    ///
    /// Content:
    ///
    /// * null bitmap - one bit per column included in the image
    /// * values of non-null included columns
    ///
    /// `columns` is the columns bitmap of the rows event (bit is set if column is in the image).
    /// It's truncated to the number of columns of the table.
    pub fn deserialize(
        table: &TableMapEvent,
        columns: &BitSlice<u8, Lsb0>,
        buf: &mut ParseBuf<'a>,
    ) -> Result<Self> {
        let num_columns = table.columns_count();
        if columns.len() < num_columns {
            return Err(DecodeError::malformed(format!(
                "columns bitmap of {} bits for {} columns",
                columns.len(),
                num_columns
            )));
        }
        let columns = &columns[..num_columns];

        let present = columns.count_ones();
        let null_bitmap = buf.checked_eat(bitmap_len(present))?.view_bits::<Lsb0>();

        let mut entries = Vec::with_capacity(num_columns);
        let mut null_index = 0;

        for (i, column) in table
            .columns_type()
            .iter()
            .zip(table.columns_metadata())
            .enumerate()
        {
            if !columns[i] {
                entries.push(ColumnEntry::Absent);
                continue;
            }

            let is_null = null_bitmap[null_index];
            null_index += 1;

            if is_null {
                entries.push(ColumnEntry::Null);
            } else {
                let (column_type, metadata) = column;
                let value = ColumnValue::deserialize(*column_type, *metadata, buf)
                    .map_err(|err| err.in_column(i))?;
                entries.push(ColumnEntry::Present(value));
            }
        }

        let image = RowImage { entries };

        tracing::trace!(
            table_id = table.table_id(),
            present,
            nulls = image.null_count(),
            "decoded row image"
        );

        Ok(image)
    }
}

impl RowImage<'_> {
    /// Writes this image as a part of a rows event body.
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        let null_bitmap = self
            .iter()
            .filter(|entry| !entry.is_absent())
            .map(ColumnEntry::is_null)
            .collect::<BitVec<u8, Lsb0>>();
        buf.put_slice(&bitmap_bytes(&null_bitmap));

        for value in self.iter().filter_map(ColumnEntry::as_value) {
            buf.put_slice(value.as_bytes());
        }
    }
}

impl<'a, 'b> IntoIterator for &'b RowImage<'a> {
    type Item = &'b ColumnEntry<'a>;
    type IntoIter = std::slice::Iter<'b, ColumnEntry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
