// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::{borrow::Cow, cmp::min, sync::Arc};

use bitvec::prelude::*;
use bytes::BufMut;
use serde::{Serialize, Serializer};

use crate::{
    binlog::{
        consts::{RowsEventFlags, RowsEventKind, RowsEventType, TableIdWidth},
        registry::TableMapRegistry,
        row::RowImage,
    },
    error::{DecodeError, Result},
    io::{BufMutExt, ParseBuf},
    misc::{bitmap_bytes, bitmap_len},
};

use super::TableMapEvent;

/// Common structure of `WRITE_ROWS_EVENT`, `UPDATE_ROWS_EVENT` and `DELETE_ROWS_EVENT`
/// of all three versions.
///
/// Row images are decoded eagerly against the table map event the rows event refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowsEvent<'a> {
    event_type: RowsEventType,
    /// Table identifier.
    ///
    /// If the table id is `0x00ffffff` it is a dummy event that should have
    /// the end of statement flag set that declares that all table maps can be freed.
    /// Otherwise it refers to a table defined by `TABLE_MAP_EVENT`.
    table_id: u64,
    /// Raw rows event flags (see [`RowsEventFlags`]).
    flags: u16,
    /// Raw extra data of a version 2 event (without its length).
    extra_data: Cow<'a, [u8]>,
    /// Number of columns.
    num_columns: u64,
    /// For DELETE and UPDATE only. Bit-field indicating whether each column is used one bit
    /// per column.
    #[serde(serialize_with = "serialize_bitmap")]
    columns_before_image: Option<BitVec<u8, Lsb0>>,
    /// For WRITE and UPDATE only. Bit-field indicating whether each column is used
    /// in the `UPDATE_ROWS_EVENT` and `WRITE_ROWS_EVENT` after-image; one bit per column.
    #[serde(serialize_with = "serialize_bitmap")]
    columns_after_image: Option<BitVec<u8, Lsb0>>,
    /// Table this event refers to.
    #[serde(skip)]
    table: Arc<TableMapEvent>,
    /// Row images in wire order (before image goes first for UPDATE events).
    images: Vec<RowImage<'a>>,
}

fn serialize_bitmap<S>(
    bitmap: &Option<BitVec<u8, Lsb0>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    bitmap
        .as_ref()
        .map(|bits| bits.iter().by_vals().collect::<Vec<bool>>())
        .serialize(serializer)
}

impl<'a> RowsEvent<'a> {
    /// Creates a new rows event.
    ///
    /// Images must be given in wire order and must contain one entry per column
    /// of the table.
    pub fn new(
        event_type: RowsEventType,
        table: Arc<TableMapEvent>,
        columns_before_image: Option<BitVec<u8, Lsb0>>,
        columns_after_image: Option<BitVec<u8, Lsb0>>,
        images: Vec<RowImage<'a>>,
    ) -> Result<Self> {
        let kind = event_type.kind();
        let num_columns = table.columns_count();

        let expects_before = kind != RowsEventKind::Write;
        let expects_after = kind != RowsEventKind::Delete;
        for (bitmap, expected) in [
            (&columns_before_image, expects_before),
            (&columns_after_image, expects_after),
        ] {
            match bitmap {
                Some(bits) if !expected || bits.len() != num_columns => {
                    return Err(DecodeError::malformed("unexpected columns bitmap"))
                }
                None if expected => return Err(DecodeError::malformed("missing columns bitmap")),
                _ => (),
            }
        }

        if images.iter().any(|image| image.len() != num_columns)
            || (kind == RowsEventKind::Update && images.len() % 2 != 0)
        {
            return Err(DecodeError::malformed("row images don't match the table"));
        }

        Ok(Self {
            event_type,
            table_id: table.table_id(),
            flags: 0,
            extra_data: Cow::Borrowed(&[]),
            num_columns: num_columns as u64,
            columns_before_image,
            columns_after_image,
            table,
            images,
        })
    }

    /// Sets the raw `flags` value.
    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the extra data of a version 2 event.
    pub fn with_extra_data(mut self, extra_data: impl Into<Cow<'a, [u8]>>) -> Self {
        self.extra_data = extra_data.into();
        self
    }

    pub fn event_type(&self) -> RowsEventType {
        self.event_type
    }

    /// Returns the table identifier.
    pub fn table_id(&self) -> u64 {
        self.table_id
    }

    /// Returns the table map event this rows event refers to.
    pub fn table(&self) -> &Arc<TableMapEvent> {
        &self.table
    }

    /// Returns the number of columns in the table.
    pub fn num_columns(&self) -> u64 {
        self.num_columns
    }

    /// Returns columns in the before-image (only for DELETE and UPDATE).
    ///
    /// Each bit indicates whether corresponding column is used in the image.
    pub fn columns_before_image(&self) -> Option<&BitSlice<u8, Lsb0>> {
        self.columns_before_image.as_deref()
    }

    /// Returns columns in the after-image (only for WRITE and UPDATE).
    ///
    /// Each bit indicates whether corresponding column is used in the image.
    pub fn columns_after_image(&self) -> Option<&BitSlice<u8, Lsb0>> {
        self.columns_after_image.as_deref()
    }

    /// Returns raw extra data of a version 2 event.
    pub fn extra_data(&self) -> &[u8] {
        self.extra_data.as_ref()
    }

    /// Returns rows event flags (unknown bits are truncated).
    pub fn flags(&self) -> RowsEventFlags {
        RowsEventFlags::from_bits_truncate(self.flags)
    }

    /// Returns raw rows event flags.
    pub fn flags_raw(&self) -> u16 {
        self.flags
    }

    /// Returns row images in wire order.
    pub fn images(&self) -> &[RowImage<'a>] {
        &self.images
    }

    /// Returns logical row changes of this event.
    ///
    /// Images of an UPDATE event are paired as (before, after).
    pub fn rows(&self) -> Vec<RowChange<'_>> {
        let images: &[RowImage<'_>] = &self.images;
        match self.event_type.kind() {
            RowsEventKind::Write => images
                .iter()
                .map(|after| RowChange::Insert { after })
                .collect(),
            RowsEventKind::Delete => images
                .iter()
                .map(|before| RowChange::Delete { before })
                .collect(),
            RowsEventKind::Update => images
                .chunks_exact(2)
                .map(|pair| RowChange::Update {
                    before: &pair[0],
                    after: &pair[1],
                })
                .collect(),
        }
    }

    /// Returns a `'static` version of `self`.
    pub fn into_owned(self) -> RowsEvent<'static> {
        RowsEvent {
            event_type: self.event_type,
            table_id: self.table_id,
            flags: self.flags,
            extra_data: Cow::Owned(self.extra_data.into_owned()),
            num_columns: self.num_columns,
            columns_before_image: self.columns_before_image,
            columns_after_image: self.columns_after_image,
            table: self.table,
            images: self.images.into_iter().map(RowImage::into_owned).collect(),
        }
    }

    /// Decodes the body of a rows event (post-header included).
    ///
    /// The table is looked up in `tables` by the table id found in the post-header.
    pub fn deserialize(
        width: TableIdWidth,
        event_type: RowsEventType,
        tables: &TableMapRegistry,
        buf: &mut ParseBuf<'a>,
    ) -> Result<Self> {
        let kind = event_type.kind();

        let table_id = buf.checked_eat_uint_le(width.len())?;
        let flags = buf.checked_eat_u16_le()?;

        let extra_data = if event_type.version() == 2 {
            // variable-length post header containing extra data
            let extra_data_len = buf.checked_eat_u16_le()? as usize;
            if extra_data_len < 2 {
                return Err(DecodeError::malformed(format!(
                    "invalid extra data length {}",
                    extra_data_len
                )));
            }
            buf.checked_eat(extra_data_len - 2)?
        } else {
            &[]
        };

        let num_columns = buf.checked_eat_lenenc_int()?;
        if num_columns > buf.len() as u64 * 8 {
            return Err(DecodeError::UnexpectedEof {
                needed: min(num_columns / 8, usize::MAX as u64) as usize,
                remaining: buf.len(),
            });
        }
        let num_columns_usize = num_columns as usize;

        let read_bitmap = |buf: &mut ParseBuf<'a>| -> Result<BitVec<u8, Lsb0>> {
            let bytes = buf.checked_eat(bitmap_len(num_columns_usize))?;
            Ok(bytes.view_bits::<Lsb0>()[..num_columns_usize].to_bitvec())
        };

        let columns_image_1 = read_bitmap(buf)?;
        let columns_image_2 = if event_type.needs_after_image() {
            Some(read_bitmap(buf)?)
        } else {
            None
        };

        let (columns_before_image, columns_after_image) = match kind {
            RowsEventKind::Update => (Some(columns_image_1), columns_image_2),
            RowsEventKind::Delete => (Some(columns_image_1), None),
            RowsEventKind::Write => (None, Some(columns_image_1)),
        };

        let table = tables
            .get(table_id)
            .cloned()
            .ok_or(DecodeError::UnknownTable(table_id))?;

        if num_columns != table.columns_count() as u64 {
            return Err(DecodeError::malformed(format!(
                "rows event declares {} columns, table {} has {}",
                num_columns,
                table_id,
                table.columns_count()
            )));
        }

        let mut images = Vec::new();
        while !buf.is_empty() {
            let remaining = buf.len();
            if let Some(ref columns) = columns_before_image {
                images.push(RowImage::deserialize(&table, columns, buf)?);
            }
            if let Some(ref columns) = columns_after_image {
                images.push(RowImage::deserialize(&table, columns, buf)?);
            }
            if buf.len() == remaining {
                return Err(DecodeError::malformed(format!(
                    "{} bytes left after the last row",
                    remaining
                )));
            }
        }

        Ok(Self {
            event_type,
            table_id,
            flags,
            extra_data: Cow::Borrowed(extra_data),
            num_columns,
            columns_before_image,
            columns_after_image,
            table,
            images,
        })
    }

    /// Writes the body of this event (post-header included).
    pub fn serialize(&self, width: TableIdWidth, buf: &mut Vec<u8>) {
        buf.put_uint_le(self.table_id, width.len());
        buf.put_u16_le(self.flags);
        if self.event_type.version() == 2 {
            let len = min(self.extra_data.len(), u16::MAX as usize - 2);
            buf.put_u16_le(len as u16 + 2);
            buf.put_slice(&self.extra_data[..len]);
        }

        buf.put_lenenc_int(self.num_columns);
        for bitmap in self
            .columns_before_image
            .iter()
            .chain(self.columns_after_image.iter())
        {
            buf.put_slice(&bitmap_bytes(bitmap));
        }

        for image in &self.images {
            image.serialize(buf);
        }
    }
}

/// Logical row change of a rows event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowChange<'a> {
    Insert {
        after: &'a RowImage<'a>,
    },
    Delete {
        before: &'a RowImage<'a>,
    },
    Update {
        before: &'a RowImage<'a>,
        after: &'a RowImage<'a>,
    },
}

impl<'a> RowChange<'a> {
    /// Image before the change (DELETE and UPDATE).
    pub fn before(&self) -> Option<&'a RowImage<'a>> {
        match *self {
            RowChange::Insert { .. } => None,
            RowChange::Delete { before } | RowChange::Update { before, .. } => Some(before),
        }
    }

    /// Image after the change (INSERT and UPDATE).
    pub fn after(&self) -> Option<&'a RowImage<'a>> {
        match *self {
            RowChange::Delete { .. } => None,
            RowChange::Insert { after } | RowChange::Update { after, .. } => Some(after),
        }
    }
}
