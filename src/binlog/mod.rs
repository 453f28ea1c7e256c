// Copyright (c) 2020 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Row-based binlog structures and functions. This implementation assumes
//! binlog version >= 4 (MySql >= 5.0.0).
//!
//! Decoding is split in layers:
//!
//! * [`events::TableMapEvent`] – table schema (column types, metadata and nullability);
//! * [`events::RowsEvent`] – rows of a `WRITE`, `UPDATE` or `DELETE` rows event;
//! * [`row::RowImage`] – one image of a row (null bitmap followed by column values);
//! * [`value::ColumnValue`] – wire segment of a single column value.
//!
//! [`BinlogDecoder`] ties them together keeping table map events of a stream
//! in a [`registry::TableMapRegistry`].

pub mod consts;
pub mod decimal;
pub mod decoder;
pub mod events;
pub mod metadata;
pub mod registry;
pub mod row;
pub mod time;
pub mod value;

pub use self::{
    consts::{RowsEventFlags, RowsEventKind, RowsEventType, TableIdWidth},
    decoder::{BinlogDecoder, DecoderOptions},
    events::{RowChange, RowsEvent, RowsQueryEvent, TableMapEvent},
    metadata::ColumnMeta,
    registry::TableMapRegistry,
    row::{ColumnEntry, RowImage},
    value::ColumnValue,
};
