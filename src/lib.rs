// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Decoder for MySql row-based binlog events.
//!
//! This crate segments the bodies of `TABLE_MAP_EVENT` and of the `*_ROWS_EVENT` family
//! into table schemas and row images. Column values are returned as raw wire segments
//! tagged with their effective column type and metadata, so that value interpretation
//! (decimals, temporal types, charsets) can happen downstream.
//!
//! The caller is expected to strip the common event header and the checksum trailer
//! before handing an event body to the decoder.
//!
//! ```
//! use mysql_binlog_rows::binlog::{BinlogDecoder, DecoderOptions, RowsEventType, TableIdWidth};
//!
//! # fn main() -> mysql_binlog_rows::Result<()> {
//! let mut decoder = BinlogDecoder::new(DecoderOptions::default());
//!
//! // TABLE_MAP_EVENT body: `test`.`t1` with a single TINYINT column.
//! let table_map = [
//!     0x01, 0x00, 0x00, 0x00, 0x00, 0x00, // table id
//!     0x00, 0x00, // flags
//!     0x04, b't', b'e', b's', b't', 0x00, // schema
//!     0x02, b't', b'1', 0x00, // table
//!     0x01, // columns count
//!     0x01, // MYSQL_TYPE_TINY
//!     0x00, // empty metadata block
//!     0x00, // null bitmask
//! ];
//! decoder.decode_table_map(&table_map)?;
//!
//! // WRITE_ROWS_EVENT_V1 body with one row holding `42`.
//! let rows = [
//!     0x01, 0x00, 0x00, 0x00, 0x00, 0x00, // table id
//!     0x00, 0x00, // flags
//!     0x01, // columns count
//!     0x01, // columns present
//!     0x00, 0x2a, // null bitmap and the value
//! ];
//! let event = decoder.decode_rows(&rows, RowsEventType::WRITE_ROWS_EVENT_V1)?;
//! assert_eq!(event.images().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod binlog;
pub mod constants;
pub mod error;
pub mod io;
pub mod misc;

pub use error::{DecodeError, ErrorKind, Result};
