// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::{DecodeError, Result},
    io::ParseBuf,
};

use super::{
    consts::{RowsEventType, TableIdWidth},
    events::{RowsEvent, RowsQueryEvent, TableMapEvent},
    registry::TableMapRegistry,
};

/// Options of a [`BinlogDecoder`].
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct DecoderOptions {
    table_id_width: TableIdWidth,
}

impl DecoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Width of table ids in `TABLE_MAP_EVENT` and rows events (defaults to 6 bytes).
    ///
    /// Use [`TableIdWidth::from_post_header_len`] to derive it from the
    /// `FORMAT_DESCRIPTION_EVENT` of the stream.
    pub fn with_table_id_width(mut self, table_id_width: TableIdWidth) -> Self {
        self.table_id_width = table_id_width;
        self
    }

    pub fn table_id_width(&self) -> TableIdWidth {
        self.table_id_width
    }
}

/// Decoder of row-based events of a single replication stream.
///
/// Events must be given in stream order: a rows event is decoded against the table map
/// event last seen for its table id.
#[derive(Debug, Default, Clone)]
pub struct BinlogDecoder {
    options: DecoderOptions,
    tables: TableMapRegistry,
}

impl BinlogDecoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            options,
            tables: TableMapRegistry::new(),
        }
    }

    pub fn options(&self) -> DecoderOptions {
        self.options
    }

    /// Returns table map events seen so far.
    pub fn tables(&self) -> &TableMapRegistry {
        &self.tables
    }

    /// Decodes a `TABLE_MAP_EVENT` body and registers the table.
    ///
    /// If the body can't be decoded but its table id can, the previous table with this id
    /// is forgotten, so that following rows events fail instead of being decoded against
    /// a stale definition.
    pub fn decode_table_map(&mut self, body: &[u8]) -> Result<Arc<TableMapEvent>> {
        let width = self.options.table_id_width;

        let event = match TableMapEvent::deserialize(width, &mut ParseBuf(body)) {
            Ok(event) => Arc::new(event),
            Err(err) => {
                if let Ok(table_id) = TableMapEvent::peek_table_id(width, body) {
                    if self.tables.remove(table_id).is_some() {
                        warn!(table_id, error = %err, "dropped table map that failed to decode");
                    }
                }
                return Err(err);
            }
        };

        let table_id = event.table_id();
        let replaced = self.tables.insert(event.clone());
        debug!(
            table_id,
            replaced = replaced.is_some(),
            "registered table map"
        );

        Ok(event)
    }

    /// Decodes a rows event body of the given type.
    pub fn decode_rows<'a>(
        &self,
        body: &'a [u8],
        event_type: RowsEventType,
    ) -> Result<RowsEvent<'a>> {
        let width = self.options.table_id_width;

        let event = RowsEvent::deserialize(width, event_type, &self.tables, &mut ParseBuf(body))
            .map_err(|err| {
                if let DecodeError::UnknownTable(table_id) = err {
                    warn!(table_id, ?event_type, "rows event for an unknown table");
                }
                err
            })?;

        debug!(
            table_id = event.table_id(),
            ?event_type,
            images = event.images().len(),
            "decoded rows event"
        );

        Ok(event)
    }

    /// Decodes a `ROWS_QUERY_EVENT` body.
    pub fn decode_rows_query<'a>(&self, body: &'a [u8]) -> Result<RowsQueryEvent<'a>> {
        RowsQueryEvent::deserialize(&mut ParseBuf(body))
    }

    /// Forgets all table map events (e.g. on rotation to a new binlog file).
    pub fn reset(&mut self) {
        self.tables.clear();
    }
}
