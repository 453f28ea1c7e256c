// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::{borrow::Cow, cmp::min};

use bytes::BufMut;
use serde::Serialize;

use crate::{error::Result, io::ParseBuf};

/// Query that caused the following `ROWS_EVENT`.
///
/// Only logged if `binlog_rows_query_log_events` is enabled.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct RowsQueryEvent<'a> {
    /// The query.
    ///
    /// Preceded by a length byte that is ignored: the query is the rest of the body.
    query: Cow<'a, [u8]>,
}

impl<'a> RowsQueryEvent<'a> {
    /// Creates new instance.
    pub fn new(query: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            query: query.into(),
        }
    }

    /// Returns raw query value.
    pub fn query_raw(&'a self) -> &'a [u8] {
        self.query.as_ref()
    }

    /// Returns query value as a string (lossy converted).
    pub fn query(&'a self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.query.as_ref())
    }

    /// Returns a `'static` version of `self`.
    pub fn into_owned(self) -> RowsQueryEvent<'static> {
        RowsQueryEvent {
            query: Cow::Owned(self.query.into_owned()),
        }
    }

    /// Decodes a `ROWS_QUERY_EVENT` body.
    pub fn deserialize(buf: &mut ParseBuf<'a>) -> Result<Self> {
        buf.checked_skip(1)?;
        Ok(Self {
            query: Cow::Borrowed(buf.eat_all()),
        })
    }

    /// Writes this event's body.
    ///
    /// The length byte is saturated at 255.
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        buf.put_u8(min(self.query.len(), u8::MAX as usize) as u8);
        buf.put_slice(&self.query);
    }

    pub fn len(&self) -> usize {
        1 + self.query.len()
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}
