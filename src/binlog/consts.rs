// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::convert::TryFrom;

use serde::Serialize;

/// Width of a table identifier on the wire.
///
/// It isn't self-describing: it depends on the post-header length the server
/// announced in its `FORMAT_DESCRIPTION_EVENT`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum TableIdWidth {
    /// Old servers (post-header length of 6).
    Four = 4,
    /// MySql 5.1.4 and later.
    Six = 6,
}

impl TableIdWidth {
    /// Derives the table id width from the post-header length of a
    /// `TABLE_MAP_EVENT` or a rows event.
    pub fn from_post_header_len(post_header_len: u8) -> Self {
        if post_header_len == 6 {
            TableIdWidth::Four
        } else {
            TableIdWidth::Six
        }
    }

    /// Returns the width in bytes.
    pub fn len(self) -> usize {
        self as usize
    }
}

impl Default for TableIdWidth {
    fn default() -> Self {
        TableIdWidth::Six
    }
}

/// Row operation of a rows event.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub enum RowsEventKind {
    Write,
    Update,
    Delete,
}

/// Binlog event types of the rows event family.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub enum RowsEventType {
    /// Version 0 (MySql 5.1.0 - 5.1.15).
    PRE_GA_WRITE_ROWS_EVENT = 0x14,
    PRE_GA_UPDATE_ROWS_EVENT = 0x15,
    PRE_GA_DELETE_ROWS_EVENT = 0x16,
    /// Version 1 (MySql 5.1.15 - 5.6.x).
    WRITE_ROWS_EVENT_V1 = 0x17,
    UPDATE_ROWS_EVENT_V1 = 0x18,
    DELETE_ROWS_EVENT_V1 = 0x19,
    /// Version 2 (MySql 5.6.x and later). Carries extra data in the post-header.
    WRITE_ROWS_EVENT = 0x1e,
    UPDATE_ROWS_EVENT = 0x1f,
    DELETE_ROWS_EVENT = 0x20,
}

impl RowsEventType {
    /// Returns the event type for the given operation and format version (`0..=2`).
    pub fn new(kind: RowsEventKind, version: u8) -> Option<Self> {
        use RowsEventKind::*;
        use RowsEventType::*;

        match (kind, version) {
            (Write, 0) => Some(PRE_GA_WRITE_ROWS_EVENT),
            (Update, 0) => Some(PRE_GA_UPDATE_ROWS_EVENT),
            (Delete, 0) => Some(PRE_GA_DELETE_ROWS_EVENT),
            (Write, 1) => Some(WRITE_ROWS_EVENT_V1),
            (Update, 1) => Some(UPDATE_ROWS_EVENT_V1),
            (Delete, 1) => Some(DELETE_ROWS_EVENT_V1),
            (Write, 2) => Some(WRITE_ROWS_EVENT),
            (Update, 2) => Some(UPDATE_ROWS_EVENT),
            (Delete, 2) => Some(DELETE_ROWS_EVENT),
            _ => None,
        }
    }

    pub fn kind(&self) -> RowsEventKind {
        use RowsEventType::*;

        match self {
            PRE_GA_WRITE_ROWS_EVENT | WRITE_ROWS_EVENT_V1 | WRITE_ROWS_EVENT => {
                RowsEventKind::Write
            }
            PRE_GA_UPDATE_ROWS_EVENT | UPDATE_ROWS_EVENT_V1 | UPDATE_ROWS_EVENT => {
                RowsEventKind::Update
            }
            PRE_GA_DELETE_ROWS_EVENT | DELETE_ROWS_EVENT_V1 | DELETE_ROWS_EVENT => {
                RowsEventKind::Delete
            }
        }
    }

    /// Returns the rows event format version (`0`, `1` or `2`).
    pub fn version(&self) -> u8 {
        match *self as u8 {
            0x14..=0x16 => 0,
            0x17..=0x19 => 1,
            _ => 2,
        }
    }

    /// Update events carry a second columns bitmap and a second image per row.
    pub fn needs_after_image(&self) -> bool {
        self.kind() == RowsEventKind::Update
    }
}

/// Unknown rows event type error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown rows event type {}", _0)]
#[repr(transparent)]
pub struct UnknownRowsEventType(pub u8);

impl From<UnknownRowsEventType> for u8 {
    fn from(x: UnknownRowsEventType) -> Self {
        x.0
    }
}

impl TryFrom<u8> for RowsEventType {
    type Error = UnknownRowsEventType;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x14 => Ok(Self::PRE_GA_WRITE_ROWS_EVENT),
            0x15 => Ok(Self::PRE_GA_UPDATE_ROWS_EVENT),
            0x16 => Ok(Self::PRE_GA_DELETE_ROWS_EVENT),
            0x17 => Ok(Self::WRITE_ROWS_EVENT_V1),
            0x18 => Ok(Self::UPDATE_ROWS_EVENT_V1),
            0x19 => Ok(Self::DELETE_ROWS_EVENT_V1),
            0x1e => Ok(Self::WRITE_ROWS_EVENT),
            0x1f => Ok(Self::UPDATE_ROWS_EVENT),
            0x20 => Ok(Self::DELETE_ROWS_EVENT),
            x => Err(UnknownRowsEventType(x)),
        }
    }
}

bitflags::bitflags! {
    /// Rows event flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RowsEventFlags: u16 {
        /// Last event of a statement.
        const STMT_END = 0x0001;
        /// No foreign key checks.
        const NO_FOREIGN_KEY_CHECKS = 0x0002;
        /// No unique key checks.
        const RELAXED_UNIQUE_CHECKS = 0x0004;
        /// Indicates that rows in this event are complete,
        /// that is contain values for all columns of the table.
        const COMPLETE_ROWS = 0x0008;
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::*;

    #[test]
    fn rows_event_type_roundtrip() {
        for kind in [RowsEventKind::Write, RowsEventKind::Update, RowsEventKind::Delete] {
            for version in 0..=2 {
                let ty = RowsEventType::new(kind, version).unwrap();
                assert_eq!(ty.kind(), kind);
                assert_eq!(ty.version(), version);
                assert_eq!(RowsEventType::try_from(ty as u8), Ok(ty));
                assert_eq!(ty.needs_after_image(), kind == RowsEventKind::Update);
            }
        }
        assert_eq!(RowsEventType::new(RowsEventKind::Write, 3), None);
        // PARTIAL_UPDATE_ROWS_EVENT
        assert_eq!(RowsEventType::try_from(0x27), Err(UnknownRowsEventType(0x27)));
    }

    #[test]
    fn table_id_width_from_post_header() {
        assert_eq!(TableIdWidth::from_post_header_len(6), TableIdWidth::Four);
        assert_eq!(TableIdWidth::from_post_header_len(8), TableIdWidth::Six);
        assert_eq!(TableIdWidth::from_post_header_len(10), TableIdWidth::Six);
        assert_eq!(TableIdWidth::default().len(), 6);
    }

    #[test]
    fn rows_event_flags_keep_unknown_bits() {
        let flags = RowsEventFlags::from_bits_retain(0x8001);
        assert!(flags.contains(RowsEventFlags::STMT_END));
        assert_eq!(flags.bits(), 0x8001);
    }
}
