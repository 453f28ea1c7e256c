// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use crate::constants::{ColumnType, UnknownColumnType};

/// Decoder result.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Error decoding a binlog event body.
///
/// Every error is fatal to the event being decoded: offsets of all subsequent columns
/// and rows depend on the correct segmentation of the previous ones.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Fewer bytes remain than a decoding step requires.
    #[error("can't parse: buf doesn't have enough data ({} bytes needed, {} remaining)", needed, remaining)]
    UnexpectedEof { needed: usize, remaining: usize },
    /// An internal consistency check failed.
    #[error("malformed event: {}", _0)]
    Malformed(String),
    /// A rows event refers to a table that has no corresponding table map event.
    #[error("invalid table id {}, no corresponding table map event", _0)]
    UnknownTable(u64),
    #[error(transparent)]
    UnknownColumnType(#[from] UnknownColumnType),
    /// A known column type that can't appear in this position of a binlog.
    #[error("unsupported column type {:?} in binlog", _0)]
    UnsupportedColumnType(ColumnType),
    /// Column metadata value that doesn't describe a valid wire layout.
    #[error("unsupported metadata {} for column type {:?}", metadata, column_type)]
    UnsupportedMetadata {
        column_type: ColumnType,
        metadata: u16,
    },
    /// Error decoding a particular column of a row image.
    #[error("can't decode column {}", index)]
    Column {
        index: usize,
        #[source]
        cause: Box<DecodeError>,
    },
}

/// Category of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input is truncated.
    Truncated,
    /// Input is structurally inconsistent.
    Malformed,
    /// Referenced table map wasn't seen.
    UnresolvedReference,
    /// Type tag, metadata value or packed field width isn't supported.
    Unsupported,
}

impl DecodeError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        DecodeError::Malformed(msg.into())
    }

    pub(crate) fn unsupported_metadata(column_type: ColumnType, metadata: u16) -> Self {
        DecodeError::UnsupportedMetadata {
            column_type,
            metadata,
        }
    }

    pub(crate) fn in_column(self, index: usize) -> Self {
        DecodeError::Column {
            index,
            cause: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping column wrappers.
    pub fn root_cause(&self) -> &DecodeError {
        let mut err = self;
        while let DecodeError::Column { cause, .. } = err {
            err = cause;
        }
        err
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::UnexpectedEof { .. } => ErrorKind::Truncated,
            DecodeError::Malformed(_) => ErrorKind::Malformed,
            DecodeError::UnknownTable(_) => ErrorKind::UnresolvedReference,
            DecodeError::UnknownColumnType(_)
            | DecodeError::UnsupportedColumnType(_)
            | DecodeError::UnsupportedMetadata { .. } => ErrorKind::Unsupported,
            DecodeError::Column { cause, .. } => cause.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn column_error_keeps_its_cause() {
        let err = DecodeError::UnexpectedEof {
            needed: 4,
            remaining: 1,
        }
        .in_column(3)
        .in_column(7);

        assert_eq!(err.kind(), ErrorKind::Truncated);
        assert!(matches!(
            err.root_cause(),
            DecodeError::UnexpectedEof {
                needed: 4,
                remaining: 1
            }
        ));
        assert_eq!(err.to_string(), "can't decode column 7");
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "can't decode column 3");
        assert!(source
            .source()
            .unwrap()
            .to_string()
            .starts_with("can't parse"));
    }

    #[test]
    fn error_kinds() {
        assert_eq!(DecodeError::UnknownTable(1).kind(), ErrorKind::UnresolvedReference);
        assert_eq!(DecodeError::malformed("x").kind(), ErrorKind::Malformed);
        assert_eq!(
            DecodeError::from(UnknownColumnType(0x42)).kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            DecodeError::unsupported_metadata(ColumnType::MYSQL_TYPE_BLOB, 5).kind(),
            ErrorKind::Unsupported
        );
    }
}
