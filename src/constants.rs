// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::convert::TryFrom;

use serde::Serialize;

/// Type of MySql column field.
///
/// Every variant corresponds to a `enum_field_types` value of the server.
/// Some of them are internal to the server and never appear as a column type
/// of a `TABLE_MAP_EVENT` (see [`ColumnType::is_internal`]).
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub enum ColumnType {
    MYSQL_TYPE_DECIMAL = 0,
    MYSQL_TYPE_TINY,
    MYSQL_TYPE_SHORT,
    MYSQL_TYPE_LONG,
    MYSQL_TYPE_FLOAT,
    MYSQL_TYPE_DOUBLE,
    MYSQL_TYPE_NULL,
    MYSQL_TYPE_TIMESTAMP,
    MYSQL_TYPE_LONGLONG,
    MYSQL_TYPE_INT24,
    MYSQL_TYPE_DATE,
    MYSQL_TYPE_TIME,
    MYSQL_TYPE_DATETIME,
    MYSQL_TYPE_YEAR,
    /// Internal to MySql. Not used in protocol
    MYSQL_TYPE_NEWDATE,
    MYSQL_TYPE_VARCHAR,
    MYSQL_TYPE_BIT,
    MYSQL_TYPE_TIMESTAMP2,
    /// Internal to MySql. Not used in protocol
    MYSQL_TYPE_DATETIME2,
    /// Internal to MySql. Not used in protocol
    MYSQL_TYPE_TIME2,
    /// Used for replication only
    MYSQL_TYPE_TYPED_ARRAY,
    MYSQL_TYPE_JSON = 245,
    MYSQL_TYPE_NEWDECIMAL = 246,
    MYSQL_TYPE_ENUM = 247,
    MYSQL_TYPE_SET = 248,
    MYSQL_TYPE_TINY_BLOB = 249,
    MYSQL_TYPE_MEDIUM_BLOB = 250,
    MYSQL_TYPE_LONG_BLOB = 251,
    MYSQL_TYPE_BLOB = 252,
    MYSQL_TYPE_VAR_STRING = 253,
    MYSQL_TYPE_STRING = 254,
    MYSQL_TYPE_GEOMETRY = 255,
}

impl ColumnType {
    /// Returns `true` for types that only exist inside the server.
    ///
    /// Such a type can't be the column type of a `TABLE_MAP_EVENT`. `ENUM` and `SET`
    /// only appear as the real type packed into the metadata of a `MYSQL_TYPE_STRING`
    /// column.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ColumnType::MYSQL_TYPE_NEWDATE
                | ColumnType::MYSQL_TYPE_ENUM
                | ColumnType::MYSQL_TYPE_SET
                | ColumnType::MYSQL_TYPE_TINY_BLOB
                | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
                | ColumnType::MYSQL_TYPE_LONG_BLOB
        )
    }

    /// Returns `true` for types that are stored with a length prefix whose width
    /// is given by the column metadata.
    pub fn is_blob_like(&self) -> bool {
        matches!(
            self,
            ColumnType::MYSQL_TYPE_BLOB
                | ColumnType::MYSQL_TYPE_GEOMETRY
                | ColumnType::MYSQL_TYPE_JSON
        )
    }

    /// Returns `true` for temporal types with fractional seconds precision.
    pub fn is_packed_temporal(&self) -> bool {
        matches!(
            self,
            ColumnType::MYSQL_TYPE_TIME2
                | ColumnType::MYSQL_TYPE_DATETIME2
                | ColumnType::MYSQL_TYPE_TIMESTAMP2
        )
    }
}

/// Unknown column type error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown column type {}", _0)]
#[repr(transparent)]
pub struct UnknownColumnType(pub u8);

impl From<UnknownColumnType> for u8 {
    fn from(x: UnknownColumnType) -> Self {
        x.0
    }
}

impl TryFrom<u8> for ColumnType {
    type Error = UnknownColumnType;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00_u8 => Ok(ColumnType::MYSQL_TYPE_DECIMAL),
            0x01_u8 => Ok(ColumnType::MYSQL_TYPE_TINY),
            0x02_u8 => Ok(ColumnType::MYSQL_TYPE_SHORT),
            0x03_u8 => Ok(ColumnType::MYSQL_TYPE_LONG),
            0x04_u8 => Ok(ColumnType::MYSQL_TYPE_FLOAT),
            0x05_u8 => Ok(ColumnType::MYSQL_TYPE_DOUBLE),
            0x06_u8 => Ok(ColumnType::MYSQL_TYPE_NULL),
            0x07_u8 => Ok(ColumnType::MYSQL_TYPE_TIMESTAMP),
            0x08_u8 => Ok(ColumnType::MYSQL_TYPE_LONGLONG),
            0x09_u8 => Ok(ColumnType::MYSQL_TYPE_INT24),
            0x0a_u8 => Ok(ColumnType::MYSQL_TYPE_DATE),
            0x0b_u8 => Ok(ColumnType::MYSQL_TYPE_TIME),
            0x0c_u8 => Ok(ColumnType::MYSQL_TYPE_DATETIME),
            0x0d_u8 => Ok(ColumnType::MYSQL_TYPE_YEAR),
            0x0e_u8 => Ok(ColumnType::MYSQL_TYPE_NEWDATE),
            0x0f_u8 => Ok(ColumnType::MYSQL_TYPE_VARCHAR),
            0x10_u8 => Ok(ColumnType::MYSQL_TYPE_BIT),
            0x11_u8 => Ok(ColumnType::MYSQL_TYPE_TIMESTAMP2),
            0x12_u8 => Ok(ColumnType::MYSQL_TYPE_DATETIME2),
            0x13_u8 => Ok(ColumnType::MYSQL_TYPE_TIME2),
            0x14_u8 => Ok(ColumnType::MYSQL_TYPE_TYPED_ARRAY),
            0xf5_u8 => Ok(ColumnType::MYSQL_TYPE_JSON),
            0xf6_u8 => Ok(ColumnType::MYSQL_TYPE_NEWDECIMAL),
            0xf7_u8 => Ok(ColumnType::MYSQL_TYPE_ENUM),
            0xf8_u8 => Ok(ColumnType::MYSQL_TYPE_SET),
            0xf9_u8 => Ok(ColumnType::MYSQL_TYPE_TINY_BLOB),
            0xfa_u8 => Ok(ColumnType::MYSQL_TYPE_MEDIUM_BLOB),
            0xfb_u8 => Ok(ColumnType::MYSQL_TYPE_LONG_BLOB),
            0xfc_u8 => Ok(ColumnType::MYSQL_TYPE_BLOB),
            0xfd_u8 => Ok(ColumnType::MYSQL_TYPE_VAR_STRING),
            0xfe_u8 => Ok(ColumnType::MYSQL_TYPE_STRING),
            0xff_u8 => Ok(ColumnType::MYSQL_TYPE_GEOMETRY),
            x => Err(UnknownColumnType(x)),
        }
    }
}

impl From<ColumnType> for u8 {
    fn from(val: ColumnType) -> u8 {
        val as u8
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::*;

    #[test]
    fn should_convert_known_column_types() {
        for byte in (0x00_u8..=0x14).chain(0xf5..=0xff) {
            let ty = ColumnType::try_from(byte).unwrap();
            assert_eq!(u8::from(ty), byte);
        }
    }

    #[test]
    fn should_reject_unknown_column_types() {
        for byte in 0x15_u8..0xf5 {
            assert_eq!(ColumnType::try_from(byte), Err(UnknownColumnType(byte)));
        }
    }

    #[test]
    fn internal_types() {
        assert!(ColumnType::MYSQL_TYPE_ENUM.is_internal());
        assert!(ColumnType::MYSQL_TYPE_LONG_BLOB.is_internal());
        assert!(!ColumnType::MYSQL_TYPE_BLOB.is_internal());
        assert!(!ColumnType::MYSQL_TYPE_STRING.is_internal());
    }

    #[test]
    fn type_families() {
        assert!(ColumnType::MYSQL_TYPE_JSON.is_blob_like());
        assert!(ColumnType::MYSQL_TYPE_GEOMETRY.is_blob_like());
        assert!(!ColumnType::MYSQL_TYPE_LONG_BLOB.is_blob_like());
        assert!(ColumnType::MYSQL_TYPE_TIME2.is_packed_temporal());
        assert!(!ColumnType::MYSQL_TYPE_TIME.is_packed_temporal());
    }
}
