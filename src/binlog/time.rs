// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Binary layout of temporal types with fractional seconds precision.

use crate::{
    constants::ColumnType,
    error::{DecodeError, Result},
};

use super::metadata::ColumnMeta;

/// Maximum fractional seconds precision.
pub const MAX_FSP: u16 = 6;

/// Width of the integer part of a `MYSQL_TYPE_TIME2` value.
pub const TIME2_INT_LEN: usize = 3;
/// Width of the integer part of a `MYSQL_TYPE_DATETIME2` value.
pub const DATETIME2_INT_LEN: usize = 5;
/// Width of the integer part of a `MYSQL_TYPE_TIMESTAMP2` value.
pub const TIMESTAMP2_INT_LEN: usize = 4;

/// Returns the width of the fractional part for the given precision.
pub fn frac_len(fsp: u16) -> usize {
    ((fsp + 1) / 2) as usize
}

/// Returns the binary length of a `TIME2`, `DATETIME2` or `TIMESTAMP2` value.
///
/// Column metadata of these types is the fractional seconds precision.
pub fn packed_temporal_len(column_type: ColumnType, meta: ColumnMeta) -> Result<usize> {
    let int_len = match column_type {
        ColumnType::MYSQL_TYPE_TIME2 => TIME2_INT_LEN,
        ColumnType::MYSQL_TYPE_DATETIME2 => DATETIME2_INT_LEN,
        ColumnType::MYSQL_TYPE_TIMESTAMP2 => TIMESTAMP2_INT_LEN,
        other => return Err(DecodeError::UnsupportedColumnType(other)),
    };

    if meta.0 > MAX_FSP {
        return Err(DecodeError::unsupported_metadata(column_type, meta.0));
    }

    Ok(int_len + frac_len(meta.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_compute_packed_temporal_len() -> Result<()> {
        let expected_frac = [0, 1, 1, 2, 2, 3, 3];
        for (fsp, frac) in expected_frac.iter().enumerate() {
            let meta = ColumnMeta(fsp as u16);
            assert_eq!(
                packed_temporal_len(ColumnType::MYSQL_TYPE_TIME2, meta)?,
                3 + frac
            );
            assert_eq!(
                packed_temporal_len(ColumnType::MYSQL_TYPE_DATETIME2, meta)?,
                5 + frac
            );
            assert_eq!(
                packed_temporal_len(ColumnType::MYSQL_TYPE_TIMESTAMP2, meta)?,
                4 + frac
            );
        }
        Ok(())
    }

    #[test]
    fn should_reject_invalid_fsp() {
        let err = packed_temporal_len(ColumnType::MYSQL_TYPE_DATETIME2, ColumnMeta(7)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnsupportedMetadata { metadata: 7, .. }
        ));

        let err = packed_temporal_len(ColumnType::MYSQL_TYPE_DATETIME, ColumnMeta(0)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnsupportedColumnType(ColumnType::MYSQL_TYPE_DATETIME)
        ));
    }
}
