// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Binary layout of `MYSQL_TYPE_NEWDECIMAL` values.
//!
//! Digits on each side of the decimal point are stored in groups of nine digits
//! (four bytes per group) plus a leftover group of up to eight digits whose width
//! is given by [`DIG_2_BYTES`]. The sign is stored in the most significant bit of
//! the first byte, so it doesn't affect the length.

use crate::{
    constants::ColumnType,
    error::{DecodeError, Result},
};

use super::metadata::ColumnMeta;

/// Number of decimal digits per 4-byte group.
pub const DIG_PER_DEC: usize = 9;

/// Bytes needed to store a leftover group of `n` digits.
pub const DIG_2_BYTES: [usize; DIG_PER_DEC + 1] = [0, 1, 1, 2, 2, 3, 3, 4, 4, 4];

/// Returns the number of bytes needed to store `digits` decimal digits.
fn digits_bin_size(digits: usize) -> usize {
    (digits / DIG_PER_DEC) * 4 + DIG_2_BYTES[digits % DIG_PER_DEC]
}

/// Returns the binary length of a decimal with the given precision and scale.
pub fn decimal_bin_size(precision: u8, scale: u8) -> Result<usize> {
    if scale > precision {
        return Err(DecodeError::unsupported_metadata(
            ColumnType::MYSQL_TYPE_NEWDECIMAL,
            ((precision as u16) << 8) | scale as u16,
        ));
    }
    let integral = (precision - scale) as usize;
    Ok(digits_bin_size(integral) + digits_bin_size(scale as usize))
}

/// Returns the binary length of a decimal column with the given metadata.
pub fn decimal_len(meta: ColumnMeta) -> Result<usize> {
    decimal_bin_size(meta.high_byte(), meta.low_byte())
}
