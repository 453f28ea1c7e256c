// Copyright (c) 2017 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use bitvec::prelude::*;

/// Returns length of length-encoded-integer representation of `x`.
pub fn lenenc_int_len(x: u64) -> u64 {
    if x < 251 {
        1
    } else if x < 65_536 {
        3
    } else if x < 16_777_216 {
        4
    } else {
        9
    }
}

/// Returns the number of bytes needed for a bitmap of `bits` bits.
pub fn bitmap_len(bits: usize) -> usize {
    (bits + 7) / 8
}

/// Returns bytes of the given bitmap with padding bits set to zero.
pub fn bitmap_bytes(bits: &BitSlice<u8, Lsb0>) -> Vec<u8> {
    let mut bytes = vec![0_u8; bitmap_len(bits.len())];
    bytes.view_bits_mut::<Lsb0>()[..bits.len()].copy_from_bitslice(bits);
    bytes
}
