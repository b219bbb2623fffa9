// SPDX-License-Identifier: MIT

//! Extract field values from and insert field values into HID Reports.
//!
//! Bits are counted little-bit-first within each byte and
//! little-byte-first across bytes, i.e. bit `n` of a report is bit
//! `n % 8` of byte `n / 8`. A report buffer must not include the Report
//! ID byte, strip it before calling into the codec.

use thiserror::Error;

use crate::report::Field;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("Field needs {needed_bits} bits but the report has {available_bits}")]
    OutOfBounds {
        needed_bits: usize,
        available_bits: usize,
    },
}

fn check_bounds(field: &Field, buffer: &[u8]) -> Result<(), CodecError> {
    let needed_bits = field.bits().end;
    let available_bits = buffer.len() * 8;
    if needed_bits > available_bits {
        return Err(CodecError::OutOfBounds {
            needed_bits,
            available_bits,
        });
    }
    Ok(())
}

/// Splits `bits` into per-byte pieces: `(byte index, bit shift within
/// that byte, number of bits, bit position within the value)`.
fn chunks(bits: std::ops::Range<usize>) -> impl Iterator<Item = (usize, usize, usize, usize)> {
    let start = bits.start;
    let end = bits.end;
    let mut bit = start;
    std::iter::from_fn(move || {
        if bit >= end {
            return None;
        }
        let shift = bit % 8;
        let nbits = (8 - shift).min(end - bit);
        let chunk = (bit / 8, shift, nbits, bit - start);
        bit += nbits;
        Some(chunk)
    })
}

fn low_bits(nbits: usize) -> u64 {
    match nbits {
        0 => 0,
        64.. => u64::MAX,
        n => (1u64 << n) - 1,
    }
}

/// Read the value of `field` from `report`. Fields with a negative
/// logical minimum are sign-extended from their top bit.
pub fn decode(field: &Field, report: &[u8]) -> Result<i64, CodecError> {
    check_bounds(field, report)?;

    let size = field.report_size();
    let value = chunks(field.bits()).fold(0u64, |acc, (idx, shift, nbits, pos)| {
        let piece = u64::from(report[idx] >> shift) & low_bits(nbits);
        acc | (piece << pos)
    });

    if field.is_signed() && size > 0 {
        let unused = 64 - size as u32;
        Ok(((value << unused) as i64) >> unused)
    } else {
        Ok(value as i64)
    }
}

/// Write the low `report_size` bits of `value` into the bits of `report`
/// occupied by `field`. All other bits of `report` are left untouched.
pub fn encode(field: &Field, value: i64, report: &mut [u8]) -> Result<(), CodecError> {
    check_bounds(field, report)?;

    let value = value as u64;
    for (idx, shift, nbits, pos) in chunks(field.bits()) {
        let mask = (low_bits(nbits) as u8) << shift;
        let piece = (((value >> pos) & low_bits(nbits)) as u8) << shift;
        report[idx] = (report[idx] & !mask) | piece;
    }
    Ok(())
}

impl Field {
    /// Extract this field's value from a report, see [decode].
    pub fn extract(&self, report: &[u8]) -> Result<i64, CodecError> {
        decode(self, report)
    }

    /// Insert a value into a report, see [encode].
    pub fn insert(&self, value: i64, report: &mut [u8]) -> Result<(), CodecError> {
        encode(self, value, report)
    }
}
