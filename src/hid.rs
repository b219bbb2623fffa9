// SPDX-License-Identifier: MIT

//! The HID Core items. This module splits a report descriptor byte stream
//! into its individual [Item]s. Interpretation of the items is left to the
//! [parser](crate::parser).
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! # Itemizing HID Report Descriptors
//!
//! ```
//! # use hidparser::hid::*;
//! let bytes = [0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0xc0];
//! for item in ItemReader::new(&bytes) {
//!     let item = item.unwrap();
//!     println!("Item at offset {:02x}: {:?}", item.offset(), item.kind());
//! }
//! ```

use crate::ParserError;

/// The header byte marking a long item, see Section 6.2.2.3.
pub const LONG_ITEM_PREFIX: u8 = 0xFE;

type Result<T> = std::result::Result<T, ParserError>;

/// Main item tags, see Section 6.2.2.4. Tags 0 to 7 are reserved
/// and never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainTag {
    Input,
    Output,
    Collection,
    Feature,
    EndCollection,
}

impl MainTag {
    fn from_tag(tag: u8) -> Option<MainTag> {
        match tag {
            8 => Some(MainTag::Input),
            9 => Some(MainTag::Output),
            10 => Some(MainTag::Collection),
            11 => Some(MainTag::Feature),
            12 => Some(MainTag::EndCollection),
            _ => None,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            MainTag::Input => 8,
            MainTag::Output => 9,
            MainTag::Collection => 10,
            MainTag::Feature => 11,
            MainTag::EndCollection => 12,
        }
    }
}

/// Global item tags, see Section 6.2.2.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalTag {
    UsagePage,
    LogicalMinimum,
    LogicalMaximum,
    PhysicalMinimum,
    PhysicalMaximum,
    UnitExponent,
    Unit,
    ReportSize,
    ReportId,
    ReportCount,
    Push,
    Pop,
}

impl GlobalTag {
    fn from_tag(tag: u8) -> Option<GlobalTag> {
        match tag {
            0 => Some(GlobalTag::UsagePage),
            1 => Some(GlobalTag::LogicalMinimum),
            2 => Some(GlobalTag::LogicalMaximum),
            3 => Some(GlobalTag::PhysicalMinimum),
            4 => Some(GlobalTag::PhysicalMaximum),
            5 => Some(GlobalTag::UnitExponent),
            6 => Some(GlobalTag::Unit),
            7 => Some(GlobalTag::ReportSize),
            8 => Some(GlobalTag::ReportId),
            9 => Some(GlobalTag::ReportCount),
            10 => Some(GlobalTag::Push),
            11 => Some(GlobalTag::Pop),
            _ => None,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            GlobalTag::UsagePage => 0,
            GlobalTag::LogicalMinimum => 1,
            GlobalTag::LogicalMaximum => 2,
            GlobalTag::PhysicalMinimum => 3,
            GlobalTag::PhysicalMaximum => 4,
            GlobalTag::UnitExponent => 5,
            GlobalTag::Unit => 6,
            GlobalTag::ReportSize => 7,
            GlobalTag::ReportId => 8,
            GlobalTag::ReportCount => 9,
            GlobalTag::Push => 10,
            GlobalTag::Pop => 11,
        }
    }
}

/// Local item tags 0 to 9, see Section 6.2.2.8. Tags 10 and above are
/// reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTag {
    Usage,
    UsageMinimum,
    UsageMaximum,
    DesignatorIndex,
    DesignatorMinimum,
    DesignatorMaximum,
    StringIndex,
    StringMinimum,
    StringMaximum,
    Delimiter,
}

impl LocalTag {
    fn from_tag(tag: u8) -> Option<LocalTag> {
        match tag {
            0 => Some(LocalTag::Usage),
            1 => Some(LocalTag::UsageMinimum),
            2 => Some(LocalTag::UsageMaximum),
            3 => Some(LocalTag::DesignatorIndex),
            4 => Some(LocalTag::DesignatorMinimum),
            5 => Some(LocalTag::DesignatorMaximum),
            6 => Some(LocalTag::StringIndex),
            7 => Some(LocalTag::StringMinimum),
            8 => Some(LocalTag::StringMaximum),
            9 => Some(LocalTag::Delimiter),
            _ => None,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            LocalTag::Usage => 0,
            LocalTag::UsageMinimum => 1,
            LocalTag::UsageMaximum => 2,
            LocalTag::DesignatorIndex => 3,
            LocalTag::DesignatorMinimum => 4,
            LocalTag::DesignatorMaximum => 5,
            LocalTag::StringIndex => 6,
            LocalTag::StringMinimum => 7,
            LocalTag::StringMaximum => 8,
            LocalTag::Delimiter => 9,
        }
    }
}

/// The kind of a HID item together with its validated tag.
///
/// [ItemKind::Long] items are recognized so they can be skipped over
/// but no long item tags are defined by the HID specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Main(MainTag),
    Global(GlobalTag),
    Local(LocalTag),
    Long { tag: u8 },
}

impl ItemKind {
    /// The 2-bit type code as found in bits 2 and 3 of a short item header.
    fn type_code(&self) -> u8 {
        match self {
            ItemKind::Main(_) => 0,
            ItemKind::Global(_) => 1,
            ItemKind::Local(_) => 2,
            ItemKind::Long { .. } => 3,
        }
    }

    fn tag(&self) -> u8 {
        match self {
            ItemKind::Main(t) => t.tag(),
            ItemKind::Global(t) => t.tag(),
            ItemKind::Local(t) => t.tag(),
            ItemKind::Long { tag } => *tag,
        }
    }
}

/// Decodes `bytes` (at most 4, little endian) into the unsigned value
/// and the value sign-extended from the payload's top bit.
fn hid_value(bytes: &[u8]) -> (u32, i32) {
    let unsigned = bytes
        .iter()
        .rev()
        .fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
    let signed = match bytes.len() {
        1 => (unsigned as u8) as i8 as i32,
        2 => (unsigned as u16) as i16 as i32,
        _ => unsigned as i32,
    };
    (unsigned, signed)
}

/// A single decoded item of a report descriptor, see Section 6.2.2.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    offset: usize,
    header: u8,
    size: usize,
    kind: ItemKind,
    unsigned_value: u32,
    signed_value: i32,
}

impl Item {
    /// The offset of this item's header byte in the report descriptor.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn header(&self) -> u8 {
        self.header
    }

    /// The payload size in bytes: 0, 1, 2 or 4 for short items, the
    /// declared data size for long items.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// The payload as unsigned little endian value. Always 0 for long items.
    pub fn unsigned_value(&self) -> u32 {
        self.unsigned_value
    }

    /// The payload sign-extended from its most significant bit.
    pub fn signed_value(&self) -> i32 {
        self.signed_value
    }
}

/// A lazy iterator over the [Item]s of a report descriptor. The iterator
/// yields at most one error and stops afterwards.
#[derive(Debug, Clone)]
pub struct ItemReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> ItemReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ItemReader {
            bytes,
            offset: 0,
            failed: false,
        }
    }

    /// The offset of the next item to be read.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, len: usize, item_offset: usize) -> Result<&'a [u8]> {
        let end = self.offset.checked_add(len);
        let bytes = match end {
            Some(end) if end <= self.bytes.len() => &self.bytes[self.offset..end],
            _ => {
                return Err(ParserError::TruncatedStream {
                    offset: item_offset,
                })
            }
        };
        self.offset += len;
        Ok(bytes)
    }

    fn read_long_item(&mut self, offset: usize) -> Result<Item> {
        let size = self.take(1, offset)?[0] as usize;
        let tag = self.take(1, offset)?[0];
        self.take(size, offset)?;
        Ok(Item {
            offset,
            header: LONG_ITEM_PREFIX,
            size,
            kind: ItemKind::Long { tag },
            unsigned_value: 0,
            signed_value: 0,
        })
    }

    fn read_item(&mut self) -> Result<Item> {
        let offset = self.offset;
        let header = self.take(1, offset)?[0];
        if header == LONG_ITEM_PREFIX {
            return self.read_long_item(offset);
        }

        let size = match header & 0b11 {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };
        let type_code = (header >> 2) & 0b11;
        let tag = header >> 4;
        let payload = self.take(size, offset)?;
        let (unsigned_value, signed_value) = hid_value(payload);

        let kind = match type_code {
            0 => MainTag::from_tag(tag).map(ItemKind::Main),
            1 => GlobalTag::from_tag(tag).map(ItemKind::Global),
            2 => LocalTag::from_tag(tag).map(ItemKind::Local),
            _ => None,
        };
        let kind = kind.ok_or(ParserError::IllegalTag {
            offset,
            kind: type_code,
            tag,
        })?;

        let item = Item {
            offset,
            header,
            size,
            kind,
            unsigned_value,
            signed_value,
        };
        tracing::trace!(
            "[{offset:3}] = {header:#04x}: size {size} {kind:?} value {unsigned_value:#010x} ({signed_value})"
        );
        Ok(item)
    }
}

impl Iterator for ItemReader<'_> {
    type Item = Result<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }
        let item = self.read_item();
        self.failed = item.is_err();
        Some(item)
    }
}

/// The data bytes of a short HID item, guaranteed to be of length
/// 0, 1, 2, or 4 bytes and in LE byte order.
///
/// This struct only exists for conversion from numbers to
/// a hid-compatible byte array.
#[derive(Debug, Default)]
pub(crate) struct HidBytes(Vec<u8>);

impl From<u32> for HidBytes {
    fn from(value: u32) -> HidBytes {
        let bytes = value.to_le_bytes();
        let cutoff = match value {
            0..=0xff => 1,
            0x100..=0xffff => 2,
            _ => 4,
        };
        HidBytes(bytes[0..cutoff].to_vec())
    }
}

impl From<i32> for HidBytes {
    fn from(value: i32) -> HidBytes {
        const MIN16: i32 = i16::MIN as i32;
        const MAX16: i32 = i16::MAX as i32;
        let bytes = match value {
            -128..=127 => (value as i8).to_le_bytes().to_vec(),
            MIN16..=MAX16 => (value as i16).to_le_bytes().to_vec(),
            _ => value.to_le_bytes().to_vec(),
        };
        HidBytes(bytes)
    }
}

impl HidBytes {
    /// A full 4-byte payload regardless of the value.
    pub(crate) fn extended(value: u32) -> HidBytes {
        HidBytes(value.to_le_bytes().to_vec())
    }
}

/// Serializes a short item of the given kind with the given payload.
pub(crate) fn encode_short_item(kind: ItemKind, data: HidBytes) -> Vec<u8> {
    let size_code = match data.0.len() {
        0 => 0b00,
        1 => 0b01,
        2 => 0b10,
        _ => 0b11,
    };
    let header = (kind.tag() << 4) | (kind.type_code() << 2) | size_code;
    [vec![header], data.0].concat()
}
