// SPDX-License-Identifier: MIT

//! Build a HID Report Descriptor programmatically.
//!
//! ```
//! # use hidparser::*;
//! let bytes: Vec<u8> = ReportDescriptorBuilder::new()
//!     .usage_page(0x01)
//!     .usage(0x02)
//!     .open_collection(CollectionKind::Application)
//!     .push()
//!     .logical_minimum(-127)
//!     .logical_maximum(127)
//!     .report_count(2)
//!     .report_size(8)
//!     .usage(0x30)
//!     .usage(0x31)
//!     .input(MainFlags::VARIABLE | MainFlags::RELATIVE)
//!     .pop()
//!     .close_collection()
//!     .build();
//!
//! let rdesc = ReportDescriptor::try_from(&bytes).unwrap();
//! assert_eq!(rdesc.fields().count(), 2);
//! ```
//!
//! Each item is encoded with the smallest payload that holds its value.
//! The builder does **not** validate the items, that is left to the
//! parser.

use crate::collection::CollectionKind;
use crate::hid::{encode_short_item, GlobalTag, HidBytes, ItemKind, LocalTag, MainTag};
use crate::report::MainFlags;

#[derive(Debug, Default, Clone)]
pub struct ReportDescriptorBuilder {
    bytes: Vec<u8>,
}

impl ReportDescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(mut self, kind: ItemKind, data: HidBytes) -> Self {
        self.bytes.extend(encode_short_item(kind, data));
        self
    }

    fn global(self, tag: GlobalTag, data: HidBytes) -> Self {
        self.append(ItemKind::Global(tag), data)
    }

    fn local(self, tag: LocalTag, data: HidBytes) -> Self {
        self.append(ItemKind::Local(tag), data)
    }

    fn main(self, tag: MainTag, data: HidBytes) -> Self {
        self.append(ItemKind::Main(tag), data)
    }

    pub fn usage_page(self, usage_page: u16) -> Self {
        self.global(GlobalTag::UsagePage, u32::from(usage_page).into())
    }

    /// A usage id on the current usage page.
    pub fn usage(self, usage_id: u16) -> Self {
        self.local(LocalTag::Usage, u32::from(usage_id).into())
    }

    /// A usage with its own usage page in the upper 16 bits. This is
    /// always encoded with a 4-byte payload.
    pub fn extended_usage(self, usage: u32) -> Self {
        self.local(LocalTag::Usage, HidBytes::extended(usage))
    }

    pub fn usage_minimum(self, usage_id: u16) -> Self {
        self.local(LocalTag::UsageMinimum, u32::from(usage_id).into())
    }

    pub fn usage_maximum(self, usage_id: u16) -> Self {
        self.local(LocalTag::UsageMaximum, u32::from(usage_id).into())
    }

    pub fn logical_minimum(self, minimum: i32) -> Self {
        self.global(GlobalTag::LogicalMinimum, minimum.into())
    }

    pub fn logical_maximum(self, maximum: i32) -> Self {
        self.global(GlobalTag::LogicalMaximum, maximum.into())
    }

    pub fn physical_minimum(self, minimum: i32) -> Self {
        self.global(GlobalTag::PhysicalMinimum, minimum.into())
    }

    pub fn physical_maximum(self, maximum: i32) -> Self {
        self.global(GlobalTag::PhysicalMaximum, maximum.into())
    }

    pub fn unit_exponent(self, exponent: i32) -> Self {
        self.global(GlobalTag::UnitExponent, exponent.into())
    }

    pub fn unit(self, unit: u32) -> Self {
        self.global(GlobalTag::Unit, unit.into())
    }

    pub fn report_size(self, bits: u32) -> Self {
        self.global(GlobalTag::ReportSize, bits.into())
    }

    pub fn report_count(self, count: u32) -> Self {
        self.global(GlobalTag::ReportCount, count.into())
    }

    pub fn report_id(self, id: u32) -> Self {
        self.global(GlobalTag::ReportId, id.into())
    }

    /// Saves the current global items, use [pop()](Self::pop) to restore them.
    pub fn push(self) -> Self {
        self.global(GlobalTag::Push, HidBytes::default())
    }

    pub fn pop(self) -> Self {
        self.global(GlobalTag::Pop, HidBytes::default())
    }

    pub fn open_collection(self, kind: CollectionKind) -> Self {
        self.main(MainTag::Collection, u32::from(u8::from(kind)).into())
    }

    pub fn close_collection(self) -> Self {
        self.main(MainTag::EndCollection, HidBytes::default())
    }

    pub fn input(self, flags: MainFlags) -> Self {
        self.main(MainTag::Input, flags.0.into())
    }

    pub fn output(self, flags: MainFlags) -> Self {
        self.main(MainTag::Output, flags.0.into())
    }

    pub fn feature(self, flags: MainFlags) -> Self {
        self.main(MainTag::Feature, flags.0.into())
    }

    /// Opens a set of alternative usages. Only the usages of the first
    /// set are used by the parser.
    pub fn open_delimiter(self) -> Self {
        self.local(LocalTag::Delimiter, 1u32.into())
    }

    pub fn close_delimiter(self) -> Self {
        self.local(LocalTag::Delimiter, 0u32.into())
    }

    /// The report descriptor bytes for all items added so far.
    pub fn build(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_report_descriptor;
    use crate::report::ReportType;
    use crate::types::*;
    use hut::{AsUsage, AsUsagePage};

    #[test]
    fn item_encoding() {
        let bytes = ReportDescriptorBuilder::new()
            .usage_page(0x01)
            .usage_page(0xff00)
            .usage(0x30)
            .extended_usage(0x000c_00e9)
            .logical_minimum(-1)
            .logical_maximum(255)
            .physical_maximum(-32768)
            .unit(0x0001_0011)
            .report_id(2)
            .push()
            .pop()
            .open_collection(CollectionKind::Logical)
            .close_collection()
            .input(MainFlags::DATA)
            .open_delimiter()
            .close_delimiter()
            .build();

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x05, 0x01,
            0x06, 0x00, 0xff,
            0x09, 0x30,
            0x0b, 0xe9, 0x00, 0x0c, 0x00,
            0x15, 0xff,
            0x26, 0xff, 0x00,
            0x46, 0x00, 0x80,
            0x67, 0x11, 0x00, 0x01, 0x00,
            0x85, 0x02,
            0xa4,
            0xb4,
            0xa1, 0x02,
            0xc0,
            0x81, 0x00,
            0x99, 0x01,
            0x99, 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn build_and_parse() {
        let bytes = ReportDescriptorBuilder::new()
            .usage_page(hut::UsagePage::GenericDesktop.usage_page_value())
            .usage(hut::GenericDesktop::Gamepad.usage_id_value())
            .open_collection(CollectionKind::Application)
            .report_id(1)
            .usage_page(hut::UsagePage::Button.usage_page_value())
            .usage_minimum(1)
            .usage_maximum(8)
            .logical_minimum(0)
            .logical_maximum(1)
            .report_size(1)
            .report_count(8)
            .input(MainFlags::VARIABLE)
            .usage_page(hut::UsagePage::GenericDesktop.usage_page_value())
            .open_collection(CollectionKind::Physical)
            .usage(hut::GenericDesktop::X.usage_id_value())
            .usage(hut::GenericDesktop::Y.usage_id_value())
            .logical_minimum(-32768)
            .logical_maximum(32767)
            .report_size(16)
            .report_count(2)
            .input(MainFlags::VARIABLE)
            .close_collection()
            .usage_page(0xff00)
            .usage(0x01)
            .report_size(8)
            .report_count(4)
            .feature(MainFlags::VARIABLE | MainFlags::VOLATILE)
            .close_collection()
            .build();

        let rdesc = parse_report_descriptor(&bytes).unwrap();
        let input = rdesc
            .find_report(ReportType::Input, Some(ReportId(1)))
            .unwrap();
        assert_eq!(input.size(), 40);
        assert_eq!(input.size_in_bytes(), 6);
        // Game Pad is still pending ahead of the buttons
        assert_eq!(input.fields()[0].usage(), Usage(0x0001_0005));
        assert_eq!(input.fields()[7].usage(), Usage(0x0009_0007));
        assert_eq!(
            input.fields()[8].usage(),
            Usage::from(hut::GenericDesktop::X.usage_value())
        );
        assert!(input.fields()[9].is_signed());
        assert!(input.fields()[9].physical().is_some());
        assert!(input.fields()[7].physical().is_none());

        let feature = rdesc
            .find_report(ReportType::Feature, Some(ReportId(1)))
            .unwrap();
        assert_eq!(feature.fields().len(), 4);
        assert!(feature.fields()[0].flags().is_volatile());
        assert_eq!(feature.fields()[3].usage(), Usage(0xff00_0001));
    }
}
