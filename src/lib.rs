// SPDX-License-Identifier: MIT

//! A parser for HID Report Descriptors and a codec for the fields of the
//! HID Reports they describe.
//!
//! A HID device presents a Report Descriptor to its host: a binary blob
//! describing the collections, reports and bit-level fields of the data
//! the device sends and accepts. This crate turns that blob into a
//! [ReportDescriptor] and extracts (or inserts) individual field values
//! from (or into) raw report buffers.
//!
//! ```
//! use hidparser::*;
//!
//! #[rustfmt::skip]
//! let bytes = [
//!     0xa1, 0x01,        // Collection (Application)
//!     0x05, 0x01,        //   Usage Page (Generic Desktop)
//!     0x09, 0x05,        //   Usage (Game Pad)
//!     0x15, 0x00,        //   Logical Minimum (0)
//!     0x25, 0x01,        //   Logical Maximum (1)
//!     0x75, 0x01,        //   Report Size (1)
//!     0x95, 0x01,        //   Report Count (1)
//!     0x81, 0x02,        //   Input (Data,Var,Abs)
//!     0xc0,              // End Collection
//! ];
//! let rdesc = ReportDescriptor::try_from(bytes.as_slice()).unwrap();
//! let report = rdesc.input_reports().next().unwrap();
//! let field = report.fields().first().unwrap();
//! assert_eq!(field.usage(), Usage(0x0001_0005));
//! assert_eq!(field.extract(&[0b1]).unwrap(), 1);
//! ```
//!
//! Parsing is all-or-nothing: any malformed item aborts the parse with a
//! [ParserError] and no partial model is returned.

use thiserror::Error;

/// Returns early with the given error if the condition does not hold.
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
pub(crate) use ensure;

pub mod builder;
pub mod codec;
pub mod collection;
pub mod hid;
pub mod parser;
pub mod report;
pub(crate) mod state;
pub mod types;

pub use builder::ReportDescriptorBuilder;
pub use codec::{decode, encode, CodecError};
pub use collection::{Collection, CollectionId, CollectionKind};
pub use parser::{parse_report_descriptor, Parser, ParserState};
pub use report::{Field, MainFlags, Report, ReportType};
pub use types::*;

/// The maximum number of fields in a single report.
pub const MAX_FIELDS_PER_REPORT: usize = 256;
/// The maximum number of usages pending for a single Main item.
pub const MAX_USAGES: usize = 12288;
/// The maximum Report Size in bits.
pub const MAX_REPORT_SIZE: usize = 32;
/// The maximum Report Count.
pub const MAX_REPORT_COUNT: usize = 12288;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("Unexpected end of data in item at offset {offset}")]
    TruncatedStream { offset: usize },
    #[error("Illegal tag {tag} for item type {kind} at offset {offset}")]
    IllegalTag { offset: usize, kind: u8, tag: u8 },
    #[error("Unsupported long item at offset {offset}")]
    UnsupportedLongItem { offset: usize },
    #[error("Global item stack underflow at offset {offset}")]
    StackUnderflow { offset: usize },
    #[error("Invalid report size {size} at offset {offset}")]
    InvalidReportSize { offset: usize, size: u32 },
    #[error("Invalid report count {count} at offset {offset}")]
    InvalidReportCount { offset: usize, count: u32 },
    #[error("Invalid report id {id} at offset {offset}")]
    InvalidReportId { offset: usize, id: u32 },
    #[error("Local item without data at offset {offset}")]
    MissingLocalData { offset: usize },
    #[error("Nested delimiter at offset {offset}")]
    NestedDelimiter { offset: usize },
    #[error("Delimiter closed without being opened at offset {offset}")]
    UnmatchedDelimiter { offset: usize },
    #[error("Too many usages at offset {offset}")]
    UsageOverflow { offset: usize },
    #[error("End Collection without open collection at offset {offset}")]
    CollectionUnderflow { offset: usize },
    #[error("Too many fields in report at offset {offset}")]
    TooManyFields { offset: usize },
    #[error("Unbalanced collection at end of report descriptor")]
    UnbalancedCollection,
    #[error("Unbalanced delimiter at end of report descriptor")]
    UnbalancedDelimiter,
}

type Result<T> = std::result::Result<T, ParserError>;

/// A fully parsed and validated HID Report Descriptor: the collection
/// tree and the set of reports with their fields.
///
/// The collections are stored in an arena in creation order. The root
/// collection is always at [CollectionId::ROOT] and is not described by
/// any item in the report descriptor.
#[derive(Debug, Clone)]
pub struct ReportDescriptor {
    collections: Vec<Collection>,
    reports: Vec<Report>,
}

impl ReportDescriptor {
    pub(crate) fn new(collections: Vec<Collection>, reports: Vec<Report>) -> Self {
        ReportDescriptor {
            collections,
            reports,
        }
    }

    /// All reports in the order they were first referenced by the
    /// report descriptor.
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn input_reports(&self) -> impl Iterator<Item = &Report> {
        self.reports_of_type(ReportType::Input)
    }

    pub fn output_reports(&self) -> impl Iterator<Item = &Report> {
        self.reports_of_type(ReportType::Output)
    }

    pub fn feature_reports(&self) -> impl Iterator<Item = &Report> {
        self.reports_of_type(ReportType::Feature)
    }

    fn reports_of_type(&self, report_type: ReportType) -> impl Iterator<Item = &Report> {
        self.reports
            .iter()
            .filter(move |r| r.report_type() == report_type)
    }

    /// Look up the report with the given type and id. Reports without a
    /// Report ID are found with `None`.
    pub fn find_report(&self, report_type: ReportType, id: Option<ReportId>) -> Option<&Report> {
        self.reports
            .iter()
            .find(|r| r.report_type() == report_type && r.report_id() == id)
    }

    /// Every field of every report, reports in the order of [Self::reports].
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.reports.iter().flat_map(|r| r.fields().iter())
    }

    pub fn root(&self) -> &Collection {
        &self.collections[CollectionId::ROOT.index()]
    }

    /// All collections including the root, in creation order. A
    /// collection's position in this slice is its [CollectionId].
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn collection(&self, id: CollectionId) -> Option<&Collection> {
        self.collections.get(id.index())
    }

    /// The direct children of the given collection in creation order.
    pub fn children(&self, id: CollectionId) -> impl Iterator<Item = (CollectionId, &Collection)> {
        self.collections
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.parent() == Some(id))
            .map(|(idx, c)| (CollectionId(idx), c))
    }
}

impl TryFrom<&[u8]> for ReportDescriptor {
    type Error = ParserError;

    fn try_from(bytes: &[u8]) -> Result<ReportDescriptor> {
        parse_report_descriptor(bytes)
    }
}

impl TryFrom<&Vec<u8>> for ReportDescriptor {
    type Error = ParserError;

    fn try_from(bytes: &Vec<u8>) -> Result<ReportDescriptor> {
        parse_report_descriptor(bytes)
    }
}

impl std::fmt::Display for ReportDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for report in &self.reports {
            write!(f, "{report}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const KEYBOARD: [u8; 63] = [
        0x05, 0x01,                    // Usage Page (Generic Desktop)        0
        0x09, 0x06,                    // Usage (Keyboard)                    2
        0xa1, 0x01,                    // Collection (Application)            4
        0x05, 0x07,                    //   Usage Page (Keyboard/Keypad)      6
        0x19, 0xe0,                    //   UsageMinimum (224)                8
        0x29, 0xe7,                    //   UsageMaximum (231)                10
        0x15, 0x00,                    //   Logical Minimum (0)               12
        0x25, 0x01,                    //   Logical Maximum (1)               14
        0x75, 0x01,                    //   Report Size (1)                   16
        0x95, 0x08,                    //   Report Count (8)                  18
        0x81, 0x02,                    //   Input (Data,Var,Abs)              20
        0x95, 0x01,                    //   Report Count (1)                  22
        0x75, 0x08,                    //   Report Size (8)                   24
        0x81, 0x01,                    //   Input (Cnst,Arr,Abs)              26
        0x95, 0x05,                    //   Report Count (5)                  28
        0x75, 0x01,                    //   Report Size (1)                   30
        0x05, 0x08,                    //   Usage Page (LED)                  32
        0x19, 0x01,                    //   UsageMinimum (1)                  34
        0x29, 0x05,                    //   UsageMaximum (5)                  36
        0x91, 0x02,                    //   Output (Data,Var,Abs)             38
        0x95, 0x01,                    //   Report Count (1)                  40
        0x75, 0x03,                    //   Report Size (3)                   42
        0x91, 0x01,                    //   Output (Cnst,Arr,Abs)             44
        0x95, 0x06,                    //   Report Count (6)                  46
        0x75, 0x08,                    //   Report Size (8)                   48
        0x15, 0x00,                    //   Logical Minimum (0)               50
        0x25, 0x65,                    //   Logical Maximum (101)             52
        0x05, 0x07,                    //   Usage Page (Keyboard/Keypad)      54
        0x19, 0x00,                    //   UsageMinimum (0)                  56
        0x29, 0x65,                    //   UsageMaximum (101)                58
        0x81, 0x00,                    //   Input (Data,Arr,Abs)              60
        0xc0,                          // End Collection                      62
    ];

    #[test]
    fn boot_keyboard() {
        let rdesc = ReportDescriptor::try_from(KEYBOARD.as_slice()).unwrap();
        assert_eq!(rdesc.reports().len(), 2);

        let input = rdesc.find_report(ReportType::Input, None).unwrap();
        assert_eq!(input.size(), 64);
        assert_eq!(input.fields().len(), 8 + 1 + 6);
        assert_eq!(input.size_in_bytes(), 8);

        // Keyboard is still pending from the Application collection
        let modifiers: Vec<Usage> = input.fields()[..8].iter().map(|f| f.usage()).collect();
        let mut expected = vec![Usage(0x0001_0006)];
        expected.extend((0xe0..=0xe6).map(|id| Usage(0x0007_0000 | id)));
        assert_eq!(modifiers, expected);

        // the constant byte has no usage
        let reserved = &input.fields()[8];
        assert!(reserved.flags().is_constant());
        assert_eq!(reserved.usage(), Usage(0));
        assert_eq!(reserved.bits(), 8..16);

        // the key array gets one usage per repetition
        let keys: Vec<Usage> = input.fields()[9..].iter().map(|f| f.usage()).collect();
        let expected: Vec<Usage> = (0..6).map(|id| Usage(0x0007_0000 | id)).collect();
        assert_eq!(keys, expected);
        assert!(input.fields()[9..].iter().all(|f| f.flags().is_array()));

        let output = rdesc.find_report(ReportType::Output, None).unwrap();
        assert_eq!(output.size(), 8);
        assert_eq!(output.fields().len(), 6);
        assert_eq!(output.fields()[4].usage(), Usage(0x0008_0005));
        assert_eq!(output.fields()[5].report_size(), 3);

        let application = rdesc.collection(CollectionId(1)).unwrap();
        assert_eq!(application.kind(), Some(CollectionKind::Application));
        assert_eq!(application.usage(), Usage(0x0001_0006));
        assert!(rdesc
            .fields()
            .all(|f| f.application() == Some(CollectionId(1)) && f.physical().is_none()));
    }

    #[test]
    fn accessors() {
        let rdesc = ReportDescriptor::try_from(&KEYBOARD.to_vec()).unwrap();
        assert_eq!(rdesc.input_reports().count(), 1);
        assert_eq!(rdesc.output_reports().count(), 1);
        assert_eq!(rdesc.feature_reports().count(), 0);
        assert_eq!(rdesc.fields().count(), 21);
        assert!(rdesc.find_report(ReportType::Input, Some(ReportId(1))).is_none());

        assert!(rdesc.root().is_root());
        let children: Vec<CollectionId> =
            rdesc.children(CollectionId::ROOT).map(|(id, _)| id).collect();
        assert_eq!(children, [CollectionId(1)]);
        assert_eq!(rdesc.children(CollectionId(1)).count(), 0);
        assert!(rdesc.collection(CollectionId(2)).is_none());
    }

    #[test]
    fn dump() {
        let rdesc = ReportDescriptor::try_from(KEYBOARD.as_slice()).unwrap();
        let dump = format!("{rdesc}");
        assert!(dump.contains("Input report"));
        assert!(dump.contains("Output report"));
        assert_eq!(dump.lines().count(), 2 + 21);
    }
}
