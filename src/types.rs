// SPDX-License-Identifier: MIT

//! Standalone HID value types that exist for type safety only.
//! Most of these are thin wrappers around their underlying integer type.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).

/// Creates a `From<Foo> for u32` and `From<u32> for Foo` implementation for the given `Foo` type.
/// Use like this: `impl_from(Foo, Foo, u32)`.
macro_rules! impl_from {
    ($tipo:ty, $tipo_expr:expr, $to:ty) => {
        impl From<$tipo> for $to {
            fn from(f: $tipo) -> $to {
                f.0
            }
        }
        impl From<&$tipo> for $to {
            fn from(f: &$tipo) -> $to {
                f.0
            }
        }
        impl From<$to> for $tipo {
            fn from(f: $to) -> Self {
                $tipo_expr(f)
            }
        }
    };
}

/// Creates a `impl Display for Foo` that just prints the underlying number.
macro_rules! impl_fmt {
    ($tipo:ty, $to:ty) => {
        impl std::fmt::Display for $tipo {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let v: $to = self.into();
                write!(f, "{v}")
            }
        }
    };
}

// ---------- GLOBAL ITEMS ---------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UsagePage(pub u16);

impl_from!(UsagePage, UsagePage, u16);
impl_fmt!(UsagePage, u16);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalMinimum(pub i32);

impl_from!(LogicalMinimum, LogicalMinimum, i32);
impl_fmt!(LogicalMinimum, i32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalMaximum(pub i32);

impl_from!(LogicalMaximum, LogicalMaximum, i32);
impl_fmt!(LogicalMaximum, i32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicalMinimum(pub i32);

impl_from!(PhysicalMinimum, PhysicalMinimum, i32);
impl_fmt!(PhysicalMinimum, i32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicalMaximum(pub i32);

impl_from!(PhysicalMaximum, PhysicalMaximum, i32);
impl_fmt!(PhysicalMaximum, i32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unit(pub u32);

impl_from!(Unit, Unit, u32);
impl_fmt!(Unit, u32);

/// The Unit Exponent is stored sign-extended, see Section 6.2.2.7.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitExponent(pub i32);

impl_from!(UnitExponent, UnitExponent, i32);
impl_fmt!(UnitExponent, i32);

/// Size of a single field in bits, at most [crate::MAX_REPORT_SIZE].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSize(pub usize);

impl_from!(ReportSize, ReportSize, usize);
impl_fmt!(ReportSize, usize);

/// A Report ID is never zero. Reports without an ID use `Option<ReportId>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportId(pub u32);

impl_from!(ReportId, ReportId, u32);
impl_fmt!(ReportId, u32);

/// Number of fields created per Main data item, at most [crate::MAX_REPORT_COUNT].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportCount(pub usize);

impl_from!(ReportCount, ReportCount, usize);
impl_fmt!(ReportCount, usize);

// ----------------- LOCAL ITEMS --------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UsageId(pub u16);

impl_from!(UsageId, UsageId, u16);
impl_fmt!(UsageId, u16);

/// A 32-bit packed HID Usage: the Usage Page in the upper
/// 16 bits, the Usage ID in the lower 16 bits (Section 6.2.2.8).
///
/// ```
/// # use hidparser::types::*;
/// let usage = Usage::from(0x0001_0030u32);
/// assert_eq!(usage.usage_page(), UsagePage(0x01));
/// assert_eq!(usage.usage_id(), UsageId(0x30));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Usage(pub u32);

impl_from!(Usage, Usage, u32);

impl Usage {
    pub fn new(usage_page: UsagePage, usage_id: UsageId) -> Self {
        Usage((u32::from(usage_page.0) << 16) | u32::from(usage_id.0))
    }

    pub fn usage_page(&self) -> UsagePage {
        UsagePage((self.0 >> 16) as u16)
    }

    pub fn usage_id(&self) -> UsageId {
        UsageId((self.0 & 0xFFFF) as u16)
    }

    /// The name of this usage as listed in the HID Usage Tables, if known.
    #[cfg(feature = "hut")]
    pub fn name(&self) -> Option<String> {
        let page = u16::from(self.usage_page());
        let id = u16::from(self.usage_id());
        hut::Usage::new_from_page_and_id(page, id)
            .ok()
            .map(|u| u.name())
    }
}

impl From<(UsagePage, UsageId)> for Usage {
    fn from((page, id): (UsagePage, UsageId)) -> Usage {
        Usage::new(page, id)
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}/{:04x}", self.usage_page().0, self.usage_id().0)?;
        #[cfg(feature = "hut")]
        if let Some(name) = self.name() {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}
