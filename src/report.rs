// SPDX-License-Identifier: MIT

//! Reports and the fields they are composed of.
//!
//! A [Report] is identified by its [ReportType] and its (optional)
//! [ReportId]. Each Input, Output or Feature item appends `Report Count`
//! fields of `Report Size` bits to the report matching the current Report
//! ID, so fields are contiguous and ordered by their bit offset.

use std::ops::Range;

use crate::collection::{CollectionId, CollectionKind, CollectionTree};
use crate::state::{GlobalState, LocalState};
use crate::types::*;
use crate::{ensure, ParserError, MAX_FIELDS_PER_REPORT};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReportType {
    Input,
    Output,
    Feature,
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReportType::Input => "Input",
            ReportType::Output => "Output",
            ReportType::Feature => "Feature",
        };
        write!(f, "{name}")
    }
}

/// Convenience function to extract a single bit as bool from a value
fn bit(bits: u32, bit: u8) -> bool {
    bits & (1 << bit) != 0
}

/// The data of an Input, Output or Feature item, see Section 6.2.2.5.
///
/// The properties come in pairs (bit set or unset in the HID report
/// descriptor item), only the set state has a predicate here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MainFlags(pub u32);

impl MainFlags {
    pub const DATA: MainFlags = MainFlags(0);
    pub const CONSTANT: MainFlags = MainFlags(0x001);
    pub const VARIABLE: MainFlags = MainFlags(0x002);
    pub const RELATIVE: MainFlags = MainFlags(0x004);
    pub const WRAP: MainFlags = MainFlags(0x008);
    pub const NONLINEAR: MainFlags = MainFlags(0x010);
    pub const NO_PREFERRED_STATE: MainFlags = MainFlags(0x020);
    pub const NULL_STATE: MainFlags = MainFlags(0x040);
    pub const VOLATILE: MainFlags = MainFlags(0x080);
    pub const BUFFERED_BYTES: MainFlags = MainFlags(0x100);

    /// True if the data is constant and never changes. This typically means the data
    /// can be ignored.
    pub fn is_constant(&self) -> bool {
        bit(self.0, 0)
    }

    pub fn is_data(&self) -> bool {
        !self.is_constant()
    }

    /// True if the data is a variable field, false for array fields.
    pub fn is_variable(&self) -> bool {
        bit(self.0, 1)
    }

    pub fn is_array(&self) -> bool {
        !self.is_variable()
    }

    /// True if the data is relative compared to a previous report
    pub fn is_relative(&self) -> bool {
        bit(self.0, 2)
    }

    /// True if the data wraps around at the logical
    /// minimum/maximum (e.g. a dial that can spin at 360 degrees).
    pub fn wraps(&self) -> bool {
        bit(self.0, 3)
    }

    /// True if the data was pre-processed on the device
    /// and the logical range is not linear.
    pub fn is_nonlinear(&self) -> bool {
        bit(self.0, 4)
    }

    /// True if the control does not have a preferred state it
    /// returns to when the user stops interacting.
    pub fn has_no_preferred_state(&self) -> bool {
        bit(self.0, 5)
    }

    /// True if the control has a null state where it does not send
    /// meaningful data.
    pub fn has_null_state(&self) -> bool {
        bit(self.0, 6)
    }

    /// Only meaningful for Output and Feature items, reserved for Input items.
    pub fn is_volatile(&self) -> bool {
        bit(self.0, 7)
    }

    /// True if the control emits a fixed size stream of bytes.
    pub fn is_buffered_bytes(&self) -> bool {
        bit(self.0, 8)
    }
}

impl std::ops::BitOr for MainFlags {
    type Output = MainFlags;

    fn bitor(self, rhs: MainFlags) -> MainFlags {
        MainFlags(self.0 | rhs.0)
    }
}

impl std::fmt::Display for MainFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = if self.is_constant() { "Cnst" } else { "Data" };
        let var = if self.is_variable() { "Var" } else { "Arr" };
        let rel = if self.is_relative() { "Rel" } else { "Abs" };
        write!(f, "{data},{var},{rel}")?;
        let extra = [
            (self.wraps(), "Wrap"),
            (self.is_nonlinear(), "NonLin"),
            (self.has_no_preferred_state(), "NoPref"),
            (self.has_null_state(), "Null"),
            (self.is_volatile(), "Vol"),
            (self.is_buffered_bytes(), "Buff"),
        ];
        for (_, name) in extra.iter().filter(|(set, _)| *set) {
            write!(f, ",{name}")?;
        }
        Ok(())
    }
}

/// One bit-range within a [Report]. A Main item with a Report Count of
/// `n` creates `n` fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub(crate) report_type: ReportType,
    pub(crate) report_id: Option<ReportId>,
    pub(crate) report_offset: usize,
    pub(crate) report_size: usize,
    pub(crate) usage: Usage,
    pub(crate) flags: MainFlags,
    pub(crate) logical_minimum: LogicalMinimum,
    pub(crate) logical_maximum: LogicalMaximum,
    pub(crate) physical_minimum: PhysicalMinimum,
    pub(crate) physical_maximum: PhysicalMaximum,
    pub(crate) unit: Unit,
    pub(crate) unit_exponent: UnitExponent,
    pub(crate) physical: Option<CollectionId>,
    pub(crate) logical: Option<CollectionId>,
    pub(crate) application: Option<CollectionId>,
}

impl Field {
    pub fn report_type(&self) -> ReportType {
        self.report_type
    }

    pub fn report_id(&self) -> Option<ReportId> {
        self.report_id
    }

    /// The offset of this field in bits from the start of the report,
    /// excluding the Report ID byte.
    pub fn report_offset(&self) -> usize {
        self.report_offset
    }

    /// The size of this field in bits.
    pub fn report_size(&self) -> usize {
        self.report_size
    }

    /// The bits of the report occupied by this field.
    pub fn bits(&self) -> Range<usize> {
        self.report_offset..self.report_offset + self.report_size
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn usage_page(&self) -> UsagePage {
        self.usage.usage_page()
    }

    pub fn usage_id(&self) -> UsageId {
        self.usage.usage_id()
    }

    pub fn flags(&self) -> MainFlags {
        self.flags
    }

    pub fn logical_minimum(&self) -> LogicalMinimum {
        self.logical_minimum
    }

    pub fn logical_maximum(&self) -> LogicalMaximum {
        self.logical_maximum
    }

    pub fn physical_minimum(&self) -> PhysicalMinimum {
        self.physical_minimum
    }

    pub fn physical_maximum(&self) -> PhysicalMaximum {
        self.physical_maximum
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn unit_exponent(&self) -> UnitExponent {
        self.unit_exponent
    }

    /// Values of this field are two's complement if the logical minimum
    /// is negative.
    pub fn is_signed(&self) -> bool {
        self.logical_minimum.0 < 0
    }

    /// The innermost enclosing Physical collection
    pub fn physical(&self) -> Option<CollectionId> {
        self.physical
    }

    /// The innermost enclosing Logical collection
    pub fn logical(&self) -> Option<CollectionId> {
        self.logical
    }

    /// The innermost enclosing Application collection
    pub fn application(&self) -> Option<CollectionId> {
        self.application
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "  bits {:4}..{:<4} usage {} logical {}..{} ({})",
            self.bits().start,
            self.bits().end,
            self.usage,
            self.logical_minimum,
            self.logical_maximum,
            self.flags
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    report_type: ReportType,
    id: Option<ReportId>,
    size: usize,
    fields: Vec<Field>,
}

impl Report {
    fn new(report_type: ReportType, id: Option<ReportId>) -> Self {
        Report {
            report_type,
            id,
            size: 0,
            fields: Vec::new(),
        }
    }

    pub fn report_type(&self) -> ReportType {
        self.report_type
    }

    /// The report ID, if any
    pub fn report_id(&self) -> Option<ReportId> {
        self.id
    }

    /// The size of this report in bits, excluding the Report ID byte.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The number of bytes of this report on the wire, including the
    /// Report ID byte if the report has one.
    pub fn size_in_bytes(&self) -> usize {
        let id_byte = usize::from(self.id.is_some());
        self.size.div_ceil(8) + id_byte
    }

    /// The fields in this report, ordered by their bit offset.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.id.map(|id| id.0).unwrap_or(0);
        writeln!(
            f,
            "{} report id {id}: {} bits, {} fields",
            self.report_type,
            self.size,
            self.fields.len()
        )?;
        for field in &self.fields {
            writeln!(f, "{field}")?;
        }
        Ok(())
    }
}

/// All reports referenced by a report descriptor in the order they were
/// first referenced.
#[derive(Debug, Default)]
pub(crate) struct ReportRegistry {
    reports: Vec<Report>,
}

impl ReportRegistry {
    fn lookup_or_create(&mut self, report_type: ReportType, id: Option<ReportId>) -> &mut Report {
        let idx = match self
            .reports
            .iter()
            .position(|r| r.report_type == report_type && r.id == id)
        {
            Some(idx) => idx,
            None => {
                tracing::debug!("New {report_type} report with id {id:?}");
                self.reports.push(Report::new(report_type, id));
                self.reports.len() - 1
            }
        };
        &mut self.reports[idx]
    }

    /// Appends one field per Report Count to the report for the current
    /// Report ID. Once the pending usages run out, the last usage is
    /// used for all remaining fields.
    pub fn add_fields(
        &mut self,
        report_type: ReportType,
        flags: MainFlags,
        globals: &GlobalState,
        locals: &LocalState,
        collections: &CollectionTree,
        offset: usize,
    ) -> Result<(), ParserError> {
        let report = self.lookup_or_create(report_type, globals.report_id);
        let usages = locals.usages();
        let physical = collections.nearest(CollectionKind::Physical);
        let logical = collections.nearest(CollectionKind::Logical);
        let application = collections.nearest(CollectionKind::Application);

        for i in 0..globals.report_count.0 {
            ensure!(
                report.fields.len() < MAX_FIELDS_PER_REPORT,
                ParserError::TooManyFields { offset }
            );
            let usage = usages
                .get(i)
                .or_else(|| usages.last())
                .copied()
                .unwrap_or_default();
            let report_offset = report.size;
            report.size += globals.report_size.0;

            report.fields.push(Field {
                report_type,
                report_id: globals.report_id,
                report_offset,
                report_size: globals.report_size.0,
                usage,
                flags,
                logical_minimum: globals.logical_minimum,
                logical_maximum: globals.logical_maximum,
                physical_minimum: globals.physical_minimum,
                physical_maximum: globals.physical_maximum,
                unit: globals.unit,
                unit_exponent: globals.unit_exponent,
                physical,
                logical,
                application,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn into_reports(self) -> Vec<Report> {
        self.reports
    }
}
