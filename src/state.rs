// SPDX-License-Identifier: MIT

//! The item state table of Section 6.2.2: the current global items, the
//! stack of saved global items, and the local items pending for the next
//! Main item.

use crate::hid::{GlobalTag, Item, LocalTag};
use crate::types::*;
use crate::{ensure, ParserError, MAX_REPORT_COUNT, MAX_REPORT_SIZE, MAX_USAGES};

type Result<T> = std::result::Result<T, ParserError>;

/// The current global items. Every field created by a Main item takes a
/// snapshot of these values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct GlobalState {
    pub usage_page: UsagePage,
    pub logical_minimum: LogicalMinimum,
    pub logical_maximum: LogicalMaximum,
    pub physical_minimum: PhysicalMinimum,
    pub physical_maximum: PhysicalMaximum,
    pub unit_exponent: UnitExponent,
    pub unit: Unit,
    pub report_id: Option<ReportId>,
    pub report_size: ReportSize,
    pub report_count: ReportCount,
}

/// The live [GlobalState] and the snapshots saved by Push items.
#[derive(Debug, Default)]
pub(crate) struct GlobalStack {
    current: GlobalState,
    saved: Vec<GlobalState>,
}

impl GlobalStack {
    pub fn current(&self) -> &GlobalState {
        &self.current
    }

    pub fn handle(&mut self, tag: GlobalTag, item: &Item) -> Result<()> {
        let offset = item.offset();
        let globals = &mut self.current;
        match tag {
            GlobalTag::Push => {
                let snapshot = *globals;
                self.saved.push(snapshot);
            }
            GlobalTag::Pop => {
                *globals = self
                    .saved
                    .pop()
                    .ok_or(ParserError::StackUnderflow { offset })?;
            }
            GlobalTag::UsagePage => globals.usage_page = UsagePage(item.unsigned_value() as u16),
            GlobalTag::LogicalMinimum => {
                globals.logical_minimum = LogicalMinimum(item.signed_value())
            }
            GlobalTag::LogicalMaximum => {
                globals.logical_maximum = LogicalMaximum(item.signed_value())
            }
            GlobalTag::PhysicalMinimum => {
                globals.physical_minimum = PhysicalMinimum(item.signed_value())
            }
            GlobalTag::PhysicalMaximum => {
                globals.physical_maximum = PhysicalMaximum(item.signed_value())
            }
            GlobalTag::UnitExponent => globals.unit_exponent = UnitExponent(item.signed_value()),
            GlobalTag::Unit => globals.unit = Unit(item.unsigned_value()),
            GlobalTag::ReportSize => {
                let size = item.unsigned_value();
                ensure!(
                    size as usize <= MAX_REPORT_SIZE,
                    ParserError::InvalidReportSize { offset, size }
                );
                globals.report_size = ReportSize(size as usize);
            }
            GlobalTag::ReportCount => {
                let count = item.unsigned_value();
                ensure!(
                    count as usize <= MAX_REPORT_COUNT,
                    ParserError::InvalidReportCount { offset, count }
                );
                globals.report_count = ReportCount(count as usize);
            }
            GlobalTag::ReportId => {
                let id = item.unsigned_value();
                ensure!(id != 0, ParserError::InvalidReportId { offset, id });
                globals.report_id = Some(ReportId(id));
            }
        }
        Ok(())
    }
}

/// The local items pending for the next Main item. Only usages and
/// delimiters affect the parsed model, designator and string items are
/// accepted and dropped.
#[derive(Debug, Default)]
pub(crate) struct LocalState {
    usages: Vec<Usage>,
    usage_minimum: u32,
    delimiter_depth: u8,
    delimiter_branch: u32,
}

impl LocalState {
    pub fn usages(&self) -> &[Usage] {
        &self.usages
    }

    pub fn delimiter_depth(&self) -> u8 {
        self.delimiter_depth
    }

    pub fn reset(&mut self) {
        self.usages.clear();
        self.usage_minimum = 0;
        self.delimiter_depth = 0;
        self.delimiter_branch = 0;
    }

    /// Usages inside the second and later delimiter branches are
    /// alternatives to the first branch and are dropped.
    fn is_alternative(&self) -> bool {
        self.delimiter_branch > 1
    }

    fn add_usage(&mut self, usage: Usage, offset: usize) -> Result<()> {
        ensure!(
            self.usages.len() < MAX_USAGES,
            ParserError::UsageOverflow { offset }
        );
        self.usages.push(usage);
        Ok(())
    }

    /// Combines a usage item with the current usage page unless the
    /// item carries its own page in a 4-byte payload.
    fn resolve(item: &Item, value: u32, usage_page: UsagePage) -> Usage {
        if item.size() <= 2 {
            Usage::new(usage_page, UsageId(value as u16))
        } else {
            Usage(value)
        }
    }

    pub fn handle(&mut self, tag: LocalTag, item: &Item, usage_page: UsagePage) -> Result<()> {
        let offset = item.offset();
        ensure!(item.size() > 0, ParserError::MissingLocalData { offset });

        match tag {
            LocalTag::Delimiter => {
                if item.unsigned_value() > 0 {
                    ensure!(
                        self.delimiter_depth == 0,
                        ParserError::NestedDelimiter { offset }
                    );
                    self.delimiter_depth += 1;
                    self.delimiter_branch += 1;
                } else {
                    ensure!(
                        self.delimiter_depth > 0,
                        ParserError::UnmatchedDelimiter { offset }
                    );
                    self.delimiter_depth -= 1;
                }
            }
            LocalTag::Usage => {
                if self.is_alternative() {
                    tracing::debug!("Ignoring alternative usage at offset {offset}");
                    return Ok(());
                }
                let usage = Self::resolve(item, item.unsigned_value(), usage_page);
                self.add_usage(usage, offset)?;
            }
            LocalTag::UsageMinimum => self.usage_minimum = item.unsigned_value(),
            LocalTag::UsageMaximum => {
                if self.is_alternative() {
                    tracing::debug!("Ignoring alternative usage range at offset {offset}");
                    return Ok(());
                }
                let maximum = item.unsigned_value();
                // An empty range when minimum > maximum. A huge range stops at UsageOverflow.
                for value in self.usage_minimum..=maximum {
                    let usage = Self::resolve(item, value, usage_page);
                    self.add_usage(usage, offset)?;
                }
            }
            LocalTag::DesignatorIndex
            | LocalTag::DesignatorMinimum
            | LocalTag::DesignatorMaximum
            | LocalTag::StringIndex
            | LocalTag::StringMinimum
            | LocalTag::StringMaximum => {}
        }
        Ok(())
    }
}
