// SPDX-License-Identifier: MIT

//! The parser driver: dispatches each [Item] to the state it mutates and
//! validates the terminal state once the byte stream is exhausted.

use crate::collection::CollectionTree;
use crate::hid::{Item, ItemKind, ItemReader, MainTag};
use crate::report::{MainFlags, ReportRegistry, ReportType};
use crate::state::{GlobalStack, LocalState};
use crate::types::Usage;
use crate::{ensure, ParserError, ReportDescriptor};

type Result<T> = std::result::Result<T, ParserError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Idle,
    Parsing,
    Done,
    Failed,
}

/// A reusable report descriptor parser. Every call to [Parser::parse]
/// starts from a fresh state, nothing carries over between calls.
///
/// ```
/// # use hidparser::*;
/// let mut parser = Parser::new();
/// assert_eq!(parser.state(), ParserState::Idle);
/// assert!(parser.parse(&[0xa1, 0x01]).is_err());
/// assert_eq!(parser.state(), ParserState::Failed);
/// assert!(parser.parse(&[0xa1, 0x01, 0xc0]).is_ok());
/// assert_eq!(parser.state(), ParserState::Done);
/// ```
#[derive(Debug, Default)]
pub struct Parser {
    state: ParserState,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn parse(&mut self, bytes: &[u8]) -> Result<ReportDescriptor> {
        self.state = ParserState::Parsing;
        let result = ParseState::default().run(bytes);
        self.state = match result {
            Ok(_) => ParserState::Done,
            Err(_) => ParserState::Failed,
        };
        result
    }
}

/// Parse a report descriptor in one go.
pub fn parse_report_descriptor(bytes: &[u8]) -> Result<ReportDescriptor> {
    Parser::new().parse(bytes)
}

/// Everything a single parse owns.
#[derive(Debug, Default)]
struct ParseState {
    globals: GlobalStack,
    locals: LocalState,
    collections: CollectionTree,
    reports: ReportRegistry,
}

impl ParseState {
    fn run(mut self, bytes: &[u8]) -> Result<ReportDescriptor> {
        for item in ItemReader::new(bytes) {
            self.process(&item?)?;
        }
        self.finish()
    }

    fn process(&mut self, item: &Item) -> Result<()> {
        match item.kind() {
            ItemKind::Main(tag) => self.main_item(tag, item),
            ItemKind::Global(tag) => self.globals.handle(tag, item),
            ItemKind::Local(tag) => {
                let usage_page = self.globals.current().usage_page;
                self.locals.handle(tag, item, usage_page)
            }
            ItemKind::Long { .. } => Err(ParserError::UnsupportedLongItem {
                offset: item.offset(),
            }),
        }
    }

    /// Local items only reset after End Collection and the data items. The
    /// usages pending at a Collection stay pending for the next data item.
    fn main_item(&mut self, tag: MainTag, item: &Item) -> Result<()> {
        let offset = item.offset();
        match tag {
            MainTag::Collection => {
                let usage = self.locals.usages().first().copied().unwrap_or(Usage(0));
                self.collections.open(item.unsigned_value(), usage);
                return Ok(());
            }
            MainTag::EndCollection => self.collections.close(offset)?,
            MainTag::Input | MainTag::Output | MainTag::Feature => {
                let report_type = match tag {
                    MainTag::Input => ReportType::Input,
                    MainTag::Output => ReportType::Output,
                    _ => ReportType::Feature,
                };
                self.reports.add_fields(
                    report_type,
                    MainFlags(item.unsigned_value()),
                    self.globals.current(),
                    &self.locals,
                    &self.collections,
                    offset,
                )?;
            }
        }
        self.locals.reset();
        Ok(())
    }

    fn finish(self) -> Result<ReportDescriptor> {
        ensure!(
            self.collections.is_balanced(),
            ParserError::UnbalancedCollection
        );
        ensure!(
            self.locals.delimiter_depth() == 0,
            ParserError::UnbalancedDelimiter
        );
        tracing::debug!(
            "Parsed report descriptor with {} reports and {} collections",
            self.reports.len(),
            self.collections.len()
        );
        Ok(ReportDescriptor::new(
            self.collections.into_collections(),
            self.reports.into_reports(),
        ))
    }
}
