//! Tabular listing of data records.
//!
//! Each run of records sharing a definition is printed as one table: a
//! banner naming the message, a header row of field titles, then one row
//! per record. Values are converted for reading unless raw output is
//! requested: date-times, durations, scaled quantities and, optionally,
//! semicircle angles in degrees. Invalid values are always printed as
//! stored.

use std::{collections::BTreeSet, io};

use log::warn;

use super::{Flow, Scanner};
use crate::{
    geo::degrees_from_semicircles,
    profile::{FieldKind, Profile},
    sans::{
        data::{BaseType, TIMESTAMP_FIELD, Value, format_date_time, format_duration},
        definition::{DefinitionRecord, FieldDefinition},
    },
    store::{ByteStore, DataRecord, Error},
};

/// Output switches of a [`PrintScanner`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintOptions {
    /// Print the document offset of every value above it.
    pub offset: bool,
    /// Print stored numbers without conversion.
    pub raw: bool,
    /// Print semicircle angles in degrees.
    pub degrees: bool,
}

#[derive(Debug)]
struct Column {
    field: FieldDefinition,
    base_type: BaseType,
    kind: FieldKind,
    scale: f64,
    offset: f64,
    width: usize,
}

impl Column {
    fn is_scaled(&self) -> bool {
        self.scale > 1.0 || self.offset != 0.0
    }
}

/// Prints data records as tables.
pub struct PrintScanner<'p, W> {
    profile: &'p dyn Profile,
    options: PrintOptions,
    messages: BTreeSet<u16>,
    fields: BTreeSet<u8>,
    out: W,
    last_definition: Option<usize>,
    border: String,
    columns: Vec<Column>,
}

impl<'p, W: io::Write> PrintScanner<'p, W> {
    pub fn new(profile: &'p dyn Profile, out: W, options: PrintOptions) -> Self {
        Self {
            profile,
            options,
            messages: BTreeSet::new(),
            fields: BTreeSet::new(),
            out,
            last_definition: None,
            border: String::new(),
            columns: Vec::new(),
        }
    }

    /// Only print records of these global messages. Empty prints all.
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = u16>) -> Self {
        self.messages = messages.into_iter().collect();
        self
    }

    /// Only print these fields. Applies when exactly one message is
    /// selected, since field numbers are only meaningful per message.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = u8>) -> Self {
        self.fields = fields.into_iter().collect();
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn filters_fields(&self) -> bool {
        self.messages.len() == 1 && !self.fields.is_empty()
    }

    fn print_header(&mut self, store: &ByteStore, definition: &DefinitionRecord) -> io::Result<()> {
        let global = definition.global;
        let filters_fields = self.filters_fields();

        self.columns.clear();
        let mut titles = Vec::new();

        for field in definition.standard_fields() {
            if filters_fields && !self.fields.contains(&field.number) {
                continue;
            }

            let meta = self.profile.field(global, field.number);
            let mut kind = meta.map_or(FieldKind::Plain, |m| m.kind);
            if field.number == TIMESTAMP_FIELD && field.size == 4 {
                kind = FieldKind::DateTime;
            }

            titles.push(match meta {
                Some(m) => format!("{} {}", m.name, field.number),
                None => field.number.to_string(),
            });

            self.columns.push(Column {
                field: field.clone(),
                base_type: field.base_type(),
                kind,
                scale: meta.map_or(1.0, |m| m.scale),
                offset: meta.map_or(0.0, |m| m.offset),
                width: 0,
            });
        }

        for field in definition.developer_fields().filter(|_| !filters_fields) {
            let developer = store.developer_fields().get(global, field.number);

            titles.push(match developer {
                Some(d) if !d.name.is_empty() => format!("{} [{}]", d.name, field.number),
                _ => format!("[{}]", field.number),
            });

            self.columns.push(Column {
                field: field.clone(),
                base_type: developer.and_then(|d| d.base_type).unwrap_or(BaseType::Byte),
                kind: FieldKind::Plain,
                scale: developer.map_or(1.0, |d| d.scale),
                offset: developer.map_or(0.0, |d| d.offset),
                width: 0,
            });
        }

        let options = self.options;
        let mut border = String::new();
        let mut header = String::new();

        for (column, title) in self.columns.iter_mut().zip(&titles) {
            let mut width = column_width(column, &options).max(title.chars().count());
            if options.offset {
                width = width.max(10);
            }
            column.width = width;

            border.push_str(&format!("+{}", "-".repeat(width + 2)));
            header.push_str(&format!("| {title:>width$} "));
        }

        border.push('+');
        header.push('|');

        match self.profile.message_name(global) {
            Some(name) => writeln!(self.out, "====  Message #{global} ({name})  ====")?,
            None => writeln!(self.out, "====  Message #{global}  ====")?,
        }

        writeln!(self.out, "{border}")?;
        writeln!(self.out, "{header}")?;
        writeln!(self.out, "{border}")?;

        self.border = border;
        Ok(())
    }

    fn print_row(&mut self, store: &ByteStore, definition: &DefinitionRecord, data: &DataRecord) -> Result<(), Error> {
        let mut offsets = String::new();
        let mut values = String::new();

        for column in &self.columns {
            let width = column.width;
            let offset = data.field_offset(&column.field);

            if self.options.offset {
                offsets.push_str(&format!("| {:>width$} ", format!("@{offset}")));
            }

            let value = store.reader(offset).value(
                column.base_type,
                column.field.size as usize,
                definition.architecture,
            )?;

            values.push_str(&format!("| {:>width$} ", render(column, &value, &self.options)));
        }

        if self.options.offset {
            writeln!(self.out, "{offsets}|")?;
        }
        writeln!(self.out, "{values}|")?;

        Ok(())
    }
}

impl<W: io::Write> Scanner for PrintScanner<'_, W> {
    fn reset(&mut self) {
        self.last_definition = None;
        self.border.clear();
        self.columns.clear();

        if !self.fields.is_empty() && self.messages.len() != 1 {
            warn!("Field filter ignored: it needs exactly one message, got {}.", self.messages.len());
        }
    }

    fn record(
        &mut self,
        store: &ByteStore,
        definition: &DefinitionRecord,
        data: &DataRecord,
    ) -> Result<Flow, Error> {
        if !self.messages.is_empty() && !self.messages.contains(&definition.global) {
            return Ok(Flow::Continue);
        }

        if self.last_definition != Some(data.definition) {
            if !self.border.is_empty() {
                writeln!(self.out, "{}\n", self.border)?;
            }

            self.print_header(store, definition)?;
            self.last_definition = Some(data.definition);
        }

        self.print_row(store, definition, data)?;

        Ok(Flow::Continue)
    }

    fn end(&mut self) {
        if self.border.is_empty() {
            return;
        }

        if let Err(e) = writeln!(self.out, "{}", self.border).and_then(|_| self.out.flush()) {
            warn!("Failed to finish table: {e}");
        }
    }
}

/// Minimum width of a value in a column. Developer columns are at least
/// as wide as converted ones.
fn column_width(column: &Column, options: &PrintOptions) -> usize {
    let width = value_width(column, options);

    if column.field.developer {
        width.max(12)
    } else {
        width
    }
}

fn value_width(column: &Column, options: &PrintOptions) -> usize {
    let size = column.field.size as usize;

    if !options.raw {
        match column.kind {
            FieldKind::DateTime => return 19,
            FieldKind::Duration => return 12,
            FieldKind::Semicircles if options.degrees => return 12,
            _ if column.is_scaled() => return 12,
            _ => {}
        }
    }

    let base_type = column.base_type;
    match base_type {
        BaseType::String => size,
        BaseType::Byte if size != 1 => size * 2,
        _ => {
            let count = (size / base_type.width()).max(1);
            type_width(base_type) * count + count - 1
        }
    }
}

/// Width of the widest printed value of a base type.
fn type_width(base_type: BaseType) -> usize {
    match base_type {
        BaseType::Enum | BaseType::UInt8 | BaseType::UInt8Z | BaseType::Byte => 3,
        BaseType::SInt8 => 4,
        BaseType::UInt16 | BaseType::UInt16Z => 5,
        BaseType::SInt16 => 6,
        BaseType::UInt32 | BaseType::UInt32Z => 10,
        BaseType::SInt32 | BaseType::Float32 => 11,
        BaseType::Float64 | BaseType::SInt64 | BaseType::UInt64 | BaseType::UInt64Z => 20,
        BaseType::String => 0,
    }
}

fn render(column: &Column, value: &Value, options: &PrintOptions) -> String {
    if options.raw || value.is_invalid(column.base_type) {
        return value.to_string();
    }

    match (column.kind, value) {
        (FieldKind::DateTime, Value::U32(raw)) => format_date_time(*raw),
        (FieldKind::Duration, Value::U32(raw)) => format_duration(*raw, column.scale),
        (FieldKind::Semicircles, Value::I32(raw)) if options.degrees => {
            format!("{:.6}", degrees_from_semicircles(*raw))
        }
        _ if column.is_scaled() => value
            .physical(column.scale, column.offset)
            .map_or_else(|| value.to_string(), format_number),
        _ => value.to_string(),
    }
}

/// Format a physical quantity with at most three decimals.
fn format_number(value: f64) -> String {
    let s = format!("{value:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
}

