//! The `column` XML record.
//!
//! ```xml
//! <column name="x" mode="double" plot_designation="x" width="0" rows="3">
//!   <mask start_row="1" end_row="1"/>
//!   <formula start_row="0" end_row="2">i*2</formula>
//!   <formula autoUpdate="1" autoResize="0">
//!     <text>2*a</text>
//!     <variableNames><name>a</name></variableNames>
//!     <columnPathes><path>data/a</path></columnPathes>
//!   </formula>
//!   <row index="0" invalid="no">1.0000000000000000e0</row>
//! </column>
//! ```
//!
//! Only rows that hold a non-default value or are flagged invalid are
//! written. Date-time cells use the `%Y-%m-%d %H:%M:%S%.3f` text format, so
//! anything finer than a millisecond is truncated on save. `input_filter`
//! and `output_filter` hold opaque XML fragments that are passed through
//! unchanged.

use std::io::{Cursor, Write};

use chrono::NaiveDateTime;
use colstore_common::{ColumnMode, Interval, PlotDesignation, format_date_time, parse_date_time};
use colstore_eval::{
    CellValue, Column, ColumnBuffer, ColumnCore, FormulaBinding, FormulaVariable, IntervalAttribute,
    IntervalFlags,
};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use rustc_hash::FxHashMap;

use crate::error::{LoadError, LoadWarning, WorkbookError};

pub const COLUMN_TAG: &str = "column";

fn parse_xml_bool(val: &str) -> bool {
    let trimmed = val.trim();
    trimmed == "1" || trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("yes")
}

fn flag(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

// ---- writing ----

/// Text body of a populated row, or `None` when the row needs no record.
fn row_body(buffer: &ColumnBuffer, invalid: &IntervalFlags, row: usize) -> Option<String> {
    if buffer.is_default_at(row) && !invalid.is_set(row) {
        return None;
    }
    Some(match buffer {
        ColumnBuffer::Double(v) => format!("{:.16e}", v[row]),
        ColumnBuffer::Integer(v) => v[row].to_string(),
        ColumnBuffer::BigInt(v) => v[row].to_string(),
        ColumnBuffer::Text(v) => v[row].clone(),
        ColumnBuffer::DateTime(v) => v[row].map(|dt| format_date_time(&dt)).unwrap_or_default(),
    })
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    start: BytesStart<'_>,
    text: &str,
) -> Result<(), quick_xml::Error> {
    let end = BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn write_list<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    item: &str,
    values: &[String],
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    for v in values {
        write_text_element(writer, BytesStart::new(item), v)?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_column_formula<W: Write>(
    writer: &mut Writer<W>,
    binding: &FormulaBinding,
) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new("formula");
    start.push_attribute(("autoUpdate", flag(binding.auto_update)));
    start.push_attribute(("autoResize", flag(binding.auto_resize)));
    writer.write_event(Event::Start(start))?;

    write_text_element(writer, BytesStart::new("text"), &binding.expression)?;
    let names: Vec<String> = binding.variables.iter().map(|v| v.name.clone()).collect();
    let paths: Vec<String> = binding
        .variables
        .iter()
        .map(|v| v.column().map(|c| c.path()).unwrap_or_else(|| v.path.clone()))
        .collect();
    write_list(writer, "variableNames", "name", &names)?;
    write_list(writer, "columnPathes", "path", &paths)?;

    writer.write_event(Event::End(BytesEnd::new("formula")))?;
    Ok(())
}

/// Write `column` as one `column` element.
pub fn write_column<W: Write>(writer: &mut Writer<W>, column: &Column) -> Result<(), quick_xml::Error> {
    let core = column.core();

    let mut start = BytesStart::new(COLUMN_TAG);
    start.push_attribute(("name", column.name().as_str()));
    start.push_attribute(("mode", core.mode().token()));
    start.push_attribute(("plot_designation", core.plot_designation().token()));
    start.push_attribute(("width", core.width().to_string().as_str()));
    start.push_attribute(("rows", core.row_count().to_string().as_str()));
    writer.write_event(Event::Start(start))?;

    for (tag, filter) in [
        ("input_filter", column.input_filter()),
        ("output_filter", column.output_filter()),
    ] {
        if let Some(fragment) = filter {
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            writer.write_event(Event::Text(BytesText::from_escaped(fragment.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
    }

    for iv in core.masked().intervals() {
        let mut mask = BytesStart::new("mask");
        mask.push_attribute(("start_row", iv.start().to_string().as_str()));
        mask.push_attribute(("end_row", iv.end().to_string().as_str()));
        writer.write_event(Event::Empty(mask))?;
    }

    for (iv, text) in core.formulas().entries() {
        let mut formula = BytesStart::new("formula");
        formula.push_attribute(("start_row", iv.start().to_string().as_str()));
        formula.push_attribute(("end_row", iv.end().to_string().as_str()));
        write_text_element(writer, formula, text)?;
    }

    if let Some(binding) = column.column_formula() {
        write_column_formula(writer, &binding)?;
    }

    for row in 0..core.row_count() {
        let Some(body) = row_body(core.buffer(), core.invalid(), row) else {
            continue;
        };
        let mut elem = BytesStart::new("row");
        elem.push_attribute(("index", row.to_string().as_str()));
        elem.push_attribute(("invalid", if core.invalid().is_set(row) { "yes" } else { "no" }));
        write_text_element(writer, elem, &body)?;
    }

    writer.write_event(Event::End(BytesEnd::new(COLUMN_TAG)))?;
    Ok(())
}

/// `column` serialized as a standalone, indented XML string.
pub fn column_to_xml(column: &Column) -> Result<String, WorkbookError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    write_column(&mut writer, column)?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ---- reading ----

pub(crate) fn attributes(e: &BytesStart<'_>) -> Result<FxHashMap<String, String>, LoadError> {
    let mut out = FxHashMap::default();
    for a in e.attributes().with_checks(false) {
        let a = a?;
        let key = std::str::from_utf8(a.key.as_ref())?.to_string();
        let raw = std::str::from_utf8(&a.value)?;
        out.insert(key, unescape(raw)?.into_owned());
    }
    Ok(out)
}

/// Unescaped text content of `e`; empty for a self-closing element.
pub(crate) fn element_text(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<String, LoadError> {
    if empty {
        return Ok(String::new());
    }
    let raw = reader.read_text(e.name())?;
    Ok(unescape(&raw)?.into_owned())
}

pub(crate) fn skip_element(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<(), LoadError> {
    if !empty {
        reader.read_to_end(e.name())?;
    }
    Ok(())
}

pub(crate) fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

struct ColumnLoader<'w> {
    name: String,
    mode: ColumnMode,
    warnings: &'w mut Vec<LoadWarning>,
}

impl ColumnLoader<'_> {
    fn warn(&mut self, message: String) {
        #[cfg(feature = "tracing")]
        tracing::warn!(column = %self.name, "{message}");
        self.warnings.push(LoadWarning {
            column: self.name.clone(),
            message,
        });
    }

    fn row_index(&mut self, attrs: &FxHashMap<String, String>, key: &str) -> Option<usize> {
        match attrs.get(key).map(|v| v.trim().parse::<usize>()) {
            Some(Ok(v)) => Some(v),
            Some(Err(_)) | None => {
                self.warn(format!("'{key}' missing or not a row index"));
                None
            }
        }
    }

    fn interval(&mut self, attrs: &FxHashMap<String, String>) -> Option<Interval> {
        let start = self.row_index(attrs, "start_row")?;
        let end = self.row_index(attrs, "end_row")?;
        match Interval::try_new(start, end) {
            Ok(iv) => Some(iv),
            Err(_) => {
                self.warn(format!("skipping reversed interval [{start},{end}]"));
                None
            }
        }
    }

    /// Trim `iv` to the loaded rows, warning when it reaches past them.
    fn clamp(&mut self, what: &str, iv: Interval, rows: usize) -> Option<Interval> {
        if iv.start() >= rows {
            self.warn(format!(
                "dropping {what} [{},{}] past the last row",
                iv.start(),
                iv.end()
            ));
            return None;
        }
        if iv.end() >= rows {
            self.warn(format!(
                "trimming {what} [{},{}] to end at row {}",
                iv.start(),
                iv.end(),
                rows - 1
            ));
            return Some(Interval::new(iv.start(), rows - 1));
        }
        Some(iv)
    }

    fn parse_row(&self, index: usize, body: &str) -> Result<CellValue, LoadError> {
        let bad = || LoadError::BadRow {
            column: self.name.clone(),
            index,
            body: body.to_string(),
        };
        let trimmed = body.trim();
        Ok(match self.mode {
            ColumnMode::Text => CellValue::Text(body.to_string()),
            ColumnMode::Double if trimmed.is_empty() => CellValue::Double(f64::NAN),
            ColumnMode::Double => CellValue::Double(trimmed.parse().map_err(|_| bad())?),
            ColumnMode::Integer if trimmed.is_empty() => CellValue::Integer(0),
            ColumnMode::Integer => CellValue::Integer(trimmed.parse().map_err(|_| bad())?),
            ColumnMode::BigInt if trimmed.is_empty() => CellValue::BigInt(0),
            ColumnMode::BigInt => CellValue::BigInt(trimmed.parse().map_err(|_| bad())?),
            ColumnMode::DateTime if trimmed.is_empty() => CellValue::DateTime(None),
            ColumnMode::DateTime => {
                let dt: NaiveDateTime = parse_date_time(trimmed).ok_or_else(bad)?;
                CellValue::DateTime(Some(dt))
            }
        })
    }

    /// Children of a column-level `formula` element.
    fn read_binding(
        &mut self,
        reader: &mut Reader<&[u8]>,
        attrs: &FxHashMap<String, String>,
        empty: bool,
    ) -> Result<FormulaBinding, LoadError> {
        let mut binding = FormulaBinding::new("")
            .auto_update(attrs.get("autoUpdate").is_some_and(|v| parse_xml_bool(v)))
            .auto_resize(attrs.get("autoResize").is_some_and(|v| parse_xml_bool(v)));
        let mut names: Vec<String> = Vec::new();
        let mut paths: Vec<String> = Vec::new();

        if !empty {
            loop {
                let (e, child_empty) = match reader.read_event()? {
                    Event::Start(e) => (e, false),
                    Event::Empty(e) => (e, true),
                    Event::End(e) if e.local_name().as_ref() == b"formula" => break,
                    Event::Eof => return Err(LoadError::UnexpectedEof),
                    _ => continue,
                };
                match e.local_name().as_ref() {
                    b"text" => binding.expression = element_text(reader, &e, child_empty)?,
                    b"name" => names.push(element_text(reader, &e, child_empty)?),
                    b"path" => paths.push(element_text(reader, &e, child_empty)?),
                    // list wrappers; their items are read by the arms above
                    b"variableNames" | b"columnPathes" => {}
                    _ => {
                        self.warn(format!("skipping unknown formula element '{}'", local_name(&e)));
                        skip_element(reader, &e, child_empty)?;
                    }
                }
            }
        }

        if names.len() != paths.len() {
            self.warn(format!(
                "{} variable names but {} column paths",
                names.len(),
                paths.len()
            ));
        }
        binding.variables = names
            .into_iter()
            .zip(paths)
            .map(|(name, path)| FormulaVariable::unbound(name, path))
            .collect();
        Ok(binding)
    }
}

fn required<'a>(
    attrs: &'a FxHashMap<String, String>,
    column: &str,
    attribute: &'static str,
) -> Result<&'a str, LoadError> {
    match attrs.get(attribute).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(LoadError::MissingAttribute {
            column: column.to_string(),
            attribute,
        }),
    }
}

/// Restore `column` from the `column` element `start` whose children follow
/// in `reader`. Everything the column held before is replaced. On error the
/// column is left unchanged.
pub fn read_column(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    empty: bool,
    column: &Column,
    warnings: &mut Vec<LoadWarning>,
) -> Result<(), LoadError> {
    let attrs = attributes(start)?;
    let name = match attrs.get("name").filter(|n| !n.is_empty()) {
        Some(n) => n.clone(),
        None => {
            let fallback = column.name();
            warnings.push(LoadWarning {
                column: fallback.clone(),
                message: "missing name; keeping the current one".to_string(),
            });
            fallback
        }
    };

    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("read_column", column = %name).entered();

    let mode_token = required(&attrs, &name, "mode")?;
    let mode: ColumnMode = mode_token.parse().map_err(|source| LoadError::UnknownMode {
        column: name.clone(),
        source,
    })?;
    let width_token = required(&attrs, &name, "width")?;
    let width: i32 = width_token.parse().map_err(|_| LoadError::InvalidAttribute {
        column: name.clone(),
        attribute: "width",
        value: width_token.to_string(),
    })?;

    let mut loader = ColumnLoader {
        name: name.clone(),
        mode,
        warnings,
    };

    let designation = match attrs.get("plot_designation") {
        Some(token) => token.parse::<PlotDesignation>().unwrap_or_else(|err| {
            loader.warn(err.to_string());
            column.config().default_plot_designation
        }),
        None => {
            loader.warn("missing plot_designation; using the default".to_string());
            column.config().default_plot_designation
        }
    };
    let max_rows = column.config().max_loaded_rows;
    let declared = match attrs.get("rows") {
        Some(v) => match v.trim().parse::<usize>() {
            Ok(n) if n <= max_rows => Some(n),
            Ok(_) => {
                return Err(LoadError::InvalidAttribute {
                    column: name,
                    attribute: "rows",
                    value: v.clone(),
                });
            }
            Err(_) => {
                loader.warn(format!("ignoring unreadable row count '{v}'"));
                None
            }
        },
        None => None,
    };
    let rows = declared.unwrap_or(0);
    // row indices must stay below the declared count, or the configured cap
    let row_limit = declared.unwrap_or(max_rows);

    let mut buffer = ColumnBuffer::new(mode, rows);
    let mut invalid = IntervalFlags::new();
    let mut masked = IntervalFlags::new();
    let mut formulas: IntervalAttribute<String> = IntervalAttribute::new();
    let mut pending_masks: Vec<Interval> = Vec::new();
    let mut pending_formulas: Vec<(Interval, String)> = Vec::new();
    let mut binding: Option<FormulaBinding> = None;
    let mut input_filter: Option<String> = None;
    let mut output_filter: Option<String> = None;

    if !empty {
        loop {
            let (e, child_empty) = match reader.read_event()? {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::End(e) if e.local_name().as_ref() == COLUMN_TAG.as_bytes() => break,
                Event::Eof => return Err(LoadError::UnexpectedEof),
                _ => continue,
            };
            match e.local_name().as_ref() {
                b"input_filter" | b"output_filter" => {
                    let fragment = if child_empty {
                        String::new()
                    } else {
                        reader.read_text(e.name())?.into_owned()
                    };
                    if e.local_name().as_ref() == b"input_filter" {
                        input_filter = Some(fragment);
                    } else {
                        output_filter = Some(fragment);
                    }
                }
                b"mask" => {
                    let child = attributes(&e)?;
                    if let Some(iv) = loader.interval(&child) {
                        pending_masks.push(iv);
                    }
                    skip_element(reader, &e, child_empty)?;
                }
                b"formula" => {
                    let child = attributes(&e)?;
                    if child.contains_key("start_row") {
                        let text = element_text(reader, &e, child_empty)?;
                        if let Some(iv) = loader.interval(&child) {
                            if !text.is_empty() {
                                pending_formulas.push((iv, text));
                            }
                        }
                    } else {
                        binding = Some(loader.read_binding(reader, &child, child_empty)?);
                    }
                }
                b"row" => {
                    let child = attributes(&e)?;
                    let body = element_text(reader, &e, child_empty)?;
                    let Some(index) = loader.row_index(&child, "index") else {
                        continue;
                    };
                    if index >= row_limit {
                        return Err(LoadError::RowOutOfRange {
                            column: name,
                            index,
                            rows: row_limit,
                        });
                    }
                    let value = loader.parse_row(index, &body)?;
                    buffer.set_cell(index, &value);
                    if child.get("invalid").is_some_and(|v| parse_xml_bool(v)) {
                        invalid.set(Interval::row(index), true);
                    }
                }
                _ => {
                    loader.warn(format!("skipping unknown element '{}'", local_name(&e)));
                    skip_element(reader, &e, child_empty)?;
                }
            }
        }
    }

    let row_count = buffer.len();
    for iv in pending_masks {
        if let Some(iv) = loader.clamp("mask", iv, row_count) {
            masked.set(iv, true);
        }
    }
    for (iv, text) in pending_formulas {
        if let Some(iv) = loader.clamp("formula", iv, row_count) {
            formulas.set_value(iv, text);
        }
    }

    let mut core = ColumnCore::new(buffer, column.config());
    core.set_width(width);
    core.set_plot_designation(designation);
    *core.invalid_mut() = invalid;
    *core.masked_mut() = masked;
    *core.formulas_mut() = formulas;

    column.set_name(name);
    column.set_input_filter(input_filter);
    column.set_output_filter(output_filter);
    column.clear_column_formula();
    column.editor().reset(core);
    if let Some(binding) = binding {
        column.set_column_formula(binding);
    }
    Ok(())
}

/// Load the first `column` element of `xml` into `column`.
pub fn load_column(xml: &str, column: &Column) -> Result<Vec<LoadWarning>, LoadError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut warnings = Vec::new();
    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::Eof => return Err(LoadError::UnexpectedEof),
            _ => continue,
        };
        if e.local_name().as_ref() != COLUMN_TAG.as_bytes() {
            return Err(LoadError::UnexpectedElement {
                expected: COLUMN_TAG,
                found: local_name(&e),
            });
        }
        read_column(&mut reader, &e, empty, column, &mut warnings)?;
        return Ok(warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colstore_common::from_millis;

    fn round_trip(column: &Column) -> (Column, Vec<LoadWarning>) {
        let xml = column_to_xml(column).unwrap();
        let restored = Column::new("tmp", ColumnMode::Double);
        let warnings = load_column(&xml, &restored).unwrap();
        (restored, warnings)
    }

    #[test]
    fn test_double_column_round_trip() {
        let col = Column::from_doubles("x", vec![0.1, f64::NAN, 1e300, -2.5]);
        col.set_invalid_row(1, true);
        col.set_masked(Interval::new(2, 3), true);
        col.set_formula(Interval::new(0, 1), "i*2");
        col.set_width(55);
        col.set_plot_designation(PlotDesignation::Y);

        let (back, warnings) = round_trip(&col);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(back.name(), "x");
        assert_eq!(back.row_count(), 4);
        assert_eq!(back.value_at(0), 0.1);
        assert!(back.value_at(1).is_nan());
        assert_eq!(back.value_at(2), 1e300);
        assert_eq!(back.invalid_intervals(), vec![Interval::row(1)]);
        assert_eq!(back.masked_intervals(), vec![Interval::new(2, 3)]);
        assert_eq!(back.formula(1), "i*2");
        assert_eq!(back.width(), 55);
        assert_eq!(back.plot_designation(), PlotDesignation::Y);
    }

    #[test]
    fn test_text_and_date_time_bodies() {
        let col = Column::from_texts("t", vec![" a<b & c ", "", "z"]);
        let (back, _) = round_trip(&col);
        assert_eq!(back.column_mode(), ColumnMode::Text);
        assert_eq!(back.text_at(0), " a<b & c ");
        assert_eq!(back.text_at(1), "");
        assert_eq!(back.row_count(), 3);

        let col = Column::from_date_times("d", vec![from_millis(1_234), None]);
        let (back, _) = round_trip(&col);
        assert_eq!(back.date_time_at(0), from_millis(1_234));
        assert_eq!(back.date_time_at(1), None);
    }

    #[test]
    fn test_column_formula_round_trip() {
        let a = Column::from_doubles("a", vec![1.0]);
        a.set_parent_path(Some("data".into()));
        let col = Column::from_doubles("b", vec![2.0]);
        col.set_column_formula(FormulaBinding::new("2*a").variable("a", &a).auto_update(true));

        let (back, _) = round_trip(&col);
        let binding = back.column_formula().unwrap();
        assert_eq!(binding.expression, "2*a");
        assert!(binding.auto_update && !binding.auto_resize);
        assert_eq!(binding.variables[0].name, "a");
        assert_eq!(binding.variables[0].path, "data/a");
        assert!(!binding.variables[0].is_bound());
        assert_eq!(back.value_at(0), 2.0);
    }

    #[test]
    fn test_filters_pass_through() {
        let col = Column::from_integers("n", vec![1, 0, 3]);
        col.set_input_filter(Some("<ascii separator=\",\"/>".into()));
        let (back, _) = round_trip(&col);
        assert_eq!(back.input_filter().as_deref(), Some("<ascii separator=\",\"/>"));
        assert_eq!(back.output_filter(), None);
        assert_eq!(back.integer_at(1), 0);
        assert_eq!(back.integer_at(2), 3);
    }

    #[test]
    fn test_missing_mode_is_fatal() {
        let col = Column::from_doubles("keep", vec![7.0]);
        let err = load_column(r#"<column name="x" width="0"/>"#, &col).unwrap_err();
        assert!(matches!(err, LoadError::MissingAttribute { attribute: "mode", .. }));
        assert_eq!(col.value_at(0), 7.0);

        let err = load_column(r#"<column name="x" mode="double" width=""/>"#, &col).unwrap_err();
        assert!(matches!(err, LoadError::MissingAttribute { attribute: "width", .. }));

        let err = load_column(r#"<column name="x" mode="float" width="0"/>"#, &col).unwrap_err();
        assert!(matches!(err, LoadError::UnknownMode { .. }));
    }

    #[test]
    fn test_bad_row_aborts() {
        let col = Column::new("x", ColumnMode::Integer);
        let xml = r#"<column name="x" mode="integer" width="0"><row index="0" invalid="no">abc</row></column>"#;
        let err = load_column(xml, &col).unwrap_err();
        assert!(matches!(err, LoadError::BadRow { index: 0, .. }));
    }

    #[test]
    fn test_unknown_elements_warn_and_load_resets() {
        let col = Column::from_doubles("x", vec![1.0, 2.0, 3.0]);
        col.set_masked_row(0, true);
        let xml = r#"<column name="y" mode="double" width="0">
            <comment><nested/></comment>
            <row index="1" invalid="yes">4</row>
        </column>"#;
        let warnings = load_column(xml, &col).unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.message.contains("comment")));
        assert!(warnings.iter().any(|w| w.message.contains("plot_designation")));
        assert_eq!(col.name(), "y");
        assert_eq!(col.row_count(), 2);
        assert_eq!(col.value_at(1), 4.0);
        assert!(col.is_invalid(1));
        assert!(col.masked_intervals().is_empty());
    }
}
