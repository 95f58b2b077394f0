use std::io::Cursor;
use std::path::Path;
use std::rc::Rc;

use colstore_common::ColumnMode;
use colstore_eval::{Column, ColumnConfig, UndoStack};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use rustc_hash::FxHashSet;

use crate::error::{LoadError, LoadWarning, WorkbookError};
use crate::xml::{COLUMN_TAG, attributes, local_name, read_column, skip_element, write_column};

pub const SPREADSHEET_TAG: &str = "spreadsheet";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookConfig {
    /// Applied to every column the spreadsheet creates.
    pub column: ColumnConfig,
    /// Rows given to a new, empty spreadsheet's first column.
    pub default_row_count: usize,
}

/// Named columns sharing one undo stack.
///
/// Columns are addressed as `sheet/column`; formula variables store that
/// path so they can be rebound after a load.
pub struct Spreadsheet {
    name: String,
    columns: Vec<Column>,
    undo: Rc<UndoStack>,
    config: WorkbookConfig,
}

impl Spreadsheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, WorkbookConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: WorkbookConfig) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            undo: Rc::new(UndoStack::new()),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &WorkbookConfig {
        &self.config
    }

    pub fn undo_stack(&self) -> Rc<UndoStack> {
        self.undo.clone()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column_path(&self, name: &str) -> Option<String> {
        self.column(name).map(Column::path)
    }

    /// Longest column.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(Column::row_count).max().unwrap_or(0)
    }

    /// Create an empty column sized to the current row count and append it.
    pub fn add_column(&mut self, name: &str, mode: ColumnMode) -> Result<Column, WorkbookError> {
        let column = Column::with_config(name, mode, self.config.column.clone());
        let rows = if self.columns.is_empty() {
            self.config.default_row_count.max(self.row_count())
        } else {
            self.row_count()
        };
        column.editor().resize(rows);
        self.insert_column(self.columns.len(), column.clone())?;
        Ok(column)
    }

    /// Adopt `column` at `index`. Formula variables elsewhere in the sheet
    /// that refer to its path are bound to it.
    pub fn insert_column(&mut self, index: usize, column: Column) -> Result<(), WorkbookError> {
        let name = column.name();
        if self.column(&name).is_some() {
            return Err(WorkbookError::DuplicateColumn(name));
        }
        if index > self.columns.len() {
            return Err(WorkbookError::IndexOutOfRange {
                index,
                count: self.columns.len(),
            });
        }
        column.set_parent_path(Some(self.name.clone()));
        column.set_undo_stack(Some(self.undo.clone()));
        self.columns.insert(index, column.clone());

        let path = column.path();
        for other in &self.columns {
            if !other.ptr_eq(&column) {
                other.bind_formula_path(&path, &column);
            }
        }
        Ok(())
    }

    /// Detach the column called `name`. Dependent formula columns are told
    /// first and unbind it.
    pub fn remove_column(&mut self, name: &str) -> Result<Column, WorkbookError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| WorkbookError::UnknownColumn(name.to_string()))?;
        let column = self.columns.remove(index);
        column.notify_about_to_be_removed();
        column.set_undo_stack(None);
        column.set_parent_path(None);
        Ok(column)
    }

    /// Grow or shrink every column to `rows`, as one undo step.
    pub fn set_row_count(&self, rows: usize) {
        self.undo.begin_macro(format!("{}: set row count to {rows}", self.name));
        for column in &self.columns {
            column.resize(rows);
        }
        self.undo.end_macro();
    }

    pub fn insert_rows(&self, before: usize, count: usize) {
        self.undo
            .begin_macro(format!("{}: insert {count} rows", self.name));
        for column in &self.columns {
            column.insert_rows(before, count);
        }
        self.undo.end_macro();
    }

    pub fn remove_rows(&self, first: usize, count: usize) {
        self.undo
            .begin_macro(format!("{}: remove {count} rows", self.name));
        for column in &self.columns {
            column.remove_rows(first, count);
        }
        self.undo.end_macro();
    }

    pub fn undo(&self) -> bool {
        self.undo.undo()
    }

    pub fn redo(&self) -> bool {
        self.undo.redo()
    }

    /// Bind every dangling formula variable to the column whose path it
    /// names. Returns the paths that are still unresolved.
    pub fn finalize_load(&self) -> Vec<String> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("finalize_load", sheet = %self.name).entered();

        let mut unresolved: FxHashSet<String> = FxHashSet::default();
        for column in &self.columns {
            for path in column.dangling_formula_paths() {
                match self.columns.iter().find(|c| c.path() == path) {
                    Some(source) => {
                        column.bind_formula_path(&path, source);
                    }
                    None => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(column = %column.name(), path = %path, "formula argument not found");
                        unresolved.insert(path);
                    }
                }
            }
        }
        let mut unresolved: Vec<String> = unresolved.into_iter().collect();
        unresolved.sort();
        unresolved
    }

    // ---- persistence ----

    pub fn to_xml(&self) -> Result<String, WorkbookError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        let mut start = BytesStart::new(SPREADSHEET_TAG);
        start.push_attribute(("name", self.name.as_str()));
        writer.write_event(Event::Start(start))?;
        for column in &self.columns {
            write_column(&mut writer, column)?;
        }
        writer.write_event(Event::End(BytesEnd::new(SPREADSHEET_TAG)))?;
        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn save_xml(&self, path: impl AsRef<Path>) -> Result<(), WorkbookError> {
        std::fs::write(path, self.to_xml()?)?;
        Ok(())
    }

    /// Rebuild a spreadsheet from its XML form and rebind formulas.
    pub fn from_xml(
        xml: &str,
        config: WorkbookConfig,
    ) -> Result<(Spreadsheet, Vec<LoadWarning>), WorkbookError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("load_spreadsheet").entered();

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut warnings = Vec::new();

        let (root, root_empty) = loop {
            match reader.read_event().map_err(LoadError::from)? {
                Event::Start(e) => break (e, false),
                Event::Empty(e) => break (e, true),
                Event::Eof => return Err(LoadError::UnexpectedEof.into()),
                _ => continue,
            }
        };
        if root.local_name().as_ref() != SPREADSHEET_TAG.as_bytes() {
            return Err(LoadError::UnexpectedElement {
                expected: SPREADSHEET_TAG,
                found: local_name(&root),
            }
            .into());
        }
        let name = attributes(&root)?
            .get("name")
            .cloned()
            .unwrap_or_else(|| {
                warnings.push(LoadWarning {
                    column: String::new(),
                    message: "spreadsheet without a name".to_string(),
                });
                String::new()
            });
        let mut sheet = Spreadsheet::with_config(name, config);

        if !root_empty {
            loop {
                let (e, empty) = match reader.read_event().map_err(LoadError::from)? {
                    Event::Start(e) => (e, false),
                    Event::Empty(e) => (e, true),
                    Event::End(e) if e.local_name().as_ref() == SPREADSHEET_TAG.as_bytes() => {
                        break;
                    }
                    Event::Eof => return Err(LoadError::UnexpectedEof.into()),
                    _ => continue,
                };
                if e.local_name().as_ref() != COLUMN_TAG.as_bytes() {
                    let found = local_name(&e);
                    #[cfg(feature = "tracing")]
                    tracing::warn!(element = %found, "skipping unknown spreadsheet element");
                    warnings.push(LoadWarning {
                        column: String::new(),
                        message: format!("skipping unknown element '{found}'"),
                    });
                    skip_element(&mut reader, &e, empty)?;
                    continue;
                }
                let column = Column::with_config("", ColumnMode::Double, sheet.config.column.clone());
                read_column(&mut reader, &e, empty, &column, &mut warnings)?;
                sheet.insert_column(sheet.columns.len(), column)?;
            }
        }

        for path in sheet.finalize_load() {
            warnings.push(LoadWarning {
                column: String::new(),
                message: format!("formula argument '{path}' not found"),
            });
        }
        Ok((sheet, warnings))
    }

    pub fn load_xml(
        path: impl AsRef<Path>,
        config: WorkbookConfig,
    ) -> Result<(Spreadsheet, Vec<LoadWarning>), WorkbookError> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml, config)
    }
}

impl std::fmt::Debug for Spreadsheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spreadsheet")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colstore_eval::FormulaBinding;

    #[test]
    fn test_add_column_matches_row_count() {
        let mut sheet = Spreadsheet::new("s");
        let x = sheet.add_column("x", ColumnMode::Double).unwrap();
        x.replace_values(0, &[1.0, 2.0, 3.0]);
        let t = sheet.add_column("t", ColumnMode::Text).unwrap();
        assert_eq!(t.row_count(), 3);
        assert_eq!(sheet.column_path("t").as_deref(), Some("s/t"));
        assert!(matches!(
            sheet.add_column("x", ColumnMode::Integer),
            Err(WorkbookError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_row_edits_are_one_undo_step() {
        let mut sheet = Spreadsheet::new("s");
        let a = sheet.add_column("a", ColumnMode::Double).unwrap();
        let b = sheet.add_column("b", ColumnMode::Integer).unwrap();
        sheet.set_row_count(4);
        assert_eq!((a.row_count(), b.row_count()), (4, 4));
        sheet.insert_rows(1, 2);
        assert_eq!(b.row_count(), 6);
        assert!(sheet.undo());
        assert_eq!((a.row_count(), b.row_count()), (4, 4));
        assert!(sheet.undo());
        assert_eq!(sheet.row_count(), 0);
        assert!(sheet.redo());
        assert_eq!(sheet.row_count(), 4);
    }

    #[test]
    fn test_remove_column_unbinds_formulas() {
        let mut sheet = Spreadsheet::new("s");
        let x = sheet.add_column("x", ColumnMode::Double).unwrap();
        x.replace_values(0, &[1.0, 2.0]);
        let y = sheet.add_column("y", ColumnMode::Double).unwrap();
        y.set_column_formula(FormulaBinding::new("x+1").variable("x", &x).auto_update(true));
        y.update_formula();
        assert_eq!(y.value_at(1), 3.0);

        let removed = sheet.remove_column("x").unwrap();
        assert!(y.value_at(0).is_nan());
        assert_eq!(y.dangling_formula_paths(), vec!["s/x".to_string()]);
        assert_eq!(removed.path(), "x");

        // putting it back rebinds by path
        sheet.insert_column(0, removed).unwrap();
        assert!(y.dangling_formula_paths().is_empty());
        y.update_formula();
        assert_eq!(y.value_at(0), 2.0);
    }
}
