//! Low-level column mutators.
//!
//! A [`ColumnEditor`] changes a column's state directly and emits the
//! matching notifications; it records nothing for undo. Commands and the
//! formula engine are its callers. Every method takes the core borrow,
//! mutates, releases the borrow, invalidates cached statistics and only
//! then notifies observers.

use colstore_common::{ColumnMode, PlotDesignation};

use super::Column;
use super::core::{ColumnCore, RowState};
use super::notify::ColumnEvent;
use crate::attributes::{IntervalAttribute, IntervalFlags};
use crate::buffer::{CellValue, ColumnBuffer};

/// Direction of a structural swap, for notification purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowChange {
    Inserted { position: usize, count: usize },
    Removed { position: usize, count: usize },
}

pub struct ColumnEditor<'c> {
    column: &'c Column,
}

impl<'c> ColumnEditor<'c> {
    pub fn new(column: &'c Column) -> Self {
        Self { column }
    }

    fn emit(&self, event: ColumnEvent) {
        self.column.emit(event);
    }

    fn with_core<R>(&self, f: impl FnOnce(&mut ColumnCore) -> R) -> R {
        let result = f(&mut self.column.inner.core.borrow_mut());
        self.column.invalidate_cache();
        result
    }

    fn data_edit<R>(&self, f: impl FnOnce(&mut ColumnCore) -> R) -> R {
        self.emit(ColumnEvent::DataAboutToChange);
        let result = self.with_core(f);
        self.emit(ColumnEvent::DataChanged);
        result
    }

    /// Swap in a whole buffer, returning the previous one. Mode
    /// notifications fire when the variant changes.
    pub fn replace_buffer(&mut self, buffer: ColumnBuffer) -> ColumnBuffer {
        let mode_change = self.column.column_mode() != buffer.mode();
        if mode_change {
            self.emit(ColumnEvent::ModeAboutToChange);
        }
        let old = self.data_edit(|core| std::mem::replace(&mut core.buffer, buffer));
        if mode_change {
            self.emit(ColumnEvent::ModeChanged);
        }
        old
    }

    /// Convert the buffer to `mode`; validity, masks and formulas stay.
    pub fn set_mode(&mut self, mode: ColumnMode) -> ColumnBuffer {
        let converted = self.column.inner.core.borrow().buffer.convert(mode);
        self.replace_buffer(converted)
    }

    /// Store one value. Returns the previous value and row count, or `None`
    /// (and changes nothing) when `value` does not match the column mode.
    pub fn set_value(&mut self, row: usize, value: &CellValue) -> Option<(CellValue, usize)> {
        if value.mode() != self.column.column_mode() {
            return None;
        }
        Some(self.data_edit(|core| {
            let old = (core.buffer.cell(row), core.buffer.len());
            core.buffer.set_cell(row, value);
            old
        }))
    }

    /// Overwrite `values.len()` rows from `first`, growing as needed.
    /// Returns the overwritten slice and the previous row count.
    pub fn replace(&mut self, first: usize, values: &ColumnBuffer) -> Option<(ColumnBuffer, usize)> {
        if values.mode() != self.column.column_mode() {
            return None;
        }
        Some(self.data_edit(|core| {
            let old = (core.buffer.slice(first, values.len()), core.buffer.len());
            core.buffer.replace(first, values);
            old
        }))
    }

    /// Write formula output: one double per row, converted to the column
    /// mode when that is not `Double`.
    pub fn write_doubles(&mut self, values: Vec<f64>) {
        let mode = self.column.column_mode();
        let buffer = ColumnBuffer::Double(values).convert(mode);
        self.data_edit(|core| core.buffer = buffer);
    }

    /// Change the row count, filling defaults. Maps are not touched.
    pub fn resize(&mut self, rows: usize) {
        let current = self.column.row_count();
        if rows == current {
            return;
        }
        if rows > current {
            let count = rows - current;
            self.emit(ColumnEvent::RowsAboutToBeInserted { position: current, count });
            self.with_core(|core| core.resize(rows));
            self.emit(ColumnEvent::RowsInserted { position: current, count });
        } else {
            let count = current - rows;
            self.emit(ColumnEvent::RowsAboutToBeRemoved { position: rows, count });
            self.with_core(|core| core.resize(rows));
            self.emit(ColumnEvent::RowsRemoved { position: rows, count });
        }
    }

    pub fn insert_rows(&mut self, before: usize, count: usize) {
        if count == 0 || before > self.column.row_count() {
            return;
        }
        self.emit(ColumnEvent::RowsAboutToBeInserted { position: before, count });
        self.with_core(|core| core.insert_rows(before, count));
        self.emit(ColumnEvent::RowsInserted { position: before, count });
    }

    pub fn remove_rows(&mut self, first: usize, count: usize) {
        let rows = self.column.row_count();
        if count == 0 || first >= rows {
            return;
        }
        let count = count.min(rows - first);
        self.emit(ColumnEvent::RowsAboutToBeRemoved { position: first, count });
        self.with_core(|core| core.remove_rows(first, count));
        self.emit(ColumnEvent::RowsRemoved { position: first, count });
    }

    /// Exchange the complete row state with `state`.
    pub fn swap_rows(&mut self, state: &mut RowState, change: RowChange) {
        match change {
            RowChange::Inserted { position, count } => {
                self.emit(ColumnEvent::RowsAboutToBeInserted { position, count });
                self.with_core(|core| core.swap_row_state(state));
                self.emit(ColumnEvent::RowsInserted { position, count });
            }
            RowChange::Removed { position, count } => {
                self.emit(ColumnEvent::RowsAboutToBeRemoved { position, count });
                self.with_core(|core| core.swap_row_state(state));
                self.emit(ColumnEvent::RowsRemoved { position, count });
            }
        }
    }

    /// Exchange values and validity together (copy commands).
    pub fn swap_values(&mut self, values: &mut (ColumnBuffer, IntervalFlags)) {
        self.data_edit(|core| {
            std::mem::swap(&mut core.buffer, &mut values.0);
            std::mem::swap(&mut core.invalid, &mut values.1);
        });
    }

    pub fn swap_buffer(&mut self, buffer: &mut ColumnBuffer) {
        self.data_edit(|core| std::mem::swap(&mut core.buffer, buffer));
    }

    pub fn swap_invalid(&mut self, flags: &mut IntervalFlags) {
        self.data_edit(|core| std::mem::swap(&mut core.invalid, flags));
    }

    pub fn swap_masked(&mut self, flags: &mut IntervalFlags) {
        self.with_core(|core| std::mem::swap(&mut core.masked, flags));
        self.emit(ColumnEvent::MaskingChanged);
    }

    pub fn swap_formulas(&mut self, formulas: &mut IntervalAttribute<String>) {
        self.with_core(|core| std::mem::swap(&mut core.formulas, formulas));
        self.emit(ColumnEvent::FormulaChanged);
    }

    pub fn set_width(&mut self, width: i32) -> i32 {
        let old = self.with_core(|core| std::mem::replace(&mut core.width, width));
        self.emit(ColumnEvent::WidthChanged);
        old
    }

    pub fn set_plot_designation(&mut self, designation: PlotDesignation) -> PlotDesignation {
        let old =
            self.with_core(|core| std::mem::replace(&mut core.plot_designation, designation));
        self.emit(ColumnEvent::PlotDesignationChanged);
        old
    }

    /// Replace the entire core (document loading).
    pub fn reset(&mut self, core: ColumnCore) {
        let mode_change = self.column.column_mode() != core.mode();
        if mode_change {
            self.emit(ColumnEvent::ModeAboutToChange);
        }
        self.data_edit(|live| *live = core);
        if mode_change {
            self.emit(ColumnEvent::ModeChanged);
        }
        self.emit(ColumnEvent::MaskingChanged);
        self.emit(ColumnEvent::FormulaChanged);
    }
}
