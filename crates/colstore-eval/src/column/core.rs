use colstore_common::{ColumnMode, PlotDesignation};

use crate::attributes::{IntervalAttribute, IntervalFlags};
use crate::buffer::ColumnBuffer;
use crate::config::ColumnConfig;

/// Stored state of a column: values plus the three per-row maps.
///
/// The buffer length is the row count. Map entries never reach past the
/// last row after a structural edit; [`ColumnCore::resize`] leaves them alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnCore {
    pub(crate) buffer: ColumnBuffer,
    pub(crate) invalid: IntervalFlags,
    pub(crate) masked: IntervalFlags,
    pub(crate) formulas: IntervalAttribute<String>,
    pub(crate) width: i32,
    pub(crate) plot_designation: PlotDesignation,
}

/// Everything that moves when rows are inserted or removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowState {
    pub buffer: ColumnBuffer,
    pub invalid: IntervalFlags,
    pub masked: IntervalFlags,
    pub formulas: IntervalAttribute<String>,
}

impl ColumnCore {
    pub fn new(buffer: ColumnBuffer, config: &ColumnConfig) -> Self {
        Self {
            buffer,
            invalid: IntervalFlags::new(),
            masked: IntervalFlags::new(),
            formulas: IntervalAttribute::new(),
            width: config.default_width,
            plot_designation: config.default_plot_designation,
        }
    }

    pub fn buffer(&self) -> &ColumnBuffer {
        &self.buffer
    }

    pub fn invalid(&self) -> &IntervalFlags {
        &self.invalid
    }

    pub fn masked(&self) -> &IntervalFlags {
        &self.masked
    }

    pub fn formulas(&self) -> &IntervalAttribute<String> {
        &self.formulas
    }

    pub fn mode(&self) -> ColumnMode {
        self.buffer.mode()
    }

    pub fn row_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn plot_designation(&self) -> PlotDesignation {
        self.plot_designation
    }

    // Mutators for a detached core, assembled before `ColumnEditor::reset`.

    pub fn invalid_mut(&mut self) -> &mut IntervalFlags {
        &mut self.invalid
    }

    pub fn masked_mut(&mut self) -> &mut IntervalFlags {
        &mut self.masked
    }

    pub fn formulas_mut(&mut self) -> &mut IntervalAttribute<String> {
        &mut self.formulas
    }

    pub fn set_width(&mut self, width: i32) {
        self.width = width;
    }

    pub fn set_plot_designation(&mut self, designation: PlotDesignation) {
        self.plot_designation = designation;
    }

    /// Row is neither invalid nor masked.
    pub fn is_usable(&self, row: usize) -> bool {
        !self.invalid.is_set(row) && !self.masked.is_set(row)
    }

    pub(crate) fn resize(&mut self, rows: usize) {
        self.buffer.resize(rows);
    }

    pub(crate) fn insert_rows(&mut self, before: usize, count: usize) {
        if before > self.row_count() || count == 0 {
            return;
        }
        self.buffer.insert_rows(before, count);
        self.invalid.insert_rows(before, count);
        self.masked.insert_rows(before, count);
        self.formulas.insert_rows(before, count);
    }

    pub(crate) fn remove_rows(&mut self, first: usize, count: usize) {
        if first >= self.row_count() || count == 0 {
            return;
        }
        let count = count.min(self.row_count() - first);
        self.buffer.remove_rows(first, count);
        self.invalid.remove_rows(first, count);
        self.masked.remove_rows(first, count);
        self.formulas.remove_rows(first, count);
    }

    pub(crate) fn swap_row_state(&mut self, state: &mut RowState) {
        std::mem::swap(&mut self.buffer, &mut state.buffer);
        std::mem::swap(&mut self.invalid, &mut state.invalid);
        std::mem::swap(&mut self.masked, &mut state.masked);
        std::mem::swap(&mut self.formulas, &mut state.formulas);
    }

    pub(crate) fn row_state(&self) -> RowState {
        RowState {
            buffer: self.buffer.clone(),
            invalid: self.invalid.clone(),
            masked: self.masked.clone(),
            formulas: self.formulas.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colstore_common::Interval;

    #[test]
    fn test_insert_and_remove_move_all_maps() {
        let mut core = ColumnCore::new(
            ColumnBuffer::Double(vec![1.0, 2.0, 3.0, 4.0]),
            &ColumnConfig::default(),
        );
        core.invalid.set(Interval::row(1), true);
        core.masked.set(Interval::new(2, 3), true);
        core.formulas.set_value(Interval::row(3), "x".to_string());
        let before = core.clone();

        core.insert_rows(1, 2);
        assert_eq!(core.row_count(), 6);
        assert!(core.invalid.is_set(3));
        assert!(core.masked.is_set(4) && core.masked.is_set(5));
        assert_eq!(core.formulas.value(5), "x");

        core.remove_rows(1, 2);
        assert_eq!(core, before);
    }

    #[test]
    fn test_remove_clamps_count() {
        let mut core = ColumnCore::new(ColumnBuffer::Integer(vec![1, 2, 3]), &ColumnConfig::default());
        core.remove_rows(1, 10);
        assert_eq!(core.buffer, ColumnBuffer::Integer(vec![1]));
        core.insert_rows(5, 1);
        assert_eq!(core.row_count(), 1);
    }
}
