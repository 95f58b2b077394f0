//! The column handle and its public, undoable API.
//!
//! [`Column`] is a cheap-to-clone `Rc` handle. Reads go straight to the
//! [`ColumnCore`]; every mutation is wrapped in a command from
//! [`crate::commands`] and executed through the column's undo stack when
//! one is attached. Statistics and the monotonicity classification are
//! computed on demand and cached until the next change.

pub mod core;
pub mod editor;
pub mod notify;
pub mod properties;

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use chrono::NaiveDateTime;
use colstore_common::{ColumnMode, Interval, PlotDesignation, Properties};
use rustc_hash::FxHashMap;

pub use self::core::{ColumnCore, RowState};
pub use editor::{ColumnEditor, RowChange};
pub use notify::{ColumnEvent, ColumnObserver, EventRecorder, ObserverId};

use crate::buffer::{CellValue, ColumnBuffer};
use crate::commands::{self, Command, UndoStack};
use crate::config::ColumnConfig;
use crate::formula::FormulaState;
use crate::stats::Statistics;
use notify::ObserverList;

bitflags! {
    /// Which derived values are currently cached.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CacheFlags: u8 {
        const STATISTICS = 0b0001;
        const PROPERTIES = 0b0010;
        const DICTIONARY = 0b0100;
    }
}

#[derive(Default)]
struct ColumnCache {
    available: CacheFlags,
    statistics: Statistics,
    properties: Properties,
    dictionary: FxHashMap<String, usize>,
}

pub(crate) struct ColumnInner {
    name: RefCell<String>,
    parent_path: RefCell<Option<String>>,
    pub(crate) core: RefCell<ColumnCore>,
    pub(crate) formula: RefCell<Option<FormulaState>>,
    pub(crate) updating: Cell<bool>,
    input_filter: RefCell<Option<String>>,
    output_filter: RefCell<Option<String>>,
    observers: ObserverList,
    cache: RefCell<ColumnCache>,
    undo_stack: RefCell<Option<Rc<UndoStack>>>,
    config: ColumnConfig,
}

#[derive(Clone)]
pub struct Column {
    pub(crate) inner: Rc<ColumnInner>,
}

/// Non-owning column handle, used by commands and formula bindings.
#[derive(Clone, Default)]
pub struct WeakColumn(Weak<ColumnInner>);

impl WeakColumn {
    pub fn upgrade(&self) -> Option<Column> {
        self.0.upgrade().map(|inner| Column { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn points_to(&self, column: &Column) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&column.inner))
    }
}

impl fmt::Debug for WeakColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(column) => write!(f, "WeakColumn({})", column.name()),
            None => f.write_str("WeakColumn(<dropped>)"),
        }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &*self.inner.name.borrow())
            .field("mode", &self.column_mode())
            .field("rows", &self.row_count())
            .finish()
    }
}

impl Column {
    pub fn new(name: impl Into<String>, mode: ColumnMode) -> Self {
        Self::with_config(name, mode, ColumnConfig::default())
    }

    pub fn with_config(name: impl Into<String>, mode: ColumnMode, config: ColumnConfig) -> Self {
        Self::from_buffer_with_config(name, ColumnBuffer::new(mode, 0), config)
    }

    pub fn from_buffer(name: impl Into<String>, buffer: ColumnBuffer) -> Self {
        Self::from_buffer_with_config(name, buffer, ColumnConfig::default())
    }

    pub fn from_buffer_with_config(
        name: impl Into<String>,
        buffer: ColumnBuffer,
        config: ColumnConfig,
    ) -> Self {
        let core = ColumnCore::new(buffer, &config);
        Column {
            inner: Rc::new(ColumnInner {
                name: RefCell::new(name.into()),
                parent_path: RefCell::new(None),
                core: RefCell::new(core),
                formula: RefCell::new(None),
                updating: Cell::new(false),
                input_filter: RefCell::new(None),
                output_filter: RefCell::new(None),
                observers: ObserverList::default(),
                cache: RefCell::new(ColumnCache::default()),
                undo_stack: RefCell::new(None),
                config,
            }),
        }
    }

    pub fn from_doubles(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::from_buffer(name, ColumnBuffer::Double(values))
    }

    pub fn from_integers(name: impl Into<String>, values: Vec<i32>) -> Self {
        Self::from_buffer(name, ColumnBuffer::Integer(values))
    }

    pub fn from_big_ints(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self::from_buffer(name, ColumnBuffer::BigInt(values))
    }

    pub fn from_texts<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self::from_buffer(
            name,
            ColumnBuffer::Text(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn from_date_times(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self::from_buffer(name, ColumnBuffer::DateTime(values))
    }

    pub fn downgrade(&self) -> WeakColumn {
        WeakColumn(Rc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Column) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn config(&self) -> &ColumnConfig {
        &self.inner.config
    }

    // ---- identity ----

    pub fn name(&self) -> String {
        self.inner.name.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.inner.name.borrow_mut() = name.into();
    }

    /// `parent/name`, or just the name for a free-standing column.
    pub fn path(&self) -> String {
        match self.inner.parent_path.borrow().as_deref() {
            Some(parent) => format!("{parent}/{}", self.inner.name.borrow()),
            None => self.name(),
        }
    }

    pub fn set_parent_path(&self, parent: Option<String>) {
        *self.inner.parent_path.borrow_mut() = parent;
    }

    pub fn input_filter(&self) -> Option<String> {
        self.inner.input_filter.borrow().clone()
    }

    pub fn set_input_filter(&self, xml: Option<String>) {
        *self.inner.input_filter.borrow_mut() = xml;
    }

    pub fn output_filter(&self) -> Option<String> {
        self.inner.output_filter.borrow().clone()
    }

    pub fn set_output_filter(&self, xml: Option<String>) {
        *self.inner.output_filter.borrow_mut() = xml;
    }

    // ---- undo and notification plumbing ----

    pub fn set_undo_stack(&self, stack: Option<Rc<UndoStack>>) {
        *self.inner.undo_stack.borrow_mut() = stack;
    }

    pub fn undo_stack(&self) -> Option<Rc<UndoStack>> {
        self.inner.undo_stack.borrow().clone()
    }

    fn exec(&self, mut cmd: Box<dyn Command>) {
        let stack = self.undo_stack();
        match stack {
            Some(stack) => stack.push(cmd),
            None => cmd.redo(),
        }
    }

    /// Direct, non-recorded mutation access.
    pub fn editor(&self) -> ColumnEditor<'_> {
        ColumnEditor::new(self)
    }

    pub fn core(&self) -> Ref<'_, ColumnCore> {
        self.inner.core.borrow()
    }

    pub fn subscribe<O: ColumnObserver + 'static>(&self, observer: &Rc<O>) -> ObserverId {
        let weak: Weak<dyn ColumnObserver> = Rc::downgrade(observer) as Weak<dyn ColumnObserver>;
        self.inner.observers.subscribe(weak)
    }

    pub fn subscribe_weak(&self, observer: Weak<dyn ColumnObserver>) -> ObserverId {
        self.inner.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.inner.observers.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    pub(crate) fn emit(&self, event: ColumnEvent) {
        self.inner.observers.emit(self, event);
    }

    /// Tell observers the column is about to leave its container.
    pub fn notify_about_to_be_removed(&self) {
        self.emit(ColumnEvent::AboutToBeRemoved);
    }

    pub(crate) fn invalidate_cache(&self) {
        self.inner.cache.borrow_mut().available = CacheFlags::empty();
    }

    pub fn cached(&self) -> CacheFlags {
        self.inner.cache.borrow().available
    }

    // ---- readers ----

    pub fn column_mode(&self) -> ColumnMode {
        self.core().mode()
    }

    pub fn row_count(&self) -> usize {
        self.core().row_count()
    }

    pub fn is_numeric(&self) -> bool {
        self.column_mode().is_numeric()
    }

    pub fn is_plottable(&self) -> bool {
        self.column_mode().is_plottable()
    }

    pub fn value_at(&self, row: usize) -> f64 {
        self.core().buffer().value_at(row)
    }

    pub fn double_at(&self, row: usize) -> f64 {
        self.core().buffer().double_at(row)
    }

    pub fn integer_at(&self, row: usize) -> i32 {
        self.core().buffer().integer_at(row)
    }

    pub fn big_int_at(&self, row: usize) -> i64 {
        self.core().buffer().big_int_at(row)
    }

    pub fn text_at(&self, row: usize) -> String {
        self.core().buffer().text_at(row).to_string()
    }

    pub fn date_time_at(&self, row: usize) -> Option<NaiveDateTime> {
        self.core().buffer().date_time_at(row)
    }

    pub fn cell(&self, row: usize) -> CellValue {
        self.core().buffer().cell(row)
    }

    pub fn is_invalid(&self, row: usize) -> bool {
        self.core().invalid().is_set(row)
    }

    pub fn is_valid(&self, row: usize) -> bool {
        !self.is_invalid(row)
    }

    pub fn is_masked(&self, row: usize) -> bool {
        self.core().masked().is_set(row)
    }

    pub fn invalid_intervals(&self) -> Vec<Interval> {
        self.core().invalid().intervals().collect()
    }

    pub fn masked_intervals(&self) -> Vec<Interval> {
        self.core().masked().intervals().collect()
    }

    /// Formula text attached to `row`; empty when there is none.
    pub fn formula(&self, row: usize) -> String {
        self.core().formulas().value(row)
    }

    pub fn formula_intervals(&self) -> Vec<(Interval, String)> {
        self.core().formulas().entries().to_vec()
    }

    pub fn width(&self) -> i32 {
        self.core().width()
    }

    pub fn plot_designation(&self) -> PlotDesignation {
        self.core().plot_designation()
    }

    // ---- undoable mutators ----

    pub fn set_column_mode(&self, mode: ColumnMode) {
        if mode == self.column_mode() {
            return;
        }
        self.exec(Box::new(commands::SetModeCommand::new(self, mode)));
    }

    /// Grow with type defaults or cut rows off the end.
    pub fn resize(&self, rows: usize) {
        let current = self.row_count();
        if rows > current {
            self.insert_rows(current, rows - current);
        } else if rows < current {
            self.remove_rows(rows, current - rows);
        }
    }

    /// Store one value; ignored when its type does not match the mode.
    pub fn set_cell(&self, row: usize, value: CellValue) {
        if value.mode() != self.column_mode() {
            return;
        }
        self.exec(Box::new(commands::SetValueCommand::new(self, row, value)));
    }

    pub fn set_value_at(&self, row: usize, value: f64) {
        self.set_cell(row, CellValue::Double(value));
    }

    pub fn set_integer_at(&self, row: usize, value: i32) {
        self.set_cell(row, CellValue::Integer(value));
    }

    pub fn set_big_int_at(&self, row: usize, value: i64) {
        self.set_cell(row, CellValue::BigInt(value));
    }

    pub fn set_text_at(&self, row: usize, value: impl Into<String>) {
        self.set_cell(row, CellValue::Text(value.into()));
    }

    pub fn set_date_time_at(&self, row: usize, value: Option<NaiveDateTime>) {
        self.set_cell(row, CellValue::DateTime(value));
    }

    /// Overwrite rows from `first`; ignored when the modes differ.
    pub fn replace(&self, first: usize, values: ColumnBuffer) {
        if values.mode() != self.column_mode() || values.is_empty() {
            return;
        }
        self.exec(Box::new(commands::ReplaceRangeCommand::new(self, first, values)));
    }

    pub fn replace_values(&self, first: usize, values: &[f64]) {
        self.replace(first, ColumnBuffer::Double(values.to_vec()));
    }

    pub fn replace_integers(&self, first: usize, values: &[i32]) {
        self.replace(first, ColumnBuffer::Integer(values.to_vec()));
    }

    pub fn replace_big_ints(&self, first: usize, values: &[i64]) {
        self.replace(first, ColumnBuffer::BigInt(values.to_vec()));
    }

    pub fn replace_texts(&self, first: usize, values: &[String]) {
        self.replace(first, ColumnBuffer::Text(values.to_vec()));
    }

    pub fn replace_date_times(&self, first: usize, values: &[Option<NaiveDateTime>]) {
        self.replace(first, ColumnBuffer::DateTime(values.to_vec()));
    }

    pub fn insert_rows(&self, before: usize, count: usize) {
        if count == 0 || before > self.row_count() {
            return;
        }
        self.exec(Box::new(commands::InsertRowsCommand::new(self, before, count)));
    }

    pub fn remove_rows(&self, first: usize, count: usize) {
        let rows = self.row_count();
        if count == 0 || first >= rows {
            return;
        }
        let count = count.min(rows - first);
        self.exec(Box::new(commands::remove_rows(self, first, count)));
    }

    /// Take over values and validity of `source`. Returns `false`, leaving
    /// this column untouched, when the modes differ.
    pub fn copy(&self, source: &Column) -> bool {
        if source.column_mode() != self.column_mode() {
            return false;
        }
        if source.ptr_eq(self) {
            return true;
        }
        self.exec(Box::new(commands::full_copy(self, source)));
        true
    }

    pub fn copy_range(
        &self,
        source: &Column,
        src_start: usize,
        dst_start: usize,
        num_rows: usize,
    ) -> bool {
        if source.column_mode() != self.column_mode() {
            return false;
        }
        if num_rows == 0 {
            return true;
        }
        self.exec(Box::new(commands::partial_copy(
            self, source, src_start, dst_start, num_rows,
        )));
        true
    }

    /// Reset every value to the type default; the row count is kept.
    pub fn clear(&self) {
        self.exec(Box::new(commands::clear(self)));
    }

    pub fn set_invalid(&self, interval: Interval, invalid: bool) {
        self.exec(Box::new(commands::set_invalid(self, interval, invalid)));
    }

    pub fn set_invalid_row(&self, row: usize, invalid: bool) {
        self.set_invalid(Interval::row(row), invalid);
    }

    pub fn clear_validity(&self) {
        self.exec(Box::new(commands::clear_validity(self)));
    }

    pub fn set_masked(&self, interval: Interval, masked: bool) {
        self.exec(Box::new(commands::set_masked(self, interval, masked)));
    }

    pub fn set_masked_row(&self, row: usize, masked: bool) {
        self.set_masked(Interval::row(row), masked);
    }

    pub fn clear_masks(&self) {
        self.exec(Box::new(commands::clear_masks(self)));
    }

    /// Attach formula text to every row of `interval`; empty text detaches.
    pub fn set_formula(&self, interval: Interval, text: impl Into<String>) {
        self.exec(Box::new(commands::set_formula(self, interval, text.into())));
    }

    pub fn set_row_formula(&self, row: usize, text: impl Into<String>) {
        self.set_formula(Interval::row(row), text);
    }

    pub fn clear_formulas(&self) {
        self.exec(Box::new(commands::clear_formulas(self)));
    }

    pub fn set_width(&self, width: i32) {
        if width == self.width() {
            return;
        }
        self.exec(Box::new(commands::SetWidthCommand::new(self, width)));
    }

    pub fn set_plot_designation(&self, designation: PlotDesignation) {
        if designation == self.plot_designation() {
            return;
        }
        self.exec(Box::new(commands::SetPlotDesignationCommand::new(
            self,
            designation,
        )));
    }

    // ---- statistics and lookup ----

    pub fn statistics(&self) -> Statistics {
        if self.cached().contains(CacheFlags::STATISTICS) {
            return self.inner.cache.borrow().statistics.clone();
        }
        let stats = {
            let core = self.core();
            let rows = (0..core.row_count()).filter(|row| !core.masked().is_set(*row));
            match core.mode() {
                ColumnMode::Text => {
                    Statistics::from_texts(rows.map(|row| core.buffer().text_at(row)))
                }
                ColumnMode::DateTime => {
                    Statistics::from_millis(rows.map(|row| core.buffer().value_at(row)))
                }
                _ => Statistics::from_samples(rows.map(|row| core.buffer().value_at(row))),
            }
        };
        let mut cache = self.inner.cache.borrow_mut();
        cache.statistics = stats.clone();
        cache.available |= CacheFlags::STATISTICS;
        stats
    }

    pub fn properties(&self) -> Properties {
        if self.cached().contains(CacheFlags::PROPERTIES) {
            return self.inner.cache.borrow().properties;
        }
        let props = properties::classify(&self.core());
        let mut cache = self.inner.cache.borrow_mut();
        cache.properties = props;
        cache.available |= CacheFlags::PROPERTIES;
        props
    }

    /// Occurrences of each distinct text among unmasked rows of a text
    /// column; empty for other modes.
    pub fn text_frequencies(&self) -> FxHashMap<String, usize> {
        if self.cached().contains(CacheFlags::DICTIONARY) {
            return self.inner.cache.borrow().dictionary.clone();
        }
        let mut dictionary = FxHashMap::default();
        {
            let core = self.core();
            if core.mode() == ColumnMode::Text {
                for row in 0..core.row_count() {
                    if !core.masked().is_set(row) {
                        *dictionary
                            .entry(core.buffer().text_at(row).to_string())
                            .or_insert(0) += 1;
                    }
                }
            }
        }
        let mut cache = self.inner.cache.borrow_mut();
        cache.dictionary = dictionary.clone();
        cache.available |= CacheFlags::DICTIONARY;
        dictionary
    }

    pub fn index_for_value(&self, target: f64, want_lower: bool) -> Option<usize> {
        let props = self.properties();
        properties::index_for_value(&self.core(), props, target, want_lower)
    }

    pub fn nearest_index(&self, target: f64) -> Option<usize> {
        let props = self.properties();
        properties::nearest_index(&self.core(), props, target)
    }

    pub fn minimum(&self, start: usize, end: usize) -> f64 {
        let props = self.properties();
        properties::minimum(&self.core(), props, start, end)
    }

    pub fn maximum(&self, start: usize, end: usize) -> f64 {
        let props = self.properties();
        properties::maximum(&self.core(), props, start, end)
    }

    pub fn row_count_in(&self, min: f64, max: f64) -> usize {
        properties::row_count_in(&self.core(), min, max)
    }

    pub fn available_row_count(&self, max: usize) -> usize {
        properties::available_row_count(&self.core(), max)
    }

    pub fn has_values(&self) -> bool {
        self.available_row_count(1) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_setter_is_noop() {
        let col = Column::from_doubles("x", vec![1.0]);
        col.set_integer_at(0, 5);
        col.set_text_at(0, "a");
        assert_eq!(col.value_at(0), 1.0);
        col.set_value_at(2, 3.0);
        assert_eq!(col.row_count(), 3);
        assert!(col.value_at(1).is_nan());
    }

    #[test]
    fn test_cache_invalidated_on_change() {
        let col = Column::from_doubles("x", vec![1.0, 2.0]);
        assert_eq!(col.statistics().arithmetic_mean, 1.5);
        assert_eq!(col.properties(), Properties::MonotonicIncreasing);
        assert!(col.cached().contains(CacheFlags::STATISTICS | CacheFlags::PROPERTIES));
        col.set_value_at(1, 0.0);
        assert!(col.cached().is_empty());
        assert_eq!(col.properties(), Properties::MonotonicDecreasing);
        assert_eq!(col.statistics().arithmetic_mean, 0.5);
    }

    #[test]
    fn test_masked_rows_skipped_in_statistics() {
        let col = Column::from_doubles("x", vec![1.0, 100.0, 3.0]);
        col.set_masked_row(1, true);
        assert_eq!(col.statistics().arithmetic_mean, 2.0);
        assert_eq!(col.properties(), Properties::No);
    }

    #[test]
    fn test_path_and_weak_handle() {
        let col = Column::new("b", ColumnMode::Text);
        assert_eq!(col.path(), "b");
        col.set_parent_path(Some("sheet".into()));
        assert_eq!(col.path(), "sheet/b");
        let weak = col.downgrade();
        assert!(weak.points_to(&col));
        drop(col);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_text_dictionary() {
        let col = Column::from_texts("t", vec!["a", "b", "a"]);
        let dict = col.text_frequencies();
        assert_eq!(dict.get("a"), Some(&2));
        assert_eq!(col.statistics().unique, 2);
        assert!(col.has_values());
    }
}
