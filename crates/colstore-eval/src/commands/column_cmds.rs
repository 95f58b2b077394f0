//! Concrete column commands.
//!
//! Bulk edits (copies, row removal, clearing, map updates) are
//! [`SwapCommand`]s built by the constructor functions below. Small edits
//! keep the old scalar and the old row count instead.

use colstore_common::{ColumnMode, Interval, PlotDesignation};

use super::Command;
use super::swap::SwapSlot;
use crate::attributes::{IntervalAttribute, IntervalFlags};
use crate::buffer::{CellValue, ColumnBuffer};
use crate::column::core::{ColumnCore, RowState};
use crate::column::editor::{ColumnEditor, RowChange};
use crate::column::{Column, WeakColumn};

/// Which direction a swap is applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Redo,
    Undo,
}

/// Values and validity; the part of a column that copies transfer.
pub type ValuesState = (ColumnBuffer, IntervalFlags);

type Prepare<T> = Box<dyn FnOnce(&ColumnCore) -> T>;
type Apply<T> = Box<dyn Fn(&mut ColumnEditor<'_>, &mut T, Step)>;

pub struct SwapCommand<T> {
    column: WeakColumn,
    text: String,
    slot: SwapSlot<T>,
    prepare: Option<Prepare<T>>,
    apply: Apply<T>,
}

impl<T> SwapCommand<T> {
    fn new(column: &Column, text: String, prepare: Prepare<T>, apply: Apply<T>) -> Self {
        Self {
            column: column.downgrade(),
            text,
            slot: SwapSlot::new(),
            prepare: Some(prepare),
            apply,
        }
    }

    fn step(&mut self, step: Step) {
        let Some(column) = self.column.upgrade() else {
            #[cfg(feature = "tracing")]
            tracing::warn!(command = %self.text, "column dropped; command ignored");
            return;
        };
        if !self.slot.is_primed() {
            if step == Step::Undo {
                return;
            }
            let Some(prepare) = self.prepare.take() else {
                return;
            };
            let post = prepare(&column.core());
            self.slot.prime(post);
        }
        if let Some(state) = self.slot.get_mut() {
            let mut editor = column.editor();
            (self.apply)(&mut editor, state, step);
        }
    }
}

impl<T> Command for SwapCommand<T> {
    fn redo(&mut self) {
        self.step(Step::Redo);
    }

    fn undo(&mut self) {
        self.step(Step::Undo);
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

/// Replace values and validity of `target` with those of `source`.
pub fn full_copy(target: &Column, source: &Column) -> SwapCommand<ValuesState> {
    let post = {
        let src = source.core();
        (src.buffer.clone(), src.invalid.clone())
    };
    SwapCommand::new(
        target,
        format!("{}: copy values from {}", target.name(), source.name()),
        Box::new(move |_| post),
        Box::new(|editor, state, _| editor.swap_values(state)),
    )
}

/// Copy `count` rows of `source` starting at `src_start` into `target` at
/// `dst_start`, growing the target when needed.
pub fn partial_copy(
    target: &Column,
    source: &Column,
    src_start: usize,
    dst_start: usize,
    count: usize,
) -> SwapCommand<ValuesState> {
    let (values, invalid) = {
        let src = source.core();
        let values = src.buffer.slice(src_start, count);
        let offset = dst_start as isize - src_start as isize;
        let invalid: Vec<Interval> = match Interval::with_len(src_start, count) {
            Some(window) => src
                .invalid
                .intervals()
                .filter_map(|iv| Interval::intersection(&iv, &window))
                .filter_map(|iv| iv.translate(offset))
                .collect(),
            None => Vec::new(),
        };
        (values, invalid)
    };
    SwapCommand::new(
        target,
        format!("{}: copy {} rows from {}", target.name(), count, source.name()),
        Box::new(move |core| {
            let mut buffer = core.buffer.clone();
            buffer.copy_from(&values, 0, dst_start, count);
            let mut flags = core.invalid.clone();
            if let Some(range) = Interval::with_len(dst_start, count) {
                flags.set(range, false);
            }
            for iv in invalid {
                flags.set(iv, true);
            }
            (buffer, flags)
        }),
        Box::new(|editor, state, _| editor.swap_values(state)),
    )
}

/// Remove `count` rows from `first`; the caller clamps `count`.
pub fn remove_rows(target: &Column, first: usize, count: usize) -> SwapCommand<RowState> {
    SwapCommand::new(
        target,
        format!("{}: remove {} rows", target.name(), count),
        Box::new(move |core| {
            let mut post = core.clone();
            post.remove_rows(first, count);
            post.row_state()
        }),
        Box::new(move |editor, state, step| {
            let change = match step {
                Step::Redo => RowChange::Removed { position: first, count },
                Step::Undo => RowChange::Inserted { position: first, count },
            };
            editor.swap_rows(state, change);
        }),
    )
}

/// Reset every value to the type default, keeping the row count.
pub fn clear(target: &Column) -> SwapCommand<ColumnBuffer> {
    SwapCommand::new(
        target,
        format!("{}: clear", target.name()),
        Box::new(|core| ColumnBuffer::new(core.mode(), core.row_count())),
        Box::new(|editor, state, _| editor.swap_buffer(state)),
    )
}

pub fn clear_validity(target: &Column) -> SwapCommand<IntervalFlags> {
    SwapCommand::new(
        target,
        format!("{}: mark all cells valid", target.name()),
        Box::new(|_| IntervalFlags::new()),
        Box::new(|editor, state, _| editor.swap_invalid(state)),
    )
}

pub fn clear_masks(target: &Column) -> SwapCommand<IntervalFlags> {
    SwapCommand::new(
        target,
        format!("{}: unmask all cells", target.name()),
        Box::new(|_| IntervalFlags::new()),
        Box::new(|editor, state, _| editor.swap_masked(state)),
    )
}

pub fn clear_formulas(target: &Column) -> SwapCommand<IntervalAttribute<String>> {
    SwapCommand::new(
        target,
        format!("{}: clear all formulas", target.name()),
        Box::new(|_| IntervalAttribute::new()),
        Box::new(|editor, state, _| editor.swap_formulas(state)),
    )
}

pub fn set_invalid(target: &Column, interval: Interval, invalid: bool) -> SwapCommand<IntervalFlags> {
    let verb = if invalid { "mark invalid" } else { "mark valid" };
    SwapCommand::new(
        target,
        format!("{}: {} {}", target.name(), verb, interval),
        Box::new(move |core| {
            let mut flags = core.invalid.clone();
            flags.set(interval, invalid);
            flags
        }),
        Box::new(|editor, state, _| editor.swap_invalid(state)),
    )
}

pub fn set_masked(target: &Column, interval: Interval, masked: bool) -> SwapCommand<IntervalFlags> {
    let verb = if masked { "mask" } else { "unmask" };
    SwapCommand::new(
        target,
        format!("{}: {} {}", target.name(), verb, interval),
        Box::new(move |core| {
            let mut flags = core.masked.clone();
            flags.set(interval, masked);
            flags
        }),
        Box::new(|editor, state, _| editor.swap_masked(state)),
    )
}

/// Attach `text` to the rows of `interval`; empty text removes it.
pub fn set_formula(
    target: &Column,
    interval: Interval,
    text: String,
) -> SwapCommand<IntervalAttribute<String>> {
    SwapCommand::new(
        target,
        format!("{}: set formula {}", target.name(), interval),
        Box::new(move |core| {
            let mut formulas = core.formulas.clone();
            if text.is_empty() {
                formulas.subtract(&interval);
            } else {
                formulas.set_value(interval, text);
            }
            formulas
        }),
        Box::new(|editor, state, _| editor.swap_formulas(state)),
    )
}

pub struct SetValueCommand {
    column: WeakColumn,
    row: usize,
    value: CellValue,
    old: Option<(CellValue, usize)>,
    text: String,
}

impl SetValueCommand {
    pub fn new(column: &Column, row: usize, value: CellValue) -> Self {
        Self {
            column: column.downgrade(),
            row,
            value,
            old: None,
            text: format!("{}: set value of row {}", column.name(), row + 1),
        }
    }
}

impl Command for SetValueCommand {
    fn redo(&mut self) {
        if let Some(column) = self.column.upgrade() {
            self.old = column.editor().set_value(self.row, &self.value);
        }
    }

    fn undo(&mut self) {
        let (Some(column), Some((old, rows))) = (self.column.upgrade(), self.old.take()) else {
            return;
        };
        let mut editor = column.editor();
        editor.set_value(self.row, &old);
        editor.resize(rows);
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

pub struct ReplaceRangeCommand {
    column: WeakColumn,
    first: usize,
    values: ColumnBuffer,
    old: Option<(ColumnBuffer, usize)>,
    text: String,
}

impl ReplaceRangeCommand {
    pub fn new(column: &Column, first: usize, values: ColumnBuffer) -> Self {
        Self {
            text: format!("{}: replace {} values", column.name(), values.len()),
            column: column.downgrade(),
            first,
            values,
            old: None,
        }
    }
}

impl Command for ReplaceRangeCommand {
    fn redo(&mut self) {
        if let Some(column) = self.column.upgrade() {
            self.old = column.editor().replace(self.first, &self.values);
        }
    }

    fn undo(&mut self) {
        let (Some(column), Some((old, rows))) = (self.column.upgrade(), self.old.take()) else {
            return;
        };
        let mut editor = column.editor();
        editor.replace(self.first, &old);
        editor.resize(rows);
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

pub struct InsertRowsCommand {
    column: WeakColumn,
    before: usize,
    count: usize,
    text: String,
}

impl InsertRowsCommand {
    pub fn new(column: &Column, before: usize, count: usize) -> Self {
        Self {
            column: column.downgrade(),
            before,
            count,
            text: format!("{}: insert {} rows", column.name(), count),
        }
    }
}

impl Command for InsertRowsCommand {
    fn redo(&mut self) {
        if let Some(column) = self.column.upgrade() {
            column.editor().insert_rows(self.before, self.count);
        }
    }

    fn undo(&mut self) {
        if let Some(column) = self.column.upgrade() {
            column.editor().remove_rows(self.before, self.count);
        }
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

pub struct SetModeCommand {
    column: WeakColumn,
    mode: ColumnMode,
    old: Option<ColumnBuffer>,
    text: String,
}

impl SetModeCommand {
    pub fn new(column: &Column, mode: ColumnMode) -> Self {
        Self {
            column: column.downgrade(),
            mode,
            old: None,
            text: format!("{}: change column type to {}", column.name(), mode),
        }
    }
}

impl Command for SetModeCommand {
    fn redo(&mut self) {
        if let Some(column) = self.column.upgrade() {
            self.old = Some(column.editor().set_mode(self.mode));
        }
    }

    fn undo(&mut self) {
        let (Some(column), Some(old)) = (self.column.upgrade(), self.old.take()) else {
            return;
        };
        column.editor().replace_buffer(old);
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

pub struct SetWidthCommand {
    column: WeakColumn,
    width: i32,
    old: Option<i32>,
    text: String,
}

impl SetWidthCommand {
    pub fn new(column: &Column, width: i32) -> Self {
        Self {
            column: column.downgrade(),
            width,
            old: None,
            text: format!("{}: change width", column.name()),
        }
    }
}

impl Command for SetWidthCommand {
    fn redo(&mut self) {
        if let Some(column) = self.column.upgrade() {
            self.old = Some(column.editor().set_width(self.width));
        }
    }

    fn undo(&mut self) {
        if let (Some(column), Some(old)) = (self.column.upgrade(), self.old.take()) {
            column.editor().set_width(old);
        }
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

pub struct SetPlotDesignationCommand {
    column: WeakColumn,
    designation: PlotDesignation,
    old: Option<PlotDesignation>,
    text: String,
}

impl SetPlotDesignationCommand {
    pub fn new(column: &Column, designation: PlotDesignation) -> Self {
        Self {
            column: column.downgrade(),
            designation,
            old: None,
            text: format!("{}: set plot designation", column.name()),
        }
    }
}

impl Command for SetPlotDesignationCommand {
    fn redo(&mut self) {
        if let Some(column) = self.column.upgrade() {
            self.old = Some(column.editor().set_plot_designation(self.designation));
        }
    }

    fn undo(&mut self) {
        if let (Some(column), Some(old)) = (self.column.upgrade(), self.old.take()) {
            column.editor().set_plot_designation(old);
        }
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}
