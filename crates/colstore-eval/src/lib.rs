//! Typed, undo-capable column storage.
//!
//! A [`Column`] holds one [`ColumnBuffer`] plus interval-encoded validity,
//! masking and per-row formula maps. Mutations are reversible
//! [`commands::Command`]s recorded on an optional [`UndoStack`]; formula
//! columns recompute from their arguments through [`formula`].

pub mod attributes;
pub mod buffer;
pub mod column;
pub mod commands;
pub mod config;
pub mod formula;
pub mod stats;

#[cfg(feature = "arrow")]
pub mod arrow;

pub use attributes::{IntervalAttribute, IntervalFlags};
pub use buffer::{CellValue, ColumnBuffer};
pub use column::{
    Column, ColumnCore, ColumnEditor, ColumnEvent, ColumnObserver, EventRecorder, ObserverId,
    WeakColumn,
};
pub use commands::{Command, UndoStack};
pub use config::{ColumnConfig, DEFAULT_MAX_LOADED_ROWS};
pub use formula::{FormulaBinding, FormulaVariable};
pub use stats::Statistics;

pub use colstore_common::{ColumnMode, Interval, PlotDesignation, Properties};
