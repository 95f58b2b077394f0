//! Meta crate that re-exports the colstore building blocks. Downstream
//! users can depend on this crate and opt into layers via feature flags
//! while keeping access to the underlying crates.

#[cfg(feature = "common")]
pub use colstore_common as common;

#[cfg(feature = "parse")]
pub use colstore_parse as parse;

#[cfg(feature = "eval")]
pub use colstore_eval as eval;

#[cfg(feature = "workbook")]
pub use colstore_workbook as workbook;

#[cfg(feature = "common")]
pub use colstore_common::{ColumnMode, Interval, PlotDesignation, Properties};

#[cfg(feature = "eval")]
pub use colstore_eval::{
    CellValue, Column, ColumnBuffer, ColumnConfig, ColumnEvent, ColumnObserver, FormulaBinding,
    Statistics, UndoStack,
};

#[cfg(feature = "workbook")]
pub use colstore_workbook::{LoadError, LoadWarning, Spreadsheet, WorkbookConfig, WorkbookError};
