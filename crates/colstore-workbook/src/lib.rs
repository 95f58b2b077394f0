//! Spreadsheet container and XML persistence for colstore columns.

pub mod error;
pub mod spreadsheet;
pub mod xml;

pub use error::{LoadError, LoadWarning, WorkbookError};
pub use spreadsheet::{Spreadsheet, WorkbookConfig};
pub use xml::{column_to_xml, load_column, read_column, write_column};
