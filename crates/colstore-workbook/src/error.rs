use colstore_common::TokenParseError;
use thiserror::Error;

/// A column record that cannot be restored.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("XML escape error: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    #[error("text is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("column '{column}': attribute '{attribute}' missing or empty")]
    MissingAttribute {
        column: String,
        attribute: &'static str,
    },
    #[error("column '{column}': invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute {
        column: String,
        attribute: &'static str,
        value: String,
    },
    #[error("column '{column}': {source}")]
    UnknownMode {
        column: String,
        #[source]
        source: TokenParseError,
    },
    #[error("column '{column}': row {index} holds unreadable value '{body}'")]
    BadRow {
        column: String,
        index: usize,
        body: String,
    },
    #[error("column '{column}': row {index} lies outside the {rows} rows allowed")]
    RowOutOfRange {
        column: String,
        index: usize,
        rows: usize,
    },
    #[error("expected element '{expected}', found '{found}'")]
    UnexpectedElement { expected: &'static str, found: String },
    #[error("unexpected end of document")]
    UnexpectedEof,
}

/// Recoverable problem met while loading; the value was defaulted or the
/// element skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    pub column: String,
    pub message: String,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "column '{}': {}", self.column, self.message)
    }
}

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("a column named '{0}' already exists")]
    DuplicateColumn(String),
    #[error("no column named '{0}'")]
    UnknownColumn(String),
    #[error("column index {index} out of range for {count} columns")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML write error: {0}")]
    Write(#[from] quick_xml::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
}
