//! Sheetd error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("workbook file '{0}' not found")]
    FileNotFound(String),

    #[error("invalid workbook file name '{0}'")]
    InvalidFileName(String),

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("row {0} out of range")]
    RowOutOfRange(usize),

    #[error("column {0} out of range")]
    ColumnOutOfRange(usize),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("malformed workbook: {0}")]
    Malformed(serde_json::Error),

    #[error("invalid arguments: {0}")]
    InvalidArguments(serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
