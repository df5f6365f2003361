use thiserror::Error;

/// Input that cannot be interpreted at a collaborator boundary.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("line {line}: column `{column}` is not numeric: {value:?}")]
    NonNumeric {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: expected {expected} columns, got {got}")]
    ColumnCount {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("missing header column `{0}`")]
    MissingColumn(&'static str),

    #[error("unknown coordinate origin: {0}")]
    UnknownOrigin(String),

    #[error("cannot derive a page number from {0:?}")]
    PageNumber(String),

    #[error("invalid page dimensions {width}x{height}")]
    PageSize { width: f64, height: f64 },

    #[error("malformed annotation value: {0}")]
    Annotation(#[from] serde_json::Error),
}
