// src/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid cell: singular matrix (volume {0:.3e})")]
    SingularCell(f64),

    #[error("Invalid lattice: {0}")]
    InvalidLattice(String),

    #[error("Elements and coordinates differ in length ({elements} vs {coordinates})")]
    LengthMismatch { elements: usize, coordinates: usize },

    #[error("Duplicate id {0} in sequence")]
    DuplicateId(usize),

    #[error("Element id {element} does not match coordinate id {coordinate} at index {index}")]
    IdMismatch {
        index: usize,
        element: usize,
        coordinate: usize,
    },

    #[error("Malformed transformation matrix: {0}")]
    MalformedTransformation(String),

    #[error("Hash cannot be created: missing {0} in derivedProperties")]
    MissingIdentifier(String),

    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
