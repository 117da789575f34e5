//! Error types for recal

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("bad format at line {line}: {reason}")]
    BadFormat { line: usize, reason: String },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("duplicate document id: {0}")]
    DuplicateDocument(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
