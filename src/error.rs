//! Error types for translation and init data loading

use thiserror::Error;

/// Errors surfaced by a single translation request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("invalid virtual address: {input:?}")]
    InvalidAddress { input: String },

    #[error("invalid page size {0}: must be a positive power of two")]
    InvalidPageSize(u64),

    #[error("segmentation fault: page {page} is neither mapped nor on disk")]
    SegFault { page: u64 },

    #[error("physical address overflow: frame {frame} x {page_size} + {offset}")]
    AddressOverflow {
        frame: usize,
        page_size: u64,
        offset: u64,
    },

    #[error("no physical frames available")]
    NoFrames,
}

/// Errors from reading init files and address lists
#[derive(Error, Debug)]
pub enum InitError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl InitError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        InitError::Parse {
            line,
            message: message.into(),
        }
    }
}
