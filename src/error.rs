use std::io;
use thiserror::Error;

/// Errors reported by index construction, the writer and the reader.
///
/// Each variant is one user-visible failure category, so callers can
/// distinguish usage errors (`InputTooLarge`, `EmptyQuery`) from
/// environment errors (`Io`) and damaged files (`CorruptIndex`).
#[derive(Debug, Error)]
pub enum Error {
    /// The text does not fit the 30-bit offsets of the suffix array.
    #[error("input too large: {0} bytes does not fit 30-bit suffix array offsets")]
    InputTooLarge(usize),

    /// An I/O failure at the reader or writer boundary.
    #[error("index i/o error: {0}")]
    Io(#[from] io::Error),

    /// The index file does not follow the chunk framing.
    #[error("corrupt index file: {0}")]
    CorruptIndex(&'static str),

    /// Searching for the empty string is rejected.
    #[error("empty search pattern")]
    EmptyQuery,
}

pub type Result<T> = std::result::Result<T, Error>;
