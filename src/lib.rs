//! Disk-backed substring search index over NUL-terminated entries.
//!
//! An index file is a sequence of self-describing chunks, each holding
//! a blob of concatenated entries and the suffix array of that blob.
//! [`IndexWriter`] accumulates entries and appends a chunk whenever
//! the accumulated text outgrows the chunk capacity; [`IndexReader`]
//! answers "which entries contain this byte string" by binary search
//! over the on-disk suffix arrays, without ever materializing them in
//! memory.
//!
//! Suffix arrays are built by a parallel improved two-stage sort with
//! tandem repeat acceleration, so repetitive inputs do not blow up.
//! The construction entry point is exposed as [`build_suffix_array`]
//! for direct use.
//!
//! ```no_run
//! use substring_index::{IndexReader, IndexWriter};
//!
//! # fn main() -> substring_index::Result<()> {
//! let mut writer = IndexWriter::create("words.idx")?;
//! writer.add_entry(b"apple")?;
//! writer.add_entry(b"banana")?;
//! writer.add_entry(b"apricot")?;
//! writer.finalize()?;
//!
//! let reader = IndexReader::open("words.idx")?;
//! assert_eq!(reader.count_entries(b"ap")?, 2);
//! for entry in reader.search(b"an")? {
//!     println!("{}", String::from_utf8_lossy(&entry));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Matching is byte-exact: no normalization, no case folding.

mod error;
mod reader;
mod sort;
mod writer;

pub use crate::error::{Error, Result};
pub use crate::reader::IndexReader;
pub use crate::sort::{build_suffix_array, MAX_TEXT_LEN};
pub use crate::writer::{IndexWriter, DEFAULT_CHUNK_CAPACITY};
