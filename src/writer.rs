//! Streaming index file writer.

use crate::error::Result;
use crate::sort;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Soft cap on accumulated entry bytes before a chunk is flushed.
pub const DEFAULT_CHUNK_CAPACITY: usize = 512 * 1024 * 1024;

/// Builds an index file entry by entry.
///
/// Entries accumulate in memory as a NUL-terminated blob; whenever
/// the blob outgrows the chunk capacity, its suffix array is built
/// and both are appended to the file as one chunk. [`finalize`]
/// flushes whatever remains and may be called any number of times;
/// dropping the writer finalizes it as well, swallowing errors.
///
/// [`finalize`]: IndexWriter::finalize
pub struct IndexWriter {
    file: BufWriter<File>,
    pending: Vec<u8>,
    chunk_capacity: usize,
}

impl IndexWriter {
    /// Create or truncate the index file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<IndexWriter> {
        IndexWriter::with_chunk_capacity(path, DEFAULT_CHUNK_CAPACITY)
    }

    /// Create or truncate the index file with a custom chunk capacity.
    pub fn with_chunk_capacity<P: AsRef<Path>>(path: P, capacity: usize) -> Result<IndexWriter> {
        Ok(IndexWriter {
            file: BufWriter::new(File::create(path)?),
            pending: Vec::new(),
            chunk_capacity: capacity,
        })
    }

    /// Append one entry.
    ///
    /// The entry is stored with a terminating NUL, so an embedded NUL
    /// byte splits it into two entries.
    pub fn add_entry(&mut self, entry: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(entry);
        self.pending.push(0);
        if self.pending.len() > self.chunk_capacity {
            self.flush_chunk()?;
        }
        Ok(())
    }

    /// Flush any partial chunk and the underlying file.
    pub fn finalize(&mut self) -> Result<()> {
        self.flush_chunk()?;
        self.file.flush()?;
        Ok(())
    }

    fn flush_chunk(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let sa = sort::build_suffix_array(&self.pending, worker_count())?;
        self.file
            .write_u32::<LittleEndian>(self.pending.len() as u32)?;
        self.file.write_all(&self.pending)?;
        self.file.write_u32::<LittleEndian>((sa.len() * 4) as u32)?;
        for &slot in &sa {
            self.file.write_u32::<LittleEndian>(slot)?;
        }
        self.pending.clear();
        Ok(())
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        let _ = self.finalize();
    }
}

#[cfg(feature = "parallel")]
fn worker_count() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
fn worker_count() -> usize {
    1
}
