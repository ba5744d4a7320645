//! Index file reader and its search protocol.
//!
//! A chunk's text blob is held in memory while its suffix array stays
//! on disk. Locating a pattern is a pair of binary searches over
//! 4-byte-aligned anchors into the on-disk array; every hit in the
//! located range is then resolved to its owning entry by walking back
//! to the previous NUL in the blob.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use memchr::{memchr, memrchr};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

struct Chunk {
    text: Vec<u8>,
    /// Byte offset of the chunk's suffix array region in the file.
    sa_start: u64,
    /// Length of that region in bytes.
    sa_len: u64,
}

/// Windowed view of one chunk's on-disk suffix array.
///
/// Each search opens its own handle, so per-chunk searches stay
/// independent of each other and of the reader itself.
struct SaView {
    file: File,
    start: u64,
}

impl SaView {
    fn open(path: &Path, chunk: &Chunk) -> Result<SaView> {
        Ok(SaView {
            file: File::open(path)?,
            start: chunk.sa_start,
        })
    }

    /// Read the 4-byte slot at a byte offset within the region.
    fn slot(&mut self, offset: u64) -> Result<u32> {
        self.file.seek(SeekFrom::Start(self.start + offset))?;
        Ok(self.file.read_u32::<LittleEndian>()?)
    }
}

/// Searches a finalized index file.
pub struct IndexReader {
    path: PathBuf,
    chunks: Vec<Chunk>,
}

impl IndexReader {
    /// Open an index file and parse its chunk directory.
    ///
    /// Fails with [`Error::CorruptIndex`] if any chunk header is
    /// truncated or its suffix array length does not match its text.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<IndexReader> {
        let path = path.as_ref().to_path_buf();
        let mut file = BufReader::new(File::open(&path)?);
        let file_len = file.get_ref().metadata()?.len();

        let mut chunks = Vec::new();
        let mut pos = 0u64;
        while pos < file_len {
            if file_len - pos < 4 {
                return Err(Error::CorruptIndex("truncated chunk header"));
            }
            let text_len = file.read_u32::<LittleEndian>()? as u64;
            if file_len - pos - 4 < text_len + 4 {
                return Err(Error::CorruptIndex("truncated text blob"));
            }
            let mut text = vec![0u8; text_len as usize];
            file.read_exact(&mut text)?;
            let sa_len = file.read_u32::<LittleEndian>()? as u64;
            if sa_len % 4 != 0 {
                return Err(Error::CorruptIndex(
                    "suffix array length is not a multiple of 4",
                ));
            }
            if sa_len / 4 != text_len + 1 {
                return Err(Error::CorruptIndex(
                    "suffix array length does not match the text",
                ));
            }
            let sa_start = pos + 4 + text_len + 4;
            if file_len - sa_start < sa_len {
                return Err(Error::CorruptIndex("truncated suffix array"));
            }
            file.seek(SeekFrom::Start(sa_start + sa_len))?;
            chunks.push(Chunk {
                text,
                sa_start,
                sa_len,
            });
            pos = sa_start + sa_len;
        }
        Ok(IndexReader { path, chunks })
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// All distinct entries containing `needle`, in no particular
    /// order across chunks.
    pub fn search(&self, needle: &[u8]) -> Result<Vec<Vec<u8>>> {
        if needle.is_empty() {
            return Err(Error::EmptyQuery);
        }
        let results = Mutex::new(Vec::new());
        self.for_each_chunk(|chunk| self.search_chunk(chunk, needle, &results))?;
        Ok(results.into_inner().unwrap())
    }

    /// Number of suffix array hits of `needle` over all chunks,
    /// counting overlapping occurrences.
    pub fn count_occurrences(&self, needle: &[u8]) -> Result<u32> {
        if needle.is_empty() {
            return Err(Error::EmptyQuery);
        }
        let total = Mutex::new(0u32);
        self.for_each_chunk(|chunk| {
            let mut view = SaView::open(&self.path, chunk)?;
            if let Some((first, last)) = locate(chunk, &mut view, needle)? {
                *total.lock().unwrap() += ((last - first) / 4 + 1) as u32;
            }
            Ok(())
        })?;
        Ok(total.into_inner().unwrap())
    }

    /// Number of distinct entries containing `needle`.
    pub fn count_entries(&self, needle: &[u8]) -> Result<u32> {
        if needle.is_empty() {
            return Err(Error::EmptyQuery);
        }
        let total = Mutex::new(0u32);
        self.for_each_chunk(|chunk| {
            let mut view = SaView::open(&self.path, chunk)?;
            if let Some((first, last)) = locate(chunk, &mut view, needle)? {
                let mut starts = HashSet::new();
                let mut offset = first;
                while offset <= last {
                    starts.insert(entry_start(&chunk.text, view.slot(offset)? as usize));
                    offset += 4;
                }
                *total.lock().unwrap() += starts.len() as u32;
            }
            Ok(())
        })?;
        Ok(total.into_inner().unwrap())
    }

    /// Whether any entry contains `needle`. Stops at the first chunk
    /// with a hit.
    pub fn contains(&self, needle: &[u8]) -> Result<bool> {
        if needle.is_empty() {
            return Err(Error::EmptyQuery);
        }
        for chunk in &self.chunks {
            let mut view = SaView::open(&self.path, chunk)?;
            if locate(chunk, &mut view, needle)?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Run `f` once per chunk, in parallel when enabled, joining all
    /// chunks before returning the first error if any.
    fn for_each_chunk<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&Chunk) -> Result<()> + Sync + Send,
    {
        #[cfg(feature = "parallel")]
        {
            self.chunks.par_iter().try_for_each(f)
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.chunks.iter().try_for_each(f)
        }
    }

    fn search_chunk(
        &self,
        chunk: &Chunk,
        needle: &[u8],
        results: &Mutex<Vec<Vec<u8>>>,
    ) -> Result<()> {
        let mut view = SaView::open(&self.path, chunk)?;
        let (first, last) = match locate(chunk, &mut view, needle)? {
            Some(range) => range,
            None => return Ok(()),
        };

        let mut starts = HashSet::new();
        let mut entries = Vec::new();
        let mut offset = first;
        while offset <= last {
            let index = view.slot(offset)? as usize;
            let start = entry_start(&chunk.text, index);
            if starts.insert(start) {
                entries.push(entry_at(&chunk.text, start).to_vec());
            }
            offset += 4;
        }

        // the lock is held only for this final push
        results.lock().unwrap().extend(entries);
        Ok(())
    }
}

/// Locate the inclusive anchor range `[first, last]` of suffix array
/// slots whose suffixes start with `needle`, or `None` if the chunk
/// has no match.
///
/// Anchors are byte offsets into the on-disk region and stay 4-byte
/// aligned; slot 0 is the sentinel and never matches a non-empty
/// needle, so the search starts at anchor 4.
fn locate(chunk: &Chunk, view: &mut SaView, needle: &[u8]) -> Result<Option<(u64, u64)>> {
    if chunk.sa_len < 8 {
        return Ok(None);
    }
    let mut left = 4u64;
    let mut right = chunk.sa_len - 4;
    let mut first = None;
    let mut last = None;
    while left <= right {
        let middle = left + (right - left) / 4 / 2 * 4;
        let index = view.slot(middle)? as usize;
        match compare_needle(needle, &chunk.text, index) {
            Ordering::Less => right = middle - 4,
            Ordering::Greater => left = middle + 4,
            Ordering::Equal => {
                first = Some(middle);
                if last.is_none() {
                    last = Some(middle);
                }
                right = middle - 4;
            }
        }
    }
    let (first, mut last) = match (first, last) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(None),
    };

    let mut left = last;
    let mut right = chunk.sa_len - 4;
    while left <= right {
        let middle = left + (right - left) / 4 / 2 * 4;
        let index = view.slot(middle)? as usize;
        match compare_needle(needle, &chunk.text, index) {
            Ordering::Less => right = middle - 4,
            Ordering::Greater => left = middle + 4,
            Ordering::Equal => {
                last = middle;
                left = middle + 4;
            }
        }
    }
    Ok(Some((first, last)))
}

/// Compare the needle against the suffix at `index`, truncated at the
/// end of the blob: a suffix that is a proper prefix of the needle
/// compares smaller.
fn compare_needle(needle: &[u8], text: &[u8], index: usize) -> Ordering {
    if index >= text.len() {
        return Ordering::Greater;
    }
    let suffix = &text[index..];
    let common = needle.len().min(suffix.len());
    match needle[..common].cmp(&suffix[..common]) {
        Ordering::Equal if suffix.len() < needle.len() => Ordering::Greater,
        ordering => ordering,
    }
}

/// Start of the entry owning byte `index`: one past the previous NUL,
/// or the start of the blob.
fn entry_start(text: &[u8], index: usize) -> usize {
    match memrchr(0, &text[..index]) {
        Some(nul) => nul + 1,
        None => 0,
    }
}

/// The entry beginning at `start`, without its terminating NUL.
fn entry_at(text: &[u8], start: usize) -> &[u8] {
    match memchr(0, &text[start..]) {
        Some(nul) => &text[start..start + nul],
        None => &text[start..],
    }
}
