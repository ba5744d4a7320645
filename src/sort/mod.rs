//! Suffix array construction: a parallel improved two-stage sort.
//!
//! The first stage classifies every suffix as type A, B or B*,
//! radix-places the B* suffixes by their two leading bytes and sorts
//! each bucket with a multi-key quicksort, deferring tandem repeat
//! groups for induced completion. The second stage spreads the
//! sorted B* suffixes into the canonical bucket layout and induces
//! first the B suffixes (right to left), then the A suffixes (left
//! to right).
//!
//! Every phase dispatches its workers and joins them at a barrier
//! before the next phase starts. The requested worker count only
//! controls how work is decomposed; scheduling is the caller's
//! thread pool policy.

mod buckets;
mod induce;
mod quicksort;
mod scan;
mod shared;
mod tandem;
#[cfg(test)]
mod tests;
mod word;

use crate::error::{Error, Result};
use buckets::{BucketTable, KindCounts, RADIX2};
use shared::{run_workers, SharedWords};
use std::sync::atomic::{AtomicIsize, Ordering};
use tandem::RepeatGroup;
use word::{words_mut, SaWord};

/// Longest supported input: offsets must fit the 30-bit payload.
pub const MAX_TEXT_LEN: usize = (1 << 30) - 1;

/// Build the suffix array of `text`, decomposing work for `threads`
/// workers.
///
/// The result has `text.len() + 1` entries; entry 0 is the sentinel
/// (the empty suffix, `text.len()`), and the rest are the suffix
/// offsets in lexicographic order under byte comparison with an
/// implicit sentinel smaller than every byte.
pub fn build_suffix_array(text: &[u8], threads: usize) -> Result<Vec<u32>> {
    if text.len() > MAX_TEXT_LEN {
        return Err(Error::InputTooLarge(text.len()));
    }
    let mut sa = vec![0u32; text.len() + 1];
    construct(text, threads, words_mut(&mut sa));
    Ok(sa)
}

fn effective_threads(requested: usize) -> usize {
    #[cfg(feature = "parallel")]
    {
        requested.max(1)
    }
    #[cfg(not(feature = "parallel"))]
    {
        let _ = requested;
        1
    }
}

fn construct(text: &[u8], threads: usize, sa: &mut [SaWord]) {
    debug_assert_eq!(sa.len(), text.len() + 1);
    if text.is_empty() {
        sa[0] = SaWord::offset(0);
        return;
    }
    let threads = effective_threads(threads);
    let mut bkt = first_stage(text, threads, sa);
    second_stage(text, threads, sa, &mut bkt);
}

/// Split the scanned positions `0..n-1` into one contiguous range per
/// worker. The final position never enters the scans; its bucket is
/// accounted for separately.
fn worker_ranges(n: usize, threads: usize) -> Vec<(usize, usize)> {
    let scanned = n - 1;
    let per = (n + threads - 1) / threads;
    (0..threads)
        .map(|w| ((per * w).min(scanned), (per * (w + 1)).min(scanned)))
        .collect()
}

fn first_stage(text: &[u8], threads: usize, sa: &mut [SaWord]) -> BucketTable {
    let n = text.len();
    let ranges = worker_ranges(n, threads);

    // count A/B/B* per two-byte bucket
    let mut counts: Vec<KindCounts> = (0..threads).map(|_| KindCounts::new()).collect();
    {
        let ranges = &ranges;
        run_workers(&mut counts, |w, kinds| {
            let (lo, hi) = ranges[w];
            scan::count_suffix_kinds(text, lo, hi, kinds);
        });
    }
    let mut bkt = BucketTable::assemble(&counts, text[n - 1]);

    // the inverse-array scratch overlays the upper half of the
    // suffix array, which the B* prefix must stay clear of
    let isa_base = (n + 1) >> 1;
    assert!(bkt.bstar_total as usize <= isa_base);

    let shared = SharedWords::new(&mut *sa);

    // radix-place the B* suffixes
    {
        let ranges = &ranges;
        let mut cursor_lanes: Vec<&mut [u32]> = bkt.bstar_cursors.chunks_mut(RADIX2).collect();
        let shared = &shared;
        run_workers(&mut cursor_lanes, |w, cursors| {
            let (lo, hi) = ranges[w];
            scan::place_bstar(text, lo, hi, cursors, shared);
        });
    }

    // sort the non-empty buckets off a shared work queue, largest
    // partitions first
    let mut repeat_lanes: Vec<Vec<RepeatGroup>> =
        (0..threads).map(|_| Vec::with_capacity(1024)).collect();
    {
        let queue = AtomicIsize::new(bkt.partitions.len() as isize);
        let partitions = &bkt.partitions;
        let shared = &shared;
        run_workers(&mut repeat_lanes, |_, repeats| {
            let mut frames = quicksort::new_frame_stack();
            loop {
                let i = queue.fetch_sub(1, Ordering::Relaxed) - 1;
                if i < 0 {
                    break;
                }
                let (start, len, key) = partitions[i as usize];
                // SAFETY: bucket partitions are disjoint and the queue
                // hands each one to a single worker
                let part = unsafe { shared.slice_mut(start as usize, (start + len) as usize) };
                quicksort::sort_bucket(text, part, start, key, repeats, &mut frames);
            }
        });
    }

    // induce the deferred tandem repeat groups
    run_workers(&mut repeat_lanes, |_, repeats| {
        tandem::complete_repeats(text, &shared, isa_base, repeats);
    });
    drop(shared);

    spread_bstar(sa, &bkt);
    sa[0] = SaWord::tagged(n as u32, true);
    bkt
}

/// Spread the sorted B* prefix into the canonical bucket layout:
/// per two-byte bucket, untouched A slots, then the sorted B*
/// suffixes, then unsorted-B sentinels for induction to fill.
fn spread_bstar(sa: &mut [SaWord], bkt: &BucketTable) {
    let mut dst = sa.len();
    let mut src = bkt.bstar_total as usize;
    for key in (0..RADIX2).rev() {
        let a = bkt.a2[key] as usize;
        let b = bkt.b2[key] as usize;
        if a == 0 && b == 0 {
            continue;
        }
        let bstar = bkt.bstar2[key] as usize;
        dst -= b;
        src -= bstar;
        sa.copy_within(src..src + bstar, dst);
        for slot in sa[dst + bstar..dst + b].iter_mut() {
            *slot = SaWord::UNSORTED_B_SLOT;
        }
        dst -= a;
        for slot in sa[dst..dst + a].iter_mut() {
            *slot = SaWord::EMPTY_A_SLOT;
        }
    }
    debug_assert_eq!(dst, 1);
    debug_assert_eq!(src, 0);
}

fn second_stage(text: &[u8], threads: usize, sa: &mut [SaWord], bkt: &mut BucketTable) {
    #[cfg(feature = "parallel")]
    {
        if threads > 1 {
            induce::right_to_left_parallel(text, sa, bkt, threads);
            induce::left_to_right_parallel(text, sa, bkt, threads);
            return;
        }
    }
    let _ = threads;
    induce::right_to_left_single(text, sa, bkt);
    induce::left_to_right_single(text, sa, bkt);
}
