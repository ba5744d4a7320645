//! Second stage of the improved two-stage sort: induce sorted B
//! suffixes from the sorted B* suffixes (right-to-left pass), then
//! sorted A suffixes from the B suffixes (left-to-right pass).
//!
//! The single-threaded passes are the reference semantics; the
//! parallel passes process the array in chunks whose bounds guarantee
//! no worker can observe a slot that has not been established yet,
//! and must produce the same array byte for byte. Within a chunk,
//! three phases run to a barrier each: classify (collect the suffixes
//! to induce into per-worker caches), reserve (carve disjoint cursor
//! ranges per worker and symbol), scatter (write the caches out).

use super::buckets::BucketTable;
use super::word::SaWord;

#[cfg(feature = "parallel")]
use super::shared::{run_workers, SharedWords};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Cache entries per worker and chunk phase.
#[cfg(feature = "parallel")]
const CACHE_SIZE: usize = 1 << 12;

/// Induce the position of every B suffix from the sorted B*
/// suffixes, walking the array right to left one first-byte super
/// bucket at a time.
pub fn right_to_left_single(text: &[u8], sa: &mut [SaWord], bkt: &mut BucketTable) {
    let mut cur = text.len();
    for c in (0..0x100).rev() {
        let end = cur - bkt.b1[c] as usize;
        while cur > end {
            let word = sa[cur];
            if !word.prec_a() {
                let p = word.index() - 1;
                let symbol = text[p];
                let prec_a = !(p > 0 && text[p - 1] <= symbol);
                let slot = &mut bkt.back[(c << 8) | symbol as usize];
                *slot -= 1;
                sa[*slot as usize] = SaWord::tagged(p as u32, prec_a);
            }
            cur -= 1;
        }
        cur -= bkt.a1[c] as usize;
    }
}

/// Induce the position of every A suffix from the sorted B suffixes,
/// walking the array left to right and clearing the `PREC_A` flag of
/// every visited entry.
pub fn left_to_right_single(text: &[u8], sa: &mut [SaWord], bkt: &mut BucketTable) {
    for i in 0..sa.len() {
        let word = sa[i];
        if word.prec_a() {
            let index = word.index();
            if index != 0 {
                let p = index - 1;
                let symbol = text[p];
                let prec_a = p > 0 && text[p - 1] >= symbol;
                let slot = &mut bkt.front[symbol as usize];
                sa[*slot as usize] = SaWord::tagged(p as u32, prec_a);
                *slot += 1;
            }
            sa[i] = SaWord::offset(index as u32);
        }
    }
}

#[cfg(feature = "parallel")]
struct Lane {
    cache: Vec<(u8, SaWord)>,
    counts: [u32; 0x100],
}

#[cfg(feature = "parallel")]
fn new_lanes(threads: usize) -> Vec<Lane> {
    (0..threads)
        .map(|_| Lane {
            cache: Vec::with_capacity(CACHE_SIZE),
            counts: [0; 0x100],
        })
        .collect()
}

/// Parallel fork of the right-to-left pass.
#[cfg(feature = "parallel")]
pub fn right_to_left_parallel(
    text: &[u8],
    sa: &mut [SaWord],
    bkt: &mut BucketTable,
    threads: usize,
) {
    let mut lanes = new_lanes(threads);
    let mut dest = vec![0u32; 0x100 * threads]; // [symbol][worker]

    let mut cur = text.len();
    for c in (0..0x100).rev() {
        let end = cur - bkt.b1[c] as usize;
        while cur > end {
            // a chunk may not extend past the first unsorted B slot:
            // everything right of it is final for this pass
            let floor = cur.saturating_sub(CACHE_SIZE * threads).max(end);
            let mut barrier = cur;
            while barrier > floor && !sa[barrier].is_unsorted_b() {
                barrier -= 1;
            }
            debug_assert!(barrier < cur, "scan caught up with an unfilled slot");
            let per = (cur - barrier + threads - 1) / threads;

            let shared = SharedWords::new(sa);
            run_workers(&mut lanes, |w, lane| {
                lane.cache.clear();
                lane.counts = [0; 0x100];
                let hi = cur.saturating_sub(per * w).max(barrier);
                let lo = cur.saturating_sub(per * (w + 1)).max(barrier);
                let mut i = hi;
                while i > lo {
                    // SAFETY: `i` is inside this worker's sub-range;
                    // nothing is written during the classify phase
                    let word = unsafe { shared.read(i) };
                    if !word.prec_a() {
                        let p = word.index() - 1;
                        let symbol = text[p];
                        let prec_a = !(p > 0 && text[p - 1] <= symbol);
                        lane.cache.push((symbol, SaWord::tagged(p as u32, prec_a)));
                        lane.counts[symbol as usize] += 1;
                    }
                    i -= 1;
                }
            });

            // reserve: worker 0 scanned the rightmost sub-range, so it
            // takes the topmost cursor slice of every target bucket
            {
                let lanes = &lanes;
                let back = &mut bkt.back[(c << 8)..(c << 8) + 0x100];
                dest.par_chunks_mut(threads)
                    .zip(back.par_iter_mut())
                    .enumerate()
                    .for_each(|(symbol, (row, cursor))| {
                        for (w, lane) in lanes.iter().enumerate() {
                            row[w] = *cursor;
                            *cursor -= lane.counts[symbol];
                        }
                    });
            }

            let dest = &dest;
            run_workers(&mut lanes, |w, lane| {
                let mut cursors = [0u32; 0x100];
                for (symbol, cursor) in cursors.iter_mut().enumerate() {
                    *cursor = dest[symbol * threads + w];
                }
                for &(symbol, word) in &lane.cache {
                    let slot = &mut cursors[symbol as usize];
                    *slot -= 1;
                    // SAFETY: the reserve phase handed this worker an
                    // exclusive slot range per symbol
                    unsafe { shared.write(*slot as usize, word) };
                }
            });

            cur = barrier;
        }
        cur -= bkt.a1[c] as usize;
    }
}

/// Parallel fork of the left-to-right pass.
#[cfg(feature = "parallel")]
pub fn left_to_right_parallel(
    text: &[u8],
    sa: &mut [SaWord],
    bkt: &mut BucketTable,
    threads: usize,
) {
    let mut lanes = new_lanes(threads);
    let mut dest = vec![0u32; 0x100 * threads];

    let sa_len = sa.len();
    let mut cur = 0;
    while cur < sa_len {
        while cur < sa_len && !sa[cur].prec_a() {
            cur += 1;
        }
        if cur >= sa_len {
            break;
        }
        let begin = cur;
        let max_end = (begin + CACHE_SIZE * threads).min(sa_len);
        // an untouched A slot is a hard barrier: its suffix has not
        // been induced yet
        if cur != max_end {
            cur += 1;
        }
        while cur != max_end && sa[cur] != SaWord::EMPTY_A_SLOT {
            cur += 1;
        }
        let end = cur;
        let per = (end - begin + threads - 1) / threads;

        let shared = SharedWords::new(sa);
        run_workers(&mut lanes, |w, lane| {
            lane.cache.clear();
            lane.counts = [0; 0x100];
            let lo = (begin + per * w).min(end);
            let hi = (begin + per * (w + 1)).min(end);
            for i in lo..hi {
                // SAFETY: `i` is inside this worker's sub-range, and
                // the flag clear below writes only within it
                let word = unsafe { shared.read(i) };
                if word.prec_a() {
                    let index = word.index();
                    if index != 0 {
                        let p = index - 1;
                        let symbol = text[p];
                        let prec_a = p > 0 && text[p - 1] >= symbol;
                        lane.cache.push((symbol, SaWord::tagged(p as u32, prec_a)));
                        lane.counts[symbol as usize] += 1;
                    }
                    unsafe { shared.write(i, SaWord::offset(index as u32)) };
                }
            }
        });

        {
            let lanes = &lanes;
            dest.par_chunks_mut(threads)
                .zip(bkt.front.par_iter_mut())
                .enumerate()
                .for_each(|(symbol, (row, cursor))| {
                    for (w, lane) in lanes.iter().enumerate() {
                        row[w] = *cursor;
                        *cursor += lane.counts[symbol];
                    }
                });
        }

        let dest = &dest;
        run_workers(&mut lanes, |w, lane| {
            let mut cursors = [0u32; 0x100];
            for (symbol, cursor) in cursors.iter_mut().enumerate() {
                *cursor = dest[symbol * threads + w];
            }
            for &(symbol, word) in &lane.cache {
                let slot = &mut cursors[symbol as usize];
                // SAFETY: the reserve phase handed this worker an
                // exclusive slot range per symbol
                unsafe { shared.write(*slot as usize, word) };
                *slot += 1;
            }
        });
    }
}
