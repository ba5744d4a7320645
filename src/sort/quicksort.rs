//! Seven-way multi-key quicksort over B* partitions.
//!
//! Suffixes are compared four bytes at a time through big-endian
//! comparand words. Each level of the sort partitions a group that
//! already agrees on `depth` bytes around three pivots; the three
//! "equal" regions descend with `depth + 4` while the others keep
//! their depth. Recursion is replaced by an explicit frame stack:
//! worst-case inputs push far beyond any reasonable native stack.

use super::scan::{suffix_ge, suffix_word};
use super::tandem::{self, RepeatGroup};
use super::word::SaWord;

pub const INSERTION_SORT_THRESHOLD: usize = 16;

/// Minimum shared depth before tandem repeat detection is worth
/// attempting: the two-byte bucket key plus two comparand words.
pub const MIN_TANDEM_DEPTH: usize = 2 + 4 + 4;

#[derive(Debug, Clone, Copy)]
pub struct Frame {
    begin: usize,
    end: usize,
    depth: usize,
    starting: u32,
    ending: [u32; 2],
}

#[inline]
fn word_at(text: &[u8], depth: usize, entry: SaWord) -> u32 {
    suffix_word(text, depth + entry.index())
}

/// Whether the most recent comparand window could contain a repeat of
/// the starting pattern. A cheap necessary condition for a tandem
/// repeat: some 32-bit window of the last eight pattern bytes equals
/// the pattern the partition started with.
fn has_potential_repeats(starting: u32, ending: [u32; 2]) -> bool {
    let mut window = [0u8; 8];
    window[..4].copy_from_slice(&ending[0].to_le_bytes());
    window[4..].copy_from_slice(&ending[1].to_le_bytes());
    (0..4).any(|i| {
        u32::from_le_bytes([window[i], window[i + 1], window[i + 2], window[i + 3]]) == starting
    })
}

/// Sort one two-byte B* bucket in place.
///
/// `part` holds the bucket's suffixes, all agreeing on the two key
/// bytes. `base` is the bucket's absolute start in the B* region, so
/// deferred repeat groups can be located later. `stack` is this
/// worker's reusable frame stack.
pub fn sort_bucket(
    text: &[u8],
    part: &mut [SaWord],
    base: u32,
    key: u16,
    repeats: &mut Vec<RepeatGroup>,
    stack: &mut Vec<Frame>,
) {
    stack.clear();
    stack.push(Frame {
        begin: 0,
        end: part.len(),
        depth: 2,
        starting: 0,
        ending: [0, key as u32],
    });

    while let Some(frame) = stack.pop() {
        let Frame {
            mut begin,
            end,
            depth,
            mut starting,
            ending,
        } = frame;
        let mut size = end - begin;
        if size < 2 {
            continue;
        }

        if depth >= MIN_TANDEM_DEPTH {
            if depth == MIN_TANDEM_DEPTH {
                starting = word_at(text, 0, part[begin]);
            }
            if has_potential_repeats(starting, ending) {
                begin += tandem::partition_repeats(text, part, begin, end, depth, base, repeats);
                size = end - begin;
            }
        }

        if size < INSERTION_SORT_THRESHOLD {
            insertion_sort(text, part, begin, end, depth, starting, ending, base, repeats);
            continue;
        }

        // five pivot candidates, ordered by a fixed nine-compare
        // network; candidates 1, 3, 5 become the pivots
        let sixth = size / 6;
        let c1 = begin + sixth;
        let c2 = c1 + sixth;
        let c3 = c2 + sixth;
        let c4 = c3 + sixth;
        let c5 = c4 + sixth;
        let mut v1 = word_at(text, depth, part[c1]);
        let mut v2 = word_at(text, depth, part[c2]);
        let mut v3 = word_at(text, depth, part[c3]);
        let mut v4 = word_at(text, depth, part[c4]);
        let mut v5 = word_at(text, depth, part[c5]);
        macro_rules! order {
            ($pa:expr, $va:ident, $pb:expr, $vb:ident) => {
                if $va > $vb {
                    part.swap($pa, $pb);
                    std::mem::swap(&mut $va, &mut $vb);
                }
            };
        }
        order!(c1, v1, c2, v2);
        order!(c4, v4, c5, v5);
        order!(c1, v1, c3, v3);
        order!(c2, v2, c3, v3);
        order!(c1, v1, c4, v4);
        order!(c3, v3, c4, v4);
        order!(c2, v2, c5, v5);
        order!(c2, v2, c3, v3);
        order!(c4, v4, c5, v5);
        let pivot1 = v1;
        let pivot2 = v3;
        let pivot3 = v5;

        // single-pass seven-way partition; a pivot tie collapses its
        // "equal" region to empty through the same arithmetic
        let mut cur = begin;
        let mut begin_p1 = begin;
        let mut end_p1 = begin;
        let mut begin_p2 = begin;
        let mut end_p2 = (end - 1) as isize;
        let mut begin_p3 = end_p2;
        let mut end_p3 = end_p2;

        part.swap(cur, c1);
        cur += 1;
        if pivot1 != pivot2 {
            begin_p2 += 1;
            end_p1 += 1;
        }
        part.swap(cur, c3);
        cur += 1;
        if pivot2 != pivot3 {
            part.swap(end_p2 as usize, c5);
            end_p2 -= 1;
            begin_p3 -= 1;
        }

        while cur as isize <= end_p2 {
            let value = word_at(text, depth, part[cur]);
            if value <= pivot2 {
                if value < pivot2 {
                    part.swap(begin_p2, cur);
                    if value <= pivot1 {
                        if value < pivot1 {
                            part.swap(begin_p1, begin_p2);
                            begin_p1 += 1;
                        }
                        part.swap(end_p1, begin_p2);
                        end_p1 += 1;
                    }
                    begin_p2 += 1;
                }
                cur += 1;
            } else {
                part.swap(end_p2 as usize, cur);
                if value >= pivot3 {
                    if value > pivot3 {
                        part.swap(end_p2 as usize, end_p3 as usize);
                        end_p3 -= 1;
                    }
                    part.swap(end_p2 as usize, begin_p3 as usize);
                    begin_p3 -= 1;
                }
                end_p2 -= 1;
            }
        }

        let end_p3 = (end_p3 + 1) as usize;
        let begin_p3 = (begin_p3 + 1) as usize;
        let end_p2 = (end_p2 + 1) as usize;
        let deeper = depth + 4;
        if end_p3 != end {
            stack.push(Frame { begin: end_p3, end, depth, starting, ending });
        }
        if begin_p3 != end_p3 {
            stack.push(Frame {
                begin: begin_p3,
                end: end_p3,
                depth: deeper,
                starting,
                ending: [ending[1], pivot3],
            });
        }
        if end_p2 != begin_p3 {
            stack.push(Frame { begin: end_p2, end: begin_p3, depth, starting, ending });
        }
        if begin_p2 != end_p2 {
            stack.push(Frame {
                begin: begin_p2,
                end: end_p2,
                depth: deeper,
                starting,
                ending: [ending[1], pivot2],
            });
        }
        if end_p1 != begin_p2 {
            stack.push(Frame { begin: end_p1, end: begin_p2, depth, starting, ending });
        }
        if begin_p1 != end_p1 {
            stack.push(Frame {
                begin: begin_p1,
                end: end_p1,
                depth: deeper,
                starting,
                ending: [ending[1], pivot1],
            });
        }
        if begin != begin_p1 {
            stack.push(Frame { begin, end: begin_p1, depth, starting, ending });
        }
    }
}

/// Create a worker's reusable frame stack, sized so depth spikes do
/// not reallocate mid-sort.
pub fn new_frame_stack() -> Vec<Frame> {
    Vec::with_capacity(1 << 15)
}

/// Multi-key insertion sort for partitions below the threshold.
///
/// Orders the group by the next comparand word, then works through
/// the equal-value runs with a fixed-capacity local stack; runs of
/// size two resolve with one full suffix comparison.
fn insertion_sort(
    text: &[u8],
    part: &mut [SaWord],
    begin: usize,
    end: usize,
    depth: usize,
    starting: u32,
    ending: [u32; 2],
    base: u32,
    repeats: &mut Vec<RepeatGroup>,
) {
    let size = end - begin;
    if size < 2 {
        return;
    }

    #[derive(Clone, Copy)]
    struct Run {
        depth: usize,
        size: usize,
        starting: u32,
        ending: u32,
        potential: bool,
    }
    let mut stack = [Run { depth: 0, size: 0, starting: 0, ending: 0, potential: false };
        INSERTION_SORT_THRESHOLD];
    stack[0] = Run { depth, size, starting, ending: ending[0], potential: false };
    let mut top = 1;
    let mut begin = begin;

    while top > 0 {
        top -= 1;
        let Run { depth, mut size, mut starting, ending, potential } = stack[top];

        if size <= 2 {
            if size == 2
                && suffix_ge(
                    text,
                    depth + part[begin].index(),
                    depth + part[begin + 1].index(),
                )
            {
                part.swap(begin, begin + 1);
            }
            begin += size;
            continue;
        }

        if depth >= MIN_TANDEM_DEPTH && potential {
            let eaten = tandem::partition_repeats(text, part, begin, begin + size, depth, base, repeats);
            size -= eaten;
            begin += eaten;
            if size == 0 {
                continue;
            }
        }

        let mut value = [0u32; INSERTION_SORT_THRESHOLD];
        value[0] = word_at(text, depth, part[begin]);
        for i in 1..size {
            let entry = part[begin + i];
            let current = word_at(text, depth, entry);
            let mut j = i;
            while j > 0 && value[j - 1] > current {
                value[j] = value[j - 1];
                part[begin + j] = part[begin + j - 1];
                j -= 1;
            }
            value[j] = current;
            part[begin + j] = entry;
        }

        // queue the equal-value runs right to left, so the leftmost
        // run is handled next and `begin` stays a simple cursor
        let deeper = depth + 4;
        let mut i = size as isize - 1;
        while i >= 0 {
            let start = i as usize;
            i -= 1;
            let run_value = value[start];
            while i >= 0 && value[i as usize] == run_value {
                i -= 1;
            }
            let run = start as isize - i;
            let potential = has_potential_repeats(starting, [ending, run_value]);
            if deeper == 2 + 4 {
                starting = word_at(text, 0, part[begin]);
            }
            stack[top] = Run {
                depth: deeper,
                size: run as usize,
                starting,
                ending: run_value,
                potential,
            };
            top += 1;
        }
    }
}
