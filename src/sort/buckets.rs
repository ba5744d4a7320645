//! Bucket bookkeeping for both construction stages.

pub const RADIX: usize = 0x100;
pub const RADIX2: usize = 0x10000;

/// Per-worker histogram triple produced by the classification scan.
pub struct KindCounts {
    pub a: Vec<u32>,
    pub b: Vec<u32>,
    pub bstar: Vec<u32>,
}

impl KindCounts {
    pub fn new() -> Self {
        KindCounts {
            a: vec![0; RADIX2],
            b: vec![0; RADIX2],
            bstar: vec![0; RADIX2],
        }
    }

    /// Count one position under its scan state and two-byte key.
    #[inline]
    pub fn bump(&mut self, state: u32, key: usize) {
        match state & 3 {
            0 => self.b[key] += 1,
            2 => self.bstar[key] += 1,
            _ => self.a[key] += 1,
        }
    }
}

/// Merged bucket table: histograms, roll-ups and the cursor tables
/// driving B* placement and the two induction passes.
pub struct BucketTable {
    /// A count per two-byte key `(first << 8) | second`.
    pub a2: Vec<u32>,
    /// B count per two-byte key, B* included.
    pub b2: Vec<u32>,
    /// B* count per two-byte key.
    pub bstar2: Vec<u32>,
    /// Single-byte roll-up of `a2`.
    pub a1: Vec<u32>,
    /// Single-byte roll-up of `b2`.
    pub b1: Vec<u32>,
    /// First slot of each first-byte super bucket; advanced by the
    /// left-to-right induction pass.
    pub front: Vec<u32>,
    /// One past the last slot of bucket `(first, second)`, indexed by
    /// `(second << 8) | first`; walked down by the right-to-left pass.
    pub back: Vec<u32>,
    /// Per-worker B* placement cursors, `workers * RADIX2` entries.
    pub bstar_cursors: Vec<u32>,
    /// Total number of B* suffixes.
    pub bstar_total: u32,
    /// `(start, len, key)` of every non-empty B* bucket, in ascending
    /// order of length so the shared work queue hands out the largest
    /// partitions first.
    pub partitions: Vec<(u32, u32, u16)>,
}

impl BucketTable {
    /// Merge the per-worker histograms and derive every cursor table.
    /// `last` is the final byte of the text, whose suffix the scans
    /// never visit.
    pub fn assemble(counts: &[KindCounts], last: u8) -> BucketTable {
        let workers = counts.len();
        let mut a2 = vec![0u32; RADIX2];
        let mut b2 = vec![0u32; RADIX2];
        let mut bstar2 = vec![0u32; RADIX2];
        let mut a1 = vec![0u32; RADIX];
        let mut b1 = vec![0u32; RADIX];

        a2[(last as usize) << 8] += 1;
        a1[last as usize] += 1;
        for worker in counts {
            for key in 0..RADIX2 {
                a2[key] += worker.a[key];
                a1[key >> 8] += worker.a[key];
                b2[key] += worker.b[key];
                b1[key >> 8] += worker.b[key] + worker.bstar[key];
            }
        }

        let mut front = vec![0u32; RADIX];
        let mut back = vec![0u32; RADIX2];
        let mut bstar_cursors = vec![0u32; workers * RADIX2];
        let mut partitions = Vec::new();

        let mut total = 1u32; // slot 0 is the sentinel
        let mut bstar_total = 0u32;
        for i in 0..RADIX {
            front[i] = total;
            for j in 0..RADIX {
                let key = (i << 8) | j;
                let partition_start = bstar_total;
                for w in 0..workers {
                    bstar_cursors[w * RADIX2 + key] = bstar_total;
                    bstar2[key] += counts[w].bstar[key];
                    bstar_total += counts[w].bstar[key];
                    b2[key] += counts[w].bstar[key];
                }
                total += b2[key] + a2[key];
                back[(j << 8) | i] = total;
                if bstar2[key] > 0 {
                    partitions.push((partition_start, bstar2[key], key as u16));
                }
            }
        }
        partitions.sort_unstable_by_key(|&(_, len, _)| len);

        BucketTable {
            a2,
            b2,
            bstar2,
            a1,
            b1,
            front,
            back,
            bstar_cursors,
            bstar_total,
            partitions,
        }
    }
}
