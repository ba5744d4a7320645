//! Tagged 32-bit words of the suffix array.
//!
//! During construction every entry carries two flag bits over a 30-bit
//! payload. The payload is a text offset, a tandem repeat period or
//! the unsorted-B sentinel. The inverse suffix array scratch region
//! shares the same layout with different flag meanings.

/// High bit of a suffix array entry: the suffix preceding this
/// entry's suffix is type A.
pub const PREC_A: u32 = 0x8000_0000;

/// Second flag bit of a suffix array entry, reserved for transient
/// bookkeeping while an entry waits for its inverse slot.
pub const MARK: u32 = 0x4000_0000;

/// Low 30 bits of an entry.
pub const PAYLOAD_MASK: u32 = !(PREC_A | MARK);

/// Payload sentinel marking a B slot not yet filled by induction.
pub const UNSORTED_B: u32 = PAYLOAD_MASK;

/// Inverse-array overlay: the payload is a tandem repeat period.
pub const IS_TANDEM_LEN: u32 = 0x8000_0000;

/// Inverse-array overlay: the entry was produced by induction.
#[allow(dead_code)]
pub const IS_INDUCED: u32 = 0x4000_0000;

/// One word of the suffix array or its inverse-array overlay.
///
/// All payload extraction goes through [`index`](SaWord::index) so
/// that flag bits can never leak into an offset computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct SaWord(u32);

impl SaWord {
    /// The still-unfilled slot of a B suffix.
    pub const UNSORTED_B_SLOT: SaWord = SaWord(UNSORTED_B);

    /// The still-unfilled slot of an A suffix: payload 0, `PREC_A`
    /// set. Also the hard chunk barrier of the left-to-right pass.
    pub const EMPTY_A_SLOT: SaWord = SaWord(PREC_A);

    /// A plain text offset with no flags.
    #[inline]
    pub fn offset(off: u32) -> SaWord {
        debug_assert_eq!(off & !PAYLOAD_MASK, 0);
        SaWord(off)
    }

    /// A text offset, optionally flagged as preceded by a type A
    /// suffix.
    #[inline]
    pub fn tagged(off: u32, prec_a: bool) -> SaWord {
        debug_assert_eq!(off & !PAYLOAD_MASK, 0);
        SaWord(off | if prec_a { PREC_A } else { 0 })
    }

    /// An inverse-array period mark for a tandem repeat chain.
    #[inline]
    pub fn period_mark(period: u32) -> SaWord {
        debug_assert_eq!(period & !PAYLOAD_MASK, 0);
        SaWord(period | IS_TANDEM_LEN)
    }

    #[inline]
    pub fn from_raw(raw: u32) -> SaWord {
        SaWord(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// The 30-bit payload as an index.
    #[inline]
    pub fn index(self) -> usize {
        (self.0 & PAYLOAD_MASK) as usize
    }

    #[inline]
    pub fn prec_a(self) -> bool {
        self.0 & PREC_A != 0
    }

    #[inline]
    pub fn is_unsorted_b(self) -> bool {
        self.0 == UNSORTED_B
    }

    #[inline]
    pub fn is_period_mark(self) -> bool {
        self.0 & IS_TANDEM_LEN != 0
    }

    /// The repeat period of an inverse-array mark.
    #[inline]
    pub fn period(self) -> usize {
        (self.0 & PAYLOAD_MASK) as usize
    }
}

/// View a zeroed `u32` buffer as suffix array words.
///
/// `SaWord` is a transparent wrapper, so layout is identical.
pub fn words_mut(sa: &mut [u32]) -> &mut [SaWord] {
    unsafe { std::slice::from_raw_parts_mut(sa.as_mut_ptr() as *mut SaWord, sa.len()) }
}
