use super::buckets::KindCounts;
use super::scan::{count_suffix_kinds, suffix_type_at, SuffixType};
use super::build_suffix_array;
use proptest::prelude::*;
use rand::random;
use std::ops::Range;

/// Brute force reference: sort every suffix offset (the sentinel
/// included) by full suffix comparison.
fn naive_suffix_array(text: &[u8]) -> Vec<u32> {
    let mut sa: Vec<u32> = (0..=text.len() as u32).collect();
    sa.sort_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));
    sa
}

/// Linear-time suffix array check: permutation, sentinel first, and
/// consecutive suffixes ordered by first byte with ties resolved by
/// the ranks of the following suffixes.
fn assert_valid_suffix_array(text: &[u8], sa: &[u32]) {
    let n = text.len();
    assert_eq!(sa.len(), n + 1);
    assert_eq!(sa[0] as usize, n, "sentinel must come first");

    let mut rank = vec![0u32; n + 1];
    let mut seen = vec![false; n + 1];
    for (r, &p) in sa.iter().enumerate() {
        let p = p as usize;
        assert!(p <= n, "entry {:#x} is out of range or flagged", p);
        assert!(!seen[p], "offset {} appears twice", p);
        seen[p] = true;
        rank[p] = r as u32;
    }

    for i in 2..sa.len() {
        let a = sa[i - 1] as usize;
        let b = sa[i] as usize;
        assert!(
            text[a] <= text[b],
            "suffixes {} and {} are out of order",
            a,
            b
        );
        if text[a] == text[b] {
            assert!(
                rank[a + 1] < rank[b + 1],
                "suffixes {} and {} are out of order",
                a,
                b
            );
        }
    }
}

fn check(text: &[u8]) {
    let sa = build_suffix_array(text, 1).unwrap();
    assert_valid_suffix_array(text, &sa);
    assert_eq!(sa, naive_suffix_array(text), "text = {:?}", text);
    for &threads in &[2, 4, 7] {
        assert_eq!(
            sa,
            build_suffix_array(text, threads).unwrap(),
            "threads = {}, text = {:?}",
            threads,
            text
        );
    }
}

fn gen_bytes(len: Range<usize>, scale: Range<u8>) -> Vec<u8> {
    let n = len.start + random::<u32>() as usize % (len.end - len.start);
    let k = scale.start + random::<u8>() % (scale.end - scale.start);
    (0..n).map(|_| random::<u8>() % k).collect()
}

#[test]
fn banana() {
    let sa = build_suffix_array(b"banana\x00", 1).unwrap();
    assert_eq!(sa, [7, 6, 5, 3, 1, 0, 4, 2]);
    check(b"banana\x00");
}

#[test]
fn uniform_run() {
    let sa = build_suffix_array(b"aaaaa", 1).unwrap();
    assert_eq!(sa, [5, 4, 3, 2, 1, 0]);
    check(b"aaaaa");
}

#[test]
fn alternating_runs() {
    let sa = build_suffix_array(b"abababab\x00", 1).unwrap();
    assert_eq!(sa, [9, 8, 6, 4, 2, 0, 7, 5, 3, 1]);

    let sa = build_suffix_array(b"babababa\x00", 1).unwrap();
    assert_eq!(sa, [9, 8, 7, 5, 3, 1, 6, 4, 2, 0]);
}

#[test]
fn tiny_inputs() {
    check(b"");
    check(b"x");
    check(b"ab");
    check(b"ba");
    check(b"aab\x00");
    check(b"\x00\x00");
    check(b"\xff\x00\xff");
}

#[test]
fn random_small_alphabets() {
    for _ in 0..200 {
        let text = gen_bytes(0..200, 1..6);
        check(&text);
    }
}

#[test]
fn random_full_alphabet() {
    for _ in 0..100 {
        let text = gen_bytes(0..512, 1..255);
        check(&text);
    }
}

#[test]
fn random_medium_inputs() {
    for _ in 0..10 {
        let text = gen_bytes(1024..4096, 1..8);
        let sa = build_suffix_array(&text, 4).unwrap();
        assert_valid_suffix_array(&text, &sa);
        assert_eq!(sa, naive_suffix_array(&text));
    }
}

#[test]
fn bulk_scan_agrees_with_pointwise_types() {
    for _ in 0..50 {
        let text = gen_bytes(2..300, 1..6);
        if text.len() < 2 {
            continue;
        }

        let mut scanned = KindCounts::new();
        count_suffix_kinds(&text, 0, text.len() - 1, &mut scanned);

        let mut pointwise = KindCounts::new();
        for p in 0..text.len() - 1 {
            let key = ((text[p] as usize) << 8) | text[p + 1] as usize;
            match suffix_type_at(&text, p) {
                SuffixType::B => pointwise.b[key] += 1,
                SuffixType::A => pointwise.a[key] += 1,
                SuffixType::BStar => pointwise.bstar[key] += 1,
            }
        }

        assert_eq!(scanned.a, pointwise.a, "text = {:?}", text);
        assert_eq!(scanned.b, pointwise.b, "text = {:?}", text);
        assert_eq!(scanned.bstar, pointwise.bstar, "text = {:?}", text);
    }
}

#[test]
fn periodic_with_terminators() {
    let units: [&[u8]; 4] = [b"ab", b"ba", b"aab", b"abc"];
    let tails: [&[u8]; 4] = [b"", b"a", b"z", b"\x00"];
    for unit in units.iter() {
        for tail in tails.iter() {
            for &k in &[8usize, 50, 300] {
                let mut text = Vec::with_capacity(unit.len() * k + tail.len());
                for _ in 0..k {
                    text.extend_from_slice(unit);
                }
                text.extend_from_slice(tail);
                check(&text);
            }
        }
    }
}

#[test]
fn tandem_repeat_fuzz() {
    for _ in 0..20 {
        let unit_a = gen_bytes(1..4, 1..5);
        let unit_b = gen_bytes(1..4, 1..5);
        let k = 1 + random::<u32>() as usize % 100_000;
        let mut text = Vec::with_capacity((unit_a.len() + unit_b.len()) * k + 8);
        for _ in 0..k {
            text.extend_from_slice(&unit_a);
            text.extend_from_slice(&unit_b);
        }
        text.extend_from_slice(&gen_bytes(0..8, 1..255));

        let sa = build_suffix_array(&text, 4).unwrap();
        assert_valid_suffix_array(&text, &sa);
        assert_eq!(sa, build_suffix_array(&text, 1).unwrap());
    }
}

#[test]
fn long_alternating_run() {
    let text: Vec<u8> = b"ab".iter().cloned().cycle().take(1_000_000).collect();
    let sa = build_suffix_array(&text, 4).unwrap();
    assert_valid_suffix_array(&text, &sa);
}

#[test]
fn long_uniform_run() {
    let text = vec![0x61u8; 300_000];
    let sa = build_suffix_array(&text, 4).unwrap();
    assert_valid_suffix_array(&text, &sa);
}

proptest! {
    #[test]
    fn matches_naive_on_random_texts(text in prop::collection::vec(any::<u8>(), 0..512)) {
        let sa = build_suffix_array(&text, 1).unwrap();
        prop_assert_eq!(sa, naive_suffix_array(&text));
    }

    #[test]
    fn matches_naive_on_repetitive_texts(text in prop::collection::vec(0u8..4, 0..1024)) {
        let sa = build_suffix_array(&text, 4).unwrap();
        prop_assert_eq!(sa, naive_suffix_array(&text));
    }
}
