//! The Boolean algebra over alphabet predicates.
//!
//! The derivative engine never enumerates characters. It only combines and
//! tests predicates through [`Solver`], so any effective Boolean algebra with
//! a total order on its elements can serve as the alphabet.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// An effective Boolean algebra over predicates.
pub trait Solver: Send + Sync {
    /// A predicate. Equality and ordering must be canonical: two predicates
    /// denoting the same symbol set compare equal.
    type Set: Copy + Eq + Ord + Hash + Debug + Send + Sync;

    fn empty(&self) -> Self::Set;
    fn full(&self) -> Self::Set;
    fn and(&self, a: Self::Set, b: Self::Set) -> Self::Set;
    fn or(&self, a: Self::Set, b: Self::Set) -> Self::Set;
    fn not(&self, a: Self::Set) -> Self::Set;

    fn is_empty(&self, a: Self::Set) -> bool {
        a == self.empty()
    }

    fn is_full(&self, a: Self::Set) -> bool {
        a == self.full()
    }

    /// Splits the alphabet into the coarsest partition that every given
    /// predicate is a union of. The result is sorted.
    fn generate_minterms(&self, sets: &[Self::Set]) -> Vec<Self::Set> {
        let mut blocks = vec![self.full()];
        for &set in sets {
            let mut refined = Vec::with_capacity(blocks.len() * 2);
            for block in blocks {
                let inside = self.and(block, set);
                let outside = self.and(block, self.not(set));
                if !self.is_empty(inside) {
                    refined.push(inside);
                }
                if !self.is_empty(outside) {
                    refined.push(outside);
                }
            }
            blocks = refined;
        }
        blocks.sort();
        blocks
    }

    /// Symbols that count as newlines for line anchors.
    fn newline(&self) -> Self::Set;

    /// Symbols that count as word letters for `\b` and `\B`.
    fn word_letter(&self) -> Self::Set;

    /// Renders a predicate in character-class notation.
    fn pretty(&self, set: Self::Set) -> String;
}

/// A set of bytes, one bit per byte value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ByteSet([u128; 2]);

impl ByteSet {
    pub const EMPTY: ByteSet = ByteSet([0, 0]);
    pub const FULL: ByteSet = ByteSet([u128::MAX, u128::MAX]);

    pub fn byte(b: u8) -> Self {
        let mut set = Self::EMPTY;
        set.insert(b);
        set
    }

    pub fn range(lo: u8, hi: u8) -> Self {
        let mut set = Self::EMPTY;
        for b in lo..=hi {
            set.insert(b);
        }
        set
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut set = Self::EMPTY;
        for &b in bytes {
            set.insert(b);
        }
        set
    }

    pub fn digit() -> Self {
        Self::range(b'0', b'9')
    }

    /// ASCII word letters: `[0-9A-Za-z_]`.
    pub fn word() -> Self {
        Self::digit()
            .union(Self::range(b'a', b'z'))
            .union(Self::range(b'A', b'Z'))
            .union(Self::byte(b'_'))
    }

    pub fn space() -> Self {
        Self::from_bytes(b" \t\n\r\x0b\x0c")
    }

    pub fn insert(&mut self, b: u8) {
        self.0[(b >> 7) as usize] |= 1u128 << (b & 0x7f);
    }

    pub fn contains(self, b: u8) -> bool {
        self.0[(b >> 7) as usize] & (1u128 << (b & 0x7f)) != 0
    }

    pub fn union(self, other: Self) -> Self {
        ByteSet([self.0[0] | other.0[0], self.0[1] | other.0[1]])
    }

    pub fn intersect(self, other: Self) -> Self {
        ByteSet([self.0[0] & other.0[0], self.0[1] & other.0[1]])
    }

    pub fn complement(self) -> Self {
        ByteSet([!self.0[0], !self.0[1]])
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    pub fn len(self) -> u32 {
        self.0[0].count_ones() + self.0[1].count_ones()
    }

    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..=255u8).filter(move |&b| self.contains(b))
    }

    /// Maximal runs of consecutive members as inclusive ranges.
    fn ranges(self) -> Vec<(u8, u8)> {
        let mut ranges: Vec<(u8, u8)> = Vec::new();
        for b in self.iter() {
            match ranges.last_mut() {
                Some((_, hi)) if *hi as u16 + 1 == b as u16 => *hi = b,
                _ => ranges.push((b, b)),
            }
        }
        ranges
    }
}

impl Debug for ByteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(*self))
    }
}

fn render_byte(out: &mut String, b: u8) {
    match b {
        b'\n' => out.push_str("\\n"),
        b'\t' => out.push_str("\\t"),
        b'\r' => out.push_str("\\r"),
        b'\\' | b'[' | b']' | b'-' | b'^' | b'.' => {
            out.push('\\');
            out.push(b as char);
        }
        0x20..=0x7e => out.push(b as char),
        _ => out.push_str(&format!("\\x{b:02X}")),
    }
}

fn render(set: ByteSet) -> String {
    if set == ByteSet::FULL {
        return ".".to_string();
    }
    if set.is_empty() {
        return "[]".to_string();
    }
    let mut out = String::new();
    if set.len() == 1 {
        if let Some(b) = set.iter().next() {
            render_byte(&mut out, b);
        }
        return out;
    }
    let (body, negated) = if set.len() > 128 {
        (set.complement(), true)
    } else {
        (set, false)
    };
    out.push('[');
    if negated {
        out.push('^');
    }
    for (lo, hi) in body.ranges() {
        render_byte(&mut out, lo);
        if hi > lo {
            if hi > lo + 1 {
                out.push('-');
            }
            render_byte(&mut out, hi);
        }
    }
    out.push(']');
    out
}

/// The byte alphabet: predicates are [`ByteSet`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteSetSolver;

impl Solver for ByteSetSolver {
    type Set = ByteSet;

    fn empty(&self) -> ByteSet {
        ByteSet::EMPTY
    }

    fn full(&self) -> ByteSet {
        ByteSet::FULL
    }

    fn and(&self, a: ByteSet, b: ByteSet) -> ByteSet {
        a.intersect(b)
    }

    fn or(&self, a: ByteSet, b: ByteSet) -> ByteSet {
        a.union(b)
    }

    fn not(&self, a: ByteSet) -> ByteSet {
        a.complement()
    }

    fn newline(&self) -> ByteSet {
        ByteSet::byte(b'\n')
    }

    fn word_letter(&self) -> ByteSet {
        ByteSet::word()
    }

    fn pretty(&self, set: ByteSet) -> String {
        render(set)
    }
}

/// Maps every byte to the minterm containing it.
#[derive(Debug, Clone)]
pub struct MintermClassifier {
    minterms: Vec<ByteSet>,
    table: Box<[u16; 256]>,
}

impl MintermClassifier {
    pub fn new(minterms: Vec<ByteSet>) -> Self {
        let mut table = Box::new([0u16; 256]);
        for (id, minterm) in minterms.iter().enumerate() {
            for b in minterm.iter() {
                table[b as usize] = id as u16;
            }
        }
        MintermClassifier { minterms, table }
    }

    pub fn minterm(&self, b: u8) -> ByteSet {
        self.minterms[self.table[b as usize] as usize]
    }

    pub fn minterms(&self) -> &[ByteSet] {
        &self.minterms
    }
}
