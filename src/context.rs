//! Character kinds surrounding an input position.
//!
//! Anchors are decided from the kinds of the previous and next character
//! alone, so a position is summarized by a [`Context`] rather than by the
//! raw input.

use std::fmt;

/// Classification of a single input character for anchor purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CharKind {
    /// Any character not covered by another kind.
    General,
    /// The virtual character before the input or after it.
    BeginningEnd,
    /// A newline.
    Newline,
    /// The final newline of the input (the one `\Z` may stand before),
    /// or, in reversed scans, the first one.
    NewlineS,
    /// A word letter as used by `\b` and `\B`.
    WordLetter,
}

impl CharKind {
    pub const COUNT: usize = 5;

    pub const ALL: [CharKind; CharKind::COUNT] = [
        CharKind::General,
        CharKind::BeginningEnd,
        CharKind::Newline,
        CharKind::NewlineS,
        CharKind::WordLetter,
    ];

    fn index(self) -> usize {
        match self {
            CharKind::General => 0,
            CharKind::BeginningEnd => 1,
            CharKind::Newline => 2,
            CharKind::NewlineS => 3,
            CharKind::WordLetter => 4,
        }
    }

    /// True for the input boundary and for the distinguished last newline.
    pub fn is_beginning_end(self) -> bool {
        matches!(self, CharKind::BeginningEnd | CharKind::NewlineS)
    }

    /// True for the input boundary and any newline.
    pub fn is_line_boundary(self) -> bool {
        matches!(
            self,
            CharKind::BeginningEnd | CharKind::Newline | CharKind::NewlineS
        )
    }

    pub fn is_word_letter(self) -> bool {
        self == CharKind::WordLetter
    }
}

/// The kinds of the characters immediately before and after a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Context {
    pub prev: CharKind,
    pub next: CharKind,
}

impl Context {
    /// Number of distinct contexts; bounds the per-node nullability cache.
    pub const LIMIT: usize = CharKind::COUNT * CharKind::COUNT;

    pub fn new(prev: CharKind, next: CharKind) -> Self {
        Context { prev, next }
    }

    /// Dense index in `0..Context::LIMIT`.
    pub fn index(self) -> usize {
        self.prev.index() * CharKind::COUNT + self.next.index()
    }

    /// Every context, in index order.
    pub fn all() -> impl Iterator<Item = Context> {
        CharKind::ALL
            .into_iter()
            .flat_map(|prev| CharKind::ALL.into_iter().map(move |next| Context::new(prev, next)))
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}|{:?}", self.prev, self.next)
    }
}
