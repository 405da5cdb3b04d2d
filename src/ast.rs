use crate::solver::ByteSet;

/// Syntax tree of a pattern, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexNode {
    Seq(Vec<RegexNode>),
    Alt(Vec<RegexNode>),
    Repeat {
        node: Box<RegexNode>,
        min: u32,
        /// `None` for no upper bound.
        max: Option<u32>,
        lazy: bool,
    },
    /// A group; `id` is `None` for `(?:...)`.
    Group {
        id: Option<u32>,
        node: Box<RegexNode>,
    },
    Anchor(AnchorKind),
    /// Any byte except newline.
    Dot,
    Class(ByteSet),
    Literal(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// `\A`, and `^` outside multiline mode.
    Start,
    /// `\z`
    End,
    /// `^` in multiline mode.
    LineStart,
    /// `$` in multiline mode.
    LineEnd,
    /// `\Z`, and `$` outside multiline mode.
    EndZ,
    WordBoundary,
    NonWordBoundary,
}
