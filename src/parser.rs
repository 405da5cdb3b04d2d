use crate::ast::{AnchorKind, RegexNode};
use crate::error::{Error, Result};
use crate::solver::ByteSet;

/// Deepest group nesting accepted, keeping the recursive descent shallow.
const MAX_NESTING: usize = 256;
/// Largest explicit repetition count.
const MAX_REPEAT: u32 = 10_000;

/// Parser for regular expressions.
///
/// The `Parser` struct holds the pattern and the current position.
/// It also manages group IDs for capturing groups.
pub struct Parser<'a> {
    pub pattern: &'a str,
    pub pos: usize,
    next_group_id: u32,
    depth: usize,
    multiline: bool,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern.
    pub fn new(pattern: &'a str) -> Self {
        Self {
            pattern,
            pos: 0,
            next_group_id: 1,
            depth: 0,
            multiline: false,
        }
    }

    fn alloc_group_id(&mut self) -> u32 {
        let id = self.next_group_id;
        self.next_group_id += 1;
        id
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(Error::Parse {
            offset: self.pos,
            message: message.into(),
        })
    }

    /// Peek at the next character in the pattern without advancing.
    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    /// Advance the parser by one character and return it.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, expected: &str) -> bool {
        if self.pattern[self.pos..].starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    /// Entry point for parsing a regex pattern.
    ///
    /// Example:
    /// - Pattern: `a|b` → Alt([Seq([Literal(b'a')]), Seq([Literal(b'b')])])
    pub fn parse(&mut self) -> Result<RegexNode> {
        let node = self.parse_alt()?;
        if self.peek().is_some() {
            return self.error("unmatched ')'");
        }
        Ok(node)
    }

    /// Parse alternation (`|`) in the pattern.
    ///
    /// Example:
    /// - Pattern: `a|b|c` → Alt([Seq([Literal(b'a')]), Seq([Literal(b'b')]), Seq([Literal(b'c')])])
    /// - Pattern: `abc`   → Seq([Literal(b'a'), Literal(b'b'), Literal(b'c')])
    fn parse_alt(&mut self) -> Result<RegexNode> {
        let mut branches = vec![self.parse_seq()?];
        while self.eat('|') {
            branches.push(self.parse_seq()?);
        }
        Ok(match branches.len() {
            1 => branches.remove(0),
            _ => RegexNode::Alt(branches),
        })
    }

    /// Parse a sequence of regex atoms (concatenation).
    fn parse_seq(&mut self) -> Result<RegexNode> {
        let mut nodes = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == ')' || ch == '|' {
                break;
            }
            nodes.push(self.parse_repeat()?);
        }
        Ok(RegexNode::Seq(nodes))
    }

    /// Parse the quantifier after an atom, optionally followed by `?` to
    /// make it lazy. A second quantifier on the same atom is rejected, which
    /// keeps the depth of the tree bounded by the group nesting.
    ///
    /// Example:
    /// - Pattern: `a?`     → Repeat { min: 0, max: Some(1), lazy: false }
    /// - Pattern: `b+?`    → Repeat { min: 1, max: None, lazy: true }
    /// - Pattern: `c{2,5}` → Repeat { min: 2, max: Some(5), lazy: false }
    /// - Pattern: `d{2}*`  → error, nested quantifier
    fn parse_repeat(&mut self) -> Result<RegexNode> {
        let node = self.parse_atom()?;
        let start = self.pos;
        let (min, max) = match self.advance() {
            Some('?') => (0, Some(1)),
            Some('*') => (0, None),
            Some('+') => (1, None),
            Some('{') => match self.parse_bounds()? {
                (min, Some(max)) if min > max => {
                    self.pos = start;
                    return self.error(format!("repetition {{{min},{max}}} is out of order"));
                }
                bounds => bounds,
            },
            _ => {
                self.pos = start;
                return Ok(node);
            }
        };
        let lazy = self.eat('?');
        if let Some(ch @ ('?' | '*' | '+' | '{')) = self.peek() {
            return self.error(format!("nested quantifier '{ch}'"));
        }
        Ok(RegexNode::Repeat {
            node: Box::new(node),
            min,
            max,
            lazy,
        })
    }

    /// Parses `m}`, `m,}` or `m,n}` and leaves the position on the `}`.
    fn parse_bounds(&mut self) -> Result<(u32, Option<u32>)> {
        let min = self.parse_count()?;
        let max = if self.eat(',') {
            if self.peek() == Some('}') {
                None
            } else {
                Some(self.parse_count()?)
            }
        } else {
            Some(min)
        };
        if self.peek() != Some('}') {
            return self.error("expected '}' to close the repetition");
        }
        self.advance();
        Ok((min, max))
    }

    fn parse_count(&mut self) -> Result<u32> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        let digits = &self.pattern[start..self.pos];
        if digits.is_empty() {
            return self.error("expected a repetition count");
        }
        match digits.parse::<u32>() {
            Ok(count) if count <= MAX_REPEAT => Ok(count),
            _ => self.error(format!("repetition count exceeds {MAX_REPEAT}")),
        }
    }

    /// Parse a single regex atom: group, char class, escape, literal, or anchor.
    ///
    /// Examples:
    /// - Pattern: `(abc)`  → Group { id: Some(1), node: Seq([...]) }
    /// - Pattern: `(?:ab)` → Group { id: None, node: Seq([...]) }
    /// - Pattern: `[abc]`  → Class(..)
    /// - Pattern: `\d`     → Class(digits)
    /// - Pattern: `.`      → Dot
    /// - Pattern: `^`      → Anchor(Start)
    /// - Pattern: `a`      → Literal(b'a')
    fn parse_atom(&mut self) -> Result<RegexNode> {
        let Some(ch) = self.peek() else {
            return Ok(RegexNode::Seq(Vec::new()));
        };
        match ch {
            '(' => self.parse_group(),
            '[' => self.parse_char_class(),
            '\\' => {
                self.advance();
                self.parse_escape()
            }
            '.' => {
                self.advance();
                Ok(RegexNode::Dot)
            }
            '^' => {
                self.advance();
                Ok(RegexNode::Anchor(if self.multiline {
                    AnchorKind::LineStart
                } else {
                    AnchorKind::Start
                }))
            }
            '$' => {
                self.advance();
                Ok(RegexNode::Anchor(if self.multiline {
                    AnchorKind::LineEnd
                } else {
                    AnchorKind::EndZ
                }))
            }
            '?' | '*' | '+' | '{' => self.error(format!("nothing to repeat before '{ch}'")),
            _ => {
                self.advance();
                Ok(literal(ch))
            }
        }
    }

    fn parse_group(&mut self) -> Result<RegexNode> {
        let start = self.pos;
        self.advance();
        if self.eat_str("?m)") {
            self.multiline = true;
            return Ok(RegexNode::Seq(Vec::new()));
        }
        let id = if self.eat_str("?:") {
            None
        } else if self.peek() == Some('?') {
            self.pos = start;
            return Err(Error::Unsupported(format!(
                "group construct at offset {start}"
            )));
        } else {
            Some(self.alloc_group_id())
        };
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return self.error(format!("groups nested deeper than {MAX_NESTING}"));
        }
        let node = self.parse_alt()?;
        self.depth -= 1;
        if !self.eat(')') {
            return self.error("missing ')'");
        }
        Ok(RegexNode::Group {
            id,
            node: Box::new(node),
        })
    }

    /// Escape after the backslash.
    fn parse_escape(&mut self) -> Result<RegexNode> {
        let Some(ch) = self.advance() else {
            return self.error("trailing backslash");
        };
        let node = match ch {
            'A' => RegexNode::Anchor(AnchorKind::Start),
            'z' => RegexNode::Anchor(AnchorKind::End),
            'Z' => RegexNode::Anchor(AnchorKind::EndZ),
            'b' => RegexNode::Anchor(AnchorKind::WordBoundary),
            'B' => RegexNode::Anchor(AnchorKind::NonWordBoundary),
            '1'..='9' => {
                return Err(Error::Unsupported(format!("backreference \\{ch}")));
            }
            _ => match class_escape(ch) {
                Some(set) => RegexNode::Class(set),
                None => match escaped_byte(ch) {
                    Some(b) => RegexNode::Literal(b),
                    None => return self.error(format!("unknown escape \\{ch}")),
                },
            },
        };
        Ok(node)
    }

    /// Parse a character class, e.g. `[abc]`, `[^a-z]` or `[\d_]`.
    fn parse_char_class(&mut self) -> Result<RegexNode> {
        self.advance();
        let negated = self.eat('^');
        let mut set = ByteSet::EMPTY;
        let mut first = true;
        loop {
            let Some(ch) = self.advance() else {
                return self.error("missing ']'");
            };
            if ch == ']' && !first {
                break;
            }
            first = false;
            let lo = match ch {
                '\\' => {
                    let Some(esc) = self.advance() else {
                        return self.error("missing ']'");
                    };
                    if let Some(class) = class_escape(esc) {
                        set = set.union(class);
                        continue;
                    }
                    match escaped_byte(esc) {
                        Some(b) => b,
                        None => return self.error(format!("unknown escape \\{esc} in class")),
                    }
                }
                _ => self.class_byte(ch)?,
            };
            let range_end = self.pattern[self.pos..].strip_prefix('-').and_then(|rest| rest.chars().next());
            match range_end {
                Some(hi) if hi != ']' => {
                    self.advance();
                    self.advance();
                    let hi = self.class_byte(hi)?;
                    if hi < lo {
                        return self.error("class range is out of order");
                    }
                    set = set.union(ByteSet::range(lo, hi));
                }
                _ => set.insert(lo),
            }
        }
        Ok(RegexNode::Class(if negated { set.complement() } else { set }))
    }

    fn class_byte(&self, ch: char) -> Result<u8> {
        match u8::try_from(ch) {
            Ok(b) if b.is_ascii() => Ok(b),
            _ => Err(Error::Unsupported(format!("non-ASCII '{ch}' in a class"))),
        }
    }
}

/// A literal character as a sequence of its UTF-8 bytes.
fn literal(ch: char) -> RegexNode {
    let mut buf = [0; 4];
    let bytes = ch.encode_utf8(&mut buf).as_bytes();
    match bytes {
        [b] => RegexNode::Literal(*b),
        _ => RegexNode::Seq(bytes.iter().map(|&b| RegexNode::Literal(b)).collect()),
    }
}

fn class_escape(ch: char) -> Option<ByteSet> {
    match ch {
        'd' => Some(ByteSet::digit()),
        'D' => Some(ByteSet::digit().complement()),
        'w' => Some(ByteSet::word()),
        'W' => Some(ByteSet::word().complement()),
        's' => Some(ByteSet::space()),
        'S' => Some(ByteSet::space().complement()),
        _ => None,
    }
}

fn escaped_byte(ch: char) -> Option<u8> {
    match ch {
        'n' => Some(b'\n'),
        't' => Some(b'\t'),
        'r' => Some(b'\r'),
        _ if ch.is_ascii_punctuation() => Some(ch as u8),
        _ => None,
    }
}
