//! Human readable rendering of nodes, for logs and test failures.

use std::fmt;

use crate::builder::Builder;
use crate::node::{NodeId, NodeKind, UNBOUNDED};
use crate::solver::Solver;

const SUBSCRIPTS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];
const SUPERSCRIPTS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

enum Piece {
    Node(NodeId),
    Text(String),
}

fn digits(n: u32, table: &[char; 10]) -> String {
    n.to_string()
        .bytes()
        .map(|d| table[usize::from(d - b'0')])
        .collect()
}

fn loop_suffix(lower: u32, upper: u32, lazy: bool) -> String {
    let mut suffix = match (lower, upper) {
        (0, 1) => "?".to_string(),
        (0, UNBOUNDED) => "*".to_string(),
        (1, UNBOUNDED) => "+".to_string(),
        (lower, UNBOUNDED) => format!("{{{lower},}}"),
        (lower, upper) if lower == upper => format!("{{{lower}}}"),
        (lower, upper) => format!("{{{lower},{upper}}}"),
    };
    if lazy {
        suffix.push('?');
    }
    suffix
}

impl<S: Solver> Builder<S> {
    /// Regex-like text of `root`.
    ///
    /// Ordered alternations print as `(x|y)`, complements as `~(x)`, effects
    /// as `(eξx)` and capture markers as `⌊₁` and `¹⌉`. Left nested
    /// concatenations are parenthesized so the tree shape stays visible.
    pub fn pretty(&self, root: NodeId) -> String {
        let mut out = String::new();
        let mut todo = vec![Piece::Node(root)];
        let text = |s: &str| Piece::Text(s.to_string());
        while let Some(piece) = todo.pop() {
            let id = match piece {
                Piece::Text(s) => {
                    out.push_str(&s);
                    continue;
                }
                Piece::Node(id) => id,
            };
            match self.kind(id) {
                NodeKind::Epsilon | NodeKind::FixedLengthMarker(_) => {}
                NodeKind::Singleton(set) => out.push_str(&self.solver().pretty(*set)),
                NodeKind::BeginAnchor => out.push_str("\\A"),
                NodeKind::EndAnchor => out.push_str("\\z"),
                NodeKind::BolAnchor => out.push('^'),
                NodeKind::EolAnchor => out.push('$'),
                NodeKind::BoundaryAnchor => out.push_str("\\b"),
                NodeKind::NonBoundaryAnchor => out.push_str("\\B"),
                NodeKind::EndAnchorZ => out.push_str("\\Z"),
                NodeKind::EndAnchorZReverse => out.push_str("\\a"),
                NodeKind::Concat(l, r) => {
                    let nested = matches!(self.kind(*l), NodeKind::Concat(..));
                    todo.push(Piece::Node(*r));
                    if nested {
                        todo.push(text(")"));
                    }
                    todo.push(Piece::Node(*l));
                    if nested {
                        todo.push(text("("));
                    }
                }
                NodeKind::OrderedOr(l, r) => {
                    todo.extend([text(")"), Piece::Node(*r), text("|"), Piece::Node(*l)]);
                    out.push('(');
                }
                NodeKind::Or(alts) | NodeKind::And(alts) => {
                    let sep = if matches!(self.kind(id), NodeKind::Or(_)) { "|" } else { "&" };
                    todo.push(text(")"));
                    for (i, member) in alts.as_slice().iter().rev().enumerate() {
                        if i > 0 {
                            todo.push(text(sep));
                        }
                        todo.push(Piece::Node(*member));
                    }
                    out.push('(');
                }
                NodeKind::Loop { .. } if self.is_any_star(id) => out.push_str(".*"),
                &NodeKind::Loop {
                    body,
                    lower,
                    upper,
                    lazy,
                } => {
                    todo.push(Piece::Text(loop_suffix(lower, upper, lazy)));
                    if matches!(self.kind(body), NodeKind::Singleton(_)) {
                        todo.push(Piece::Node(body));
                    } else {
                        todo.extend([text(")"), Piece::Node(body)]);
                        out.push('(');
                    }
                }
                NodeKind::Not(child) => {
                    todo.extend([text(")"), Piece::Node(*child)]);
                    out.push_str("~(");
                }
                NodeKind::Effect { node, effect } => {
                    todo.extend([text(")"), Piece::Node(*node), text("ξ"), Piece::Node(*effect)]);
                    out.push('(');
                }
                NodeKind::CaptureStart(n) => {
                    out.push('⌊');
                    out.push_str(&digits(*n, &SUBSCRIPTS));
                }
                NodeKind::CaptureEnd(n) => {
                    out.push_str(&digits(*n, &SUPERSCRIPTS));
                    out.push('⌉');
                }
                NodeKind::DisableBacktrackingSimulation(child) => todo.push(Piece::Node(*child)),
            }
        }
        out
    }

    /// Adapter for `{}` formatting of a node.
    pub fn display(&self, node: NodeId) -> DisplayNode<'_, S> {
        DisplayNode {
            builder: self,
            node,
        }
    }
}

pub struct DisplayNode<'a, S: Solver> {
    builder: &'a Builder<S>,
    node: NodeId,
}

impl<S: Solver> fmt::Display for DisplayNode<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.builder.pretty(self.node))
    }
}
