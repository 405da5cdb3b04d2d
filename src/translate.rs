//! Lowering of the syntax tree into builder nodes over bytes.

use crate::ast::{AnchorKind, RegexNode};
use crate::builder::Builder;
use crate::node::{NodeId, UNBOUNDED};
use crate::solver::{ByteSet, ByteSetSolver};

impl Builder<ByteSetSolver> {
    /// Builds the node for `ast`. Groups become capture markers; `.` excludes
    /// newline. Recursion follows the syntax tree, whose depth the parser
    /// bounds by capping group nesting and allowing one quantifier per atom.
    pub fn translate(&mut self, ast: &RegexNode) -> NodeId {
        match ast {
            RegexNode::Literal(b) => self.singleton(ByteSet::byte(*b)),
            RegexNode::Dot => self.singleton(ByteSet::byte(b'\n').complement()),
            RegexNode::Class(set) => self.singleton(*set),
            RegexNode::Anchor(kind) => match kind {
                AnchorKind::Start => self.begin_anchor(),
                AnchorKind::End => self.end_anchor(),
                AnchorKind::LineStart => self.bol_anchor(),
                AnchorKind::LineEnd => self.eol_anchor(),
                AnchorKind::EndZ => self.end_anchor_z(),
                AnchorKind::WordBoundary => self.boundary_anchor(),
                AnchorKind::NonWordBoundary => self.non_boundary_anchor(),
            },
            RegexNode::Seq(nodes) => {
                let parts: Vec<NodeId> = nodes.iter().map(|n| self.translate(n)).collect();
                self.concat_all(parts)
            }
            RegexNode::Alt(branches) => {
                let parts: Vec<NodeId> = branches.iter().map(|n| self.translate(n)).collect();
                self.ordered_or_all(parts)
            }
            RegexNode::Repeat {
                node,
                min,
                max,
                lazy,
            } => {
                let body = self.translate(node);
                self.repeat(body, *min, max.unwrap_or(UNBOUNDED), *lazy)
            }
            RegexNode::Group { id, node } => {
                let inner = self.translate(node);
                match id {
                    Some(n) => self.capture(inner, *n),
                    None => inner,
                }
            }
        }
    }
}
