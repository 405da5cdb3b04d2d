//! Context dependent nullability.
//!
//! Both queries walk the tree with explicit stacks, so they are safe on
//! arbitrarily deep nodes and only need shared access to the builder.

use crate::builder::Builder;
use crate::context::{CharKind, Context};
use crate::node::{NodeId, NodeKind};
use crate::solver::Solver;

impl<S: Solver> Builder<S> {
    /// True if `id` accepts the empty string between characters of the
    /// kinds in `context`.
    pub fn is_nullable_for(&self, id: NodeId, context: Context) -> bool {
        if let Some(known) = self.node(id).known_nullability(context) {
            return known;
        }
        let mut todo = vec![(id, false)];
        while let Some((node, children_done)) = todo.pop() {
            if self.node(node).known_nullability(context).is_some() {
                continue;
            }
            if !children_done {
                todo.push((node, true));
                for child in self.nullability_children(node) {
                    if self.node(child).known_nullability(context).is_none() {
                        todo.push((child, false));
                    }
                }
                continue;
            }
            let nullable = self.nullable_from_children(node, context);
            self.node(node).store_nullability(context, nullable);
        }
        self.node(id).known_nullability(context).unwrap_or(false)
    }

    fn nullability_children(&self, id: NodeId) -> Vec<NodeId> {
        match self.kind(id) {
            NodeKind::Loop { body, lower, .. } if *lower != 0 => vec![*body],
            NodeKind::Concat(l, r) | NodeKind::OrderedOr(l, r) => vec![*l, *r],
            NodeKind::Or(alts) | NodeKind::And(alts) => alts.as_slice().to_vec(),
            NodeKind::Not(child)
            | NodeKind::DisableBacktrackingSimulation(child)
            | NodeKind::Effect { node: child, .. } => vec![*child],
            _ => Vec::new(),
        }
    }

    /// Nullability of `id` once the nullability of its children is known.
    fn nullable_from_children(&self, id: NodeId, context: Context) -> bool {
        let known = |child: NodeId| self.node(child).known_nullability(context) == Some(true);
        let Context { prev, next } = context;
        match self.kind(id) {
            NodeKind::Loop { body, lower, .. } => *lower == 0 || known(*body),
            NodeKind::Concat(l, r) => known(*l) && known(*r),
            NodeKind::OrderedOr(l, r) => known(*l) || known(*r),
            NodeKind::Or(alts) => alts.iter().any(known),
            NodeKind::And(alts) => alts.iter().all(known),
            NodeKind::Not(child) => !known(*child),
            NodeKind::DisableBacktrackingSimulation(child)
            | NodeKind::Effect { node: child, .. } => known(*child),
            NodeKind::BeginAnchor => prev == CharKind::BeginningEnd,
            NodeKind::EndAnchor => next == CharKind::BeginningEnd,
            NodeKind::BolAnchor => prev.is_line_boundary(),
            NodeKind::EolAnchor => next.is_line_boundary(),
            NodeKind::BoundaryAnchor => prev.is_word_letter() != next.is_word_letter(),
            NodeKind::NonBoundaryAnchor => prev.is_word_letter() == next.is_word_letter(),
            NodeKind::EndAnchorZ => next.is_beginning_end(),
            NodeKind::EndAnchorZReverse => prev.is_beginning_end(),
            NodeKind::Epsilon
            | NodeKind::CaptureStart(_)
            | NodeKind::CaptureEnd(_)
            | NodeKind::FixedLengthMarker(_) => true,
            NodeKind::Singleton(_) => false,
        }
    }

    /// True if a backtracking engine at a position with this `context` would
    /// accept the empty match of `id` before trying to consume input.
    pub fn is_high_priority_nullable_for(&self, id: NodeId, context: Context) -> bool {
        if !self.info(id).can_be_nullable() {
            return false;
        }
        // every node on the worklist must be high priority nullable
        let mut todo = vec![id];
        'nodes: while let Some(mut node) = todo.pop() {
            loop {
                let info = self.info(node);
                if info.is_high_priority_nullable() {
                    continue 'nodes;
                }
                if !info.contains_some_anchor() {
                    return false;
                }
                match *self.kind(node) {
                    NodeKind::Loop { lower, lazy, .. } => {
                        if lazy && lower == 0 {
                            continue 'nodes;
                        }
                        return false;
                    }
                    NodeKind::Concat(l, r) => {
                        todo.push(l);
                        node = r;
                    }
                    NodeKind::OrderedOr(l, _)
                    | NodeKind::Effect { node: l, .. }
                    | NodeKind::DisableBacktrackingSimulation(l) => {
                        if !self.info(l).can_be_nullable() {
                            return false;
                        }
                        node = l;
                    }
                    _ => {
                        if self.is_nullable_for(node, context) {
                            continue 'nodes;
                        }
                        return false;
                    }
                }
            }
        }
        true
    }
}
