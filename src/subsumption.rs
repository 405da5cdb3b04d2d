//! Syntactic language containment and alternation folding.
//!
//! `subsumes(a, b)` is an approximation: a true answer means every string
//! accepted by `b` is accepted by `a`, a false answer means nothing. The
//! rules cover the shapes that repeated derivation produces, mostly
//! alternatives that differ by an optional prefix.

use log::trace;

use crate::builder::Builder;
use crate::node::{NodeId, NodeKind};
use crate::solver::Solver;

impl<S: Solver> Builder<S> {
    /// True if `a` accepts every string `b` accepts, as far as the
    /// syntactic rules can tell.
    pub fn subsumes(&mut self, a: NodeId, b: NodeId) -> bool {
        self.subsumes_at(a, b, 0)
    }

    fn subsumes_at(&mut self, a: NodeId, b: NodeId, depth: u32) -> bool {
        if a == b || b == self.nothing() {
            return true;
        }
        if depth >= self.config().subsumption_depth_limit {
            trace!("subsumption of {b:?} by {a:?} cut off at depth {depth}");
            return false;
        }
        if let Some(&cached) = self.subsumption_cache.get(&(a, b)) {
            return cached;
        }
        match self.subsumption_rules(a, b, depth + 1) {
            Some(result) => {
                self.subsumption_cache.insert((a, b), result);
                result
            }
            None => false,
        }
    }

    /// Applies the first matching rule. `None` when no rule applies, which
    /// is not cached.
    fn subsumption_rules(&mut self, a: NodeId, b: NodeId, depth: u32) -> Option<bool> {
        // effects do not change the language
        if let NodeKind::Effect { node, .. } = *self.kind(a) {
            return Some(self.subsumes_at(node, b, depth));
        }
        if let NodeKind::Effect { node, .. } = *self.kind(b) {
            return Some(self.subsumes_at(a, node, depth));
        }

        if let (&NodeKind::Concat(al, ar), &NodeKind::Concat(bl, br)) =
            (self.kind(a), self.kind(b))
        {
            // XY subsumes X??Y' when Y subsumes Y'
            if let Some(prefix) = self.lazy_optional_body(bl) {
                if let Some(tail) = self.skip_prefix(a, prefix) {
                    return Some(self.subsumes_at(tail, br, depth));
                }
            }
            // X??Y subsumes XY' when Y subsumes Y'
            if let Some(prefix) = self.lazy_optional_body(al) {
                if let Some(tail) = self.skip_prefix(b, prefix) {
                    return Some(self.subsumes_at(ar, tail, depth));
                }
            }
        }

        // XY subsumes Y' when X is nullable and Y subsumes Y'
        if let NodeKind::Concat(l, r) = *self.kind(a) {
            if self.info(l).is_nullable() {
                return Some(self.subsumes_at(r, b, depth));
            }
        }
        None
    }

    fn lazy_optional_body(&self, id: NodeId) -> Option<NodeId> {
        match *self.kind(id) {
            NodeKind::Loop {
                body,
                lower: 0,
                upper: 1,
                lazy: true,
            } => Some(body),
            _ => None,
        }
    }

    /// Finds `tail` with `node = prefix · tail`, walking both concatenation
    /// spines in lockstep.
    fn skip_prefix(&self, mut node: NodeId, mut prefix: NodeId) -> Option<NodeId> {
        while let NodeKind::Concat(pl, pr) = *self.kind(prefix) {
            match *self.kind(node) {
                NodeKind::Concat(nl, nr) if nl == pl => {
                    node = nr;
                    prefix = pr;
                }
                _ => return None,
            }
        }
        match *self.kind(node) {
            NodeKind::Concat(nl, nr) if nl == prefix => Some(nr),
            _ => None,
        }
    }

    /// First non-effect node under any number of effect wrappers.
    pub(crate) fn unwrap_effects(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Effect { node, .. } = *self.kind(id) {
            id = node;
        }
        id
    }

    /// Merges `low | high`, where `high` subsumes `low`, into one node that
    /// still prefers the strings of `low`. `Y | XY` becomes `X??Y`.
    ///
    /// Returns `None` when no folding rule applies.
    pub(crate) fn try_fold_alternation(&mut self, low: NodeId, high: NodeId) -> Option<NodeId> {
        let epsilon = self.epsilon();
        self.fold_with_effects(low, high, epsilon)
    }

    fn fold_with_effects(&mut self, low: NodeId, high: NodeId, high_effects: NodeId) -> Option<NodeId> {
        if self.unwrap_effects(low) == self.unwrap_effects(high) {
            return Some(low);
        }

        // Effect(Y, E) | X?Y is Effect(X??Y, E)
        if let NodeKind::Effect { node, effect } = *self.kind(low) {
            if high_effects != self.epsilon() {
                return None;
            }
            if let Some(inner) = self.fold_with_effects(node, high, high_effects) {
                return Some(self.effect(inner, effect));
            }
        }

        // Y | Effect(X?Y, E) is Effect(X?, E)??Y
        if let NodeKind::Effect { node, effect } = *self.kind(high) {
            let effects = self.concat(effect, high_effects);
            return self.fold_with_effects(low, node, effects);
        }

        if let NodeKind::Concat(l, _) = *self.kind(high) {
            if self.info(l).is_nullable() {
                if let Some(prefix) = self.split_concat_subsumption(low, high) {
                    let prefix = self.effect(prefix, high_effects);
                    let optional = self.repeat(prefix, 0, 1, true);
                    return Some(self.concat(optional, low));
                }
            }
        }
        None
    }

    /// Finds a prefix `P` with `high = P · T` where `T` is equivalent to
    /// `low`. Every suffix visited subsumes `low`.
    fn split_concat_subsumption(&mut self, low: NodeId, high: NodeId) -> Option<NodeId> {
        let mut prefix = Vec::new();
        let mut suffix = high;
        while let NodeKind::Concat(l, r) = *self.kind(suffix) {
            if suffix == low {
                return Some(self.concat_all(prefix));
            }
            if self.subsumes(r, low) {
                prefix.push(l);
                suffix = r;
            } else if self.subsumes(low, suffix) {
                return Some(self.concat_all(prefix));
            } else {
                return None;
            }
        }
        // the walk can end on a non-concatenation tail equal to `low`
        if suffix == low || self.subsumes(low, suffix) {
            return Some(self.concat_all(prefix));
        }
        None
    }
}
