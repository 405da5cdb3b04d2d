//! Derivatives that keep the match order of a backtracking engine.
//!
//! The derivative of a node with respect to a symbol is the node matching
//! what is left of its matches after the symbol. Ordered alternations in the
//! result list the continuations in the order a backtracking engine would
//! try them, and pruning at nullable positions drops the ones it would never
//! reach.

use log::trace;

use crate::builder::Builder;
use crate::context::Context;
use crate::error::Result;
use crate::node::{NodeId, NodeKind, UNBOUNDED};
use crate::solver::Solver;

impl<S: Solver> Builder<S> {
    /// Residual of `node` after consuming `symbol` in `context`.
    ///
    /// `symbol` is a minterm of the pattern or a single symbol set. At the
    /// top level a `DisableBacktrackingSimulation` marker is kept and
    /// turns pruning off; otherwise a nullable node first loses every
    /// alternative ranked below the empty match.
    pub fn derivative(&mut self, node: NodeId, symbol: S::Set, context: Context) -> Result<NodeId> {
        if let NodeKind::DisableBacktrackingSimulation(child) = *self.kind(node) {
            let derivative = self.derive(child, symbol, context)?;
            return Ok(self.disable_backtracking_simulation(derivative));
        }
        let node = if self.is_nullable_for(node, context) {
            self.prune_lower_priority_than_nullability(node, context)?
        } else {
            node
        };
        self.derive(node, symbol, context)
    }

    /// Removes the alternatives a backtracking engine would rank below
    /// accepting the empty match of `node` in `context`.
    pub fn prune_lower_priority_than_nullability(
        &mut self,
        node: NodeId,
        context: Context,
    ) -> Result<NodeId> {
        if let Some(&pruned) = self.prune_priority_cache.get(&(node, context)) {
            return Ok(pruned);
        }
        let pruned = self.guarded(move |b| b.prune_uncached(node, context))?;
        self.prune_priority_cache.insert((node, context), pruned);
        Ok(pruned)
    }

    fn prune_uncached(&mut self, node: NodeId, context: Context) -> Result<NodeId> {
        let pruned = match *self.kind(node) {
            // a nullable left side wins, otherwise the right side is pruned
            NodeKind::OrderedOr(l, r) => {
                if self.is_nullable_for(l, context) {
                    self.prune_lower_priority_than_nullability(l, context)?
                } else {
                    let r = self.prune_lower_priority_than_nullability(r, context)?;
                    self.ordered_or_with(l, r, true, false)
                }
            }
            // (X|Y)Z is XZ|YZ, and XZ alone is kept when X is nullable
            NodeKind::Concat(l, r) => match *self.kind(l) {
                NodeKind::OrderedOr(ll, lr) => {
                    let first = self.concat(ll, r);
                    if self.is_nullable_for(ll, context) {
                        self.prune_lower_priority_than_nullability(first, context)?
                    } else {
                        let rest = self.concat(lr, r);
                        let rest = self.prune_lower_priority_than_nullability(rest, context)?;
                        self.ordered_or(first, rest)
                    }
                }
                _ => {
                    let l = self.prune_lower_priority_than_nullability(l, context)?;
                    let r = self.prune_lower_priority_than_nullability(r, context)?;
                    self.concat(l, r)
                }
            },
            NodeKind::Loop {
                lower: 0,
                lazy: true,
                ..
            } => self.epsilon(),
            NodeKind::Effect { node: inner, effect } => {
                let inner = self.prune_lower_priority_than_nullability(inner, context)?;
                self.effect(inner, effect)
            }
            _ => node,
        };
        Ok(pruned)
    }

    fn derive(&mut self, node: NodeId, symbol: S::Set, context: Context) -> Result<NodeId> {
        let key = (node, symbol, context);
        if let Some(&derivative) = self.derivative_cache.get(&key) {
            return Ok(derivative);
        }
        trace!("deriving {node:?} by {symbol:?} in {context}");
        let derivative = self.guarded(move |b| b.derive_uncached(node, symbol, context))?;
        self.derivative_cache.insert(key, derivative);
        Ok(derivative)
    }

    fn derive_uncached(&mut self, node: NodeId, symbol: S::Set, context: Context) -> Result<NodeId> {
        let derivative = match self.kind(node).clone() {
            NodeKind::Singleton(set) => {
                let solver = self.solver();
                if solver.is_empty(solver.and(symbol, set)) {
                    self.nothing()
                } else {
                    self.epsilon()
                }
            }
            NodeKind::Concat(l, r) => {
                let dl = self.derive(l, symbol, context)?;
                let consume_left = self.concat(dl, r);
                if !self.is_nullable_for(l, context) {
                    consume_left
                } else {
                    // the left side matched empty, its effects still apply
                    let dr = self.derive(r, symbol, context)?;
                    let skip_left = self.effect(dr, l);
                    if self.is_high_priority_nullable_for(l, context) {
                        self.ordered_or_with(skip_left, consume_left, false, true)
                    } else {
                        self.ordered_or(consume_left, skip_left)
                    }
                }
            }
            NodeKind::Loop {
                body,
                lower,
                upper,
                lazy,
            } => {
                let db = self.derive(body, symbol, context)?;
                if self.is_nothing(db) {
                    self.nothing()
                } else {
                    let upper = if upper == UNBOUNDED {
                        UNBOUNDED
                    } else {
                        upper.saturating_sub(1)
                    };
                    let rest = self.repeat(body, lower.saturating_sub(1), upper, lazy);
                    self.concat(db, rest)
                }
            }
            NodeKind::OrderedOr(l, r) => {
                let dl = self.derive(l, symbol, context)?;
                let dr = self.derive(r, symbol, context)?;
                self.ordered_or(dl, dr)
            }
            NodeKind::Or(alts) => {
                let members = self.derive_members(alts.as_slice(), symbol, context)?;
                self.or(members)
            }
            NodeKind::And(alts) => {
                let members = self.derive_members(alts.as_slice(), symbol, context)?;
                self.and(members)
            }
            NodeKind::Not(child) => {
                let dc = self.derive(child, symbol, context)?;
                let dc = self.strip_effects(dc)?;
                self.not(dc)
            }
            NodeKind::DisableBacktrackingSimulation(child) => {
                let dc = self.derive(child, symbol, context)?;
                self.disable_backtracking_simulation(dc)
            }
            NodeKind::Effect { .. } => {
                panic!("derivative requested for effect node {node:?}; strip effects first")
            }
            _ => self.nothing(),
        };
        Ok(derivative)
    }

    fn derive_members(
        &mut self,
        members: &[NodeId],
        symbol: S::Set,
        context: Context,
    ) -> Result<Vec<NodeId>> {
        let mut derived = Vec::with_capacity(members.len());
        for &member in members {
            let dm = self.derive(member, symbol, context)?;
            derived.push(self.strip_effects(dm)?);
        }
        Ok(derived)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{Builder, ListKind};
    use crate::context::{CharKind, Context};
    use crate::node::{NodeId, NodeKind, UNBOUNDED};
    use crate::solver::{ByteSet, ByteSetSolver};

    const MIDDLE: Context = Context {
        prev: CharKind::General,
        next: CharKind::General,
    };

    fn lit(b: &mut Builder<ByteSetSolver>, c: u8) -> NodeId {
        b.singleton(ByteSet::byte(c))
    }

    #[test]
    fn singleton_derivative() {
        let mut b = Builder::new(ByteSetSolver);
        let ab = b.singleton(ByteSet::from_bytes(b"ab"));
        let d = b.derivative(ab, ByteSet::byte(b'a'), MIDDLE).unwrap();
        assert_eq!(d, b.epsilon());
        let d = b.derivative(ab, ByteSet::byte(b'z'), MIDDLE).unwrap();
        assert_eq!(d, b.nothing());
        let eps = b.epsilon();
        assert_eq!(b.derivative(eps, ByteSet::byte(b'a'), MIDDLE).unwrap(), b.nothing());
    }

    #[test]
    fn greedy_optional_prefers_consuming() {
        // a?a on "a": staying inside the optional comes first
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let opt = b.repeat(a, 0, 1, false);
        let x = b.concat(opt, a);
        let d = b.derivative(x, ByteSet::byte(b'a'), MIDDLE).unwrap();
        let d = b.strip_effects(d).unwrap();
        assert_eq!(b.to_list(d, ListKind::OrderedOr), vec![a, b.epsilon()]);
    }

    #[test]
    fn lazy_optional_prefers_skipping() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let opt = b.repeat(a, 0, 1, true);
        let x = b.concat(opt, a);
        let d = b.derivative(x, ByteSet::byte(b'a'), MIDDLE).unwrap();
        let d = b.strip_effects(d).unwrap();
        assert_eq!(b.to_list(d, ListKind::OrderedOr), vec![b.epsilon(), a]);
    }

    #[test]
    fn loops_peel_one_iteration() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let x = b.repeat(a, 2, 3, false);
        let d = b.derivative(x, ByteSet::byte(b'a'), MIDDLE).unwrap();
        assert_eq!(d, b.repeat(a, 1, 2, false));
        let star = b.repeat(a, 0, UNBOUNDED, false);
        let d = b.derivative(star, ByteSet::byte(b'a'), MIDDLE).unwrap();
        assert_eq!(d, star);
        // a lazy star at a nullable position stops right there
        let lazy = b.repeat(a, 0, UNBOUNDED, true);
        assert_eq!(b.derivative(lazy, ByteSet::byte(b'a'), MIDDLE).unwrap(), b.nothing());
        let d = b.derivative(x, ByteSet::byte(b'c'), MIDDLE).unwrap();
        assert_eq!(d, b.nothing());
    }

    #[test]
    fn pruning_follows_backtracking_choices() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let lazy = b.repeat(a, 0, 5, true);
        assert_eq!(b.prune_lower_priority_than_nullability(lazy, MIDDLE).unwrap(), b.epsilon());

        // (a{0,5}?|c)a* keeps only a*
        let alt = b.ordered_or(lazy, c);
        let star = b.repeat(a, 0, UNBOUNDED, false);
        let x = b.concat(alt, star);
        assert_eq!(b.prune_lower_priority_than_nullability(x, MIDDLE).unwrap(), star);

        // c|a* keeps both, the nullable side is last
        let y = b.ordered_or(c, star);
        let pruned = b.prune_lower_priority_than_nullability(y, MIDDLE).unwrap();
        assert_eq!(b.to_list(pruned, ListKind::OrderedOr), vec![c, star]);
    }

    #[test]
    fn pruning_drops_alternatives_after_empty_match() {
        // a*|ab never reaches ab, since a* already accepts the empty match
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'b');
        let star = b.repeat(a, 0, UNBOUNDED, false);
        let ab = b.concat(a, c);
        let x = b.ordered_or(star, ab);
        let d = b.derivative(x, ByteSet::byte(b'a'), MIDDLE).unwrap();
        assert_eq!(d, star);
        let d = b.derivative(d, ByteSet::byte(b'b'), MIDDLE).unwrap();
        assert_eq!(d, b.nothing());
    }

    #[test]
    fn disabled_backtracking_keeps_all_alternatives() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'b');
        let star = b.repeat(a, 0, UNBOUNDED, false);
        let ab = b.concat(a, c);
        let x = b.ordered_or(star, ab);
        let root = b.disable_backtracking_simulation(x);
        let d = b.derivative(root, ByteSet::byte(b'a'), MIDDLE).unwrap();
        let d = b.derivative(d, ByteSet::byte(b'b'), MIDDLE).unwrap();
        let eps = b.epsilon();
        assert_eq!(*b.kind(d), NodeKind::DisableBacktrackingSimulation(eps));
    }

    #[test]
    fn boolean_derivatives() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let star = b.any_star();
        let ac = b.concat(a, c);
        let x = b.concat(star, ac);
        let not_ac = b.not(x);
        let d = b.derivative(not_ac, ByteSet::byte(b'a'), MIDDLE).unwrap();
        assert!(matches!(b.kind(d), NodeKind::Not(_)));
        let d = b.derivative(d, ByteSet::byte(b'c'), MIDDLE).unwrap();
        assert!(!b.is_nullable_for(d, MIDDLE));

        let both = b.and([x, star]);
        assert_eq!(both, x);
        let aa = b.concat(a, a);
        let either = b.or([aa, ac]);
        let d = b.derivative(either, ByteSet::byte(b'a'), MIDDLE).unwrap();
        let expected = b.singleton(ByteSet::from_bytes(b"ac"));
        assert_eq!(d, expected);
    }

    #[test]
    fn derivatives_are_cached() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let x = b.repeat(a, 2, 3, false);
        let d = b.derivative(x, ByteSet::byte(b'a'), MIDDLE).unwrap();
        assert_eq!(b.derivative_cache.get(&(x, ByteSet::byte(b'a'), MIDDLE)), Some(&d));
    }

    #[test]
    #[should_panic(expected = "strip effects first")]
    fn effect_nodes_have_no_derivative() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let cs = b.capture_start(0);
        let eff = b.effect(a, cs);
        let _ = b.derivative(eff, ByteSet::byte(b'a'), MIDDLE);
    }
}
