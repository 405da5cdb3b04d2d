//! Whole-pattern transformations: reversal, anchor pruning, fixed lengths
//! and the predicates a pattern distinguishes.

use rustc_hash::FxHashSet;

use crate::builder::{Builder, ListKind};
use crate::context::CharKind;
use crate::error::Result;
use crate::node::{NodeId, NodeKind};
use crate::solver::Solver;

impl<S: Solver> Builder<S> {
    /// Pattern matching the reversed strings of `node`, used to find match
    /// starts by scanning backwards. Anchors swap with their mirror images
    /// and fixed length markers are dropped.
    pub fn reverse(&mut self, node: NodeId) -> Result<NodeId> {
        self.guarded(move |b| b.reverse_uncached(node))
    }

    fn reverse_uncached(&mut self, node: NodeId) -> Result<NodeId> {
        let reversed = match self.kind(node).clone() {
            NodeKind::Loop {
                body,
                lower,
                upper,
                lazy,
            } => {
                let body = self.reverse(body)?;
                self.repeat(body, lower, upper, lazy)
            }
            NodeKind::Concat(..) => {
                let mut reversed = self.epsilon();
                for elem in self.to_list(node, ListKind::Concat) {
                    let elem = self.reverse(elem)?;
                    reversed = self.concat(elem, reversed);
                }
                reversed
            }
            NodeKind::OrderedOr(..) => {
                let elems = self.to_list(node, ListKind::OrderedOr);
                let mut reversed = self.nothing();
                for &elem in elems.iter().rev() {
                    let elem = self.reverse(elem)?;
                    reversed = self.ordered_or(elem, reversed);
                }
                reversed
            }
            NodeKind::Or(alts) => {
                let members = self.reverse_members(alts.as_slice())?;
                self.or(members)
            }
            NodeKind::And(alts) => {
                let members = self.reverse_members(alts.as_slice())?;
                self.and(members)
            }
            NodeKind::Not(child) => {
                let child = self.reverse(child)?;
                self.not(child)
            }
            NodeKind::DisableBacktrackingSimulation(child) => {
                let child = self.reverse(child)?;
                self.disable_backtracking_simulation(child)
            }
            NodeKind::Effect { node: inner, effect } => {
                let inner = self.reverse(inner)?;
                self.effect(inner, effect)
            }
            NodeKind::FixedLengthMarker(_) => self.epsilon(),
            NodeKind::BeginAnchor => self.end_anchor(),
            NodeKind::EndAnchor => self.begin_anchor(),
            NodeKind::BolAnchor => self.eol_anchor(),
            NodeKind::EolAnchor => self.bol_anchor(),
            NodeKind::EndAnchorZ => self.end_anchor_z_reverse(),
            NodeKind::EndAnchorZReverse => self.end_anchor_z(),
            _ => node,
        };
        Ok(reversed)
    }

    fn reverse_members(&mut self, members: &[NodeId]) -> Result<Vec<NodeId>> {
        members.iter().map(|&m| self.reverse(m)).collect()
    }

    /// Removes leading anchors that cannot hold after a character of kind
    /// `prev`. `cont_word` and `cont_non_word` tell whether the input can
    /// continue with a word letter or a non word letter (or stop).
    pub fn prune_anchors(
        &mut self,
        node: NodeId,
        prev: CharKind,
        cont_word: bool,
        cont_non_word: bool,
    ) -> Result<NodeId> {
        if !self.info(node).starts_with_some_anchor() {
            return Ok(node);
        }
        let key = (node, prev, cont_word, cont_non_word);
        if let Some(&pruned) = self.prune_anchors_cache.get(&key) {
            return Ok(pruned);
        }
        let pruned =
            self.guarded(move |b| b.prune_anchors_uncached(node, prev, cont_word, cont_non_word))?;
        self.prune_anchors_cache.insert(key, pruned);
        Ok(pruned)
    }

    fn prune_anchors_uncached(
        &mut self,
        node: NodeId,
        prev: CharKind,
        cont_word: bool,
        cont_non_word: bool,
    ) -> Result<NodeId> {
        let after_word = prev == CharKind::WordLetter;
        let pruned = match self.kind(node).clone() {
            NodeKind::BeginAnchor if prev != CharKind::BeginningEnd => self.nothing(),
            NodeKind::EndAnchorZReverse if !prev.is_beginning_end() => self.nothing(),
            NodeKind::BoundaryAnchor => {
                let possible = if after_word { cont_non_word } else { cont_word };
                if possible {
                    node
                } else {
                    self.nothing()
                }
            }
            NodeKind::NonBoundaryAnchor => {
                let possible = if after_word { cont_word } else { cont_non_word };
                if possible {
                    node
                } else {
                    self.nothing()
                }
            }
            NodeKind::Loop {
                body,
                lower,
                upper,
                lazy,
            } => {
                let pruned = self.prune_anchors(body, prev, cont_word, cont_non_word)?;
                if pruned == body {
                    node
                } else {
                    self.repeat(pruned, lower, upper, lazy)
                }
            }
            NodeKind::Concat(l, r) => {
                let pl = self.prune_anchors(l, prev, cont_word, cont_non_word)?;
                let pr = if self.info(l).is_nullable() {
                    self.prune_anchors(r, prev, cont_word, cont_non_word)?
                } else {
                    r
                };
                if pl == l && pr == r {
                    node
                } else {
                    self.concat(pl, pr)
                }
            }
            NodeKind::Or(alts) => {
                let mut members = Vec::with_capacity(alts.len());
                for member in alts.iter() {
                    members.push(self.prune_anchors(member, prev, cont_word, cont_non_word)?);
                }
                self.or(members)
            }
            NodeKind::OrderedOr(l, r) => {
                let pl = self.prune_anchors(l, prev, cont_word, cont_non_word)?;
                let pr = self.prune_anchors(r, prev, cont_word, cont_non_word)?;
                if pl == l && pr == r {
                    node
                } else {
                    self.ordered_or(pl, pr)
                }
            }
            NodeKind::Effect { node: inner, effect } => {
                let pruned = self.prune_anchors(inner, prev, cont_word, cont_non_word)?;
                if pruned == inner {
                    node
                } else {
                    self.effect(pruned, effect)
                }
            }
            NodeKind::DisableBacktrackingSimulation(child) => {
                let pruned = self.prune_anchors(child, prev, cont_word, cont_non_word)?;
                if pruned == child {
                    node
                } else {
                    self.disable_backtracking_simulation(pruned)
                }
            }
            _ => node,
        };
        Ok(pruned)
    }

    /// Length of every match of `node`, if they all have the same length.
    /// Deep nodes whose traversal cannot continue count as unknown.
    pub fn get_fixed_length(&mut self, node: NodeId) -> Option<u32> {
        self.fixed_length(node).ok().flatten()
    }

    fn fixed_length(&mut self, node: NodeId) -> Result<Option<u32>> {
        self.guarded(move |b| b.fixed_length_uncached(node))
    }

    fn fixed_length_uncached(&mut self, node: NodeId) -> Result<Option<u32>> {
        let length = match self.kind(node).clone() {
            NodeKind::Singleton(_) => Some(1),
            NodeKind::Loop {
                body, lower, upper, ..
            } if lower == upper => self
                .fixed_length(body)?
                .and_then(|len| len.checked_mul(lower)),
            NodeKind::Concat(..) => {
                let mut total = Some(0u32);
                for elem in self.to_list(node, ListKind::Concat) {
                    let Some(sum) = total else { break };
                    total = match self.fixed_length(elem)? {
                        Some(len) => sum.checked_add(len),
                        None => None,
                    };
                }
                total
            }
            NodeKind::OrderedOr(..) => {
                let elems = self.to_list(node, ListKind::OrderedOr);
                self.common_length(&elems)?
            }
            NodeKind::Or(alts) => self.common_length(alts.as_slice())?,
            NodeKind::DisableBacktrackingSimulation(child) | NodeKind::Effect { node: child, .. } => {
                self.fixed_length(child)?
            }
            kind if kind.is_anchor() => Some(0),
            NodeKind::Epsilon
            | NodeKind::FixedLengthMarker(_)
            | NodeKind::CaptureStart(_)
            | NodeKind::CaptureEnd(_) => Some(0),
            _ => None,
        };
        Ok(length)
    }

    fn common_length(&mut self, members: &[NodeId]) -> Result<Option<u32>> {
        let mut common = None;
        for &member in members {
            match (self.fixed_length(member)?, common) {
                (None, _) => return Ok(None),
                (Some(len), None) => common = Some(len),
                (Some(len), Some(seen)) if len != seen => return Ok(None),
                _ => {}
            }
        }
        Ok(common)
    }

    /// Every predicate `node` distinguishes. Line anchors contribute the
    /// newline set and word boundaries the word letter set.
    pub fn sets(&self, node: NodeId) -> Vec<S::Set> {
        let mut sets = FxHashSet::default();
        let mut visited = FxHashSet::default();
        let mut todo = vec![node];
        while let Some(id) = todo.pop() {
            if !visited.insert(id) {
                continue;
            }
            match self.kind(id) {
                NodeKind::Singleton(set) => {
                    sets.insert(*set);
                }
                NodeKind::BolAnchor
                | NodeKind::EolAnchor
                | NodeKind::EndAnchorZ
                | NodeKind::EndAnchorZReverse => {
                    sets.insert(self.solver().newline());
                }
                NodeKind::BoundaryAnchor | NodeKind::NonBoundaryAnchor => {
                    sets.insert(self.solver().word_letter());
                }
                NodeKind::Loop { body: child, .. }
                | NodeKind::Not(child)
                | NodeKind::DisableBacktrackingSimulation(child) => todo.push(*child),
                NodeKind::Effect { node, effect } => todo.extend([*node, *effect]),
                NodeKind::Concat(l, r) | NodeKind::OrderedOr(l, r) => todo.extend([*l, *r]),
                NodeKind::Or(alts) | NodeKind::And(alts) => todo.extend(alts.iter()),
                _ => {}
            }
        }
        let mut sets: Vec<S::Set> = sets.into_iter().collect();
        sets.sort_unstable();
        sets
    }

    /// Sorted minterms of the predicates of `node`.
    pub fn compute_minterms(&self, node: NodeId) -> Vec<S::Set> {
        let sets = self.sets(node);
        self.solver().generate_minterms(&sets)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::Builder;
    use crate::context::CharKind;
    use crate::node::{NodeId, UNBOUNDED};
    use crate::solver::{ByteSet, ByteSetSolver};

    fn lit(b: &mut Builder<ByteSetSolver>, c: u8) -> NodeId {
        b.singleton(ByteSet::byte(c))
    }

    #[test]
    fn reverse_flips_concatenation_and_anchors() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let begin = b.begin_anchor();
        let x = b.concat_all([begin, a, c]);
        let r = b.reverse(x).unwrap();
        let end = b.end_anchor();
        assert_eq!(r, b.concat_all([c, a, end]));

        let marker = b.fixed_length_marker(2);
        let y = b.concat(a, marker);
        assert_eq!(b.reverse(y).unwrap(), a);
        let end_z = b.end_anchor_z();
        assert_eq!(b.reverse(end_z).unwrap(), b.end_anchor_z_reverse());
    }

    #[test]
    fn reverse_twice_is_identity_without_anchors() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let d = lit(&mut b, b'd');
        let star = b.repeat(c, 0, UNBOUNDED, true);
        let ad = b.concat(a, d);
        let x = b.concat_all([a, star, ad]);
        let y = b.repeat(x, 1, 3, false);
        let r = b.reverse(y).unwrap();
        assert_ne!(r, y);
        assert_eq!(b.reverse(r).unwrap(), y);
    }

    #[test]
    fn anchors_pruned_by_previous_kind() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let begin = b.begin_anchor();
        let x = b.concat(begin, a);
        assert_eq!(b.prune_anchors(x, CharKind::General, true, true).unwrap(), b.nothing());
        assert_eq!(b.prune_anchors(x, CharKind::BeginningEnd, true, true).unwrap(), x);

        let boundary = b.boundary_anchor();
        let y = b.concat(boundary, a);
        // after a word letter, \b needs a non word continuation
        assert_eq!(b.prune_anchors(y, CharKind::WordLetter, true, false).unwrap(), b.nothing());
        assert_eq!(b.prune_anchors(y, CharKind::WordLetter, false, true).unwrap(), y);
        let non_boundary = b.non_boundary_anchor();
        let z = b.ordered_or(non_boundary, a);
        assert_eq!(b.prune_anchors(z, CharKind::General, true, false).unwrap(), a);
        assert!(b.prune_anchors_cache.contains_key(&(z, CharKind::General, true, false)));
        // nodes that cannot start with an anchor are returned as is
        assert_eq!(b.prune_anchors(a, CharKind::General, false, false).unwrap(), a);
    }

    #[test]
    fn fixed_lengths() {
        let mut b = Builder::new(ByteSetSolver);
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let ac = b.concat(a, c);
        assert_eq!(b.get_fixed_length(ac), Some(2));
        let twice = b.repeat(a, 2, 2, false);
        assert_eq!(b.get_fixed_length(twice), Some(2));
        let either = b.ordered_or(ac, twice);
        assert_eq!(b.get_fixed_length(either), Some(2));
        let uneven = b.ordered_or(a, ac);
        assert_eq!(b.get_fixed_length(uneven), None);
        let star = b.repeat(a, 0, UNBOUNDED, false);
        assert_eq!(b.get_fixed_length(star), None);
        let anchored = b.concat_all([b.begin_anchor(), ac, b.end_anchor()]);
        assert_eq!(b.get_fixed_length(anchored), Some(2));
        let huge = b.repeat(twice, u32::MAX / 2 + 1, u32::MAX / 2 + 1, false);
        assert_eq!(b.get_fixed_length(huge), None);
    }

    #[test]
    fn sets_and_minterms() {
        let mut b = Builder::new(ByteSetSolver);
        let ab = b.singleton(ByteSet::from_bytes(b"ab"));
        let bc = b.singleton(ByteSet::from_bytes(b"bc"));
        let x = b.concat(ab, bc);
        assert_eq!(b.sets(x).len(), 2);
        let minterms = b.compute_minterms(x);
        assert_eq!(minterms.len(), 4);
        assert!(minterms.contains(&ByteSet::byte(b'b')));

        let bol = b.bol_anchor();
        let y = b.concat(bol, ab);
        assert!(b.sets(y).contains(&ByteSet::byte(b'\n')));
        let boundary = b.boundary_anchor();
        assert_eq!(b.sets(boundary), vec![ByteSet::word()]);
        let eps = b.epsilon();
        assert_eq!(b.compute_minterms(eps), vec![ByteSet::FULL]);
    }
}
