//! Canonical alternatives sets for unordered `Or` and `And`.

use rustc_hash::FxHashSet;

use crate::builder::Builder;
use crate::node::{NodeId, NodeKind};
use crate::solver::Solver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AltKind {
    Or,
    And,
}

/// A deduplicated collection of alternatives sorted by node id.
///
/// Two sets with the same members compare equal regardless of the order the
/// members were supplied in, which makes `Or` and `And` nodes intern by
/// content. A set that met its absorbing element (`.*` for `Or`, nothing for
/// `And`) is `absorbed` and keeps no members.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AltSet {
    kind: AltKind,
    elems: Box<[NodeId]>,
    absorbed: bool,
}

impl AltSet {
    pub fn kind(&self) -> AltKind {
        self.kind
    }

    /// True when the set denotes the empty language.
    pub fn is_nothing(&self) -> bool {
        match self.kind {
            AltKind::Or => !self.absorbed && self.elems.is_empty(),
            AltKind::And => self.absorbed,
        }
    }

    /// True when the set denotes every string.
    pub fn is_everything(&self) -> bool {
        match self.kind {
            AltKind::Or => self.absorbed,
            AltKind::And => !self.absorbed && self.elems.is_empty(),
        }
    }

    pub fn singleton(&self) -> Option<NodeId> {
        match &*self.elems {
            [only] if !self.absorbed => Some(*only),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.elems.iter().copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.elems
    }
}

impl<S: Solver> Builder<S> {
    /// Canonicalizes `items` into an alternatives set of the given kind.
    ///
    /// Nested collections of the same kind are flattened, identity elements
    /// dropped and singleton predicates merged into one singleton.
    pub(crate) fn alt_set<I>(&mut self, kind: AltKind, items: I) -> AltSet
    where
        I: IntoIterator<Item = NodeId>,
    {
        let nothing = self.nothing();
        let mut todo: Vec<NodeId> = items.into_iter().collect();
        todo.reverse();
        let mut seen = FxHashSet::default();
        let mut elems = Vec::new();
        let mut merged: Option<S::Set> = None;
        let mut absorbed = false;

        while let Some(id) = todo.pop() {
            match (kind, self.kind(id)) {
                (AltKind::Or, NodeKind::Or(alts)) | (AltKind::And, NodeKind::And(alts)) => {
                    todo.extend(alts.as_slice().iter().rev().copied());
                    continue;
                }
                _ => {}
            }
            let (identity, absorbing) = match kind {
                AltKind::Or => (id == nothing, self.is_any_star(id)),
                AltKind::And => (self.is_any_star(id), id == nothing),
            };
            if identity {
                continue;
            }
            if absorbing {
                absorbed = true;
                break;
            }
            if let NodeKind::Singleton(set) = *self.kind(id) {
                merged = Some(match (merged, kind) {
                    (None, _) => set,
                    (Some(acc), AltKind::Or) => self.solver().or(acc, set),
                    (Some(acc), AltKind::And) => self.solver().and(acc, set),
                });
                continue;
            }
            let id = self.internalize(id);
            if seen.insert(id) {
                elems.push(id);
            }
        }

        if !absorbed {
            if let Some(set) = merged {
                let single = self.singleton(set);
                if kind == AltKind::And && single == nothing {
                    absorbed = true;
                } else if seen.insert(single) {
                    elems.push(single);
                }
            }
        }
        if absorbed {
            elems.clear();
        }
        elems.sort_unstable();
        AltSet {
            kind,
            elems: elems.into_boxed_slice(),
            absorbed,
        }
    }
}
