//! Interning table, memoization caches and smart constructors.
//!
//! Every node is created through a [`Builder`], which hash-conses nodes so
//! structurally equal nodes share one [`NodeId`]. The one exception is an
//! ordered alternation at the top of a result: it is looked up but not
//! inserted until it is used as a child or passed to
//! [`Builder::internalize`]. Derivative states are mostly such alternations
//! and interning every one of them would pin each intermediate state in the
//! table.
//!
//! Constructors never fail. They normalize as they build, so a tree that was
//! built here is already simplified with respect to the algebra laws.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::alts::{AltKind, AltSet};
use crate::context::{CharKind, Context};
use crate::error::Result;
use crate::info::RegexInfo;
use crate::node::{Node, NodeId, NodeKind, UNBOUNDED};
use crate::solver::Solver;
use crate::stack::{self, StackGuard};

/// Tunables of a builder. The defaults are empirical, not semantic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Rule applications after which subsumption gives up and answers false.
    pub subsumption_depth_limit: u32,
    /// Guarded recursive frames run per stack segment.
    pub stack_segment_depth: usize,
    /// Size in bytes of each fresh stack segment.
    pub stack_segment_size: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            subsumption_depth_limit: 50,
            stack_segment_depth: 128,
            stack_segment_size: 8 * 1024 * 1024,
        }
    }
}

/// Which binary spine [`Builder::to_list`] flattens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Concat,
    OrderedOr,
}

/// Owner of every node of one pattern universe and of the caches over them.
///
/// Construction and derivation take `&mut self`; share a builder between
/// threads behind a lock. Nullability queries only need `&self`.
pub struct Builder<S: Solver> {
    solver: S,
    config: BuilderConfig,
    nodes: Vec<Node<S::Set>>,
    interned: FxHashMap<NodeKind<S::Set>, NodeId>,
    pub(crate) derivative_cache: FxHashMap<(NodeId, S::Set, Context), NodeId>,
    pub(crate) subsumption_cache: FxHashMap<(NodeId, NodeId), bool>,
    pub(crate) prune_anchors_cache: FxHashMap<(NodeId, CharKind, bool, bool), NodeId>,
    pub(crate) prune_priority_cache: FxHashMap<(NodeId, Context), NodeId>,
    stack: StackGuard,
    nothing: NodeId,
    epsilon: NodeId,
    any_char: NodeId,
    any_star: NodeId,
    begin: NodeId,
    end: NodeId,
    bol: NodeId,
    eol: NodeId,
    boundary: NodeId,
    non_boundary: NodeId,
    end_z: NodeId,
    end_z_reverse: NodeId,
}

impl<S: Solver> Builder<S> {
    pub fn new(solver: S) -> Self {
        Self::with_config(solver, BuilderConfig::default())
    }

    pub fn with_config(solver: S, config: BuilderConfig) -> Self {
        debug!("creating builder with {config:?}");
        let placeholder = NodeId::new(0);
        let stack = StackGuard::new(config.stack_segment_depth, config.stack_segment_size);
        let mut builder = Builder {
            solver,
            config,
            nodes: Vec::new(),
            interned: FxHashMap::default(),
            derivative_cache: FxHashMap::default(),
            subsumption_cache: FxHashMap::default(),
            prune_anchors_cache: FxHashMap::default(),
            prune_priority_cache: FxHashMap::default(),
            stack,
            nothing: placeholder,
            epsilon: placeholder,
            any_char: placeholder,
            any_star: placeholder,
            begin: placeholder,
            end: placeholder,
            bol: placeholder,
            eol: placeholder,
            boundary: placeholder,
            non_boundary: placeholder,
            end_z: placeholder,
            end_z_reverse: placeholder,
        };

        let empty = builder.solver.empty();
        let full = builder.solver.full();
        builder.nothing = builder.create(NodeKind::Singleton(empty), RegexInfo::empty());
        builder.epsilon = builder.create(NodeKind::Epsilon, nullable_info());
        builder.any_char = builder.create(NodeKind::Singleton(full), RegexInfo::empty());
        builder.any_star = builder.create_loop(builder.any_char, 0, UNBOUNDED, false);

        let anchor = RegexInfo::CAN_BE_NULLABLE | RegexInfo::STARTS_WITH_SOME_ANCHOR;
        let line_anchor = anchor | RegexInfo::STARTS_WITH_LINE_ANCHOR;
        builder.begin = builder.create(NodeKind::BeginAnchor, anchor.normalized());
        builder.end = builder.create(NodeKind::EndAnchor, anchor.normalized());
        builder.bol = builder.create(NodeKind::BolAnchor, line_anchor.normalized());
        builder.eol = builder.create(NodeKind::EolAnchor, line_anchor.normalized());
        builder.end_z = builder.create(NodeKind::EndAnchorZ, line_anchor.normalized());
        builder.end_z_reverse =
            builder.create(NodeKind::EndAnchorZReverse, line_anchor.normalized());
        builder.boundary = builder.create(NodeKind::BoundaryAnchor, anchor.normalized());
        builder.non_boundary = builder.create(NodeKind::NonBoundaryAnchor, anchor.normalized());
        builder
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Number of nodes allocated so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node<S::Set> {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind<S::Set> {
        &self.nodes[id.index()].kind
    }

    pub fn info(&self, id: NodeId) -> RegexInfo {
        self.nodes[id.index()].info
    }

    /// Union of the predicates that can begin a match of `id`.
    pub fn start_set(&self, id: NodeId) -> S::Set {
        self.nodes[id.index()].start_set
    }

    pub fn nothing(&self) -> NodeId {
        self.nothing
    }

    pub fn epsilon(&self) -> NodeId {
        self.epsilon
    }

    pub fn any_char(&self) -> NodeId {
        self.any_char
    }

    pub fn any_star(&self) -> NodeId {
        self.any_star
    }

    pub fn begin_anchor(&self) -> NodeId {
        self.begin
    }

    pub fn end_anchor(&self) -> NodeId {
        self.end
    }

    pub fn bol_anchor(&self) -> NodeId {
        self.bol
    }

    pub fn eol_anchor(&self) -> NodeId {
        self.eol
    }

    pub fn boundary_anchor(&self) -> NodeId {
        self.boundary
    }

    pub fn non_boundary_anchor(&self) -> NodeId {
        self.non_boundary
    }

    pub fn end_anchor_z(&self) -> NodeId {
        self.end_z
    }

    pub fn end_anchor_z_reverse(&self) -> NodeId {
        self.end_z_reverse
    }

    pub fn is_nothing(&self, id: NodeId) -> bool {
        id == self.nothing
    }

    pub fn is_epsilon(&self, id: NodeId) -> bool {
        id == self.epsilon
    }

    /// True for the eager `.*` over the full predicate.
    pub fn is_any_star(&self, id: NodeId) -> bool {
        match *self.kind(id) {
            NodeKind::Loop {
                body,
                lower: 0,
                upper: UNBOUNDED,
                lazy: false,
            } => matches!(*self.kind(body), NodeKind::Singleton(set) if self.solver.is_full(set)),
            _ => false,
        }
    }

    fn is_any_plus(&self, id: NodeId) -> bool {
        matches!(
            *self.kind(id),
            NodeKind::Loop { body, lower: 1, upper: UNBOUNDED, .. } if body == self.any_char
        )
    }

    /// Runs `f` as one guarded recursive frame, hopping to a fresh stack
    /// segment when the frame count says so.
    pub(crate) fn guarded<T, F>(&mut self, f: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut Self) -> Result<T> + Send,
    {
        let result = if self.stack.enter() {
            self.stack.record_segment();
            let size = self.stack.segment_size();
            let depth = self.stack.depth();
            let this = &mut *self;
            stack::on_fresh_segment(size, depth, move || f(this))
        } else {
            f(self)
        };
        self.stack.exit();
        result
    }

    /// Number of fresh stack segments used so far.
    pub fn stack_segments(&self) -> usize {
        self.stack.segments()
    }

    fn push(&mut self, kind: NodeKind<S::Set>, info: RegexInfo) -> NodeId {
        let start_set = self.compute_start_set(&kind);
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(kind, info, start_set));
        id
    }

    fn create(&mut self, kind: NodeKind<S::Set>, info: RegexInfo) -> NodeId {
        let kind = kind.map_children(|child| self.internalize(child));
        if let Some(&id) = self.interned.get(&kind) {
            return id;
        }
        if matches!(kind, NodeKind::OrderedOr(..)) {
            return self.push(kind, info);
        }
        let id = self.push(kind.clone(), info);
        self.interned.insert(kind, id);
        id
    }

    /// Interns an ordered alternation that was created at top level. Returns
    /// the canonical node structurally equal to `id`; other kinds are
    /// returned unchanged.
    pub fn internalize(&mut self, id: NodeId) -> NodeId {
        let node = &self.nodes[id.index()];
        if node.internalized || !matches!(node.kind, NodeKind::OrderedOr(..)) {
            return id;
        }
        let kind = node.kind.clone();
        if let Some(&existing) = self.interned.get(&kind) {
            return existing;
        }
        self.nodes[id.index()].internalized = true;
        self.interned.insert(kind, id);
        id
    }

    fn compute_start_set(&self, kind: &NodeKind<S::Set>) -> S::Set {
        let solver = &self.solver;
        match kind {
            NodeKind::Singleton(set) => *set,
            NodeKind::Loop { body: child, .. }
            | NodeKind::Effect { node: child, .. }
            | NodeKind::DisableBacktrackingSimulation(child) => self.start_set(*child),
            NodeKind::Concat(l, r) => {
                if self.info(*l).can_be_nullable() {
                    solver.or(self.start_set(*l), self.start_set(*r))
                } else {
                    self.start_set(*l)
                }
            }
            NodeKind::OrderedOr(l, r) => solver.or(self.start_set(*l), self.start_set(*r)),
            NodeKind::Or(alts) => alts
                .iter()
                .fold(solver.empty(), |acc, id| solver.or(acc, self.start_set(id))),
            NodeKind::And(alts) => alts
                .iter()
                .fold(solver.full(), |acc, id| solver.and(acc, self.start_set(id))),
            NodeKind::Not(_) => solver.full(),
            _ => solver.empty(),
        }
    }

    pub fn singleton(&mut self, set: S::Set) -> NodeId {
        self.create(NodeKind::Singleton(set), RegexInfo::empty())
    }

    pub fn capture_start(&mut self, capture_number: u32) -> NodeId {
        self.create(NodeKind::CaptureStart(capture_number), nullable_info())
    }

    pub fn capture_end(&mut self, capture_number: u32) -> NodeId {
        self.create(NodeKind::CaptureEnd(capture_number), nullable_info())
    }

    /// `node` wrapped in start and end markers of the given capture group.
    pub fn capture(&mut self, node: NodeId, capture_number: u32) -> NodeId {
        let start = self.capture_start(capture_number);
        let end = self.capture_end(capture_number);
        self.concat_all([start, node, end])
    }

    pub fn fixed_length_marker(&mut self, length: u32) -> NodeId {
        self.create(NodeKind::FixedLengthMarker(length), nullable_info())
    }

    pub fn disable_backtracking_simulation(&mut self, child: NodeId) -> NodeId {
        if matches!(self.kind(child), NodeKind::DisableBacktrackingSimulation(_)) {
            return child;
        }
        let info = self.info(child);
        self.create(NodeKind::DisableBacktrackingSimulation(child), info)
    }

    pub fn concat(&mut self, left: NodeId, right: NodeId) -> NodeId {
        if left == self.nothing || right == self.nothing {
            return self.nothing;
        }
        if left == self.epsilon {
            return right;
        }
        if right == self.epsilon {
            return left;
        }
        // effects float to the top of a concatenation
        if let NodeKind::Effect { node, effect } = *self.kind(left) {
            let inner = self.concat(node, right);
            return self.effect(inner, effect);
        }
        let info = RegexInfo::concat(self.info(left), self.info(right));
        self.create(NodeKind::Concat(left, right), info)
    }

    /// Right associated concatenation of `items`. Nested concatenations are
    /// flattened first.
    pub fn concat_all<I>(&mut self, items: I) -> NodeId
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut elems = Vec::new();
        for id in items {
            elems.extend(self.to_list(id, ListKind::Concat));
        }
        let mut result = self.epsilon;
        for &id in elems.iter().rev() {
            result = self.concat(id, result);
        }
        result
    }

    /// Loop with the construction laws applied: `{1,1}` is the body, `{0,0}`
    /// is epsilon and loops over nothing or epsilon collapse.
    ///
    /// # Panics
    ///
    /// When `lower > upper`.
    pub fn repeat(&mut self, body: NodeId, lower: u32, upper: u32, lazy: bool) -> NodeId {
        assert!(
            lower <= upper,
            "loop lower bound {lower} exceeds upper bound {upper}"
        );
        if lower == 1 && upper == 1 {
            return body;
        }
        if upper == 0 || body == self.epsilon {
            return self.epsilon;
        }
        if body == self.nothing {
            return if lower == 0 { self.epsilon } else { self.nothing };
        }
        self.create_loop(body, lower, upper, lazy)
    }

    fn create_loop(&mut self, body: NodeId, lower: u32, upper: u32, lazy: bool) -> NodeId {
        // (X?)? and friends become a single optional
        if lower == 0 && upper == 1 {
            if let NodeKind::Loop {
                body: inner,
                lower: 0,
                upper: 1,
                lazy: inner_lazy,
            } = *self.kind(body)
            {
                return self.create_loop(inner, 0, 1, lazy || inner_lazy);
            }
        }
        let info = RegexInfo::looped(self.info(body), lower, lazy);
        self.create(
            NodeKind::Loop {
                body,
                lower,
                upper,
                lazy,
            },
            info,
        )
    }

    /// `node` with the effects of `effect` applied before it.
    pub fn effect(&mut self, node: NodeId, effect: NodeId) -> NodeId {
        if effect == self.epsilon {
            return node;
        }
        if node == self.nothing {
            return self.nothing;
        }
        if let NodeKind::Effect {
            node: inner,
            effect: inner_effect,
        } = *self.kind(node)
        {
            let combined = self.concat(effect, inner_effect);
            return self.effect(inner, combined);
        }
        let info = RegexInfo::effect(self.info(node));
        self.create(NodeKind::Effect { node, effect }, info)
    }

    /// Unordered disjunction.
    pub fn or<I>(&mut self, items: I) -> NodeId
    where
        I: IntoIterator<Item = NodeId>,
    {
        let alts = self.alt_set(AltKind::Or, items);
        self.collection(alts)
    }

    /// Unordered conjunction.
    pub fn and<I>(&mut self, items: I) -> NodeId
    where
        I: IntoIterator<Item = NodeId>,
    {
        let alts = self.alt_set(AltKind::And, items);
        self.collection(alts)
    }

    pub(crate) fn collection(&mut self, alts: AltSet) -> NodeId {
        if alts.is_nothing() {
            return self.nothing;
        }
        if alts.is_everything() {
            return self.any_star;
        }
        if let Some(only) = alts.singleton() {
            return only;
        }
        let infos: Vec<RegexInfo> = alts.iter().map(|id| self.info(id)).collect();
        match alts.kind() {
            AltKind::Or => self.create(NodeKind::Or(alts), RegexInfo::or(infos)),
            AltKind::And => self.create(NodeKind::And(alts), RegexInfo::and(infos)),
        }
    }

    /// Complement, pushed to the leaves with De Morgan's laws.
    pub fn not(&mut self, root: NodeId) -> NodeId {
        let mut nnf: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut todo = vec![(root, false)];
        while let Some((node, members_done)) = todo.pop() {
            if members_done {
                let (is_or, members) = match self.kind(node) {
                    NodeKind::Or(alts) => (true, alts.as_slice().to_vec()),
                    NodeKind::And(alts) => (false, alts.as_slice().to_vec()),
                    _ => continue,
                };
                let negated: Vec<NodeId> = members.iter().map(|m| nnf[m]).collect();
                let result = if is_or {
                    self.and(negated)
                } else {
                    self.or(negated)
                };
                nnf.insert(node, result);
                continue;
            }
            if nnf.contains_key(&node) {
                continue;
            }
            let negated = match self.kind(node) {
                NodeKind::Not(child) => *child,
                NodeKind::Or(alts) | NodeKind::And(alts) => {
                    let members = alts.as_slice().to_vec();
                    todo.push((node, true));
                    todo.extend(members.into_iter().map(|m| (m, false)));
                    continue;
                }
                NodeKind::Epsilon => self.repeat(self.any_char, 1, UNBOUNDED, false),
                _ if node == self.nothing => self.any_star,
                _ if self.is_any_star(node) => self.nothing,
                _ if self.is_any_plus(node) => self.epsilon,
                _ => {
                    let info = RegexInfo::not(self.info(node));
                    self.create(NodeKind::Not(node), info)
                }
            };
            nnf.insert(node, negated);
        }
        nnf[&root]
    }

    pub fn ordered_or(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.ordered_or_with(left, right, false, false)
    }

    /// Prioritized choice of `left` over `right`.
    ///
    /// `deduplicated` skips the duplicate scan when the caller knows the
    /// elements are distinct. `hint` tries the rule where `right` subsumes
    /// `left` before the converse.
    pub fn ordered_or_with(
        &mut self,
        mut left: NodeId,
        mut right: NodeId,
        mut deduplicated: bool,
        mut hint: bool,
    ) -> NodeId {
        loop {
            if self.is_any_star(left)
                || right == self.nothing
                || left == right
                || (self.info(left).is_nullable() && right == self.epsilon)
            {
                return left;
            }
            if left == self.nothing {
                return right;
            }

            let (head, tail) = match *self.kind(right) {
                NodeKind::OrderedOr(head, tail) => (head, tail),
                _ => (right, self.nothing),
            };

            // X?Y|Y|Z is X?Y|Z
            if !hint && self.subsumes(left, head) {
                right = tail;
                deduplicated = false;
                continue;
            }
            // Y|X?Y|Z is X??Y|Z
            if self.subsumes(head, left) {
                if let Some(folded) = self.try_fold_alternation(left, head) {
                    left = folded;
                    right = tail;
                    deduplicated = false;
                    hint = false;
                    continue;
                }
            }
            if hint && self.subsumes(left, head) {
                right = tail;
                deduplicated = false;
                hint = false;
                continue;
            }
            break;
        }

        let left_is_or = matches!(self.kind(left), NodeKind::OrderedOr(..));
        if !deduplicated && !left_is_or {
            let mut current = right;
            deduplicated = true;
            while let NodeKind::OrderedOr(head, tail) = *self.kind(current) {
                if head == left {
                    deduplicated = false;
                    break;
                }
                current = tail;
            }
            if deduplicated {
                deduplicated = current != left;
            }
        }

        if !deduplicated || left_is_or {
            let mut elems = self.to_list(left, ListKind::OrderedOr);
            let first_right = elems.len();
            elems.extend(self.to_list(right, ListKind::OrderedOr));

            let mut seen = FxHashSet::default();
            let mut right_changed = false;
            for (i, elem) in elems.iter_mut().enumerate() {
                if !seen.insert(*elem) {
                    *elem = self.nothing;
                    right_changed |= i >= first_right;
                }
            }

            let (mut result, count) = if right_changed {
                (self.nothing, elems.len())
            } else {
                (right, first_right)
            };
            for &elem in elems[..count].iter().rev() {
                result = self.ordered_or_with(elem, result, true, false);
            }
            return result;
        }

        let info = RegexInfo::alternate(self.info(left), self.info(right));
        self.create(NodeKind::OrderedOr(left, right), info)
    }

    /// Prioritized choice over `items` in order, keeping the first occurrence
    /// of repeated elements.
    pub fn ordered_or_all<I>(&mut self, items: I) -> NodeId
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut elems = Vec::new();
        for id in items {
            elems.extend(self.to_list(id, ListKind::OrderedOr));
        }
        let mut seen = FxHashSet::default();
        elems.retain(|id| seen.insert(*id));
        let mut result = self.nothing;
        for &elem in elems.iter().rev() {
            result = self.ordered_or_with(elem, result, true, false);
        }
        result
    }

    /// Flattens the spine of the given kind into its elements, left to right.
    /// Any other node is a one element list.
    pub fn to_list(&self, id: NodeId, list_kind: ListKind) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut todo = vec![id];
        while let Some(node) = todo.pop() {
            match (list_kind, self.kind(node)) {
                (ListKind::Concat, NodeKind::Concat(l, r))
                | (ListKind::OrderedOr, NodeKind::OrderedOr(l, r)) => {
                    todo.push(*r);
                    todo.push(*l);
                }
                _ => out.push(node),
            }
        }
        out
    }
}

fn nullable_info() -> RegexInfo {
    (RegexInfo::IS_ALWAYS_NULLABLE | RegexInfo::IS_HIGH_PRIORITY_NULLABLE).normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{ByteSet, ByteSetSolver};

    fn builder() -> Builder<ByteSetSolver> {
        Builder::new(ByteSetSolver)
    }

    fn lit(b: &mut Builder<ByteSetSolver>, c: u8) -> NodeId {
        b.singleton(ByteSet::byte(c))
    }

    #[test]
    fn interning_is_idempotent() {
        let mut b = builder();
        let a1 = lit(&mut b, b'a');
        let a2 = lit(&mut b, b'a');
        assert_eq!(a1, a2);
        let c = lit(&mut b, b'c');
        let x = b.concat(a1, c);
        let y = b.concat(a2, c);
        assert_eq!(x, y);
        let star1 = b.repeat(x, 0, UNBOUNDED, true);
        let star2 = b.repeat(y, 0, UNBOUNDED, true);
        assert_eq!(star1, star2);
    }

    #[test]
    fn top_level_ordered_or_is_not_interned() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let first = b.ordered_or(a, c);
        let second = b.ordered_or(a, c);
        assert_ne!(first, second);

        let canonical = b.internalize(first);
        assert_eq!(canonical, first);
        assert_eq!(b.internalize(second), first);
        // once internalized, construction finds it
        assert_eq!(b.ordered_or(a, c), first);
    }

    #[test]
    fn ordered_or_children_are_internalized() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let d = lit(&mut b, b'd');
        let first = b.ordered_or(a, c);
        let x = b.concat(first, d);
        let second = b.ordered_or(a, c);
        let y = b.concat(second, d);
        assert_eq!(x, y);
    }

    #[test]
    fn concat_laws() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let (nothing, eps) = (b.nothing(), b.epsilon());
        assert_eq!(b.concat(a, nothing), nothing);
        assert_eq!(b.concat(nothing, a), nothing);
        assert_eq!(b.concat(eps, a), a);
        assert_eq!(b.concat(a, eps), a);
    }

    #[test]
    fn concat_lifts_effects() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let cs = b.capture_start(1);
        let eff = b.effect(a, cs);
        let cat = b.concat(eff, c);
        let inner = b.concat(a, c);
        assert_eq!(*b.kind(cat), NodeKind::Effect { node: inner, effect: cs });
    }

    #[test]
    fn nested_effects_merge() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let cs = b.capture_start(1);
        let ce = b.capture_end(2);
        let inner = b.effect(a, ce);
        let outer = b.effect(inner, cs);
        let combined = b.concat(cs, ce);
        assert_eq!(*b.kind(outer), NodeKind::Effect { node: a, effect: combined });
        let eps = b.epsilon();
        assert_eq!(b.effect(a, eps), a);
        let nothing = b.nothing();
        assert_eq!(b.effect(nothing, cs), nothing);
    }

    #[test]
    fn loop_laws() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let (nothing, eps) = (b.nothing(), b.epsilon());
        assert_eq!(b.repeat(a, 1, 1, false), a);
        assert_eq!(b.repeat(a, 0, 0, false), eps);
        assert_eq!(b.repeat(nothing, 0, 3, false), eps);
        assert_eq!(b.repeat(nothing, 2, 3, false), nothing);
        assert_eq!(b.repeat(eps, 2, UNBOUNDED, true), eps);
        let any = b.any_char();
        assert_eq!(b.repeat(any, 0, UNBOUNDED, false), b.any_star());
        assert_ne!(b.repeat(any, 0, UNBOUNDED, true), b.any_star());
    }

    #[test]
    fn nested_optionals_collapse() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let lazy = b.repeat(a, 0, 1, true);
        let outer = b.repeat(lazy, 0, 1, false);
        assert_eq!(
            *b.kind(outer),
            NodeKind::Loop { body: a, lower: 0, upper: 1, lazy: true }
        );
    }

    #[test]
    #[should_panic(expected = "exceeds upper bound")]
    fn loop_bounds_are_checked() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        b.repeat(a, 3, 2, false);
    }

    #[test]
    fn negation_normal_form() {
        let mut b = builder();
        let (nothing, eps, star) = (b.nothing(), b.epsilon(), b.any_star());
        assert_eq!(b.not(nothing), star);
        assert_eq!(b.not(star), nothing);
        let plus = b.not(eps);
        assert_eq!(b.not(plus), eps);

        let x = b.begin_anchor();
        let y = b.end_anchor();
        let or = b.or([x, y]);
        let negated = b.not(or);
        let nx = b.not(x);
        let ny = b.not(y);
        let expected = b.and([nx, ny]);
        assert_eq!(negated, expected);
        // double negation cancels
        assert_eq!(b.not(nx), x);
    }

    #[test]
    fn ordered_or_laws() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let (nothing, eps, star) = (b.nothing(), b.epsilon(), b.any_star());
        assert_eq!(b.ordered_or(a, nothing), a);
        assert_eq!(b.ordered_or(nothing, a), a);
        assert_eq!(b.ordered_or(a, a), a);
        assert_eq!(b.ordered_or(star, a), star);
        let opt = b.repeat(a, 0, 1, false);
        assert_eq!(b.ordered_or(opt, eps), opt);
    }

    #[test]
    fn ordered_or_deduplicates_keeping_first() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let d = lit(&mut b, b'd');
        let cd = b.ordered_or(c, d);
        let dcd = b.ordered_or(d, cd);
        assert_eq!(b.to_list(dcd, ListKind::OrderedOr), vec![d, c]);

        let all = b.ordered_or_all([a, c, a, d, c]);
        assert_eq!(b.to_list(all, ListKind::OrderedOr), vec![a, c, d]);
    }

    #[test]
    fn ordered_or_drops_subsumed_alternative() {
        // a?b|b is a?b
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'b');
        let opt = b.repeat(a, 0, 1, false);
        let x = b.concat(opt, c);
        assert_eq!(b.ordered_or(x, c), x);
    }

    #[test]
    fn ordered_or_folds_into_lazy_prefix() {
        // b|a?b is a??b
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'b');
        let opt = b.repeat(a, 0, 1, false);
        let x = b.concat(opt, c);
        let folded = b.ordered_or(c, x);
        let lazy = b.repeat(a, 0, 1, true);
        let expected = b.concat(lazy, c);
        assert_eq!(folded, expected);
    }

    #[test]
    fn start_sets() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let opt = b.repeat(a, 0, 1, false);
        let x = b.concat(opt, c);
        assert_eq!(b.start_set(x), ByteSet::from_bytes(b"ac"));
        let y = b.concat(a, c);
        assert_eq!(b.start_set(y), ByteSet::byte(b'a'));
        let bol = b.bol_anchor();
        assert_eq!(b.start_set(bol), ByteSet::EMPTY);
    }

    #[test]
    fn to_list_flattens_left_nesting() {
        let mut b = builder();
        let a = lit(&mut b, b'a');
        let c = lit(&mut b, b'c');
        let d = lit(&mut b, b'd');
        let ac = b.concat(a, c);
        let left_nested = b.concat(ac, d);
        assert_eq!(b.to_list(left_nested, ListKind::Concat), vec![a, c, d]);
        let right = b.concat_all([left_nested]);
        let cd = b.concat(c, d);
        assert_eq!(*b.kind(right), NodeKind::Concat(a, cd));
    }
}
