//! A minimal byte-scanning driver over [`ByteSetSolver`] patterns.
//!
//! Effects are stripped after every step, so these entry points only answer
//! where matches end, never what the groups captured.

use log::debug;

use crate::builder::Builder;
use crate::context::{CharKind, Context};
use crate::error::Result;
use crate::node::{NodeId, NodeKind};
use crate::solver::{ByteSet, ByteSetSolver, MintermClassifier};

/// Kind of the byte at `pos`, or [`CharKind::BeginningEnd`] outside `input`.
pub fn char_kind(input: &[u8], pos: usize) -> CharKind {
    match input.get(pos) {
        None => CharKind::BeginningEnd,
        Some(b'\n') if pos + 1 == input.len() => CharKind::NewlineS,
        Some(b'\n') => CharKind::Newline,
        Some(&b) if ByteSet::word().contains(b) => CharKind::WordLetter,
        Some(_) => CharKind::General,
    }
}

/// Context of the position just before `input[pos]`.
pub fn context_at(input: &[u8], pos: usize) -> Context {
    let prev = match pos.checked_sub(1) {
        Some(p) => char_kind(input, p),
        None => CharKind::BeginningEnd,
    };
    Context::new(prev, char_kind(input, pos))
}

/// A translated pattern together with the minterms of its predicates.
pub struct Scanner<'b> {
    builder: &'b mut Builder<ByteSetSolver>,
    root: NodeId,
    classifier: MintermClassifier,
}

impl<'b> Scanner<'b> {
    pub fn new(builder: &'b mut Builder<ByteSetSolver>, root: NodeId) -> Self {
        let any_star = builder.any_star();
        let searcher = builder.concat(any_star, root);
        let classifier = MintermClassifier::new(builder.compute_minterms(searcher));
        debug!(
            "scanner over {} with {} minterms",
            builder.display(root),
            classifier.minterms().len()
        );
        Scanner {
            builder,
            root,
            classifier,
        }
    }

    fn is_dead(&self, state: NodeId) -> bool {
        let inner = match *self.builder.kind(state) {
            NodeKind::DisableBacktrackingSimulation(child) => child,
            _ => state,
        };
        self.builder.is_nothing(inner)
    }

    fn step(&mut self, state: NodeId, input: &[u8], pos: usize) -> Result<NodeId> {
        let minterm = self.classifier.minterm(input[pos]);
        self.builder
            .derivative_without_effects(state, minterm, context_at(input, pos))
    }

    /// True if the pattern matches the whole of `input`.
    pub fn accepts(&mut self, input: &[u8]) -> Result<bool> {
        let mut state = self.builder.disable_backtracking_simulation(self.root);
        for pos in 0..input.len() {
            state = self.step(state, input, pos)?;
            if self.is_dead(state) {
                return Ok(false);
            }
        }
        Ok(self
            .builder
            .is_nullable_for(state, context_at(input, input.len())))
    }

    /// True if the pattern matches anywhere in `input`.
    pub fn is_match(&mut self, input: &[u8]) -> Result<bool> {
        let any_star = self.builder.any_star();
        let searcher = self.builder.concat(any_star, self.root);
        let mut state = self.builder.disable_backtracking_simulation(searcher);
        for pos in 0..input.len() {
            if self.builder.is_nullable_for(state, context_at(input, pos)) {
                return Ok(true);
            }
            state = self.step(state, input, pos)?;
            if self.is_dead(state) {
                return Ok(false);
            }
        }
        Ok(self
            .builder
            .is_nullable_for(state, context_at(input, input.len())))
    }

    /// End of the match starting at position 0 that a backtracking engine
    /// would report, if any.
    ///
    /// Pruning keeps only alternatives preferred over the latest accepting
    /// position, so the last position where the state is nullable wins.
    pub fn first_match_end(&mut self, input: &[u8]) -> Result<Option<usize>> {
        let mut state = self.root;
        let mut end = None;
        for pos in 0..=input.len() {
            if self.builder.is_nullable_for(state, context_at(input, pos)) {
                end = Some(pos);
            }
            if pos == input.len() {
                break;
            }
            state = self.step(state, input, pos)?;
            if self.is_dead(state) {
                break;
            }
        }
        Ok(end)
    }
}
