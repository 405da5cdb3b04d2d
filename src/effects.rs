//! Capture effects carried by derivatives.
//!
//! A derivative that skips over a nullable prefix wraps the remainder in an
//! `Effect` node holding that prefix, since the capture markers inside it
//! still fire. Before the next step the effects are either dropped
//! ([`Builder::strip_effects`]) or turned into per-alternative lists of
//! [`DerivativeEffect`]s ([`Builder::strip_and_map_effects`]).

use crate::builder::{Builder, ListKind};
use crate::context::Context;
use crate::error::Result;
use crate::node::{DerivativeEffect, NodeId, NodeKind};
use crate::solver::Solver;

/// One alternative of a derivative with the effects to apply when taking it.
pub type Transition = (NodeId, Vec<DerivativeEffect>);

impl<S: Solver> Builder<S> {
    /// `node` with every effect wrapper removed.
    pub fn strip_effects(&mut self, node: NodeId) -> Result<NodeId> {
        if !self.info(node).contains_effect() {
            return Ok(node);
        }
        self.guarded(move |b| b.strip_uncached(node))
    }

    fn strip_uncached(&mut self, node: NodeId) -> Result<NodeId> {
        let stripped = match self.kind(node).clone() {
            NodeKind::Effect { node: inner, .. } => self.strip_effects(inner)?,
            NodeKind::Concat(l, r) => {
                let l = self.strip_effects(l)?;
                let r = self.strip_effects(r)?;
                self.concat(l, r)
            }
            NodeKind::OrderedOr(..) => {
                // stripping can make alternatives equal, so rebuild with dedup
                let mut elems = self.to_list(node, ListKind::OrderedOr);
                for elem in elems.iter_mut() {
                    *elem = self.strip_effects(*elem)?;
                }
                self.ordered_or_all(elems)
            }
            NodeKind::DisableBacktrackingSimulation(child) => {
                let child = self.strip_effects(child)?;
                self.disable_backtracking_simulation(child)
            }
            NodeKind::Loop {
                body,
                lower,
                upper,
                lazy,
            } => {
                let body = self.strip_effects(body)?;
                self.repeat(body, lower, upper, lazy)
            }
            NodeKind::Or(alts) => {
                let members = self.strip_members(alts.as_slice())?;
                self.or(members)
            }
            NodeKind::And(alts) => {
                let members = self.strip_members(alts.as_slice())?;
                self.and(members)
            }
            NodeKind::Not(child) => {
                let child = self.strip_effects(child)?;
                self.not(child)
            }
            _ => node,
        };
        Ok(stripped)
    }

    fn strip_members(&mut self, members: &[NodeId]) -> Result<Vec<NodeId>> {
        members.iter().map(|&m| self.strip_effects(m)).collect()
    }

    /// Splits `node` into its top level alternatives in priority order, each
    /// paired with the effects that taking it applies in `context`.
    ///
    /// A `{0,1}` loop contributes its skip branch as epsilon, before the body
    /// when lazy and after it when greedy.
    pub fn strip_and_map_effects(&mut self, node: NodeId, context: Context) -> Result<Vec<Transition>> {
        let mut out = Vec::new();
        let mut current = Vec::new();
        self.map_effects_into(node, context, &mut out, &mut current)?;
        Ok(out)
    }

    fn map_effects_into(
        &mut self,
        node: NodeId,
        context: Context,
        out: &mut Vec<Transition>,
        current: &mut Vec<DerivativeEffect>,
    ) -> Result<()> {
        self.guarded(move |b| b.map_effects_uncached(node, context, out, current))
    }

    fn map_effects_uncached(
        &mut self,
        node: NodeId,
        context: Context,
        out: &mut Vec<Transition>,
        current: &mut Vec<DerivativeEffect>,
    ) -> Result<()> {
        if !self.info(node).contains_effect() {
            out.push((node, current.clone()));
            return Ok(());
        }
        match self.kind(node).clone() {
            NodeKind::Effect {
                node: inner,
                effect,
            } => {
                let mark = current.len();
                self.collect_effects(effect, context, current)?;
                self.map_effects_into(inner, context, out, current)?;
                current.truncate(mark);
            }
            NodeKind::Concat(l, r) => {
                let first = out.len();
                self.map_effects_into(l, context, out, current)?;
                let r = self.strip_effects(r)?;
                for i in first..out.len() {
                    out[i].0 = self.concat(out[i].0, r);
                }
            }
            NodeKind::OrderedOr(l, r) => {
                self.map_effects_into(l, context, out, current)?;
                self.map_effects_into(r, context, out, current)?;
            }
            NodeKind::Loop {
                body,
                lower: 0,
                upper: 1,
                lazy,
            } => {
                let epsilon = self.epsilon();
                if lazy {
                    out.push((epsilon, current.clone()));
                }
                self.map_effects_into(body, context, out, current)?;
                if !lazy {
                    out.push((epsilon, current.clone()));
                }
            }
            NodeKind::DisableBacktrackingSimulation(child) => {
                let first = out.len();
                self.map_effects_into(child, context, out, current)?;
                for i in first..out.len() {
                    out[i].0 = self.disable_backtracking_simulation(out[i].0);
                }
            }
            _ => {
                let stripped = self.strip_effects(node)?;
                out.push((stripped, current.clone()));
            }
        }
        Ok(())
    }

    /// Reports, in order, the capture effects of the empty match of `node`
    /// along the path a backtracking engine commits to in `context`.
    pub fn apply_effects<F>(&mut self, node: NodeId, context: Context, mut visit: F) -> Result<()>
    where
        F: FnMut(DerivativeEffect),
    {
        let mut effects = Vec::new();
        self.collect_effects(node, context, &mut effects)?;
        for effect in effects {
            visit(effect);
        }
        Ok(())
    }

    pub(crate) fn collect_effects(
        &mut self,
        node: NodeId,
        context: Context,
        out: &mut Vec<DerivativeEffect>,
    ) -> Result<()> {
        self.guarded(move |b| b.collect_effects_uncached(node, context, out))
    }

    fn collect_effects_uncached(
        &mut self,
        node: NodeId,
        context: Context,
        out: &mut Vec<DerivativeEffect>,
    ) -> Result<()> {
        match self.kind(node).clone() {
            NodeKind::Concat(..) => {
                for elem in self.to_list(node, ListKind::Concat) {
                    self.collect_effects(elem, context, out)?;
                }
            }
            NodeKind::Loop {
                body,
                lower,
                upper,
                lazy,
            } => {
                // only where the engine would enter the loop
                if lower != 0 || (upper != 0 && !lazy && self.is_nullable_for(body, context)) {
                    self.collect_effects(body, context, out)?;
                }
            }
            NodeKind::OrderedOr(l, r) => {
                let preferred = if self.is_nullable_for(l, context) { l } else { r };
                self.collect_effects(preferred, context, out)?;
            }
            NodeKind::CaptureStart(n) => out.push(DerivativeEffect::capture_start(n)),
            NodeKind::CaptureEnd(n) => out.push(DerivativeEffect::capture_end(n)),
            NodeKind::DisableBacktrackingSimulation(child) => {
                self.collect_effects(child, context, out)?;
            }
            NodeKind::Effect {
                node: inner,
                effect,
            } => {
                self.collect_effects(effect, context, out)?;
                self.collect_effects(inner, context, out)?;
            }
            NodeKind::Or(alts) => {
                for member in alts.iter() {
                    if self.is_nullable_for(member, context) {
                        self.collect_effects(member, context, out)?;
                    }
                }
            }
            NodeKind::And(alts) => {
                for member in alts.iter() {
                    self.collect_effects(member, context, out)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Derivative with its effects dropped, for matching without captures.
    pub fn derivative_without_effects(
        &mut self,
        node: NodeId,
        symbol: S::Set,
        context: Context,
    ) -> Result<NodeId> {
        let derivative = self.derivative(node, symbol, context)?;
        self.strip_effects(derivative)
    }

    /// Derivative split into prioritized alternatives with their effects,
    /// for simulation with one capture register set per alternative.
    pub fn nfa_derivative_with_effects(
        &mut self,
        node: NodeId,
        symbol: S::Set,
        context: Context,
    ) -> Result<Vec<Transition>> {
        let derivative = self.derivative(node, symbol, context)?;
        self.strip_and_map_effects(derivative, context)
    }
}
