//! Node representation.
//!
//! Nodes live in the [`Builder`](crate::Builder) arena and refer to each other
//! by [`NodeId`]. The algebra is a DAG, so children always have smaller ids
//! than their parents and no node is ever freed before its builder.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::alts::AltSet;
use crate::context::Context;
use crate::info::RegexInfo;

/// Handle of a node inside its builder.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(index) => NodeId(index),
            Err(_) => panic!("node arena exceeded {} entries", u32::MAX),
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Upper bound of an unbounded loop.
pub const UNBOUNDED: u32 = u32::MAX;

/// Kind and payload of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind<T> {
    /// The empty string.
    Epsilon,
    /// One symbol of the given set. The empty set is the nothing node.
    Singleton(T),
    Concat(NodeId, NodeId),
    Loop {
        body: NodeId,
        lower: u32,
        upper: u32,
        lazy: bool,
    },
    /// Prioritized choice, right associated. The left side is preferred.
    OrderedOr(NodeId, NodeId),
    Or(AltSet),
    And(AltSet),
    Not(NodeId),
    /// `\A`
    BeginAnchor,
    /// `\z`
    EndAnchor,
    /// `^` in multiline mode.
    BolAnchor,
    /// `$` in multiline mode.
    EolAnchor,
    /// `\b`
    BoundaryAnchor,
    /// `\B`
    NonBoundaryAnchor,
    /// `\Z`, end of input or before a final newline.
    EndAnchorZ,
    /// `\Z` in reversed patterns.
    EndAnchorZReverse,
    CaptureStart(u32),
    CaptureEnd(u32),
    FixedLengthMarker(u32),
    /// Matches of `node`, with the effects of `effect` applied first.
    Effect {
        node: NodeId,
        effect: NodeId,
    },
    /// Top level marker turning priority pruning off.
    DisableBacktrackingSimulation(NodeId),
}

impl<T> NodeKind<T> {
    pub fn is_anchor(&self) -> bool {
        matches!(
            self,
            NodeKind::BeginAnchor
                | NodeKind::EndAnchor
                | NodeKind::BolAnchor
                | NodeKind::EolAnchor
                | NodeKind::BoundaryAnchor
                | NodeKind::NonBoundaryAnchor
                | NodeKind::EndAnchorZ
                | NodeKind::EndAnchorZReverse
        )
    }

    /// Applies `f` to every child id, leaving payloads untouched.
    pub(crate) fn map_children(self, mut f: impl FnMut(NodeId) -> NodeId) -> Self {
        match self {
            NodeKind::Concat(l, r) => NodeKind::Concat(f(l), f(r)),
            NodeKind::OrderedOr(l, r) => NodeKind::OrderedOr(f(l), f(r)),
            NodeKind::Loop {
                body,
                lower,
                upper,
                lazy,
            } => NodeKind::Loop {
                body: f(body),
                lower,
                upper,
                lazy,
            },
            NodeKind::Not(c) => NodeKind::Not(f(c)),
            NodeKind::Effect { node, effect } => NodeKind::Effect {
                node: f(node),
                effect: f(effect),
            },
            NodeKind::DisableBacktrackingSimulation(c) => {
                NodeKind::DisableBacktrackingSimulation(f(c))
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivativeEffectKind {
    CaptureStart,
    CaptureEnd,
}

/// A capture register update produced while consuming input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivativeEffect {
    pub kind: DerivativeEffectKind,
    pub capture_number: u32,
}

impl DerivativeEffect {
    pub fn capture_start(capture_number: u32) -> Self {
        DerivativeEffect {
            kind: DerivativeEffectKind::CaptureStart,
            capture_number,
        }
    }

    pub fn capture_end(capture_number: u32) -> Self {
        DerivativeEffect {
            kind: DerivativeEffectKind::CaptureEnd,
            capture_number,
        }
    }
}

const UNDEFINED: u8 = 0;
const FALSE: u8 = 1;
const TRUE: u8 = 2;

/// An arena entry.
#[derive(Debug)]
pub struct Node<T> {
    pub(crate) kind: NodeKind<T>,
    pub(crate) info: RegexInfo,
    pub(crate) start_set: T,
    /// Per-context nullability, present only when nullability can depend on
    /// the context. Slots are written once; racing writers store the same value.
    nullability: Option<Box<[AtomicU8]>>,
    pub(crate) internalized: bool,
}

impl<T> Node<T> {
    pub(crate) fn new(kind: NodeKind<T>, info: RegexInfo, start_set: T) -> Self {
        let nullability = (info.can_be_nullable() && info.contains_some_anchor()).then(|| {
            (0..Context::LIMIT)
                .map(|_| AtomicU8::new(UNDEFINED))
                .collect::<Vec<_>>()
                .into_boxed_slice()
        });
        Node {
            kind,
            info,
            start_set,
            nullability,
            internalized: false,
        }
    }

    pub fn kind(&self) -> &NodeKind<T> {
        &self.kind
    }

    pub fn info(&self) -> RegexInfo {
        self.info
    }

    pub fn start_set(&self) -> &T {
        &self.start_set
    }

    /// Nullability in `context` if it is already known without traversal.
    pub(crate) fn known_nullability(&self, context: Context) -> Option<bool> {
        match &self.nullability {
            None => Some(self.info.is_nullable()),
            Some(slots) => match slots[context.index()].load(Ordering::Acquire) {
                TRUE => Some(true),
                FALSE => Some(false),
                _ => None,
            },
        }
    }

    pub(crate) fn store_nullability(&self, context: Context, nullable: bool) {
        if let Some(slots) = &self.nullability {
            slots[context.index()].store(if nullable { TRUE } else { FALSE }, Ordering::Release);
        }
    }
}
