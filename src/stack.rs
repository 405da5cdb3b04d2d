//! Stack depth guard for structural recursion.
//!
//! Node trees are as deep as the patterns and inputs that produced them, so a
//! recursive traversal cannot rely on the caller's stack. Guarded frames are
//! counted, and every `segment_depth` frames the remaining recursion moves to
//! a fresh thread with a stack of `segment_size` bytes. The calling thread
//! blocks until the segment returns, so the recursion stays sequential.

use std::panic;
use std::thread;

use log::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct StackGuard {
    depth: usize,
    segment_depth: usize,
    segment_size: usize,
    segments: usize,
}

impl StackGuard {
    pub(crate) fn new(segment_depth: usize, segment_size: usize) -> Self {
        StackGuard {
            depth: 0,
            segment_depth: segment_depth.max(1),
            segment_size,
            segments: 0,
        }
    }

    /// Records one more guarded frame. Returns true when the frame must run
    /// on a fresh segment.
    pub(crate) fn enter(&mut self) -> bool {
        self.depth += 1;
        self.depth % self.segment_depth == 0
    }

    pub(crate) fn exit(&mut self) {
        self.depth -= 1;
    }

    pub(crate) fn segment_size(&self) -> usize {
        self.segment_size
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Number of fresh segments spawned so far.
    pub(crate) fn segments(&self) -> usize {
        self.segments
    }

    pub(crate) fn record_segment(&mut self) {
        self.segments += 1;
    }
}

/// Runs `f` to completion on a new thread with a `size` byte stack.
///
/// Panics inside `f` are propagated to the caller unchanged.
pub(crate) fn on_fresh_segment<T, F>(size: usize, depth: usize, f: F) -> Result<T>
where
    T: Send,
    F: FnOnce() -> Result<T> + Send,
{
    debug!("continuing recursion at depth {depth} on a fresh {size} byte stack");
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name("symbolic-regex-stack".to_string())
            .stack_size(size)
            .spawn_scoped(scope, f)
            .map_err(Error::StackExhausted)?;
        match handle.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    })
}
