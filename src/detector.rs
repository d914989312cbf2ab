//! Change detector: pending binding queue + digest
//!
//! Decouples "a bound property changed" from "the DOM reflects it". Writes
//! are queued as (node, path, value) triples; [`ChangeDetector::digest`]
//! applies them in one batch, skipping writes whose target already holds the
//! queued value.
//!
//! The detector is a cheap-clone handle over shared state (`Rc`, because the
//! whole framework is single-threaded by design): every prop sink and the
//! orchestrator hold the same queue.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::dom::{Document, NodeId};

/// One queued DOM write.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub node: NodeId,
    pub path: String,
    pub value: Value,
}

/// Shared pending-write queue.
#[derive(Clone, Default)]
pub struct ChangeDetector {
    queue: Rc<RefCell<Vec<PendingWrite>>>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write, dropping any older entry for the same (node, path).
    ///
    /// O(n) in queue depth; the queue never holds two entries for one
    /// (node, path) pair, so the last write always wins.
    pub fn record(&self, node: NodeId, path: impl Into<String>, value: Value) {
        let path = path.into();
        let mut queue = self.queue.borrow_mut();
        queue.retain(|w| !(w.node == node && w.path == path));
        queue.push(PendingWrite { node, path, value });
    }

    /// Apply all pending writes to the document and leave the queue empty.
    ///
    /// Pops LIFO (dedup already guarantees at most one write per target, so
    /// intra-digest order carries no meaning). Each entry is removed from
    /// the queue before its write is attempted, so the queue can never be
    /// left in a partial state for the next cycle. A write is skipped when
    /// the live value already equals the queued one, which avoids redundant
    /// DOM mutation when a value oscillates back within one task.
    pub fn digest(&self, doc: &mut Document) {
        loop {
            let next = self.queue.borrow_mut().pop();
            let Some(write) = next else {
                break;
            };
            let actual = doc.get_path(write.node, &write.path);
            if actual == write.value {
                continue;
            }
            debug!(node = %write.node, path = %write.path, value = %write.value, "digest write");
            doc.set_path(write.node, &write.path, write.value);
        }
    }

    /// Number of queued writes (tests and diagnostics).
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl std::fmt::Debug for ChangeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDetector")
            .field("pending", &self.pending())
            .finish()
    }
}
