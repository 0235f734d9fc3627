//! Shared queue of product-type leaves
//!
//! The taxonomy is fully discovered before any worker starts, so the queue
//! only ever shrinks. Workers pop from the front in discovery order; a fatal
//! error closes the queue so no further leaves are handed out.

use crate::taxonomy::ProductTypeLeaf;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub struct LeafQueue {
    pending: Mutex<VecDeque<ProductTypeLeaf>>,
    closed: AtomicBool,
    total: usize,
}

impl LeafQueue {
    pub fn new(leaves: impl IntoIterator<Item = ProductTypeLeaf>) -> Self {
        let pending: VecDeque<_> = leaves.into_iter().collect();
        let total = pending.len();
        Self {
            pending: Mutex::new(pending),
            closed: AtomicBool::new(false),
            total,
        }
    }

    /// Hands out the next leaf, or None once drained or closed
    pub fn next_leaf(&self) -> Option<ProductTypeLeaf> {
        if self.is_closed() {
            return None;
        }
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    /// Stops handing out leaves
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Number of leaves the queue started with
    pub fn total(&self) -> usize {
        self.total
    }
}
