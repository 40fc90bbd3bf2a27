//! Shared handles around the pass offset.
//!
//! The offset is read by every worker on every synthesis call but advanced
//! by exactly one orchestrator per pass. The two capabilities are split
//! into separate handles created together, so the single-writer rule is
//! carried by the type system instead of convention: [`SharedOffset`]
//! clones freely and only reads, [`PassAdvancer`] does not clone and is
//! the only way to advance.

use std::sync::Arc;
use synth_core::SynthesisOffset;
use tokio::sync::RwLock;
use tracing::info;

/// Cloneable read handle on the process-wide synthesis offset.
#[derive(Debug, Clone)]
pub struct SharedOffset {
    inner: Arc<RwLock<SynthesisOffset>>,
}

impl SharedOffset {
    /// Snapshot of the current offset.
    pub async fn current(&self) -> SynthesisOffset {
        *self.inner.read().await
    }
}

/// Write handle on the synthesis offset, held by the pass orchestrator.
///
/// Deliberately not `Clone`: concurrent advancement would skip or
/// double-advance the virtual-replica numbering.
#[derive(Debug)]
pub struct PassAdvancer {
    inner: Arc<RwLock<SynthesisOffset>>,
}

impl PassAdvancer {
    /// Advance the offset once, after a full pass over all tables being
    /// scaled together has completed. Returns the new offset.
    pub async fn advance_pass(&self) -> SynthesisOffset {
        let mut offset = self.inner.write().await;
        offset.advance();
        info!(
            "Synthesis offset advanced to ({}, {})",
            offset.row(),
            offset.col()
        );
        *offset
    }
}

/// Create the linked read/write handle pair for one process.
pub fn offset_handles(offset: SynthesisOffset) -> (SharedOffset, PassAdvancer) {
    let inner = Arc::new(RwLock::new(offset));
    (
        SharedOffset {
            inner: inner.clone(),
        },
        PassAdvancer { inner },
    )
}
