//! The two-dimensional synthesis offset.
//!
//! The offset identifies which virtual replica of the corpus is currently
//! being generated. It is shared by all tables synthesized together in one
//! pass and advances once per completed pass.

use serde::{Deserialize, Serialize};

/// Position of the current synthesis pass in the virtual-replica grid.
///
/// Starts at `(0, 0)`. The replica ordinal `row * max_col + col` is folded
/// into derived-id arithmetic so that workers running the same pass index
/// produce identifiers in disjoint numeric bands, while the shared insert
/// counter guarantees no two concurrent callers reserve the same raw id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisOffset {
    row: u32,
    col: u32,
    max_col: u32,
}

impl SynthesisOffset {
    /// Create an offset at `(0, 0)` with the given row width.
    pub fn new(max_col: u32) -> Self {
        Self {
            row: 0,
            col: 0,
            max_col,
        }
    }

    /// Current `(row, col)` coordinate.
    pub fn current(&self) -> (u32, u32) {
        (self.row, self.col)
    }

    /// Current row.
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Current column.
    pub fn col(&self) -> u32 {
        self.col
    }

    /// Width of one row of virtual replicas.
    pub fn max_col(&self) -> u32 {
        self.max_col
    }

    /// Advance to the next pass position: `col += 1`, rolling over into a
    /// new row once `col` exceeds `max_col`.
    ///
    /// Must be applied at most once per completed pass; the shared-offset
    /// handles in `synth-generator` restrict who can call this.
    pub fn advance(&mut self) {
        self.col += 1;
        if self.col > self.max_col {
            self.col = 0;
            self.row += 1;
        }
    }

    /// Ordinal of the virtual replica this offset addresses.
    pub fn replica_ordinal(&self) -> i64 {
        i64::from(self.row) * i64::from(self.max_col) + i64::from(self.col)
    }

    /// Identifier of the copy of `template_id` inside the replica this
    /// offset addresses, for a table holding `total_docs` originals.
    pub fn derived_id(&self, template_id: i64, total_docs: i64) -> i64 {
        template_id + total_docs * self.replica_ordinal()
    }
}
