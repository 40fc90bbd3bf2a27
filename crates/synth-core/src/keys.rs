//! Store-key naming for counters and template bodies.
//!
//! All shared state lives in the counter store under string keys derived
//! from the table name: counters under `<table>:<kind>`, template bodies
//! under `<table>:template:<id>`.

use serde::{Deserialize, Serialize};

/// The three bookkeeping counters kept per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    /// Fixed count of real template documents. Seeded once at
    /// initialization, never mutated afterward.
    TotalDocs,
    /// Next storage identifier to hand out. Mutated only via atomic
    /// increment; monotonically increasing, never reused.
    NextInsertId,
    /// Documents synthesized and stored so far, for progress accounting.
    StorageDocs,
}

impl CounterKind {
    /// All counter kinds, in seeding order.
    pub const ALL: [CounterKind; 3] = [
        CounterKind::TotalDocs,
        CounterKind::NextInsertId,
        CounterKind::StorageDocs,
    ];

    /// Key suffix for this counter kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKind::TotalDocs => "total_docs",
            CounterKind::NextInsertId => "next_insert_id",
            CounterKind::StorageDocs => "storage_docs",
        }
    }
}

impl std::fmt::Display for CounterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store key for one of a table's counters.
pub fn counter_key(table: &str, kind: CounterKind) -> String {
    format!("{table}:{kind}")
}

/// Store key for a table's template body.
pub fn template_key(table: &str, id: i64) -> String {
    format!("{table}:template:{id}")
}
