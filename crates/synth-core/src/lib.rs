//! Core types for the corpus-scale synthesis engine.
//!
//! This crate provides the foundational types used across the synthesis
//! framework, including:
//!
//! - [`CounterKind`] - The per-table bookkeeping counters and their store keys
//! - [`SynthesisOffset`] - The two-dimensional pass offset and its derived-id
//!   arithmetic
//! - [`CorpusSchema`] - Table declarations loaded from YAML
//! - [`TemplateDocument`] / [`SynthesizedDocument`] - Seed material and its
//!   synthesized copies
//!
//! # Architecture
//!
//! The synth-core crate sits at the foundation of the framework:
//!
//! ```text
//! synth-core (this crate)
//!    │
//!    ├─── counter-store     (stores values under synth-core key names)
//!    │
//!    └─── synth-generator   (depends on synth-core for types)
//! ```
//!
//! Everything here is plain data with no I/O: the store capability lives in
//! `counter-store`, and the orchestration in `synth-generator`.

pub mod document;
pub mod keys;
pub mod offset;
pub mod schema;

// Re-exports for convenience
pub use document::{SynthesizedDocument, TemplateDocument};
pub use keys::{counter_key, template_key, CounterKind};
pub use offset::SynthesisOffset;
pub use schema::{CorpusSchema, SchemaError, TableSpec};
