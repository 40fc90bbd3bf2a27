//! Command handlers for the corpus-scale CLI.
//!
//! This module contains handlers for the preload, synthesize, and status
//! commands.

pub mod preload;
pub mod status;
pub mod synthesize;
