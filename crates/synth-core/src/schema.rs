//! Corpus schema: which tables exist and how their documents are keyed.
//!
//! Loaded from YAML the same way across all workers so every process agrees
//! on table names, identifier fields, and the replica-grid width.
//!
//! ```yaml
//! version: 1
//! max_col: 9
//! insert_start: 0
//!
//! tables:
//!   - name: incidents
//!     id_field: id
//!     origin_field: origin_id
//!     fields: [type, severity, location]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Table not found in schema
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Two tables share a name
    #[error("Duplicate table in schema: {0}")]
    DuplicateTable(String),
}

/// Declaration of one logical table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableSpec {
    /// Table name, also the key prefix for its counters and templates.
    pub name: String,

    /// Body field overridden with the storage id on synthesis.
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Body field pointing back at the source template.
    #[serde(default = "default_origin_field")]
    pub origin_field: String,

    /// Ordered projection fields, consumed by the query layer.
    #[serde(default)]
    pub fields: Vec<String>,

    /// Expected number of captured originals; used as the initialization
    /// hint when no preload has counted them.
    #[serde(default)]
    pub total_docs: Option<i64>,
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_origin_field() -> String {
    "origin_id".to_string()
}

/// Full corpus schema shared by every worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusSchema {
    /// Schema format version.
    pub version: u32,

    /// Width of one row of virtual replicas.
    #[serde(default = "default_max_col")]
    pub max_col: u32,

    /// Identifier range reserved between originals and synthesized
    /// documents.
    #[serde(default)]
    pub insert_start: i64,

    /// Table declarations.
    pub tables: Vec<TableSpec>,
}

fn default_max_col() -> u32 {
    9
}

impl CorpusSchema {
    /// Parse a schema from YAML content.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let schema: CorpusSchema = serde_yaml::from_str(yaml)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load a schema from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Look up a table by name.
    pub fn get_table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Names of all declared tables, in declaration order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.name.clone()).collect()
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = std::collections::HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.name.as_str()) {
                return Err(SchemaError::DuplicateTable(table.name.clone()));
            }
        }
        Ok(())
    }
}
