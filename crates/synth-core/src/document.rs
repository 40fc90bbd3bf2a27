//! Template and synthesized document types.

use crate::schema::TableSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A captured real document used as synthesis seed material.
///
/// Read-only once stored; every synthesized copy derives its field shapes
/// from one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    /// Table the template belongs to.
    pub table: String,
    /// Original identifier, also the template's store-key suffix.
    pub id: i64,
    /// The captured JSON body.
    pub body: Value,
}

/// A document synthesized from a template.
///
/// Carries three identifiers: the storage id reserved through the shared
/// insert counter, the derived id placing the copy in the virtual-replica
/// numbering, and the id of the source template for traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedDocument {
    /// Table the document belongs to.
    pub table: String,
    /// Storage id reserved through the table's insert counter.
    pub storage_id: i64,
    /// Position of this copy in the virtual-replica numbering.
    pub derived_id: i64,
    /// Identifier of the source template.
    pub origin_id: i64,
    /// Structural copy of the template body with the identifier and
    /// origin-reference fields overridden.
    pub body: Value,
}

impl SynthesizedDocument {
    /// Build a synthesized document as a structural copy of `template`.
    ///
    /// In the body, the table's identifier field is replaced with the
    /// storage id and the origin-reference field with the template's id.
    /// Non-object bodies are carried through untouched.
    pub fn from_template(
        spec: &TableSpec,
        template: &TemplateDocument,
        storage_id: i64,
        derived_id: i64,
    ) -> Self {
        let mut body = template.body.clone();
        if let Value::Object(map) = &mut body {
            map.insert(spec.id_field.clone(), Value::from(storage_id));
            map.insert(spec.origin_field.clone(), Value::from(template.id));
        }
        Self {
            table: template.table.clone(),
            storage_id,
            derived_id,
            origin_id: template.id,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> TableSpec {
        TableSpec {
            name: "incidents".to_string(),
            id_field: "_id".to_string(),
            origin_field: "source_incident".to_string(),
            fields: vec!["type".to_string(), "severity".to_string()],
            total_docs: None,
        }
    }

    fn template() -> TemplateDocument {
        TemplateDocument {
            table: "incidents".to_string(),
            id: 100,
            body: json!({
                "_id": 100,
                "type": "fire",
                "severity": 3,
                "location": { "lat": 37.77, "lon": -122.42 }
            }),
        }
    }

    #[test]
    fn test_identifier_fields_overridden() {
        let document = SynthesizedDocument::from_template(&spec(), &template(), 716, 700);

        assert_eq!(document.storage_id, 716);
        assert_eq!(document.derived_id, 700);
        assert_eq!(document.origin_id, 100);
        assert_eq!(document.body["_id"], json!(716));
        assert_eq!(document.body["source_incident"], json!(100));
    }

    #[test]
    fn test_structural_fields_preserved() {
        let document = SynthesizedDocument::from_template(&spec(), &template(), 716, 700);

        assert_eq!(document.body["type"], json!("fire"));
        assert_eq!(document.body["severity"], json!(3));
        assert_eq!(document.body["location"]["lat"], json!(37.77));
    }

    #[test]
    fn test_template_body_not_mutated() {
        let template = template();
        let _ = SynthesizedDocument::from_template(&spec(), &template, 716, 700);
        assert_eq!(template.body["_id"], json!(100));
    }
}
