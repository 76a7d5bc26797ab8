use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::trace;

use crate::schema::Schema;
use crate::types::Cell;

/// Store-side identity of a document: `stop_id` followed by `pid`.
///
/// Writing the same identity twice overwrites, which makes reloads idempotent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(stop_id: &str, pid: &str) -> Self {
        Self(format!("{stop_id}{pid}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A canonical stop document.
///
/// Only fields declared by the schema it was built against can be present. The document
/// serializes as a flat JSON object of those fields; the identity travels separately.
#[derive(Debug, Clone, PartialEq)]
pub struct StopDocument {
    id: DocumentId,
    cells: BTreeMap<&'static str, Cell>,
}

impl StopDocument {
    /// Starts a document with the given identity, restricted to the fields of `schema`.
    pub fn builder(id: DocumentId, schema: &Schema) -> DocumentBuilder {
        DocumentBuilder {
            schema: *schema,
            document: StopDocument {
                id,
                cells: BTreeMap::new(),
            },
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&Cell> {
        self.cells.get(field)
    }

    /// Fields in name order.
    pub fn cells(&self) -> &BTreeMap<&'static str, Cell> {
        &self.cells
    }
}

impl Serialize for StopDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, cell) in &self.cells {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

/// Collects the fields of a [`StopDocument`]; later writes to a field replace earlier ones.
#[derive(Debug)]
pub struct DocumentBuilder {
    schema: Schema,
    document: StopDocument,
}

impl DocumentBuilder {
    /// Sets `field`. Fields the schema does not declare are dropped.
    pub fn set(&mut self, field: &str, cell: Cell) -> &mut Self {
        match self.schema.field(field) {
            Some(declared) => {
                self.document.cells.insert(declared.name, cell);
            }
            None => trace!(field, "dropping field not declared by the schema"),
        }
        self
    }

    pub fn build(self) -> StopDocument {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::STOP_SCHEMA;
    use serde_json::json;

    #[test]
    fn identity_concatenates_stop_and_person() {
        assert_eq!(DocumentId::new("1234", "2").as_str(), "12342");
        assert_eq!(DocumentId::new("1234", "2"), DocumentId::new("1234", "2"));
    }

    #[test]
    fn undeclared_fields_are_dropped() {
        let mut builder = StopDocument::builder(DocumentId::new("9", "1"), &STOP_SCHEMA);
        builder
            .set("beat", Cell::String("521".to_string()))
            .set("beat_name", Cell::String("Pacific Beach".to_string()))
            .set("ori", Cell::String("CA0371100".to_string()));
        let document = builder.build();

        assert_eq!(document.cells().len(), 1);
        assert!(document.get("beat_name").is_none());
        assert_eq!(document.get("beat"), Some(&Cell::String("521".to_string())));
    }

    #[test]
    fn later_writes_win() {
        let mut builder = StopDocument::builder(DocumentId::new("9", "1"), &STOP_SCHEMA);
        builder
            .set("driver", Cell::Bool(true))
            .set("driver", Cell::Bool(false));

        assert_eq!(builder.build().get("driver"), Some(&Cell::Bool(false)));
    }

    #[test]
    fn serializes_as_a_flat_object_without_identity() {
        let mut builder = StopDocument::builder(DocumentId::new("9", "1"), &STOP_SCHEMA);
        builder
            .set("pid", Cell::String("1".to_string()))
            .set("exp_years", Cell::I64(4))
            .set("perceived_age", Cell::Null);

        let value = serde_json::to_value(builder.build()).unwrap();

        assert_eq!(
            value,
            json!({ "pid": "1", "exp_years": 4, "perceived_age": null })
        );
    }
}
