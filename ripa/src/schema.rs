//! Canonical schema of a stop document.
//!
//! The same definition drives index creation (via [`Schema::index_mappings`]) and the row
//! transformer (which fields are booleans, which are passed through, which are kept).

use serde_json::{Map, Value, json};

/// Canonical field names.
pub mod fields {
    pub const PID: &str = "pid";
    pub const STOP_ID: &str = "stop_id";
    pub const EXP_YEARS: &str = "exp_years";
    pub const STOP_DATETIME: &str = "stop_datetime";
    pub const STOP_DURATION_MINUTES: &str = "stop_duration_minutes";
    pub const OFFICER_ASSIGNMENT: &str = "officer_assignment";
    pub const ADDRESS_DESCRIPTION: &str = "address_description";
    pub const PERCEIVED_AGE: &str = "perceived_age";
    pub const PERCEIVED_GENDER: &str = "perceived_gender";
    pub const DRIVER: &str = "driver";
    pub const RESPONSE_TO_SERVICE_CALL: &str = "response_to_service_call";
    pub const PERCEIVED_LGBTQIA: &str = "perceived_lgbtqia";
    pub const PERCEIVED_TRANSGENDER: &str = "perceived_transgender";
    pub const PERCEIVED_LIMITED_ENGLISH: &str = "perceived_limited_english";
    pub const BEAT: &str = "beat";
    pub const CITY: &str = "city";
}

/// Value kind of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Exact-match identifier.
    Keyword,
    /// Whole number.
    Integer,
    /// Timezone-aware timestamp.
    Date,
    /// Full-text field.
    Text,
    Boolean,
}

impl FieldKind {
    /// Returns the index mapping type for this kind.
    pub fn mapping_type(&self) -> &'static str {
        match self {
            FieldKind::Keyword => "keyword",
            FieldKind::Integer => "integer",
            FieldKind::Date => "date",
            FieldKind::Text => "text",
            FieldKind::Boolean => "boolean",
        }
    }
}

/// A declared field: its name and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSchema {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Ordered set of declared fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    fields: &'static [FieldSchema],
}

impl Schema {
    pub const fn new(fields: &'static [FieldSchema]) -> Self {
        Self { fields }
    }

    /// Returns the fields in declaration order.
    pub fn fields(&self) -> &'static [FieldSchema] {
        self.fields
    }

    /// Returns the field named `name`, if declared.
    pub fn field(&self, name: &str) -> Option<&'static FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the declared fields of `kind`, in declaration order.
    pub fn fields_of_kind(&self, kind: FieldKind) -> impl Iterator<Item = &'static FieldSchema> {
        self.fields.iter().filter(move |field| field.kind == kind)
    }

    /// Builds the index mappings body: `{"properties": {"<field>": {"type": "<kind>"}}}`.
    pub fn index_mappings(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| {
                (
                    field.name.to_string(),
                    json!({ "type": field.kind.mapping_type() }),
                )
            })
            .collect();

        json!({ "properties": properties })
    }
}

/// Schema of a canonical stop document.
pub static STOP_SCHEMA: Schema = Schema::new(&[
    FieldSchema::new(fields::PID, FieldKind::Keyword),
    FieldSchema::new(fields::STOP_ID, FieldKind::Keyword),
    FieldSchema::new(fields::EXP_YEARS, FieldKind::Integer),
    FieldSchema::new(fields::STOP_DATETIME, FieldKind::Date),
    FieldSchema::new(fields::STOP_DURATION_MINUTES, FieldKind::Integer),
    FieldSchema::new(fields::OFFICER_ASSIGNMENT, FieldKind::Keyword),
    FieldSchema::new(fields::ADDRESS_DESCRIPTION, FieldKind::Text),
    FieldSchema::new(fields::PERCEIVED_AGE, FieldKind::Integer),
    FieldSchema::new(fields::PERCEIVED_GENDER, FieldKind::Keyword),
    FieldSchema::new(fields::DRIVER, FieldKind::Boolean),
    FieldSchema::new(fields::RESPONSE_TO_SERVICE_CALL, FieldKind::Boolean),
    FieldSchema::new(fields::PERCEIVED_LGBTQIA, FieldKind::Boolean),
    FieldSchema::new(fields::PERCEIVED_TRANSGENDER, FieldKind::Boolean),
    FieldSchema::new(fields::PERCEIVED_LIMITED_ENGLISH, FieldKind::Boolean),
    FieldSchema::new(fields::BEAT, FieldKind::Keyword),
    FieldSchema::new(fields::CITY, FieldKind::Keyword),
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mappings_mirror_every_declared_field() {
        let mappings = STOP_SCHEMA.index_mappings();
        let properties = mappings["properties"].as_object().unwrap();

        assert_eq!(properties.len(), STOP_SCHEMA.fields().len());
        assert_eq!(properties["stop_datetime"], json!({ "type": "date" }));
        assert_eq!(properties["address_description"], json!({ "type": "text" }));
        assert_eq!(properties["driver"], json!({ "type": "boolean" }));
        assert_eq!(properties["exp_years"], json!({ "type": "integer" }));
        assert_eq!(properties["city"], json!({ "type": "keyword" }));
    }

    #[test]
    fn boolean_fields_are_listed_in_declaration_order() {
        let booleans: Vec<_> = STOP_SCHEMA
            .fields_of_kind(FieldKind::Boolean)
            .map(|field| field.name)
            .collect();

        assert_eq!(
            booleans,
            vec![
                "driver",
                "response_to_service_call",
                "perceived_lgbtqia",
                "perceived_transgender",
                "perceived_limited_english",
            ]
        );
    }

    #[test]
    fn undeclared_fields_are_not_contained() {
        assert!(STOP_SCHEMA.contains("beat"));
        assert!(!STOP_SCHEMA.contains("beat_name"));
        assert!(!STOP_SCHEMA.contains("ori"));
    }
}
