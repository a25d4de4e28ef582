use crate::{
    core::value::FieldValue,
    merge::qualifier::MatchQualifierExpression,
};
use serde::{Deserialize, Serialize};

/// How one entity property maps onto a table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub property_name: String,
    pub mapped_column_name: String,
    pub is_identity: bool,
}

impl PropertyDefinition {
    pub fn new(property_name: &str) -> Self {
        Self {
            property_name: property_name.to_string(),
            mapped_column_name: property_name.to_string(),
            is_identity: false,
        }
    }

    pub fn mapped_to(mut self, column: &str) -> Self {
        self.mapped_column_name = column.to_string();
        self
    }

    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }
}

/// Describes an entity type to the merge engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingDefinition {
    /// Table used when the caller does not pass one explicitly.
    pub mapped_table_name: Option<String>,
    pub properties: Vec<PropertyDefinition>,
    /// Qualifier declared on the model; used when the caller supplies none.
    pub match_qualifier: Option<MatchQualifierExpression>,
    /// Resolve qualifier fields through property → column mappings.
    pub mapping_lookup_enabled: bool,
}

impl ProcessingDefinition {
    pub fn new(properties: Vec<PropertyDefinition>) -> Self {
        Self {
            mapped_table_name: None,
            properties,
            match_qualifier: None,
            mapping_lookup_enabled: true,
        }
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.mapped_table_name = Some(table.to_string());
        self
    }

    pub fn with_match_qualifier(mut self, qualifier: MatchQualifierExpression) -> Self {
        self.match_qualifier = Some(qualifier);
        self
    }

    pub fn with_mapping_lookup(mut self, enabled: bool) -> Self {
        self.mapping_lookup_enabled = enabled;
        self
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties
            .iter()
            .find(|p| p.property_name.eq_ignore_ascii_case(name))
    }

    /// The property whose value feeds `column`, honouring the mapping when
    /// lookups are enabled and falling back to a same-named property.
    pub fn property_for_column(&self, column: &str) -> Option<&PropertyDefinition> {
        if self.mapping_lookup_enabled {
            if let Some(prop) = self
                .properties
                .iter()
                .find(|p| p.mapped_column_name.eq_ignore_ascii_case(column))
            {
                return Some(prop);
            }
        }
        self.find_property(column)
    }

    pub fn identity_property(&self) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.is_identity)
    }
}

/// A row-shaped value the bulk merge engine can write and patch back.
pub trait BulkEntity: Send {
    fn processing_definition() -> ProcessingDefinition
    where
        Self: Sized;

    /// Current property values keyed by property name.
    fn field_values(&self) -> Vec<FieldValue>;

    /// Receives the server-assigned identity for this row.
    fn set_identity(&mut self, value: i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> ProcessingDefinition {
        ProcessingDefinition::new(vec![
            PropertyDefinition::new("id").mapped_to("Id").identity(),
            PropertyDefinition::new("key").mapped_to("WidgetKey"),
            PropertyDefinition::new("value"),
        ])
    }

    #[test]
    fn test_property_for_column_uses_mapping() {
        let def = definition();
        assert_eq!(
            def.property_for_column("widgetkey").unwrap().property_name,
            "key"
        );
        assert_eq!(def.property_for_column("Value").unwrap().property_name, "value");
        assert!(def.property_for_column("Missing").is_none());
    }

    #[test]
    fn test_mapping_lookup_disabled_matches_by_name_only() {
        let def = definition().with_mapping_lookup(false);
        assert!(def.property_for_column("WidgetKey").is_none());
        assert_eq!(def.property_for_column("key").unwrap().property_name, "key");
        assert_eq!(def.identity_property().unwrap().property_name, "id");
    }
}
