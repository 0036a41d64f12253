//! Schema difference calculator
//!
//! This module compares two schema sets, lists every change between them and
//! classifies each change as breaking or not under a [`ValidationLevel`].

use crate::schema::types::{ChangeRecord, ChangeType, SchemaDocument, SchemaSet, ValidationLevel};

/// Diffs schema sets and applies the breaking-change policy
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator {
    level: ValidationLevel,
}

impl SchemaValidator {
    /// Create a validator using the given policy
    pub fn new(level: ValidationLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> ValidationLevel {
        self.level
    }

    /// Compute every change from `old` to `new`
    ///
    /// Records come out as removed schemas, then added schemas, then the
    /// field-level changes of schemas present on both sides.
    pub fn diff(&self, old: &SchemaSet, new: &SchemaSet) -> Vec<ChangeRecord> {
        let mut changes = Vec::new();

        // Schemas that disappeared
        for name in old.names().filter(|name| !new.contains(name)) {
            changes.push(ChangeRecord {
                schema_name: name.to_string(),
                change_type: ChangeType::Removed,
                field_name: None,
                old_type: None,
                new_type: None,
                description: format!("Schema '{}' was removed", name),
            });
        }

        // Schemas that appeared
        for name in new.names().filter(|name| !old.contains(name)) {
            changes.push(ChangeRecord {
                schema_name: name.to_string(),
                change_type: ChangeType::Added,
                field_name: None,
                old_type: None,
                new_type: None,
                description: format!("Schema '{}' was added", name),
            });
        }

        for new_doc in new.documents() {
            if let Some(old_doc) = old.get(&new_doc.name) {
                Self::diff_fields(old_doc, new_doc, &mut changes);
            }
        }

        changes
    }

    /// Compare the properties of one schema present in both sets
    fn diff_fields(old: &SchemaDocument, new: &SchemaDocument, changes: &mut Vec<ChangeRecord>) {
        let schema_name = &new.name;

        for field in old.properties.keys().filter(|f| !new.properties.contains_key(*f)) {
            changes.push(ChangeRecord {
                schema_name: schema_name.clone(),
                change_type: ChangeType::Removed,
                field_name: Some(field.clone()),
                old_type: old.properties[field].type_name(),
                new_type: None,
                description: format!("Field '{}' was removed", field),
            });
        }

        for field in new.properties.keys().filter(|f| !old.properties.contains_key(*f)) {
            changes.push(ChangeRecord {
                schema_name: schema_name.clone(),
                change_type: ChangeType::Added,
                field_name: Some(field.clone()),
                old_type: None,
                new_type: new.properties[field].type_name(),
                description: format!("Field '{}' was added", field),
            });
        }

        for (field, new_field) in &new.properties {
            let Some(old_field) = old.properties.get(field) else {
                continue;
            };

            let old_type = old_field.type_name();
            let new_type = new_field.type_name();

            if old_type != new_type {
                changes.push(ChangeRecord {
                    schema_name: schema_name.clone(),
                    change_type: ChangeType::Modified,
                    field_name: Some(field.clone()),
                    description: format!(
                        "Field type changed from {} to {}",
                        old_type.as_deref().unwrap_or("any"),
                        new_type.as_deref().unwrap_or("any")
                    ),
                    old_type,
                    new_type,
                });
            }

            // Requiredness is its own axis; a field can yield both records
            let was_required = old.is_required(field);
            let is_required = new.is_required(field);
            if was_required != is_required {
                changes.push(ChangeRecord {
                    schema_name: schema_name.clone(),
                    change_type: ChangeType::Modified,
                    field_name: Some(field.clone()),
                    old_type: None,
                    new_type: None,
                    description: format!(
                        "Field required status changed: {} -> {}",
                        bool_label(was_required),
                        bool_label(is_required)
                    ),
                });
            }
        }
    }

    /// Whether a change is incompatible under the configured level
    pub fn is_breaking(&self, change: &ChangeRecord) -> bool {
        match self.level {
            ValidationLevel::Strict => true,
            ValidationLevel::Moderate => match change.change_type {
                ChangeType::Removed => true,
                ChangeType::Modified => change.old_type != change.new_type,
                ChangeType::Added => false,
            },
            ValidationLevel::Lenient => {
                change.change_type == ChangeType::Removed && change.field_name.is_none()
            }
        }
    }

    /// Filter the breaking changes out of a change list
    pub fn breaking_changes<'a>(&self, changes: &'a [ChangeRecord]) -> Vec<&'a ChangeRecord> {
        changes.iter().filter(|c| self.is_breaking(c)).collect()
    }
}

fn bool_label(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::FieldSchema;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn user(with_age: bool) -> SchemaSet {
        let mut doc = SchemaDocument::new("User").with_field("name", FieldSchema::of_type("string"), true);
        if with_age {
            doc = doc.with_field("age", FieldSchema::of_type("number"), false);
        }
        [doc].into_iter().collect()
    }

    #[test]
    fn identical_sets_have_no_changes() {
        let validator = SchemaValidator::default();
        assert!(validator.diff(&user(true), &user(true)).is_empty());
    }

    #[test]
    fn field_changes_follow_removed_added_modified_order() {
        let old: SchemaSet = [SchemaDocument::new("Order")
            .with_field("id", FieldSchema::of_type("integer"), true)
            .with_field("legacy", FieldSchema::of_type("string"), false)]
        .into_iter()
        .collect();
        let new: SchemaSet = [SchemaDocument::new("Order")
            .with_field("id", FieldSchema::of_type("string"), false)
            .with_field("total", FieldSchema::of_type("number"), true)]
        .into_iter()
        .collect();

        let changes = SchemaValidator::default().diff(&old, &new);
        let summary: Vec<_> = changes
            .iter()
            .map(|c| (c.change_type, c.field_name.as_deref().unwrap_or("")))
            .collect();

        assert_eq!(
            summary,
            vec![
                (ChangeType::Removed, "legacy"),
                (ChangeType::Added, "total"),
                (ChangeType::Modified, "id"),
                (ChangeType::Modified, "id"),
            ]
        );
        assert_eq!(changes[2].old_type.as_deref(), Some("integer"));
        assert_eq!(changes[2].new_type.as_deref(), Some("string"));
        assert_eq!(changes[3].description, "Field required status changed: True -> False");
    }

    #[rstest]
    #[case(ValidationLevel::Strict, true)]
    #[case(ValidationLevel::Moderate, false)]
    #[case(ValidationLevel::Lenient, false)]
    fn added_field_policy(#[case] level: ValidationLevel, #[case] breaking: bool) {
        let changes = SchemaValidator::new(level).diff(&user(false), &user(true));

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_name.as_deref(), Some("age"));
        assert_eq!(SchemaValidator::new(level).is_breaking(&changes[0]), breaking);
    }

    #[rstest]
    #[case(ValidationLevel::Strict, true)]
    #[case(ValidationLevel::Moderate, true)]
    #[case(ValidationLevel::Lenient, false)]
    fn removed_field_policy(#[case] level: ValidationLevel, #[case] breaking: bool) {
        let validator = SchemaValidator::new(level);
        let changes = validator.diff(&user(true), &user(false));

        assert_eq!(changes[0].change_type, ChangeType::Removed);
        assert_eq!(validator.is_breaking(&changes[0]), breaking);
    }

    #[test]
    fn breaking_changes_filters_by_level() {
        let old: SchemaSet = [SchemaDocument::new("Legacy"), SchemaDocument::new("User")]
            .into_iter()
            .collect();
        let new: SchemaSet = [SchemaDocument::new("User"), SchemaDocument::new("Audit")]
            .into_iter()
            .collect();

        let changes = SchemaValidator::default().diff(&old, &new);
        let breaking = SchemaValidator::new(ValidationLevel::Lenient).breaking_changes(&changes);

        assert_eq!(changes.len(), 2);
        assert_eq!(breaking.len(), 1);
        assert_eq!(breaking[0].schema_name, "Legacy");
    }
}
