//! Declarative migration steps, as planned by the migration collaborator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{field_uid, table_uid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    CreateTable,
    DropTable,
    RenameTable,
    AddColumn,
    DropColumn,
    RenameColumn,
    AlterType,
    AddIndex,
    DropIndex,
    AddConstraint,
    DropConstraint,
    #[serde(other)]
    Other,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateTable => "create_table",
            Self::DropTable => "drop_table",
            Self::RenameTable => "rename_table",
            Self::AddColumn => "add_column",
            Self::DropColumn => "drop_column",
            Self::RenameColumn => "rename_column",
            Self::AlterType => "alter_type",
            Self::AddIndex => "add_index",
            Self::DropIndex => "drop_index",
            Self::AddConstraint => "add_constraint",
            Self::DropConstraint => "drop_constraint",
            Self::Other => "other",
        }
    }
}

/// Column definition carried by `add_column` / `alter_type` steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(rename = "default", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl FieldSpec {
    /// `NOT NULL` with no default: existing rows cannot be backfilled.
    pub fn is_not_null_without_default(&self) -> bool {
        self.nullable == Some(false) && self.default_value.as_ref().is_none_or(Value::is_null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStep {
    pub kind: StepKind,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub concurrent: bool,
    #[serde(default)]
    pub uid_continuity: bool,
    /// Raw statement, when the planner rendered one. Feeds lock classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

impl MigrationStep {
    pub fn new(kind: StepKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            column: None,
            field: None,
            from: None,
            to: None,
            concurrent: false,
            uid_continuity: false,
            sql: None,
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// UID of the element the step changes. Column renames resolve to the
    /// new name, falling back to the old one.
    pub fn target_uid(&self) -> String {
        let column = match self.kind {
            StepKind::RenameColumn => self
                .column
                .as_deref()
                .or(self.to.as_deref())
                .or(self.from.as_deref()),
            _ => self.column.as_deref(),
        };
        match column {
            Some(column) => field_uid(&self.table, column),
            None => table_uid(&self.table),
        }
    }
}

pub fn steps_from_json_str(raw: &str) -> Result<Vec<MigrationStep>, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_kind_becomes_other() {
        let step: MigrationStep =
            serde_json::from_value(json!({"kind": "vacuum_full", "table": "User"})).unwrap();
        assert_eq!(step.kind, StepKind::Other);
        assert_eq!(step.target_uid(), "tbl:User");
    }

    #[test]
    fn camel_case_flags_parse() {
        let step: MigrationStep = serde_json::from_value(json!({
            "kind": "rename_column",
            "table": "User",
            "from": "mail",
            "to": "email",
            "uidContinuity": true
        }))
        .unwrap();
        assert!(step.uid_continuity);
        assert!(!step.concurrent);
        assert_eq!(step.target_uid(), "col:User.email");
    }

    #[test]
    fn not_null_without_default_detection() {
        let spec = FieldSpec {
            type_name: Some("String".to_string()),
            nullable: Some(false),
            default_value: None,
        };
        assert!(spec.is_not_null_without_default());

        let defaulted = FieldSpec {
            default_value: Some(json!("")),
            ..spec.clone()
        };
        assert!(!defaulted.is_not_null_without_default());

        let explicit_null = FieldSpec {
            default_value: Some(Value::Null),
            ..spec
        };
        assert!(explicit_null.is_not_null_without_default());
    }
}
