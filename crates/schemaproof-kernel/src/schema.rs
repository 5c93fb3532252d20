//! Schema IR as produced by the (external) schema compiler.
//!
//! Only the shape needed for scoring is modelled: tables, their directives,
//! and per-field constraint flags.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::KernelError;
use crate::weights::WeightSubject;

pub const SKIP_DIRECTIVE: &str = "skip";

pub fn table_uid(table: &str) -> String {
    format!("tbl:{table}")
}

pub fn field_uid(table: &str, field: &str) -> String {
    format!("col:{table}.{field}")
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, Value>,
}

impl Directive {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: BTreeMap::new(),
        }
    }

    fn tag(&self) -> String {
        self.name.trim().trim_start_matches('@').to_ascii_lowercase()
    }
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub foreign_key: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub indexed: bool,
    /// Foreign-key target, e.g. `User.id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
    #[serde(rename = "default", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_virtual: false,
            primary_key: false,
            foreign_key: false,
            unique: false,
            indexed: false,
            references: None,
            default_value: None,
            check: None,
            nullable: true,
            list: false,
            directives: Vec::new(),
        }
    }

    pub fn has_foreign_key(&self) -> bool {
        self.foreign_key || self.references.is_some()
    }

    pub fn has_default(&self) -> bool {
        self.default_value.as_ref().is_some_and(|v| !v.is_null())
    }

    pub fn is_skipped(&self) -> bool {
        self.directives.iter().any(|d| d.tag() == SKIP_DIRECTIVE)
    }

    /// Directive names plus structural tags (`pk`, `fk`, `unique`, `index`).
    pub fn tags(&self) -> BTreeSet<String> {
        let mut tags: BTreeSet<String> = self.directives.iter().map(Directive::tag).collect();
        if self.primary_key {
            tags.insert("pk".to_string());
        }
        if self.has_foreign_key() {
            tags.insert("fk".to_string());
        }
        if self.unique {
            tags.insert("unique".to_string());
        }
        if self.indexed {
            tags.insert("index".to_string());
        }
        tags
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub directives: Vec<Directive>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Table {
    pub fn uid(&self) -> String {
        table_uid(&self.name)
    }

    pub fn tags(&self) -> BTreeSet<String> {
        self.directives.iter().map(Directive::tag).collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.directives.iter().any(|d| d.tag() == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaIr {
    pub tables: Vec<Table>,
}

impl SchemaIr {
    pub fn from_json_str(raw: &str) -> Result<Self, KernelError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| KernelError::MalformedSchema(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Load the IR, failing loudly when `tables` is not an array.
    pub fn from_value(value: &Value) -> Result<Self, KernelError> {
        match value.get("tables") {
            Some(Value::Array(_)) => {}
            Some(other) => {
                return Err(KernelError::MalformedSchema(format!(
                    "`tables` must be an array, found {}",
                    json_type_name(other)
                )));
            }
            None => {
                return Err(KernelError::MalformedSchema(
                    "missing `tables` array".to_string(),
                ));
            }
        }
        serde_json::from_value(value.clone()).map_err(|e| KernelError::MalformedSchema(e.to_string()))
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Non-virtual, non-skipped fields: the elements every score is computed over.
    pub fn scored_fields(&self) -> Vec<SchemaElement<'_>> {
        self.tables
            .iter()
            .flat_map(|table| {
                table
                    .fields
                    .iter()
                    .filter(|field| !field.is_virtual && !field.is_skipped())
                    .map(move |field| SchemaElement::field(table, field))
            })
            .collect()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A table or field seen through its UID and directive tags.
#[derive(Debug, Clone)]
pub struct SchemaElement<'a> {
    pub uid: String,
    pub table: &'a Table,
    pub field: Option<&'a Field>,
    pub tags: BTreeSet<String>,
}

impl<'a> SchemaElement<'a> {
    pub fn table(table: &'a Table) -> Self {
        Self {
            uid: table.uid(),
            table,
            field: None,
            tags: table.tags(),
        }
    }

    /// Field tags include the owning table's directives.
    pub fn field(table: &'a Table, field: &'a Field) -> Self {
        let mut tags = field.tags();
        tags.extend(table.tags());
        Self {
            uid: field_uid(&table.name, &field.name),
            table,
            field: Some(field),
            tags,
        }
    }

    pub fn subject(&self) -> WeightSubject<'_> {
        WeightSubject {
            uid: &self.uid,
            table: Some(&self.table.name),
            tags: &self.tags,
        }
    }
}
