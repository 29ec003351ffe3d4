//! Field metadata for model definitions.
//!
//! Filters never see typed Rust values: everything arrives as strings from
//! the query string. A [`FieldDef`] carries what is needed to turn those
//! strings back into typed SQL parameters and to label them for display.

mod relations;

pub use relations::{Relation, RelationKind};

use crate::error::{OrmError, Result};
use crate::value::SqlValue;

/// Storage type of a field, used to validate lookup values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    /// 64-bit integer.
    #[default]
    Integer,
    /// Floating point number.
    Float,
    /// Text.
    Text,
    /// Boolean stored as 0/1.
    Boolean,
}

impl FieldKind {
    /// Converts a raw lookup value to a SQL parameter of this kind.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] when the value is not valid for the
    /// kind, e.g. `"abc"` for an integer field.
    pub fn parse(self, value: &str) -> Result<SqlValue> {
        let trimmed = value.trim();
        match self {
            Self::Integer => trimmed
                .parse::<i64>()
                .map(SqlValue::Int)
                .map_err(|_| OrmError::Validation(format!("'{value}' must be an integer"))),
            Self::Float => trimmed
                .parse::<f64>()
                .map(SqlValue::Float)
                .map_err(|_| OrmError::Validation(format!("'{value}' must be a number"))),
            Self::Text => Ok(SqlValue::Text(value.to_string())),
            Self::Boolean => match trimmed.to_lowercase().as_str() {
                "1" | "true" => Ok(SqlValue::Bool(true)),
                "0" | "false" => Ok(SqlValue::Bool(false)),
                _ => Err(OrmError::Validation(format!(
                    "'{value}' must be either true or false"
                ))),
            },
        }
    }
}

/// Metadata for one model field.
#[derive(Debug, Clone, Default)]
pub struct FieldDef {
    /// Field name as used in lookups (`author`, `status`).
    pub name: String,
    /// Database column. Empty for many-to-many fields.
    pub column: String,
    /// Storage type.
    pub kind: FieldKind,
    /// Whether the column can be NULL.
    pub null: bool,
    /// Declared choices as (value, label) pairs.
    pub choices: Vec<(String, String)>,
    /// Human-readable name.
    pub verbose_name: Option<String>,
    /// Relation to another table, for foreign keys and many-to-many fields.
    pub relation: Option<Relation>,
}

impl FieldDef {
    /// Creates a field stored in a column of the same name.
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            column: name.to_string(),
            kind,
            ..Default::default()
        }
    }

    /// Creates a relation field.
    ///
    /// The column is the foreign key column for foreign keys and empty for
    /// many-to-many fields; the kind is the kind of the related identifier.
    pub fn related(name: &str, relation: Relation) -> Self {
        let column = match &relation.kind {
            RelationKind::ForeignKey { column } => column.clone(),
            RelationKind::ManyToMany { .. } => String::new(),
        };
        Self {
            name: name.to_string(),
            column,
            kind: relation.target_kind,
            relation: Some(relation),
            ..Default::default()
        }
    }

    /// Sets the column name.
    #[must_use]
    pub fn column(mut self, column: &str) -> Self {
        self.column = column.to_string();
        self
    }

    /// Sets whether the field can be NULL.
    #[must_use]
    pub fn null(mut self, value: bool) -> Self {
        self.null = value;
        self
    }

    /// Sets the declared choices.
    #[must_use]
    pub fn choices(mut self, choices: &[(&str, &str)]) -> Self {
        self.choices = choices
            .iter()
            .map(|(v, l)| ((*v).to_string(), (*l).to_string()))
            .collect();
        self
    }

    /// Sets the human-readable name.
    #[must_use]
    pub fn verbose_name(mut self, name: &str) -> Self {
        self.verbose_name = Some(name.to_string());
        self
    }

    /// Returns the human-readable name, derived from the field name when
    /// none was set.
    pub fn label(&self) -> String {
        self.verbose_name
            .clone()
            .unwrap_or_else(|| self.name.replace('_', " "))
    }

    /// Returns the declared label for a raw value, if any.
    pub fn choice_label(&self, value: &str) -> Option<&str> {
        self.choices
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, l)| l.as_str())
    }

    /// Returns whether this field points at another table.
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    /// Converts a raw lookup value to a SQL parameter.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] when the value does not match the
    /// field's kind.
    pub fn to_lookup_value(&self, value: &str) -> Result<SqlValue> {
        self.kind.parse(value).map_err(|e| match e {
            OrmError::Validation(msg) => OrmError::Validation(format!("{}: {msg}", self.name)),
            other => other,
        })
    }
}
