//! Model trait and field path resolution.

use crate::error::{OrmError, Result};
use crate::fields::FieldDef;
use crate::manager::Manager;

/// Separator between the segments of a lookup path (`author__country`).
pub const LOOKUP_SEP: &str = "__";

/// A database model with ORM capabilities.
///
/// # Example
///
/// ```ignore
/// use multiselect_orm::{FieldDef, FieldKind, Model, Relation};
///
/// #[derive(sqlx::FromRow)]
/// struct Article {
///     id: i64,
///     status: Option<String>,
///     author_id: Option<i64>,
/// }
///
/// impl Model for Article {
///     fn table_name() -> &'static str {
///         "articles"
///     }
///
///     fn columns() -> &'static [&'static str] {
///         &["id", "status", "author_id"]
///     }
///
///     fn fields() -> Vec<FieldDef> {
///         vec![
///             FieldDef::new("status", FieldKind::Text).null(true),
///             FieldDef::related("author", Relation::foreign_key("author_id", "authors")),
///         ]
///     }
/// }
/// ```
pub trait Model: Sized + Send + Sync + 'static {
    /// Returns the table name.
    fn table_name() -> &'static str;

    /// Returns the primary key column name.
    fn pk_column() -> &'static str {
        "id"
    }

    /// Returns all column names.
    fn columns() -> &'static [&'static str];

    /// Returns the filterable field metadata.
    fn fields() -> Vec<FieldDef>;

    /// Looks up a field by name.
    fn field(name: &str) -> Option<FieldDef> {
        Self::fields().into_iter().find(|f| f.name == name)
    }

    /// Returns a new Manager for this model.
    fn objects() -> Manager<Self> {
        Manager::new()
    }
}

/// A lookup path resolved against a model.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    /// The lookup path as written (`status`, `author__country`).
    pub path: String,
    /// The field at the end of the path.
    pub field: FieldDef,
    /// The relation field crossed to reach `field`, if any.
    pub via: Option<FieldDef>,
}

impl ResolvedField {
    /// Returns whether the path crosses a relation.
    pub fn is_remote(&self) -> bool {
        self.via.is_some()
    }
}

/// Resolves a lookup path against `M`.
///
/// Supports a field of `M` (`status`, `tags`) or one hop through a relation
/// to a declared remote field (`author__country`).
///
/// # Errors
///
/// Returns [`OrmError::InvalidField`] when a segment does not name a known
/// field or the path is deeper than one relation.
pub fn resolve_field_path<M: Model>(path: &str) -> Result<ResolvedField> {
    let segments: Vec<&str> = path.split(LOOKUP_SEP).collect();
    match segments.as_slice() {
        [name] => {
            let field = M::field(name).ok_or_else(|| {
                OrmError::InvalidField(format!("{} has no field '{name}'", M::table_name()))
            })?;
            Ok(ResolvedField {
                path: path.to_string(),
                field,
                via: None,
            })
        }
        [name, remote] => {
            let via = M::field(name).ok_or_else(|| {
                OrmError::InvalidField(format!("{} has no field '{name}'", M::table_name()))
            })?;
            let relation = via
                .relation
                .as_ref()
                .ok_or_else(|| OrmError::InvalidField(format!("'{name}' is not a relation")))?;
            let field = relation.remote(remote).cloned().ok_or_else(|| {
                OrmError::InvalidField(format!(
                    "{} has no field '{remote}'",
                    relation.related_table
                ))
            })?;
            Ok(ResolvedField {
                path: path.to_string(),
                field,
                via: Some(via),
            })
        }
        _ => Err(OrmError::InvalidField(format!(
            "unsupported lookup path '{path}'"
        ))),
    }
}
