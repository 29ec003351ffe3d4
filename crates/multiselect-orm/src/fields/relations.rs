//! Relation metadata for foreign keys and many-to-many fields.
//!
//! A [`Relation`] knows how to reach the related rows from an owner row,
//! which is all the related list filters need: "relation is empty",
//! "relation contains any of these identifiers" and "relation contains
//! all of these identifiers" are each a correlated subquery.

use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::{FieldDef, FieldKind};
use crate::error::Result;
use crate::query::{Aggregate, Q, Subquery, SUBQUERY_ALIAS};
use crate::queryset::OrderBy;
use crate::value::SqlValue;

/// How the owner table points at the related table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// A column on the owner table holds the related identifier.
    ForeignKey {
        /// Foreign key column on the owner table.
        column: String,
    },
    /// A junction table holds (owner, related) identifier pairs.
    ManyToMany {
        /// Junction table name.
        through: String,
        /// Junction column referencing the owner's primary key.
        source_column: String,
        /// Junction column referencing the related identifier.
        target_column: String,
    },
}

/// A relation from an owner model to a related table.
///
/// # Example
///
/// ```ignore
/// let tags = Relation::many_to_many("tags", "article_tags", "article_id", "tag_id")
///     .label_column("name")
///     .ordering(&["name"]);
/// ```
#[derive(Debug, Clone)]
pub struct Relation {
    /// How the relation is stored.
    pub kind: RelationKind,
    /// The related table.
    pub related_table: String,
    /// The referenced field on the related table.
    pub target_field: String,
    /// Storage type of the referenced field.
    pub target_kind: FieldKind,
    /// Column used as the display label of related rows.
    pub label_column: Option<String>,
    /// Default ordering of related rows (prefix with `-` for descending).
    pub ordering: Vec<String>,
    /// Fields of the related table reachable through `<field>__<remote>`.
    pub remote_fields: Vec<FieldDef>,
}

impl Relation {
    fn new(kind: RelationKind, related_table: &str) -> Self {
        Self {
            kind,
            related_table: related_table.to_string(),
            target_field: "id".to_string(),
            target_kind: FieldKind::Integer,
            label_column: None,
            ordering: Vec::new(),
            remote_fields: Vec::new(),
        }
    }

    /// Creates a foreign key stored in `column` and referencing
    /// `related_table.id`.
    pub fn foreign_key(column: &str, related_table: &str) -> Self {
        Self::new(
            RelationKind::ForeignKey {
                column: column.to_string(),
            },
            related_table,
        )
    }

    /// Creates a many-to-many relation through a junction table.
    pub fn many_to_many(
        related_table: &str,
        through: &str,
        source_column: &str,
        target_column: &str,
    ) -> Self {
        Self::new(
            RelationKind::ManyToMany {
                through: through.to_string(),
                source_column: source_column.to_string(),
                target_column: target_column.to_string(),
            },
            related_table,
        )
    }

    /// Sets the referenced field on the related table.
    #[must_use]
    pub fn to_field(mut self, field: &str, kind: FieldKind) -> Self {
        self.target_field = field.to_string();
        self.target_kind = kind;
        self
    }

    /// Sets the column used to label related rows.
    #[must_use]
    pub fn label_column(mut self, column: &str) -> Self {
        self.label_column = Some(column.to_string());
        self
    }

    /// Sets the default ordering of related rows.
    #[must_use]
    pub fn ordering(mut self, specs: &[&str]) -> Self {
        self.ordering = specs.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Declares a field of the related table for one-hop lookups.
    #[must_use]
    pub fn remote_field(mut self, field: FieldDef) -> Self {
        self.remote_fields.push(field);
        self
    }

    /// Returns whether this is a many-to-many relation.
    pub fn is_many_to_many(&self) -> bool {
        matches!(self.kind, RelationKind::ManyToMany { .. })
    }

    /// Looks up a declared remote field by name.
    pub fn remote(&self, name: &str) -> Option<&FieldDef> {
        self.remote_fields.iter().find(|f| f.name == name)
    }

    /// Converts a raw identifier to a SQL parameter of the target kind.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the identifier is malformed.
    pub fn parse_target(&self, value: &str) -> Result<SqlValue> {
        self.target_kind.parse(value)
    }

    /// Subquery yielding the related identifiers of an owner row.
    ///
    /// The subquery column is the qualified related identifier.
    pub fn link(&self, owner_table: &str, owner_pk: &str) -> Subquery {
        match &self.kind {
            RelationKind::ForeignKey { column } => Subquery::new(
                &self.related_table,
                format!(
                    "{SUBQUERY_ALIAS}.{} = {owner_table}.{column}",
                    self.target_field
                ),
                format!("{SUBQUERY_ALIAS}.{}", self.target_field),
            ),
            RelationKind::ManyToMany {
                through,
                source_column,
                target_column,
            } => Subquery::new(
                through,
                format!("{SUBQUERY_ALIAS}.{source_column} = {owner_table}.{owner_pk}"),
                format!("{SUBQUERY_ALIAS}.{target_column}"),
            ),
        }
    }

    /// Subquery over the related table's rows linked to an owner row.
    ///
    /// Used for lookups on remote fields (`author__country`): columns of
    /// the related table are available as `rel.<column>`.
    pub fn remote_link(&self, owner_table: &str, owner_pk: &str) -> Subquery {
        let column = format!("{SUBQUERY_ALIAS}.{}", self.target_field);
        match &self.kind {
            RelationKind::ForeignKey { .. } => self.link(owner_table, owner_pk),
            RelationKind::ManyToMany {
                through,
                source_column,
                target_column,
            } => Subquery::new(
                &self.related_table,
                format!(
                    "{column} IN (SELECT {through}.{target_column} FROM {through} \
                     WHERE {through}.{source_column} = {owner_table}.{owner_pk})"
                ),
                column,
            ),
        }
    }

    /// Matches owner rows with no related row.
    pub fn is_null_q(&self, owner_table: &str, owner_pk: &str) -> Q {
        match &self.kind {
            RelationKind::ForeignKey { column } => Q::is_null(&format!("{owner_table}.{column}")),
            RelationKind::ManyToMany { .. } => {
                Q::exists(self.link(owner_table, owner_pk), None).not()
            }
        }
    }

    /// Matches owner rows related to any of `values`.
    pub fn any_of_q(&self, owner_table: &str, owner_pk: &str, values: Vec<SqlValue>) -> Q {
        match &self.kind {
            RelationKind::ForeignKey { column } => {
                Q::in_list(&format!("{owner_table}.{column}"), values)
            }
            RelationKind::ManyToMany { .. } => {
                let link = self.link(owner_table, owner_pk);
                let filter = Q::in_list(&link.column, values);
                Q::exists(link, Some(filter))
            }
        }
    }

    /// Matches owner rows related to every one of `values`.
    ///
    /// Counts the distinct related identifiers among `values` and compares
    /// the count with the number of values. Related rows outside `values`
    /// do not disqualify an owner row.
    pub fn all_of_q(&self, owner_table: &str, owner_pk: &str, values: Vec<SqlValue>) -> Q {
        let expected = values.len();
        let link = self.link(owner_table, owner_pk);
        let aggregate = Aggregate::count_distinct(&link.column);
        let filter = Q::in_list(&link.column, values);
        Q::aggregate_eq(link, aggregate, Some(filter), expected)
    }

    /// Builds the query listing `(identifier, label)` pairs of related rows.
    pub fn build_choices(&self, ordering: &[String]) -> String {
        let label = self.label_column.as_deref().unwrap_or(&self.target_field);
        let order: Vec<String> = if ordering.is_empty() {
            vec![format!("{} ASC", self.target_field)]
        } else {
            ordering.iter().map(|s| OrderBy::parse(s).to_sql()).collect()
        };
        format!(
            "SELECT CAST({} AS TEXT), CAST({label} AS TEXT) FROM {} ORDER BY {}",
            self.target_field,
            self.related_table,
            order.join(", ")
        )
    }

    /// Fetches `(identifier, label)` pairs of every related row.
    ///
    /// `ordering` overrides the relation's default ordering when non-empty.
    /// A NULL label is returned as `None`.
    pub async fn choices(
        &self,
        pool: &SqlitePool,
        ordering: &[String],
    ) -> Result<Vec<(String, Option<String>)>> {
        let ordering = if ordering.is_empty() {
            self.ordering.as_slice()
        } else {
            ordering
        };
        let sql = self.build_choices(ordering);
        debug!(sql = %sql, "fetching related choices");

        let rows = sqlx::query(&sql).fetch_all(pool).await?;
        let mut choices = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Option<String> = row.try_get(0)?;
            let label: Option<String> = row.try_get(1)?;
            if let Some(id) = id {
                choices.push((id, label));
            }
        }
        Ok(choices)
    }
}
