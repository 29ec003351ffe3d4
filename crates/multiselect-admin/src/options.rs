//! ModelAdmin configuration options.

use multiselect_orm::{FieldDef, Model, QuerySet, Q};
use sqlx::SqlitePool;

use crate::error::{AdminError, Result};

/// Text shown for empty values when no other display is configured.
pub const DEFAULT_EMPTY_VALUE_DISPLAY: &str = "-";

/// A list filter declared on a [`ModelAdmin`], keyed by field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    /// Multi-select over the distinct values of a field.
    Values(String),
    /// Multi-select over related objects, matching any selected one.
    Related(String),
    /// Multi-select over related objects, matching rows related to all
    /// selected ones.
    ExclusiveRelated(String),
}

impl FilterSpec {
    /// Creates a [`FilterSpec::Values`] filter.
    pub fn values(field_path: &str) -> Self {
        Self::Values(field_path.to_string())
    }

    /// Creates a [`FilterSpec::Related`] filter.
    pub fn related(field_path: &str) -> Self {
        Self::Related(field_path.to_string())
    }

    /// Creates a [`FilterSpec::ExclusiveRelated`] filter.
    pub fn exclusive_related(field_path: &str) -> Self {
        Self::ExclusiveRelated(field_path.to_string())
    }

    /// Returns the field path the filter works on.
    pub fn field_path(&self) -> &str {
        match self {
            Self::Values(path) | Self::Related(path) | Self::ExclusiveRelated(path) => path,
        }
    }
}

/// Configuration for how a model is listed in the admin.
#[derive(Debug, Clone, Default)]
pub struct ModelAdmin {
    /// Filters shown next to the list.
    pub list_filter: Vec<FilterSpec>,
    /// Default ordering (prefix with - for descending).
    pub ordering: Vec<String>,
    /// Text shown for empty values; falls back to
    /// [`DEFAULT_EMPTY_VALUE_DISPLAY`].
    pub empty_value_display: Option<String>,
    /// Filters restricting which rows the admin exposes at all.
    pub scope: Vec<Q>,
    /// Ordering of related choices, per relation field name.
    pub related_ordering: Vec<(String, Vec<String>)>,
}

impl ModelAdmin {
    /// Creates a new ModelAdmin with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the list filters.
    #[must_use]
    pub fn list_filter(mut self, specs: &[FilterSpec]) -> Self {
        self.list_filter = specs.to_vec();
        self
    }

    /// Sets the default ordering.
    #[must_use]
    pub fn ordering(mut self, cols: &[&str]) -> Self {
        self.ordering = cols.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Sets the text shown for empty values.
    #[must_use]
    pub fn empty_value_display(mut self, display: &str) -> Self {
        self.empty_value_display = Some(display.to_string());
        self
    }

    /// Restricts the rows exposed by this admin.
    #[must_use]
    pub fn scope(mut self, q: Q) -> Self {
        self.scope.push(q);
        self
    }

    /// Sets the ordering of the choices offered for a relation field.
    #[must_use]
    pub fn related_ordering(mut self, field: &str, ordering: &[&str]) -> Self {
        self.related_ordering.retain(|(name, _)| name != field);
        self.related_ordering.push((
            field.to_string(),
            ordering.iter().map(|s| (*s).to_string()).collect(),
        ));
        self
    }

    /// Returns the text shown for empty values.
    pub fn get_empty_value_display(&self) -> &str {
        self.empty_value_display
            .as_deref()
            .unwrap_or(DEFAULT_EMPTY_VALUE_DISPLAY)
    }

    /// Returns the rows this admin exposes, in its default ordering.
    pub fn get_queryset<M: Model>(&self) -> QuerySet<M> {
        let qs = self
            .scope
            .iter()
            .cloned()
            .fold(M::objects().all(), QuerySet::filter);
        self.ordering.iter().fold(qs, |qs, spec| qs.order_by(spec))
    }

    /// Returns the `(identifier, label)` choices of a relation field.
    ///
    /// # Errors
    ///
    /// Fails with [`AdminError::InvalidField`] when `field` is not a
    /// relation, or with a database error.
    pub async fn field_choices(
        &self,
        field: &FieldDef,
        pool: &SqlitePool,
    ) -> Result<Vec<(String, Option<String>)>> {
        let relation = field
            .relation
            .as_ref()
            .ok_or_else(|| AdminError::InvalidField(format!("'{}' is not a relation", field.name)))?;
        let ordering = self
            .related_ordering
            .iter()
            .find(|(name, _)| *name == field.name)
            .map(|(_, ordering)| ordering.as_slice())
            .unwrap_or_default();
        Ok(relation.choices(pool, ordering).await?)
    }
}
