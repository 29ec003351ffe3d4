//! Multi-select filter over the distinct values of a scalar field.

use std::iter;
use std::marker::PhantomData;

use multiselect_orm::query::SUBQUERY_ALIAS;
use multiselect_orm::{resolve_field_path, Model, QuerySet, ResolvedField, ValuesList, Q};
use sqlx::SqlitePool;
use tracing::debug;

use super::{lookup_error, ChoiceOption, ListFilter, LookupKwargs, LookupParams, Selection};
use crate::changelist::ChangeList;
use crate::error::{AdminError, Result};
use crate::options::ModelAdmin;
use crate::request::AdminRequest;

/// Filters a scalar field by a set of chosen values, with an optional
/// branch for the empty value.
///
/// Reads `<path>__in` and `<path>__isnull`. The candidates are the
/// distinct values of the field in the rows the admin exposes, or in the
/// whole related table when the path crosses a relation
/// (`author__country`).
pub struct ValueListFilter<M: Model> {
    title: String,
    field: ResolvedField,
    kwargs: LookupKwargs,
    selection: Selection,
    candidates: Vec<Option<String>>,
    empty_value_display: String,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> ValueListFilter<M> {
    /// Builds the filter, popping its parameters from `params` and
    /// fetching the candidate values.
    ///
    /// # Errors
    ///
    /// Fails when `field_path` does not resolve to a scalar field of `M`,
    /// or with a database error.
    pub async fn new(
        field_path: &str,
        params: &mut LookupParams,
        admin: &ModelAdmin,
        pool: &SqlitePool,
    ) -> Result<Self> {
        let field = resolve_field_path::<M>(field_path)?;
        if field.field.is_relation() {
            return Err(AdminError::InvalidField(format!(
                "'{field_path}' is a relation; use a related filter"
            )));
        }

        let kwargs = LookupKwargs {
            values: format!("{field_path}__in"),
            isnull: format!("{field_path}__isnull"),
        };
        let selection = kwargs.pop(params);

        let column = field.field.column.as_str();
        let values = match field.via.as_ref().and_then(|via| via.relation.as_ref()) {
            Some(relation) => ValuesList::from_table(&relation.related_table, column),
            None => admin.get_queryset::<M>().values_list(column),
        };
        let candidates = values.distinct().order_by(column).fetch(pool).await?;

        debug!(
            field = %field_path,
            selection = ?selection.values(),
            isnull = ?selection.isnull(),
            candidates = candidates.len(),
            "built value list filter"
        );

        Ok(Self {
            title: field.field.label(),
            field,
            kwargs,
            selection,
            candidates,
            empty_value_display: admin.get_empty_value_display().to_string(),
            _model: PhantomData,
        })
    }

    /// Returns the current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    fn value_option(&self, cl: &ChangeList<M>, value: &str) -> ChoiceOption {
        let values = self.selection.toggled(value);
        let query_string = if values.is_empty() {
            cl.get_query_string(&[], &[self.kwargs.values.as_str(), self.kwargs.isnull.as_str()])
        } else {
            let joined = values.join(",");
            cl.get_query_string(
                &[(self.kwargs.values.as_str(), joined.as_str())],
                &[self.kwargs.isnull.as_str()],
            )
        };
        ChoiceOption {
            selected: self.selection.contains(value),
            query_string,
            display: self
                .field
                .field
                .choice_label(value)
                .unwrap_or(value)
                .to_string(),
        }
    }

    fn has_null_candidate(&self) -> bool {
        self.candidates.iter().any(Option::is_none)
    }

    /// Builds the predicate on the filtered column, qualified with
    /// `table`.
    fn predicate(&self, table: &str) -> Result<Option<Q>> {
        let column = format!("{table}.{}", self.field.field.column);
        if self.selection.is_null_selected() {
            return Ok(Some(Q::is_null(&column)));
        }
        if !self.selection.values().is_empty() {
            let values = self
                .selection
                .values()
                .iter()
                .map(|v| self.field.field.to_lookup_value(v))
                .collect::<multiselect_orm::Result<Vec<_>>>()
                .map_err(|e| lookup_error(&self.field.path, e))?;
            return Ok(Some(Q::in_list(&column, values)));
        }
        if self.selection.isnull() == Some(false) {
            return Ok(Some(Q::is_not_null(&column)));
        }
        Ok(None)
    }
}

impl<M: Model> ListFilter<M> for ValueListFilter<M> {
    fn title(&self) -> &str {
        &self.title
    }

    fn expected_parameters(&self) -> Vec<String> {
        self.kwargs.expected()
    }

    // Always shown, so a selection still applies when no candidate is left.
    fn has_output(&self) -> bool {
        true
    }

    fn choices<'a>(
        &'a self,
        cl: &'a ChangeList<M>,
    ) -> Box<dyn Iterator<Item = ChoiceOption> + 'a> {
        let all = iter::once_with(move || self.kwargs.all_option(cl, &self.selection));
        let values = self
            .candidates
            .iter()
            .flatten()
            .map(move |value| self.value_option(cl, value));
        let empty = iter::once_with(move || {
            self.has_null_candidate().then(|| {
                self.kwargs
                    .isnull_option(cl, &self.selection, &self.empty_value_display)
            })
        })
        .flatten();
        Box::new(all.chain(values).chain(empty))
    }

    fn queryset(&self, _request: &AdminRequest, qs: QuerySet<M>) -> Result<QuerySet<M>> {
        let relation = self.field.via.as_ref().and_then(|via| via.relation.as_ref());
        let Some(relation) = relation else {
            return Ok(match self.predicate(M::table_name())? {
                Some(q) => qs.filter(q),
                None => qs,
            });
        };

        let Some(q) = self.predicate(SUBQUERY_ALIAS)? else {
            return Ok(qs);
        };
        let link = relation.remote_link(M::table_name(), M::pk_column());
        let q = if self.selection.is_null_selected() {
            // Rows without related rows count as empty too.
            Q::exists(link.clone(), Some(q)).or(Q::exists(link, None).not())
        } else {
            Q::exists(link, Some(q))
        };
        Ok(qs.filter(q))
    }
}
