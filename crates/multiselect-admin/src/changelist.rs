//! The admin change list: the filtered list of a model's rows.

use std::collections::BTreeMap;

use multiselect_orm::{Model, QuerySet, Q};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};

use crate::error::{AdminError, Result};
use crate::filters::{
    lookup_error, ExclusiveRelatedValueListFilter, ListFilter, LookupParams,
    RelatedValueListFilter, ValueListFilter,
};
use crate::options::{FilterSpec, ModelAdmin};
use crate::request::{urlencode, AdminRequest};
use crate::templates::FilterPanel;

/// Query parameters that never narrow the list (page, ordering, search,
/// popup flag).
pub const IGNORED_PARAMS: &[&str] = &["p", "o", "q", "_popup"];

/// The state of one change list request.
///
/// Holds the request's parameters, the lookup parameters not consumed by
/// any filter, and the filters that have something to show.
pub struct ChangeList<M: Model> {
    params: BTreeMap<String, String>,
    lookup_params: LookupParams,
    filters: Vec<Box<dyn ListFilter<M>>>,
}

impl<M: Model> ChangeList<M> {
    /// Creates a change list without filters.
    pub fn from_request(request: &AdminRequest) -> Self {
        let params = request.query.clone();
        let lookup_params = params
            .iter()
            .filter(|(key, _)| !IGNORED_PARAMS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self {
            params,
            lookup_params,
            filters: Vec::new(),
        }
    }

    /// Creates a change list and the filters declared by `admin`.
    ///
    /// Each filter consumes its own parameters from the lookup parameters.
    /// Filters without output are dropped.
    ///
    /// # Errors
    ///
    /// Fails when a filter names an unusable field, or with a database
    /// error.
    pub async fn build(
        request: &AdminRequest,
        admin: &ModelAdmin,
        pool: &SqlitePool,
    ) -> Result<Self> {
        let mut cl = Self::from_request(request);
        for spec in &admin.list_filter {
            let params = &mut cl.lookup_params;
            let filter: Box<dyn ListFilter<M>> = match spec {
                FilterSpec::Values(path) => {
                    Box::new(ValueListFilter::<M>::new(path, params, admin, pool).await?)
                }
                FilterSpec::Related(path) => {
                    Box::new(RelatedValueListFilter::<M>::new(path, params, admin, pool).await?)
                }
                FilterSpec::ExclusiveRelated(path) => Box::new(
                    ExclusiveRelatedValueListFilter::<M>::new(path, params, admin, pool).await?,
                ),
            };
            if filter.has_output() {
                cl.filters.push(filter);
            } else {
                debug!(field = %spec.field_path(), "skipping filter without output");
            }
        }
        Ok(cl)
    }

    /// Returns the request's query parameters.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Returns the lookup parameters no filter consumed.
    pub fn lookup_params(&self) -> &LookupParams {
        &self.lookup_params
    }

    /// Returns the filters shown next to the list.
    pub fn filters(&self) -> &[Box<dyn ListFilter<M>>] {
        &self.filters
    }

    /// Builds the query string of this list with `new` parameters set and
    /// every parameter starting with one of `remove` dropped.
    ///
    /// Pairs are sorted by key and form-urlencoded, e.g.
    /// `?status__in=A%2CB`. An empty result is `?`.
    pub fn get_query_string(&self, new: &[(&str, &str)], remove: &[&str]) -> String {
        let mut params = self.params.clone();
        params.retain(|key, _| !remove.iter().any(|prefix| key.starts_with(prefix)));
        for (key, value) in new {
            params.insert((*key).to_string(), (*value).to_string());
        }

        let pairs: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", urlencode(key), urlencode(value)))
            .collect();
        format!("?{}", pairs.join("&"))
    }

    /// Returns the rows of the list: the admin's rows narrowed by every
    /// filter, then by the remaining lookup parameters.
    ///
    /// Remaining parameters must name a column of `M` and are matched
    /// exactly.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::IncorrectLookupParameters`] for unknown
    /// parameters or values that do not fit their field.
    pub fn get_queryset(
        &self,
        request: &AdminRequest,
        admin: &ModelAdmin,
    ) -> Result<QuerySet<M>> {
        let mut qs = admin.get_queryset::<M>();
        for filter in &self.filters {
            qs = filter.queryset(request, qs)?;
        }

        for (key, value) in &self.lookup_params {
            let field = M::field(key)
                .filter(|field| !field.column.is_empty())
                .ok_or_else(|| {
                    warn!(param = %key, "unknown lookup parameter");
                    AdminError::IncorrectLookupParameters(format!(
                        "{} has no field '{key}'",
                        M::table_name()
                    ))
                })?;
            let value = field
                .to_lookup_value(value)
                .map_err(|e| lookup_error(key, e))?;
            qs = qs.filter(Q::eq(&format!("{}.{}", M::table_name(), field.column), value));
        }
        Ok(qs)
    }

    /// Returns the title and choices of every filter, for rendering.
    pub fn filter_panels(&self) -> Vec<FilterPanel> {
        self.filters
            .iter()
            .map(|filter| FilterPanel {
                title: filter.title().to_string(),
                choices: filter.choices(self).collect(),
            })
            .collect()
    }
}

impl<M> ChangeList<M>
where
    M: Model + for<'r> FromRow<'r, SqliteRow> + Unpin,
{
    /// Fetches the rows of the list.
    ///
    /// # Errors
    ///
    /// See [`ChangeList::get_queryset`]; also fails with a database error.
    pub async fn get_results(
        &self,
        request: &AdminRequest,
        admin: &ModelAdmin,
        pool: &SqlitePool,
    ) -> Result<Vec<M>> {
        let qs = self.get_queryset(request, admin)?;
        Ok(qs.execute(pool).await?)
    }
}
