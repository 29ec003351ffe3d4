//! Multi-select filter matching rows related to every selected object.

use multiselect_orm::{Model, QuerySet};
use sqlx::SqlitePool;
use tracing::debug;

use super::{ChoiceOption, ListFilter, LookupParams, RelatedValueListFilter};
use crate::changelist::ChangeList;
use crate::error::Result;
use crate::options::ModelAdmin;
use crate::request::AdminRequest;

/// Like [`RelatedValueListFilter`], but a row matches only when it is
/// related to all selected identifiers.
///
/// The match counts the distinct selected identifiers among the row's
/// related objects and compares the count with the size of the selection.
/// Related objects outside the selection do not disqualify a row, so with
/// `{a, b}` selected a row related to `{a, b, c}` matches while rows
/// related to `{a}` or `{a, c}` do not.
pub struct ExclusiveRelatedValueListFilter<M: Model> {
    inner: RelatedValueListFilter<M>,
}

impl<M: Model> ExclusiveRelatedValueListFilter<M> {
    /// Builds the filter. See [`RelatedValueListFilter::new`].
    ///
    /// # Errors
    ///
    /// Fails when `field_path` does not name a relation field of `M`, or
    /// with a database error.
    pub async fn new(
        field_path: &str,
        params: &mut LookupParams,
        admin: &ModelAdmin,
        pool: &SqlitePool,
    ) -> Result<Self> {
        let inner = RelatedValueListFilter::new(field_path, params, admin, pool).await?;
        Ok(Self { inner })
    }
}

impl<M: Model> From<RelatedValueListFilter<M>> for ExclusiveRelatedValueListFilter<M> {
    fn from(inner: RelatedValueListFilter<M>) -> Self {
        Self { inner }
    }
}

impl<M: Model> ListFilter<M> for ExclusiveRelatedValueListFilter<M> {
    fn title(&self) -> &str {
        self.inner.title()
    }

    fn expected_parameters(&self) -> Vec<String> {
        self.inner.expected_parameters()
    }

    fn has_output(&self) -> bool {
        self.inner.has_output()
    }

    fn choices<'a>(
        &'a self,
        cl: &'a ChangeList<M>,
    ) -> Box<dyn Iterator<Item = ChoiceOption> + 'a> {
        self.inner.choices(cl)
    }

    fn queryset(&self, _request: &AdminRequest, qs: QuerySet<M>) -> Result<QuerySet<M>> {
        let relation = self.inner.relation()?;
        let (table, pk) = (M::table_name(), M::pk_column());
        if self.inner.selection().is_null_selected() {
            return Ok(qs.filter(relation.is_null_q(table, pk)));
        }

        let ids = self.inner.selected_ids()?;
        if ids.is_empty() {
            return Ok(qs);
        }
        debug!(count = ids.len(), "filtering rows related to all selected ids");
        Ok(qs.filter(relation.all_of_q(table, pk, ids)))
    }
}
