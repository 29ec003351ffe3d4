//! Multi-select list filters for the admin change list.
//!
//! Every filter reads two parameters from the query string, `<path>__in`
//! (a comma-joined list) and `<path>__isnull`, and exposes:
//!
//! - `choices`: the options rendered next to the list, each carrying the
//!   query string that toggles it
//! - `queryset`: the predicate narrowing the listed rows
//!
//! Three filters are provided:
//!
//! - [`ValueListFilter`] - distinct values of a scalar field
//! - [`RelatedValueListFilter`] - related objects, matching rows related to
//!   any selected object
//! - [`ExclusiveRelatedValueListFilter`] - related objects, matching rows
//!   related to every selected object

mod exclusive;
mod related;
mod value_list;

pub use exclusive::ExclusiveRelatedValueListFilter;
pub use related::RelatedValueListFilter;
pub use value_list::ValueListFilter;

use std::collections::BTreeMap;

use multiselect_orm::{Model, OrmError, QuerySet};
use serde::Serialize;
use tracing::{debug, warn};

use crate::changelist::ChangeList;
use crate::error::{AdminError, Result};
use crate::request::AdminRequest;

/// Label of the option that clears a filter.
pub const ALL_LABEL: &str = "All";

/// Lookup parameters of a request that no filter has consumed yet.
pub type LookupParams = BTreeMap<String, String>;

/// A filter shown next to the admin change list.
pub trait ListFilter<M: Model>: Send + Sync {
    /// Returns the heading of the filter.
    fn title(&self) -> &str;

    /// Returns the query parameters this filter consumes.
    fn expected_parameters(&self) -> Vec<String>;

    /// Returns whether the filter has anything to offer.
    fn has_output(&self) -> bool;

    /// Returns the options of the filter, first "All", then one per
    /// candidate, then optionally the empty value.
    fn choices<'a>(
        &'a self,
        cl: &'a ChangeList<M>,
    ) -> Box<dyn Iterator<Item = ChoiceOption> + 'a>;

    /// Narrows `qs` to the rows matching the current selection.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::IncorrectLookupParameters`] when a selected
    /// value does not fit the field.
    fn queryset(&self, request: &AdminRequest, qs: QuerySet<M>) -> Result<QuerySet<M>>;
}

/// One option of a filter, as consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    /// Whether the option reflects the current selection.
    pub selected: bool,
    /// Query string of the list after following this option.
    pub query_string: String,
    /// Human-readable label.
    pub display: String,
}

/// The values chosen for a filter plus its isnull flag.
///
/// A truthy isnull flag overrides the values: a selection built with
/// `isnull == Some(true)` never holds values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    values: Vec<String>,
    isnull: Option<bool>,
}

impl Selection {
    /// Creates a selection, dropping the values when isnull is set.
    pub fn new(values: Vec<String>, isnull: Option<bool>) -> Self {
        if isnull == Some(true) && !values.is_empty() {
            debug!(?values, "isnull overrides selected values");
            return Self {
                values: Vec::new(),
                isnull,
            };
        }
        Self { values, isnull }
    }

    /// Parses the raw `__in` and `__isnull` parameters.
    ///
    /// An absent or empty `__in` parameter is an empty selection.
    pub fn parse(values: Option<&str>, isnull: Option<&str>) -> Self {
        let values = match values {
            Some(raw) if !raw.is_empty() => raw.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };
        Self::new(values, isnull.map(parse_isnull))
    }

    /// Returns the selected values in request order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Returns the parsed isnull flag, if the parameter was given.
    pub const fn isnull(&self) -> Option<bool> {
        self.isnull
    }

    /// Returns whether the empty value is selected.
    pub fn is_null_selected(&self) -> bool {
        self.isnull == Some(true)
    }

    /// Returns whether nothing narrows the list.
    pub fn is_all(&self) -> bool {
        self.values.is_empty() && !self.is_null_selected()
    }

    /// Returns whether `value` is selected.
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Returns the values after toggling `value`: removed when selected,
    /// appended otherwise. The order of the other values is kept.
    pub fn toggled(&self, value: &str) -> Vec<String> {
        if self.contains(value) {
            self.values.iter().filter(|v| *v != value).cloned().collect()
        } else {
            let mut values = self.values.clone();
            values.push(value.to_string());
            values
        }
    }
}

/// Parses an isnull parameter: `""`, `"false"` and `"0"` are false, in any
/// case; everything else is true.
pub fn parse_isnull(value: &str) -> bool {
    !matches!(value.to_lowercase().as_str(), "" | "false" | "0")
}

/// The parameter names shared by the multi-select filters.
#[derive(Debug, Clone)]
pub(crate) struct LookupKwargs {
    pub(crate) values: String,
    pub(crate) isnull: String,
}

impl LookupKwargs {
    /// Removes both parameters from `params` and parses them.
    pub(crate) fn pop(&self, params: &mut LookupParams) -> Selection {
        let values = params.remove(&self.values);
        let isnull = params.remove(&self.isnull);
        Selection::parse(values.as_deref(), isnull.as_deref())
    }

    pub(crate) fn expected(&self) -> Vec<String> {
        vec![self.values.clone(), self.isnull.clone()]
    }

    /// The option clearing the filter.
    pub(crate) fn all_option<M: Model>(
        &self,
        cl: &ChangeList<M>,
        selection: &Selection,
    ) -> ChoiceOption {
        ChoiceOption {
            selected: selection.is_all(),
            query_string: cl
                .get_query_string(&[], &[self.values.as_str(), self.isnull.as_str()]),
            display: ALL_LABEL.to_string(),
        }
    }

    /// The option selecting the empty value.
    pub(crate) fn isnull_option<M: Model>(
        &self,
        cl: &ChangeList<M>,
        selection: &Selection,
        display: &str,
    ) -> ChoiceOption {
        ChoiceOption {
            selected: selection.is_null_selected(),
            query_string: cl.get_query_string(
                &[(self.isnull.as_str(), "True")],
                &[self.values.as_str()],
            ),
            display: display.to_string(),
        }
    }
}

/// Converts a failure to build a filter predicate from request values into
/// [`AdminError::IncorrectLookupParameters`].
pub(crate) fn lookup_error(path: &str, err: OrmError) -> AdminError {
    match err {
        OrmError::Validation(msg) | OrmError::InvalidField(msg) => {
            warn!(field = %path, error = %msg, "rejected lookup parameters");
            AdminError::IncorrectLookupParameters(msg)
        }
        other => AdminError::Orm(other),
    }
}
