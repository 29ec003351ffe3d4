//! # multiselect-admin
//!
//! Multi-select list filters for a Django-like admin, on top of
//! `multiselect-orm`.
//!
//! A change list reads its filters from [`ModelAdmin::list_filter`]:
//!
//! - `FilterSpec::values("status")` - [`ValueListFilter`], pick any number
//!   of distinct values of a field (`?status__in=A,B`), or the empty value
//!   (`?status__isnull=True`)
//! - `FilterSpec::related("tags")` - [`RelatedValueListFilter`], pick
//!   related objects and list rows related to any of them
//!   (`?tags__id__in=1,2`)
//! - `FilterSpec::exclusive_related("tags")` -
//!   [`ExclusiveRelatedValueListFilter`], list rows related to all picked
//!   objects
//!
//! ## Quick Start
//!
//! ```ignore
//! use multiselect_admin::{
//!     render_filter_sidebar, AdminRequest, ChangeList, FilterSpec, ModelAdmin,
//! };
//!
//! async fn articles(url: &str, pool: &SqlitePool) -> multiselect_admin::Result<String> {
//!     let admin = ModelAdmin::new()
//!         .list_filter(&[FilterSpec::values("status"), FilterSpec::exclusive_related("tags")])
//!         .empty_value_display("(none)");
//!
//!     let request = AdminRequest::from_url(url);
//!     let cl = ChangeList::<Article>::build(&request, &admin, pool).await?;
//!     let rows = cl.get_results(&request, &admin, pool).await?;
//!
//!     Ok(render_filter_sidebar(&cl.filter_panels()))
//! }
//! ```
//!
//! Lookup values that do not fit their field are reported as
//! [`AdminError::IncorrectLookupParameters`], which views should answer
//! with a bad request page.

pub mod changelist;
pub mod error;
pub mod filters;
pub mod options;
pub mod request;
pub mod templates;

pub use changelist::{ChangeList, IGNORED_PARAMS};
pub use error::{AdminError, Result};
pub use filters::{
    parse_isnull, ChoiceOption, ExclusiveRelatedValueListFilter, ListFilter, LookupParams,
    RelatedValueListFilter, Selection, ValueListFilter, ALL_LABEL,
};
pub use options::{FilterSpec, ModelAdmin, DEFAULT_EMPTY_VALUE_DISPLAY};
pub use request::AdminRequest;
pub use templates::{filters_to_json, render_filter_sidebar, FilterPanel};
