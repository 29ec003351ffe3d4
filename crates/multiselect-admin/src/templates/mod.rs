//! Bootstrap 5 rendering of the change list filters.

mod filters;

pub use filters::{filters_to_json, render_filter_sidebar, FilterPanel};
