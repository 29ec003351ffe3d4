//! Query building types for the ORM.
//!
//! This module provides Q objects for filtering and the aggregates used in
//! subquery predicates.

mod aggregates;
mod filter;

pub use aggregates::Aggregate;
pub use filter::{FilterExpr, Q, Subquery, SUBQUERY_ALIAS};

pub(crate) use filter::build_filter_expr;
