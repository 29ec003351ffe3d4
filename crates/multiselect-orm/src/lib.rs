//! # multiselect-orm
//!
//! The slice of a Django-like ORM that admin list filters need, on SQLite
//! through sqlx.
//!
//! This crate provides:
//! - `Model` trait with field metadata (`FieldDef`, `Relation`)
//! - `QuerySet` for lazy, chainable queries
//! - `Q` objects for filter expressions, including correlated subqueries
//!   over foreign keys and many-to-many relations
//! - `ValuesList` for distinct single-column projections
//!
//! ## Quick Start
//!
//! ```ignore
//! use multiselect_orm::{Model, Q};
//! use sqlx::SqlitePool;
//!
//! async fn example(pool: &SqlitePool) -> multiselect_orm::Result<()> {
//!     // Articles in draft or review
//!     let articles = Article::objects()
//!         .all()
//!         .filter(Q::in_list("status", vec!["draft", "review"]))
//!         .order_by("-id")
//!         .execute(pool)
//!         .await?;
//!
//!     // Distinct statuses, ascending
//!     let statuses = Article::objects()
//!         .all()
//!         .distinct()
//!         .order_by("status")
//!         .values_list("status")
//!         .fetch(pool)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Relation predicates
//!
//! ```ignore
//! let tags = Relation::many_to_many("tags", "article_tags", "article_id", "tag_id");
//!
//! // Articles without tags
//! let q = tags.is_null_q("articles", "id");
//!
//! // Articles tagged with both 1 and 2 (possibly more)
//! let q = tags.all_of_q("articles", "id", vec![SqlValue::Int(1), SqlValue::Int(2)]);
//! ```

mod error;
pub mod fields;
mod manager;
mod model;
pub mod query;
mod queryset;
mod value;
mod values;

pub use error::{OrmError, Result};
pub use fields::{FieldDef, FieldKind, Relation, RelationKind};
pub use manager::Manager;
pub use model::{resolve_field_path, Model, ResolvedField, LOOKUP_SEP};
pub use query::{Aggregate, Q, Subquery};
pub use queryset::{OrderBy, OrderDirection, QuerySet};
pub use value::{SqlValue, ToSqlValue};
pub use values::ValuesList;
