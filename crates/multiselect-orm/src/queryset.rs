//! Lazy, chainable row queries.
//!
//! Nothing touches the database until `execute()` or `count()` is awaited.

use std::fmt;
use std::marker::PhantomData;

use sqlx::{FromRow, Row, SqlitePool};
use tracing::debug;

use crate::error::Result;
use crate::model::Model;
use crate::query::{build_filter_expr, FilterExpr, Q};
use crate::value::{bind_value, bind_value_as, SqlValue};
use crate::values::ValuesList;

/// Sort direction of an [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// ASC
    Asc,
    /// DESC
    Desc,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone)]
pub struct OrderBy {
    /// Column to sort on
    pub column: String,
    /// Sort direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Parses an admin ordering term: `"name"` sorts ascending, `"-name"`
    /// descending.
    pub fn parse(term: &str) -> Self {
        let (column, direction) = match term.strip_prefix('-') {
            Some(column) => (column, OrderDirection::Desc),
            None => (term, OrderDirection::Asc),
        };
        Self {
            column: column.to_string(),
            direction,
        }
    }

    /// Returns the SQL representation.
    pub fn to_sql(&self) -> String {
        match self.direction {
            OrderDirection::Asc => format!("{} ASC", self.column),
            OrderDirection::Desc => format!("{} DESC", self.column),
        }
    }
}

/// The rows of `M` matching a conjunction of [`Q`] filters.
///
/// Every builder method consumes the QuerySet and returns the refined one.
///
/// # Example
///
/// ```ignore
/// let articles = Article::objects()
///     .all()
///     .filter(Q::in_list("articles.status", vec!["draft", "review"]))
///     .order_by("-id")
///     .execute(&pool)
///     .await?;
/// ```
pub struct QuerySet<M: Model> {
    filters: Vec<FilterExpr>,
    order_by: Vec<OrderBy>,
    distinct: bool,
    _marker: PhantomData<M>,
}

// Written by hand so neither trait requires it of M.
impl<M: Model> Clone for QuerySet<M> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            order_by: self.order_by.clone(),
            distinct: self.distinct,
            _marker: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for QuerySet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("table", &M::table_name())
            .field("filters", &self.filters)
            .field("order_by", &self.order_by)
            .field("distinct", &self.distinct)
            .finish()
    }
}

impl<M: Model> Default for QuerySet<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> QuerySet<M> {
    /// Creates a QuerySet over every row of `M`.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            order_by: Vec::new(),
            distinct: false,
            _marker: PhantomData,
        }
    }

    /// Narrows the rows to those matching `q`, ANDed with earlier filters.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        self.filters.push(q.into_expr());
        self
    }

    /// Appends an ordering term, see [`OrderBy::parse`].
    #[must_use]
    pub fn order_by(mut self, term: &str) -> Self {
        self.order_by.push(OrderBy::parse(term));
        self
    }

    /// Selects distinct rows.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Projects the QuerySet onto a single column, keeping its filters,
    /// ordering and DISTINCT flag.
    pub fn values_list(&self, column: &str) -> ValuesList {
        let mut params = Vec::new();
        let where_clause = self.build_where_clause(&mut params);
        let values = ValuesList::from_table(M::table_name(), column)
            .where_clause(where_clause, params)
            .order_by_specs(self.order_by.clone());
        if self.distinct {
            values.distinct()
        } else {
            values
        }
    }

    /// Builds the SELECT statement and its parameters.
    pub fn build_select(&self) -> (String, Vec<SqlValue>) {
        let mut params = Vec::new();
        let mut sql = format!(
            "SELECT {}{} FROM {}",
            if self.distinct { "DISTINCT " } else { "" },
            M::columns().join(", "),
            M::table_name()
        );

        let where_clause = self.build_where_clause(&mut params);
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }

        if !self.order_by.is_empty() {
            let terms: Vec<String> = self.order_by.iter().map(OrderBy::to_sql).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        (sql, params)
    }

    /// Builds the `SELECT COUNT(*)` statement and its parameters.
    pub fn build_count(&self) -> (String, Vec<SqlValue>) {
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) FROM {}", M::table_name());
        let where_clause = self.build_where_clause(&mut params);
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }
        (sql, params)
    }

    fn build_where_clause(&self, params: &mut Vec<SqlValue>) -> String {
        self.filters
            .iter()
            .map(|filter| {
                let (sql, filter_params) = build_filter_expr(filter);
                params.extend(filter_params);
                sql
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Counts the matching rows.
    pub async fn count(&self, pool: &SqlitePool) -> Result<i64> {
        let (sql, params) = self.build_count();
        debug!(sql = %sql, "counting rows");
        let mut query = sqlx::query(&sql);
        for param in params {
            query = bind_value(query, param);
        }
        let row = query.fetch_one(pool).await?;
        Ok(row.get(0))
    }
}

impl<M: Model + for<'r> FromRow<'r, sqlx::sqlite::SqliteRow> + Unpin> QuerySet<M> {
    /// Fetches every matching row.
    pub async fn execute(&self, pool: &SqlitePool) -> Result<Vec<M>> {
        let (sql, params) = self.build_select();
        debug!(sql = %sql, "executing queryset");
        let mut query = sqlx::query_as::<_, M>(&sql);
        for param in params {
            query = bind_value_as(query, param);
        }
        Ok(query.fetch_all(pool).await?)
    }
}
