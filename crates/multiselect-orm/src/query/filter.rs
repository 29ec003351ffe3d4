//! Q objects for complex query filtering.
//!
//! Q objects build filter expressions that combine with OR and NOT, similar
//! to Django's Q objects. QuerySet filters are ANDed together. Besides
//! plain column predicates they can express correlated subqueries over a
//! relation (`EXISTS` and aggregate comparisons), which is what the related
//! list filters are built on.

use crate::query::Aggregate;
use crate::value::{SqlValue, ToSqlValue};

/// Alias given to the table scanned by a correlated subquery.
pub const SUBQUERY_ALIAS: &str = "rel";

/// A correlated subquery source: a table scanned under [`SUBQUERY_ALIAS`]
/// and the condition tying its rows to the outer row.
///
/// Columns inside the subquery should be qualified with the alias, e.g.
/// `rel.tag_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subquery {
    /// Table scanned by the subquery.
    pub table: String,
    /// Condition correlating the subquery with the outer row.
    pub correlation: String,
    /// Qualified column the subquery is about (counted, matched).
    pub column: String,
}

impl Subquery {
    /// Creates a new subquery source.
    pub fn new(
        table: impl Into<String>,
        correlation: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            correlation: correlation.into(),
            column: column.into(),
        }
    }

    fn from_clause(&self) -> String {
        format!("{} AS {SUBQUERY_ALIAS}", self.table)
    }
}

/// A filter expression that can be combined with other expressions.
///
/// # Example
///
/// ```ignore
/// use multiselect_orm::Q;
///
/// // Simple equality
/// let filter = Q::eq("status", "active");
///
/// // Boolean logic
/// let filter = Q::in_list("status", vec!["A", "B"]).or(Q::is_null("status"));
///
/// // NOT expressions
/// let filter = Q::eq("deleted", true).not();
/// ```
#[derive(Debug, Clone)]
pub struct Q {
    expr: FilterExpr,
}

/// Internal filter expression representation.
#[derive(Debug, Clone)]
pub enum FilterExpr {
    /// Equality: field = value
    Eq { field: String, value: SqlValue },
    /// IS NULL check
    IsNull { field: String },
    /// IS NOT NULL check
    IsNotNull { field: String },
    /// IN list check
    InList {
        field: String,
        values: Vec<SqlValue>,
    },
    /// EXISTS over a correlated subquery
    Exists {
        subquery: Subquery,
        filter: Option<Box<FilterExpr>>,
    },
    /// (SELECT aggregate FROM subquery) = value
    AggregateEq {
        subquery: Subquery,
        aggregate: Aggregate,
        filter: Option<Box<FilterExpr>>,
        value: SqlValue,
    },
    /// OR combination
    Or(Box<FilterExpr>, Box<FilterExpr>),
    /// NOT negation
    Not(Box<FilterExpr>),
}

impl Q {
    /// Creates an equality filter (field = value).
    pub fn eq<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self {
            expr: FilterExpr::Eq {
                field: field.to_string(),
                value: value.to_sql_value(),
            },
        }
    }

    /// Creates an IS NULL filter.
    pub fn is_null(field: &str) -> Self {
        Self {
            expr: FilterExpr::IsNull {
                field: field.to_string(),
            },
        }
    }

    /// Creates an IS NOT NULL filter.
    pub fn is_not_null(field: &str) -> Self {
        Self {
            expr: FilterExpr::IsNotNull {
                field: field.to_string(),
            },
        }
    }

    /// Creates an IN list filter.
    ///
    /// An empty list matches nothing.
    pub fn in_list<V: ToSqlValue>(field: &str, values: Vec<V>) -> Self {
        Self {
            expr: FilterExpr::InList {
                field: field.to_string(),
                values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            },
        }
    }

    /// Creates an `EXISTS (SELECT 1 FROM ...)` filter over a correlated
    /// subquery, optionally narrowed by `filter`.
    pub fn exists(subquery: Subquery, filter: Option<Q>) -> Self {
        Self {
            expr: FilterExpr::Exists {
                subquery,
                filter: filter.map(|q| Box::new(q.expr)),
            },
        }
    }

    /// Matches rows for which an aggregate over a correlated subquery
    /// equals `value`, e.g. `(SELECT COUNT(DISTINCT rel.tag_id) FROM ...) = ?`.
    ///
    /// `filter` narrows the rows the aggregate sees, like Django's
    /// `Count(..., filter=Q(...))`.
    pub fn aggregate_eq<V: ToSqlValue>(
        subquery: Subquery,
        aggregate: Aggregate,
        filter: Option<Q>,
        value: V,
    ) -> Self {
        Self {
            expr: FilterExpr::AggregateEq {
                subquery,
                aggregate,
                filter: filter.map(|q| Box::new(q.expr)),
                value: value.to_sql_value(),
            },
        }
    }

    /// Combines this filter with another using OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            expr: FilterExpr::Or(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Negates this filter with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self {
            expr: FilterExpr::Not(Box::new(self.expr)),
        }
    }

    /// Returns the internal filter expression.
    pub fn into_expr(self) -> FilterExpr {
        self.expr
    }

    /// Builds the SQL WHERE clause and parameters.
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        build_filter_expr(&self.expr)
    }
}

/// Builds the `FROM ... WHERE ...` tail shared by subquery expressions.
fn build_subquery_tail(
    subquery: &Subquery,
    filter: Option<&FilterExpr>,
) -> (String, Vec<SqlValue>) {
    let mut sql = format!(
        "FROM {} WHERE {}",
        subquery.from_clause(),
        subquery.correlation
    );
    let mut params = Vec::new();
    if let Some(filter) = filter {
        let (filter_sql, filter_params) = build_filter_expr(filter);
        sql.push_str(&format!(" AND ({filter_sql})"));
        params.extend(filter_params);
    }
    (sql, params)
}

/// Builds SQL and parameters from a filter expression.
pub(crate) fn build_filter_expr(expr: &FilterExpr) -> (String, Vec<SqlValue>) {
    match expr {
        FilterExpr::Eq { field, value } => (format!("{field} = ?"), vec![value.clone()]),
        FilterExpr::IsNull { field } => (format!("{field} IS NULL"), vec![]),
        FilterExpr::IsNotNull { field } => (format!("{field} IS NOT NULL"), vec![]),
        FilterExpr::InList { field, values } => {
            if values.is_empty() {
                return ("1 = 0".to_string(), vec![]);
            }
            let placeholders: Vec<&str> = values.iter().map(|_| SqlValue::placeholder()).collect();
            (
                format!("{field} IN ({})", placeholders.join(", ")),
                values.clone(),
            )
        }
        FilterExpr::Exists { subquery, filter } => {
            let (tail, params) = build_subquery_tail(subquery, filter.as_deref());
            (format!("EXISTS (SELECT 1 {tail})"), params)
        }
        FilterExpr::AggregateEq {
            subquery,
            aggregate,
            filter,
            value,
        } => {
            let (tail, mut params) = build_subquery_tail(subquery, filter.as_deref());
            params.push(value.clone());
            (
                format!("(SELECT {} {tail}) = ?", aggregate.to_sql()),
                params,
            )
        }
        FilterExpr::Or(left, right) => {
            let (left_sql, mut left_params) = build_filter_expr(left);
            let (right_sql, right_params) = build_filter_expr(right);
            left_params.extend(right_params);
            (format!("({left_sql}) OR ({right_sql})"), left_params)
        }
        FilterExpr::Not(inner) => {
            let (inner_sql, params) = build_filter_expr(inner);
            (format!("NOT ({inner_sql})"), params)
        }
    }
}
