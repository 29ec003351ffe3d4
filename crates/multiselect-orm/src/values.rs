//! Flat single-column projections, like Django's `values_list(flat=True)`.

use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::Result;
use crate::queryset::OrderBy;
use crate::value::{bind_value, SqlValue};

/// A lazy projection of one column of a table.
///
/// Values are fetched string-encoded; SQL NULL comes back as `None`.
/// Ordering applies to the stored value, so integers sort numerically.
#[derive(Debug, Clone)]
pub struct ValuesList {
    table: String,
    column: String,
    where_clause: String,
    params: Vec<SqlValue>,
    order_by: Vec<OrderBy>,
    distinct: bool,
}

impl ValuesList {
    /// Projects `column` over every row of `table`.
    pub fn from_table(table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
            where_clause: String::new(),
            params: Vec::new(),
            order_by: Vec::new(),
            distinct: false,
        }
    }

    /// Restricts the rows with a pre-built WHERE clause.
    #[must_use]
    pub(crate) fn where_clause(mut self, sql: String, params: Vec<SqlValue>) -> Self {
        self.where_clause = sql;
        self.params = params;
        self
    }

    pub(crate) fn order_by_specs(mut self, order_by: Vec<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    /// Keeps each value once.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Replaces the ordering (prefix with `-` for descending).
    #[must_use]
    pub fn order_by(mut self, spec: &str) -> Self {
        self.order_by = vec![OrderBy::parse(spec)];
        self
    }

    /// Builds the SQL SELECT query and parameters.
    ///
    /// The column is selected twice: as stored, so DISTINCT and ORDER BY
    /// see the real value, and cast to text for decoding.
    pub fn build_select(&self) -> (String, Vec<SqlValue>) {
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        let mut sql = format!(
            "SELECT {distinct}{col}, CAST({col} AS TEXT) FROM {table}",
            col = self.column,
            table = self.table
        );
        if !self.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clause);
        }
        if !self.order_by.is_empty() {
            let parts: Vec<String> = self.order_by.iter().map(OrderBy::to_sql).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }
        (sql, self.params.clone())
    }

    /// Fetches the projected values.
    pub async fn fetch(&self, pool: &SqlitePool) -> Result<Vec<Option<String>>> {
        let (sql, params) = self.build_select();
        debug!(sql = %sql, "fetching values list");
        let mut query = sqlx::query(&sql);
        for param in params {
            query = bind_value(query, param);
        }

        let rows = query.fetch_all(pool).await?;
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            values.push(row.try_get::<Option<String>, _>(1)?);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_table() {
        let (sql, params) = ValuesList::from_table("authors", "country")
            .distinct()
            .order_by("country")
            .build_select();
        assert_eq!(
            sql,
            "SELECT DISTINCT country, CAST(country AS TEXT) FROM authors ORDER BY country ASC"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_without_distinct() {
        let (sql, _) = ValuesList::from_table("authors", "id").build_select();
        assert_eq!(sql, "SELECT id, CAST(id AS TEXT) FROM authors");
    }
}
