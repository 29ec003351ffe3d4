//! Aggregate functions for subquery predicates.
//!
//! The exclusive related filter compares `COUNT(DISTINCT ...)` over a
//! relation with the number of selected identifiers.

/// An aggregate function usable in a correlated subquery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    /// COUNT(DISTINCT column)
    CountDistinct {
        /// Column whose distinct values are counted
        column: String,
    },
}

impl Aggregate {
    /// Creates a COUNT(DISTINCT column) aggregate.
    pub fn count_distinct(column: &str) -> Self {
        Self::CountDistinct {
            column: column.to_string(),
        }
    }

    /// Returns the SQL representation of this aggregate.
    pub fn to_sql(&self) -> String {
        match self {
            Self::CountDistinct { column } => format!("COUNT(DISTINCT {column})"),
        }
    }
}
