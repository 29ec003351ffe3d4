//! Manager for database access.
//!
//! The Manager is the entry point to a model's rows, similar to Django's
//! default manager.

use std::marker::PhantomData;

use crate::model::Model;
use crate::queryset::QuerySet;

/// A Manager provides QuerySets for a Model.
///
/// Each Model has a default Manager accessible via `Model::objects()`.
/// Managers are lightweight and can be created freely.
pub struct Manager<M: Model> {
    _marker: PhantomData<M>,
}

impl<M: Model> Clone for Manager<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: Model> Copy for Manager<M> {}

impl<M: Model> std::fmt::Debug for Manager<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("table", &M::table_name())
            .finish()
    }
}

impl<M: Model> Default for Manager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Manager<M> {
    /// Creates a new Manager.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Returns a QuerySet for all objects.
    pub fn all(&self) -> QuerySet<M> {
        QuerySet::new()
    }
}
