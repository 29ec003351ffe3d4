//! Multi-select filter over related objects.

use std::iter;
use std::marker::PhantomData;

use multiselect_orm::{resolve_field_path, FieldDef, Model, QuerySet, Relation, SqlValue};
use sqlx::SqlitePool;
use tracing::debug;

use super::{lookup_error, ChoiceOption, ListFilter, LookupKwargs, LookupParams, Selection};
use crate::changelist::ChangeList;
use crate::error::{AdminError, Result};
use crate::options::ModelAdmin;
use crate::request::AdminRequest;

/// Filters a foreign key or many-to-many field by a set of related
/// identifiers. A row matches when it is related to any of them.
///
/// Reads `<path>__<target>__in` (e.g. `tags__id__in`) and `<path>__isnull`.
pub struct RelatedValueListFilter<M: Model> {
    title: String,
    field: FieldDef,
    kwargs: LookupKwargs,
    selection: Selection,
    lookup_choices: Vec<(String, Option<String>)>,
    include_empty_choice: bool,
    empty_value_display: String,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> RelatedValueListFilter<M> {
    /// Builds the filter, popping its parameters from `params` and
    /// fetching the related choices.
    ///
    /// # Errors
    ///
    /// Fails when `field_path` does not name a relation field of `M`, or
    /// with a database error.
    pub async fn new(
        field_path: &str,
        params: &mut LookupParams,
        admin: &ModelAdmin,
        pool: &SqlitePool,
    ) -> Result<Self> {
        let resolved = resolve_field_path::<M>(field_path)?;
        if !resolved.field.is_relation() || resolved.is_remote() {
            return Err(AdminError::InvalidField(format!(
                "'{field_path}' is not a relation of {}",
                M::table_name()
            )));
        }
        let lookup_choices = admin.field_choices(&resolved.field, pool).await?;
        Ok(Self::with_choices(resolved.field, params, lookup_choices, admin))
    }

    pub(crate) fn with_choices(
        field: FieldDef,
        params: &mut LookupParams,
        lookup_choices: Vec<(String, Option<String>)>,
        admin: &ModelAdmin,
    ) -> Self {
        let target = field
            .relation
            .as_ref()
            .map_or("id", |relation| relation.target_field.as_str());
        let kwargs = LookupKwargs {
            values: format!("{}__{target}__in", field.name),
            isnull: format!("{}__isnull", field.name),
        };
        let selection = kwargs.pop(params);

        let include_empty_choice = field.null
            || field.relation.as_ref().is_some_and(Relation::is_many_to_many)
            || lookup_choices.iter().any(|(_, label)| label.is_none());

        debug!(
            field = %field.name,
            selection = ?selection.values(),
            isnull = ?selection.isnull(),
            choices = lookup_choices.len(),
            "built related value list filter"
        );

        Self {
            title: field.label(),
            field,
            kwargs,
            selection,
            lookup_choices,
            include_empty_choice,
            empty_value_display: admin.get_empty_value_display().to_string(),
            _model: PhantomData,
        }
    }

    /// Returns the current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub(crate) fn relation(&self) -> Result<&Relation> {
        self.field.relation.as_ref().ok_or_else(|| {
            AdminError::InvalidField(format!("'{}' is not a relation", self.field.name))
        })
    }

    /// Parses the selected identifiers with the relation's target kind.
    pub(crate) fn selected_ids(&self) -> Result<Vec<SqlValue>> {
        let relation = self.relation()?;
        self.selection
            .values()
            .iter()
            .map(|v| relation.parse_target(v))
            .collect::<multiselect_orm::Result<Vec<_>>>()
            .map_err(|e| lookup_error(&self.field.name, e))
    }

    fn value_option(&self, cl: &ChangeList<M>, pk: &str, label: &str) -> ChoiceOption {
        // An emptied selection is still encoded, as `<kwarg>=`.
        let values = self.selection.toggled(pk).join(",");
        ChoiceOption {
            selected: self.selection.contains(pk),
            query_string: cl.get_query_string(
                &[(self.kwargs.values.as_str(), values.as_str())],
                &[self.kwargs.isnull.as_str()],
            ),
            display: label.to_string(),
        }
    }
}

impl<M: Model> ListFilter<M> for RelatedValueListFilter<M> {
    fn title(&self) -> &str {
        &self.title
    }

    fn expected_parameters(&self) -> Vec<String> {
        self.kwargs.expected()
    }

    fn has_output(&self) -> bool {
        let labelled = self
            .lookup_choices
            .iter()
            .filter(|(_, label)| label.is_some())
            .count();
        labelled + usize::from(self.include_empty_choice) > 1
    }

    fn choices<'a>(
        &'a self,
        cl: &'a ChangeList<M>,
    ) -> Box<dyn Iterator<Item = ChoiceOption> + 'a> {
        let all = iter::once_with(move || self.kwargs.all_option(cl, &self.selection));
        let values = self
            .lookup_choices
            .iter()
            .filter_map(|(pk, label)| label.as_deref().map(|label| (pk, label)))
            .map(move |(pk, label)| self.value_option(cl, pk, label));
        let empty = iter::once_with(move || {
            self.include_empty_choice.then(|| {
                self.kwargs
                    .isnull_option(cl, &self.selection, &self.empty_value_display)
            })
        })
        .flatten();
        Box::new(all.chain(values).chain(empty))
    }

    fn queryset(&self, _request: &AdminRequest, qs: QuerySet<M>) -> Result<QuerySet<M>> {
        let relation = self.relation()?;
        let (table, pk) = (M::table_name(), M::pk_column());
        if self.selection.is_null_selected() {
            return Ok(qs.filter(relation.is_null_q(table, pk)));
        }
        if !self.selection.values().is_empty() {
            return Ok(qs.filter(relation.any_of_q(table, pk, self.selected_ids()?)));
        }
        if self.selection.isnull() == Some(false) {
            return Ok(qs.filter(relation.is_null_q(table, pk).not()));
        }
        Ok(qs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiselect_orm::FieldKind;

    struct Article;

    impl Model for Article {
        fn table_name() -> &'static str {
            "articles"
        }

        fn columns() -> &'static [&'static str] {
            &["id", "author_id"]
        }

        fn fields() -> Vec<FieldDef> {
            vec![
                FieldDef::new("title", FieldKind::Text),
                FieldDef::related("author", Relation::foreign_key("author_id", "authors")),
                FieldDef::related(
                    "tags",
                    Relation::many_to_many("tags", "article_tags", "article_id", "tag_id"),
                ),
            ]
        }
    }

    fn choices() -> Vec<(String, Option<String>)> {
        vec![
            ("1".to_string(), Some("rust".to_string())),
            ("2".to_string(), Some("sql".to_string())),
            ("3".to_string(), Some("web".to_string())),
        ]
    }

    fn filter(name: &str, query: &str) -> RelatedValueListFilter<Article> {
        let mut params = AdminRequest::parse_query_string(query);
        let field = Article::field(name).unwrap();
        RelatedValueListFilter::with_choices(field, &mut params, choices(), &ModelAdmin::new())
    }

    fn changelist(query: &str) -> ChangeList<Article> {
        ChangeList::from_request(&AdminRequest::from_url(&format!("/admin/articles/?{query}")))
    }

    #[test]
    fn test_parameters() {
        let filter = filter("tags", "");
        assert_eq!(
            filter.expected_parameters(),
            vec!["tags__id__in".to_string(), "tags__isnull".to_string()]
        );
    }

    #[test]
    fn test_choices_without_selection() {
        let filter = filter("tags", "");
        let cl = changelist("");
        let choices: Vec<ChoiceOption> = filter.choices(&cl).collect();

        // All, three tags, and the empty choice of a many-to-many field.
        assert_eq!(choices.len(), 5);
        assert!(choices[0].selected);
        assert_eq!(choices[1].display, "rust");
        assert_eq!(choices[1].query_string, "?tags__id__in=1");
        assert_eq!(choices[4].display, "-");
        assert_eq!(choices[4].query_string, "?tags__isnull=True");
        assert!(!choices[4].selected);
    }

    #[test]
    fn test_toggle_keeps_order() {
        let filter = filter("tags", "tags__id__in=3,1");
        let cl = changelist("tags__id__in=3,1");
        let choices: Vec<ChoiceOption> = filter.choices(&cl).collect();

        assert!(!choices[0].selected);
        assert!(choices[1].selected);
        assert_eq!(choices[1].query_string, "?tags__id__in=3");
        assert!(!choices[2].selected);
        assert_eq!(choices[2].query_string, "?tags__id__in=3%2C1%2C2");
        assert!(choices[3].selected);
        assert_eq!(choices[3].query_string, "?tags__id__in=1");
    }

    #[test]
    fn test_deselecting_last_value_encodes_empty_list() {
        let filter = filter("tags", "tags__id__in=2");
        let cl = changelist("tags__id__in=2");
        let choices: Vec<ChoiceOption> = filter.choices(&cl).collect();
        assert_eq!(choices[2].query_string, "?tags__id__in=");
    }

    #[test]
    fn test_isnull_option() {
        let filter = filter("tags", "tags__isnull=True");
        let cl = changelist("tags__isnull=True");
        let choices: Vec<ChoiceOption> = filter.choices(&cl).collect();

        assert!(!choices[0].selected);
        assert_eq!(choices[1].query_string, "?tags__id__in=1");
        assert!(choices[4].selected);
        assert!(!choices[4].query_string.contains("tags__id__in"));
    }

    #[test]
    fn test_non_nullable_foreign_key_has_no_empty_choice() {
        let filter = filter("author", "");
        let cl = changelist("");
        let choices: Vec<ChoiceOption> = filter.choices(&cl).collect();
        assert_eq!(choices.len(), 4);
        assert_eq!(
            filter.expected_parameters()[0],
            "author__id__in".to_string()
        );
    }

    #[test]
    fn test_null_label_marks_empty_choice() {
        let mut params = LookupParams::new();
        let field = Article::field("author").unwrap();
        let filter = RelatedValueListFilter::<Article>::with_choices(
            field,
            &mut params,
            vec![
                ("1".to_string(), Some("Ada".to_string())),
                ("2".to_string(), None),
            ],
            &ModelAdmin::new(),
        );
        let cl = changelist("");
        let displays: Vec<String> = filter.choices(&cl).map(|c| c.display).collect();
        assert_eq!(displays, vec!["All", "Ada", "-"]);
        assert!(filter.has_output());
    }

    #[test]
    fn test_has_output_needs_two_options() {
        let mut params = LookupParams::new();
        let field = Article::field("author").unwrap();
        let filter = RelatedValueListFilter::<Article>::with_choices(
            field,
            &mut params,
            vec![("1".to_string(), Some("Ada".to_string()))],
            &ModelAdmin::new(),
        );
        assert!(!filter.has_output());
    }

    #[test]
    fn test_queryset_any_of() {
        let filter = filter("tags", "tags__id__in=1,2");
        let qs = filter
            .queryset(&AdminRequest::default(), Article::objects().all())
            .unwrap();
        let (sql, params) = qs.build_select();
        assert_eq!(
            sql,
            "SELECT id, author_id FROM articles WHERE EXISTS (SELECT 1 FROM article_tags AS rel \
             WHERE rel.article_id = articles.id AND (rel.tag_id IN (?, ?)))"
        );
        assert_eq!(params, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_queryset_rejects_malformed_id() {
        let filter = filter("author", "author__id__in=1,x");
        let err = filter
            .queryset(&AdminRequest::default(), Article::objects().all())
            .unwrap_err();
        assert!(matches!(err, AdminError::IncorrectLookupParameters(_)));
    }
}
