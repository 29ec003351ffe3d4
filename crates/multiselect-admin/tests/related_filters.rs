//! RelatedValueListFilter and ExclusiveRelatedValueListFilter against an
//! in-memory SQLite database.

mod common;
use common::*;

use multiselect_admin::{
    render_filter_sidebar, AdminError, AdminRequest, ChangeList, ChoiceOption, FilterSpec,
};
use multiselect_orm::OrmError;

fn displays(choices: &[ChoiceOption]) -> Vec<&str> {
    choices.iter().map(|c| c.display.as_str()).collect()
}

#[tokio::test]
async fn test_related_choices() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::related("tags")]);
    let cl = changelist("/admin/articles/", &admin, &pool).await.unwrap();

    let panels = cl.filter_panels();
    assert_eq!(panels[0].title, "tags");
    let choices = &panels[0].choices;
    assert_eq!(displays(choices), vec!["All", "rust", "sql", "web", "-"]);
    assert!(choices[0].selected);
    assert_eq!(choices[1].query_string, "?tags__id__in=1");
    assert_eq!(choices[4].query_string, "?tags__isnull=True");
    assert!(choices[1..].iter().all(|c| !c.selected));
}

#[tokio::test]
async fn test_related_choices_follow_admin_ordering() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::related("tags")]).related_ordering("tags", &["-name"]);
    let cl = changelist("/admin/articles/", &admin, &pool).await.unwrap();

    let panels = cl.filter_panels();
    assert_eq!(
        displays(&panels[0].choices),
        vec!["All", "web", "sql", "rust", "-"]
    );
}

#[tokio::test]
async fn test_related_any_of() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::related("tags")]);

    let ids = list_ids("/admin/articles/?tags__id__in=2", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![1, 2]);

    let ids = list_ids("/admin/articles/?tags__id__in=2,3", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![1, 2, 4]);

    let ids = list_ids("/admin/articles/?tags__isnull=True", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![5]);
}

#[tokio::test]
async fn test_related_foreign_key() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::related("author")]);
    let cl = changelist("/admin/articles/?author__id__in=1", &admin, &pool)
        .await
        .unwrap();

    let choices: Vec<ChoiceOption> = cl.filters()[0].choices(&cl).collect();
    // Nullable foreign key: the empty choice is offered.
    assert_eq!(displays(&choices), vec!["All", "Ada", "Linus", "Grace", "-"]);
    assert!(choices[1].selected);

    let ids = list_ids("/admin/articles/?author__id__in=1", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![1, 3]);

    let ids = list_ids("/admin/articles/?author__isnull=True", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![4]);
}

#[tokio::test]
async fn test_exclusive_requires_every_selected_id() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::exclusive_related("tags")]);

    // {rust, sql}: 1 has exactly both, 2 has both plus web, 3 lacks sql,
    // 4 has rust and web.
    let ids = list_ids("/admin/articles/?tags__id__in=1,2", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![1, 2]);

    let ids = list_ids("/admin/articles/?tags__id__in=1,3", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![2, 4]);

    let ids = list_ids("/admin/articles/?tags__id__in=1", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_exclusive_duplicate_ids_match_nothing() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::exclusive_related("tags")]);

    let ids = list_ids("/admin/articles/?tags__id__in=1,1", &admin, &pool)
        .await
        .unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_exclusive_empty_selection_returns_all_rows() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::exclusive_related("tags")]);

    let all = list_ids("/admin/articles/", &admin, &pool).await.unwrap();
    assert_eq!(all.len(), 5);

    let ids = list_ids("/admin/articles/?tags__id__in=", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, all);
}

#[tokio::test]
async fn test_exclusive_isnull() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::exclusive_related("tags")]);

    let ids = list_ids("/admin/articles/?tags__isnull=True", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![5]);

    let ids = list_ids(
        "/admin/articles/?tags__id__in=1,2&tags__isnull=True",
        &admin,
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(ids, vec![5]);
}

#[tokio::test]
async fn test_exclusive_malformed_id() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::exclusive_related("tags")]);

    let err = list_ids("/admin/articles/?tags__id__in=1,rust", &admin, &pool)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::IncorrectLookupParameters(_)));
}

#[tokio::test]
async fn test_exclusive_choices_match_related() {
    let pool = create_test_pool().await;
    let related = admin(&[FilterSpec::related("tags")]);
    let exclusive = admin(&[FilterSpec::exclusive_related("tags")]);
    let url = "/admin/articles/?tags__id__in=3,1&o=1";

    let related_cl = changelist(url, &related, &pool).await.unwrap();
    let exclusive_cl = changelist(url, &exclusive, &pool).await.unwrap();
    assert_eq!(related_cl.filter_panels(), exclusive_cl.filter_panels());
}

#[tokio::test]
async fn test_empty_selection_asymmetry() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::values("status"), FilterSpec::related("tags")]);
    let cl = changelist(
        "/admin/articles/?status__in=A&tags__id__in=2",
        &admin,
        &pool,
    )
    .await
    .unwrap();
    let panels = cl.filter_panels();

    // Deselecting the last value drops the scalar parameter...
    let status_a = &panels[0].choices[1];
    assert!(status_a.selected);
    assert_eq!(status_a.query_string, "?tags__id__in=2");

    // ...but keeps the related parameter with an empty list.
    let tag_sql = &panels[1].choices[2];
    assert!(tag_sql.selected);
    assert_eq!(tag_sql.query_string, "?status__in=A&tags__id__in=");
}

#[tokio::test]
async fn test_filters_combine() {
    let pool = create_test_pool().await;
    let admin = admin(&[
        FilterSpec::values("status"),
        FilterSpec::exclusive_related("tags"),
    ]);

    let ids = list_ids(
        "/admin/articles/?status__in=A&tags__id__in=1,2",
        &admin,
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(ids, vec![1]);
}

#[tokio::test]
async fn test_remaining_lookup_params() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::related("tags")]);

    let ids = list_ids("/admin/articles/?rating=2&p=1", &admin, &pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![2, 3]);

    let err = list_ids("/admin/articles/?colour=red", &admin, &pool)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::IncorrectLookupParameters(_)));
}

#[tokio::test]
async fn test_unknown_filter_field() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::related("editor")]);

    let err = changelist("/admin/articles/", &admin, &pool).await.err();
    assert!(matches!(
        err,
        Some(AdminError::Orm(OrmError::InvalidField(_)))
    ));
}

#[tokio::test]
async fn test_sidebar_marks_selection() {
    let pool = create_test_pool().await;
    let admin = admin(&[FilterSpec::exclusive_related("tags")]);
    let request = AdminRequest::from_url("/admin/articles/?tags__id__in=2");
    let cl = ChangeList::<common::Article>::build(&request, &admin, &pool)
        .await
        .unwrap();

    let html = render_filter_sidebar(&cl.filter_panels());
    assert!(html.contains("By tags"));
    assert_eq!(html.matches("list-group-item-action active").count(), 1);
    assert!(html.contains(r#"href="?tags__id__in=2%2C1""#));
}
