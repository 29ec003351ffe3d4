#![allow(dead_code)]

use multiselect_admin::{AdminRequest, ChangeList, FilterSpec, ModelAdmin, Result};
use multiselect_orm::{FieldDef, FieldKind, Model, Relation};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

#[derive(Debug, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub status: Option<String>,
    pub rating: Option<i64>,
    pub author_id: Option<i64>,
}

impl Model for Article {
    fn table_name() -> &'static str {
        "articles"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "title", "status", "rating", "author_id"]
    }

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::new("title", FieldKind::Text),
            FieldDef::new("status", FieldKind::Text).null(true),
            FieldDef::new("rating", FieldKind::Integer).null(true),
            FieldDef::related(
                "author",
                Relation::foreign_key("author_id", "authors")
                    .label_column("name")
                    .remote_field(FieldDef::new("country", FieldKind::Text).null(true)),
            )
            .null(true),
            FieldDef::related(
                "tags",
                Relation::many_to_many("tags", "article_tags", "article_id", "tag_id")
                    .label_column("name"),
            ),
        ]
    }
}

// Tags: 1 rust, 2 sql, 3 web.
//
// id  title       status  rating  author         tags
// 1   exact       A       10      Ada (UK)       {1, 2}
// 2   superset    B       2       Linus (FI)     {1, 2, 3}
// 3   only rust   A       2       Ada (UK)       {1}
// 4   rust web    NULL    NULL    -              {1, 3}
// 5   untagged    NULL    5       Grace (NULL)   {}
const SCHEMA: &[&str] = &[
    "CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT NOT NULL, country TEXT)",
    "CREATE TABLE tags (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
    "CREATE TABLE articles (id INTEGER PRIMARY KEY, title TEXT NOT NULL, status TEXT, \
     rating INTEGER, author_id INTEGER REFERENCES authors(id))",
    "CREATE TABLE article_tags (article_id INTEGER NOT NULL, tag_id INTEGER NOT NULL)",
    "INSERT INTO authors (id, name, country) VALUES (1, 'Ada', 'UK'), (2, 'Linus', 'FI'), \
     (3, 'Grace', NULL)",
    "INSERT INTO tags (id, name) VALUES (1, 'rust'), (2, 'sql'), (3, 'web')",
    "INSERT INTO articles (id, title, status, rating, author_id) VALUES \
     (1, 'exact', 'A', 10, 1), (2, 'superset', 'B', 2, 2), (3, 'only rust', 'A', 2, 1), \
     (4, 'rust web', NULL, NULL, NULL), (5, 'untagged', NULL, 5, 3)",
    "INSERT INTO article_tags (article_id, tag_id) VALUES (1, 1), (1, 2), (2, 1), (2, 2), \
     (2, 3), (3, 1), (4, 1), (4, 3)",
];

pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .unwrap_or_else(|e| panic!("Failed to run: {statement}\nError: {e:?}"));
    }
    pool
}

pub fn admin(filters: &[FilterSpec]) -> ModelAdmin {
    ModelAdmin::new().list_filter(filters).ordering(&["id"])
}

pub async fn changelist(
    url: &str,
    admin: &ModelAdmin,
    pool: &SqlitePool,
) -> Result<ChangeList<Article>> {
    ChangeList::build(&AdminRequest::from_url(url), admin, pool).await
}

/// Returns the ids of the rows listed at `url`.
pub async fn list_ids(url: &str, admin: &ModelAdmin, pool: &SqlitePool) -> Result<Vec<i64>> {
    let request = AdminRequest::from_url(url);
    let cl = ChangeList::<Article>::build(&request, admin, pool).await?;
    let rows = cl.get_results(&request, admin, pool).await?;
    Ok(rows.iter().map(|a| a.id).collect())
}
