use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stowage_data::prelude::*;
use stowage_data::{Condition, InsertMode, Removed, SortSpec};
use stowage_data_sqlx::{DataSourceOptions, SqlxAdapter};

fn posts() -> EntitySchema {
    EntitySchema::new("posts")
        .column(ColumnDef::primary_generated("id"))
        .column(ColumnDef::new("title", ColumnType::Text).not_null())
        .column(ColumnDef::new("slug", ColumnType::Text).unique())
        .column(ColumnDef::new("votes", ColumnType::Integer))
        .column(ColumnDef::new("published", ColumnType::Boolean))
        .column(ColumnDef::new("meta", ColumnType::Json))
        .delete_date_column("deleted_at")
}

async fn connected(settings: ServiceSettings) -> SqlxAdapter {
    let adapter = SqlxAdapter::new(DataSourceOptions::sqlite_memory());
    adapter.init(posts(), settings).unwrap();
    adapter.connect().await.unwrap();
    adapter
}

async fn seed(adapter: &SqlxAdapter) {
    for (title, votes) in [("alpha", 3), ("beta", 10), ("gamma", 1), ("delta", 7)] {
        adapter
            .insert(record! { "title" => title, "votes" => votes, "slug" => title })
            .await
            .unwrap();
    }
}

fn titles(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r["title"].as_str().unwrap_or_default())
        .collect()
}

// --- Lifecycle ---

#[tokio::test]
async fn test_operations_before_connect_fail() {
    let adapter = SqlxAdapter::new(DataSourceOptions::sqlite_memory());
    adapter.init(posts(), ServiceSettings::default()).unwrap();
    assert!(matches!(adapter.find(None).await, Err(DataError::NotConnected)));
    assert!(matches!(
        adapter.insert(record! { "title" => "x" }).await,
        Err(DataError::NotConnected)
    ));
}

#[tokio::test]
async fn test_connect_requires_init() {
    let adapter = SqlxAdapter::new(DataSourceOptions::sqlite_memory());
    assert!(matches!(adapter.connect().await, Err(DataError::Config(_))));
}

#[tokio::test]
async fn test_invalid_schema_rejected_at_init() {
    let adapter = SqlxAdapter::new(DataSourceOptions::sqlite_memory());
    let no_key = EntitySchema::new("posts").column(ColumnDef::new("title", ColumnType::Text));
    assert!(matches!(
        adapter.init(no_key, ServiceSettings::default()),
        Err(DataError::Config(_))
    ));
    assert!(adapter.schema().is_none());
}

#[tokio::test]
async fn test_soft_delete_without_column_rejected_at_init() {
    let adapter = SqlxAdapter::new(DataSourceOptions::sqlite_memory());
    let schema = EntitySchema::new("tags").column(ColumnDef::primary_generated("id"));
    assert!(matches!(
        adapter.init(schema, ServiceSettings::soft_delete()),
        Err(DataError::Config(_))
    ));
}

#[tokio::test]
async fn test_second_init_rejected() {
    let adapter = SqlxAdapter::new(DataSourceOptions::sqlite_memory());
    adapter.init(posts(), ServiceSettings::default()).unwrap();
    assert!(matches!(
        adapter.init(posts(), ServiceSettings::default()),
        Err(DataError::Config(_))
    ));
}

#[tokio::test]
async fn test_connect_twice_and_disconnect() {
    let adapter = connected(ServiceSettings::default()).await;
    assert!(adapter.is_connected().await);
    assert!(matches!(adapter.connect().await, Err(DataError::AlreadyConnected)));

    adapter.disconnect().await.unwrap();
    assert!(!adapter.is_connected().await);
    assert!(matches!(adapter.count(None).await, Err(DataError::NotConnected)));

    // Disconnecting again is a no-op.
    adapter.disconnect().await.unwrap();
}

// --- Reads ---

#[tokio::test]
async fn test_insert_then_find_by_id() {
    let adapter = connected(ServiceSettings::default()).await;
    let saved = adapter
        .insert(record! { "title" => "hello", "votes" => 0, "published" => true })
        .await
        .unwrap();

    assert_eq!(saved["id"], json!(1));
    assert_eq!(saved["published"], json!(true));
    assert_eq!(saved["deleted_at"], Value::Null);

    let found = adapter.find_by_id(saved["id"].clone()).await.unwrap();
    assert_eq!(found, Some(saved));
}

#[tokio::test]
async fn test_boolean_column_reads_back() {
    let adapter = connected(ServiceSettings::default()).await;
    adapter
        .insert(record! { "title" => "on", "published" => true })
        .await
        .unwrap();
    adapter
        .insert(record! { "title" => "off", "published" => false })
        .await
        .unwrap();

    let on = adapter.find_by_id(json!(1)).await.unwrap().unwrap();
    let off = adapter.find_by_id(json!(2)).await.unwrap().unwrap();
    assert_eq!(on["published"], json!(true));
    assert_eq!(off["published"], json!(false));

    let drafts = FindParams::new().query(Filter::new().eq("published", false));
    assert_eq!(titles(&adapter.find(Some(&drafts)).await.unwrap()), vec!["off"]);
}

#[tokio::test]
async fn test_create_is_insert() {
    let adapter = connected(ServiceSettings::default()).await;
    let saved = adapter.create(record! { "title" => "x" }).await.unwrap();
    assert_eq!(adapter.count(None).await.unwrap(), 1);
    assert_eq!(saved["title"], json!("x"));
}

#[tokio::test]
async fn test_find_without_params_equals_empty_params() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    let a = adapter.find(None).await.unwrap();
    let b = adapter.find(Some(&FindParams::default())).await.unwrap();
    assert_eq!(a.len(), 4);
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_find_sorted_and_paged() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    let all = adapter
        .find(Some(&FindParams::new().sort("-votes")))
        .await
        .unwrap();
    assert_eq!(titles(&all), vec!["beta", "delta", "alpha", "gamma"]);

    let page = adapter
        .find(Some(&FindParams::new().sort("-votes").offset(1i64).limit("2")))
        .await
        .unwrap();
    assert_eq!(titles(&page), vec!["delta", "alpha"]);

    let tail = adapter
        .find(Some(&FindParams::new().sort("title").offset(2i64)))
        .await
        .unwrap();
    assert_eq!(titles(&tail), vec!["delta", "gamma"]);
}

#[tokio::test]
async fn test_invalid_paging_is_ignored() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    let params: FindParams =
        serde_json::from_value(json!({"offset": -3, "limit": "abc"})).unwrap();
    assert_eq!(adapter.find(Some(&params)).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_sort_shapes_agree() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;
    adapter
        .insert(record! { "title" => "alpha", "votes" => 5 })
        .await
        .unwrap();

    let specs: Vec<SortSpec> = vec![
        "title,-votes".into(),
        vec!["title", "-votes"].into(),
        serde_json::from_value(json!({"title": "ASC", "votes": "DESC"})).unwrap(),
    ];
    let mut results = Vec::new();
    for spec in specs {
        let found = adapter.find(Some(&FindParams::new().sort(spec))).await.unwrap();
        results.push(
            found
                .iter()
                .map(|r| (r["title"].clone(), r["votes"].clone()))
                .collect::<Vec<_>>(),
        );
    }
    assert_eq!(results[0][0], (json!("alpha"), json!(5)));
    assert_eq!(results[0][1], (json!("alpha"), json!(3)));
    assert_eq!(results[0], results[1]);
    assert_eq!(results[1], results[2]);
}

#[tokio::test]
async fn test_filter_operators() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    let params: FindParams = serde_json::from_value(json!({
        "query": {"votes": {"$gte": 3}, "title": {"$like": "%a"}},
        "sort": "votes"
    }))
    .unwrap();
    let found = adapter.find(Some(&params)).await.unwrap();
    assert_eq!(titles(&found), vec!["alpha", "delta", "beta"]);
}

#[tokio::test]
async fn test_unknown_filter_column_is_invalid_query() {
    let adapter = connected(ServiceSettings::default()).await;
    let params = FindParams::new().query(Filter::new().eq("nope", 1));
    assert!(matches!(
        adapter.find(Some(&params)).await,
        Err(DataError::InvalidQuery(_))
    ));
    let params = FindParams::new().sort("-nope");
    assert!(matches!(
        adapter.find(Some(&params)).await,
        Err(DataError::InvalidQuery(_))
    ));
}

#[tokio::test]
async fn test_count_ignores_paging() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    let params = FindParams::new()
        .query(Filter::new().with("votes", Condition::Gt(json!(2))))
        .limit(1i64)
        .offset(1i64);
    assert_eq!(adapter.count(Some(&params)).await.unwrap(), 3);
    assert_eq!(adapter.count(None).await.unwrap(), 4);
}

#[tokio::test]
async fn test_find_one() {
    let adapter = connected(ServiceSettings::default()).await;
    assert_eq!(adapter.find_one(None).await.unwrap(), None);

    seed(&adapter).await;
    let top = adapter
        .find_one(Some(&FindParams::new().sort("-votes")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(top["title"], json!("beta"));
}

#[tokio::test]
async fn test_find_by_ids() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    let mut found = adapter
        .find_by_ids(&[json!(1), json!("3"), json!(99)])
        .await
        .unwrap();
    found.sort_by_key(|r| r["id"].as_i64());
    assert_eq!(titles(&found), vec!["alpha", "gamma"]);
    assert!(adapter.find_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_id_is_none() {
    let adapter = connected(ServiceSettings::default()).await;
    assert_eq!(adapter.find_by_id(json!(42)).await.unwrap(), None);
}

#[tokio::test]
async fn test_relations_are_accepted_and_ignored() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;
    let found = adapter
        .find(Some(&FindParams::new().relations(["author"])))
        .await
        .unwrap();
    assert_eq!(found.len(), 4);
}

#[tokio::test]
async fn test_json_column_round_trip() {
    let adapter = connected(ServiceSettings::default()).await;
    let saved = adapter
        .insert(record! { "title" => "j", "meta" => json!({"tags": ["a", "b"]}) })
        .await
        .unwrap();
    assert_eq!(saved["meta"], json!({"tags": ["a", "b"]}));
}

// --- Writes ---

#[tokio::test]
async fn test_insert_many_all_succeed() {
    let adapter = connected(ServiceSettings::default()).await;
    let saved = adapter
        .insert_many(vec![
            record! { "title" => "a" },
            record! { "title" => "b" },
            record! { "title" => "c" },
        ])
        .await
        .unwrap();
    assert_eq!(saved.len(), 3);
    assert_eq!(adapter.count(None).await.unwrap(), 3);
}

#[tokio::test]
async fn test_insert_many_reports_partial_failure() {
    let adapter = connected(ServiceSettings::default()).await;
    let err = adapter
        .insert_many(vec![
            record! { "title" => "a", "slug" => "same" },
            record! { "title" => "b", "slug" => "same" },
        ])
        .await
        .unwrap_err();

    match err {
        DataError::PartialInsert { inserted, failures } => {
            assert_eq!(inserted.len(), 1);
            assert_eq!(failures.len(), 1);
            assert!(matches!(failures[0].1, DataError::Database(_)));
        }
        other => panic!("expected PartialInsert, got {other:?}"),
    }
    // No rollback of the successful insert.
    assert_eq!(adapter.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_sequential_insert_stops_at_first_failure() {
    let adapter = connected(ServiceSettings::default()).await;
    let err = adapter
        .insert_many_with(
            vec![
                record! { "title" => "a", "slug" => "same" },
                record! { "title" => "b", "slug" => "same" },
                record! { "title" => "c" },
            ],
            InsertMode::Sequential,
        )
        .await
        .unwrap_err();

    let DataError::PartialInsert { inserted, failures } = err else {
        panic!("expected PartialInsert");
    };
    assert_eq!(inserted.len(), 1);
    assert_eq!(failures[0].0, 1);
    assert_eq!(adapter.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_many() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    let result = adapter
        .update_many(
            &Filter::new().with("votes", Condition::Lt(json!(5))),
            record! { "published" => true },
        )
        .await
        .unwrap();
    assert_eq!(result.affected, 2);

    let published = FindParams::new().query(Filter::new().eq("published", true));
    assert_eq!(adapter.count(Some(&published)).await.unwrap(), 2);
}

#[tokio::test]
async fn test_update_many_rejects_empty_filter_or_patch() {
    let adapter = connected(ServiceSettings::default()).await;
    assert!(matches!(
        adapter.update_many(&Filter::new(), record! { "votes" => 1 }).await,
        Err(DataError::InvalidQuery(_))
    ));
    assert!(matches!(
        adapter.update_many(&Filter::new().eq("id", 1), Record::new()).await,
        Err(DataError::InvalidQuery(_))
    ));
}

#[tokio::test]
async fn test_update_by_id_applies_patch() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    let updated = adapter
        .update_by_id(json!(1), UpdatePatch::default().field("votes", 5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated["votes"], json!(5));
    assert_eq!(updated["title"], json!("alpha"));

    let stored = adapter.find_by_id(json!(1)).await.unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn test_update_by_id_rejects_unknown_column() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    let err = adapter
        .update_by_id(json!(1), UpdatePatch::default().field("vots", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::InvalidQuery(_)), "{err}");

    let stored = adapter.find_by_id(json!(1)).await.unwrap().unwrap();
    assert_eq!(stored["votes"], json!(3));
}

#[tokio::test]
async fn test_update_by_id_missing_is_none() {
    let adapter = connected(ServiceSettings::default()).await;
    let patch: UpdatePatch = serde_json::from_value(json!({"$set": {"votes": 5}})).unwrap();
    assert_eq!(adapter.update_by_id(json!(1), patch).await.unwrap(), None);
}

// --- Removal ---

#[tokio::test]
async fn test_hard_remove_by_id() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    assert_eq!(
        adapter.remove_by_id(json!(1)).await.unwrap(),
        Removed { id: json!(1) }
    );
    assert_eq!(adapter.find_by_id(json!(1)).await.unwrap(), None);
    let everything = FindParams::new().with_deleted();
    assert_eq!(adapter.count(Some(&everything)).await.unwrap(), 3);
}

#[tokio::test]
async fn test_remove_by_id_returns_id_even_when_missing() {
    let adapter = connected(ServiceSettings::default()).await;
    assert_eq!(
        adapter.remove_by_id(json!(404)).await.unwrap(),
        Removed { id: json!(404) }
    );
}

#[tokio::test]
async fn test_remove_by_id_with_unstorable_id_resolves() {
    let adapter = connected(ServiceSettings::default()).await;
    seed(&adapter).await;

    assert_eq!(
        adapter.remove_by_id(json!("abc")).await.unwrap(),
        Removed { id: json!("abc") }
    );
    assert_eq!(adapter.count(None).await.unwrap(), 4);
}

#[tokio::test]
async fn test_soft_remove_by_id_keeps_row() {
    let adapter = connected(ServiceSettings::soft_delete()).await;
    seed(&adapter).await;

    adapter.remove_by_id(json!(1)).await.unwrap();

    assert_eq!(adapter.find_by_id(json!(1)).await.unwrap(), None);
    assert_eq!(adapter.count(None).await.unwrap(), 3);
    assert!(!titles(&adapter.find(None).await.unwrap()).contains(&"alpha"));

    let with_deleted = FindParams::new()
        .query(Filter::new().eq("id", 1))
        .with_deleted();
    let rows = adapter.find(Some(&with_deleted)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0]["deleted_at"].is_string());
}

#[tokio::test]
async fn test_soft_remove_many_and_restore() {
    let adapter = connected(ServiceSettings::soft_delete()).await;
    seed(&adapter).await;

    let filter = Filter::new().with("votes", Condition::Gte(json!(7)));
    assert_eq!(adapter.remove_many(&filter).await.unwrap().affected, 2);
    // Already-deleted rows are not stamped again.
    assert_eq!(adapter.remove_many(&filter).await.unwrap().affected, 0);
    assert_eq!(adapter.count(None).await.unwrap(), 2);

    assert_eq!(adapter.restore_by_id(json!(2)).await.unwrap().affected, 1);
    assert_eq!(adapter.restore_by_id(json!(2)).await.unwrap().affected, 0);
    assert_eq!(adapter.count(None).await.unwrap(), 3);
}

#[tokio::test]
async fn test_soft_delete_flag_read_per_call() {
    let adapter = connected(ServiceSettings::soft_delete()).await;
    seed(&adapter).await;

    adapter.set_use_soft_delete(false);
    adapter.remove_by_id(json!(1)).await.unwrap();
    let everything = FindParams::new().with_deleted();
    assert_eq!(adapter.count(Some(&everything)).await.unwrap(), 3);

    adapter.set_use_soft_delete(true);
    adapter.remove_by_id(json!(2)).await.unwrap();
    assert_eq!(adapter.count(Some(&everything)).await.unwrap(), 3);
    assert_eq!(adapter.count(None).await.unwrap(), 2);
}

#[tokio::test]
async fn test_remove_many_requires_filter() {
    let adapter = connected(ServiceSettings::default()).await;
    assert!(matches!(
        adapter.remove_many(&Filter::new()).await,
        Err(DataError::InvalidQuery(_))
    ));
}

#[tokio::test]
async fn test_clear_deletes_everything_even_in_soft_mode() {
    let adapter = connected(ServiceSettings::soft_delete()).await;
    seed(&adapter).await;
    adapter.remove_by_id(json!(1)).await.unwrap();

    assert_eq!(adapter.clear().await.unwrap(), 4);
    let everything = FindParams::new().with_deleted();
    assert_eq!(adapter.count(Some(&everything)).await.unwrap(), 0);
}

// --- Typed entities ---

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Post {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    title: String,
    votes: i64,
}

impl Entity for Post {
    fn schema() -> EntitySchema {
        EntitySchema::new("typed_posts")
            .column(ColumnDef::primary_generated("id"))
            .column(ColumnDef::new("title", ColumnType::Text).not_null())
            .column(ColumnDef::new("votes", ColumnType::Integer).not_null())
    }
}

#[tokio::test]
async fn test_typed_entity_round_trip() {
    let adapter = SqlxAdapter::new(DataSourceOptions::sqlite_memory());
    adapter.init(Post::schema(), ServiceSettings::default()).unwrap();
    adapter.connect().await.unwrap();

    let post = Post {
        id: None,
        title: "typed".into(),
        votes: 2,
    };
    let saved = Post::from_record(adapter.insert(post.to_record().unwrap()).await.unwrap()).unwrap();
    assert_eq!(saved.id, Some(1));

    let found = adapter.find_by_id(json!(1)).await.unwrap().unwrap();
    assert_eq!(Post::from_record(found).unwrap(), saved);
}
