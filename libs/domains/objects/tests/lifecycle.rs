//! End-to-end lifecycle behavior over stateful in-memory stores.

mod support;

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use domain_objects::{CreateObject, ErrorKind, Principal, Properties};

use support::{DIM, world};

fn article(title: &str) -> CreateObject {
    CreateObject::new("Article")
        .with_property("title", json!(title))
        .with_property("words", json!(120))
}

fn tester() -> Principal {
    Principal::new("tester")
}

#[tokio::test]
async fn created_object_reads_back_with_its_vector_indexed() {
    let w = world();
    let cancel = CancellationToken::new();

    let created = w
        .service
        .create(&cancel, &tester(), article("consistency"))
        .await
        .unwrap();
    assert_eq!(created.vector.len(), DIM);

    let fetched = w
        .service
        .get(&tester(), "Article", created.id)
        .await
        .unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.properties["title"], json!("consistency"));
    assert!(w.vectors.contains("Article", created.id));
}

#[tokio::test]
async fn failed_vector_write_leaves_no_orphaned_record() {
    let w = world();
    let cancel = CancellationToken::new();
    w.vectors.fail_next_put();

    let err = w
        .service
        .create(&cancel, &tester(), article("doomed"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Repo);

    // Compensation removed the connector record, so the object is simply
    // absent rather than half-written.
    assert_eq!(w.connector.len(), 0);
}

#[tokio::test]
async fn delete_removes_both_stores_and_second_delete_is_not_found() {
    let w = world();
    let cancel = CancellationToken::new();

    let created = w
        .service
        .create(&cancel, &tester(), article("ephemeral"))
        .await
        .unwrap();

    w.service
        .delete(&cancel, &tester(), "Article", created.id)
        .await
        .unwrap();
    assert_eq!(w.connector.len(), 0);
    assert!(!w.vectors.contains("Article", created.id));

    let err = w
        .service
        .delete(&cancel, &tester(), "Article", created.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn batch_commits_valid_items_and_reports_the_rest() {
    let w = world();
    let cancel = CancellationToken::new();
    let duplicate = Uuid::new_v4();
    w.service
        .create(&cancel, &tester(), article("occupant").with_id(duplicate))
        .await
        .unwrap();

    let items = vec![
        article("one"),
        CreateObject::new("Article"), // missing required title
        article("two").with_id(duplicate),
        article("three"),
    ];
    let results = w
        .service
        .create_batch(&cancel, &tester(), items)
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert_eq!(
        results[1].result.as_ref().unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        results[2].result.as_ref().unwrap_err().kind(),
        ErrorKind::Conflict
    );
    assert!(results[3].is_ok());
    // The pre-existing occupant plus the two committed items.
    assert_eq!(w.connector.len(), 3);
}

#[tokio::test]
async fn update_rewrites_record_and_embedding() {
    let w = world();
    let cancel = CancellationToken::new();
    let created = w
        .service
        .create(&cancel, &tester(), article("draft"))
        .await
        .unwrap();

    let mut revised = Properties::new();
    revised.insert("title".to_string(), json!("published"));
    let updated = w
        .service
        .update(&cancel, &tester(), "Article", created.id, revised)
        .await
        .unwrap();

    assert_eq!(updated.properties["title"], json!("published"));
    // The embedding tracks the new payload, not the one written at create.
    assert_ne!(updated.vector, created.vector);

    let fetched = w
        .service
        .get(&tester(), "Article", created.id)
        .await
        .unwrap();
    assert_eq!(fetched.properties["title"], json!("published"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_serialize_on_the_connector_lock() {
    let w = world();
    let cancel = CancellationToken::new();
    let created = w
        .service
        .create(&cancel, &tester(), article("contended"))
        .await
        .unwrap();
    // Widen the write window so overlapping writers would trip the fake's
    // single-writer assertion if the lock failed to serialize them.
    w.connector.set_write_delay(Duration::from_millis(20));

    let mut tasks = Vec::new();
    for title in ["left", "right"] {
        let service = w.service.clone();
        let cancel = cancel.clone();
        let id = created.id;
        tasks.push(tokio::spawn(async move {
            let mut properties = Properties::new();
            properties.insert("title".to_string(), json!(title));
            service
                .update(&cancel, &tester(), "Article", id, properties)
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let fetched = w
        .service
        .get(&tester(), "Article", created.id)
        .await
        .unwrap();
    let title = fetched.properties["title"].as_str().unwrap();
    assert!(title == "left" || title == "right");
}
