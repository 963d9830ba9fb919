use serde_json::json;
use taskboard_config::{RemoteConfig, StoreConfig, SummaryConfig, TaskboardConfig};
use taskboard_kanban::{
    Authenticator, BlobStorage, Collection, ColumnCounts, DocumentStore, ImageRef, ImageUpload,
    KanbanError, Query, SummaryRequest, TaskStatus, TextGenerator, UserId,
};
use taskboard_remote::documents::PAGE_SIZE;
use taskboard_remote::{
    ChatCompletionsClient, RemoteAuthenticator, RemoteBlobStorage, RemoteClient,
    RemoteDocumentStore, RemoteServices,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote_config(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        endpoint: server.uri(),
        project_id: "board-project".to_string(),
        api_key: Some("secret".to_string()),
        ..Default::default()
    }
}

fn client(server: &MockServer) -> RemoteClient {
    RemoteClient::new(&remote_config(server)).unwrap()
}

fn document(id: &str, fields: serde_json::Value) -> serde_json::Value {
    let mut doc = fields;
    doc["$id"] = json!(id);
    doc["$createdAt"] = json!("2024-05-01T10:00:00.000+00:00");
    doc["$collectionId"] = json!("tasks");
    doc
}

#[tokio::test]
async fn test_list_documents_sends_headers_and_queries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/databases/taskboard/collections/tasks/documents"))
        .and(header("X-Appwrite-Project", "board-project"))
        .and(header("X-Appwrite-Key", "secret"))
        .and(query_param(
            "queries[]",
            r#"{"method":"equal","attribute":"userId","values":["u1"]}"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "documents": [document("t1", json!({"title": "Plan", "status": "todo", "order": 0, "userId": "u1"}))]
        })))
        .mount(&server)
        .await;

    let store = RemoteDocumentStore::new(client(&server));
    let documents = store
        .list_documents(
            &Collection::new("taskboard", "tasks"),
            &[Query::equal("userId", "u1")],
        )
        .await
        .unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id, "t1");
    assert_eq!(documents[0].data["title"], json!("Plan"));
    assert!(!documents[0].data.contains_key("$collectionId"));
}

#[tokio::test]
async fn test_list_documents_follows_cursor_past_full_page() {
    let server = MockServer::start().await;
    let first_page: Vec<_> = (0..PAGE_SIZE)
        .map(|i| {
            document(
                &format!("t{}", i),
                json!({"title": "Task", "status": "todo", "order": i, "userId": "u1"}),
            )
        })
        .collect();
    let last_id = format!("t{}", PAGE_SIZE - 1);

    Mock::given(method("GET"))
        .and(path("/databases/taskboard/collections/tasks/documents"))
        .and(query_param(
            "queries[]",
            json!({"method": "cursorAfter", "values": [last_id]}).to_string(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": PAGE_SIZE + 1,
            "documents": [document("extra", json!({"title": "Extra", "status": "done", "order": 0, "userId": "u1"}))]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/databases/taskboard/collections/tasks/documents"))
        .and(query_param(
            "queries[]",
            json!({"method": "limit", "values": [PAGE_SIZE]}).to_string(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": PAGE_SIZE + 1,
            "documents": first_page
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let store = RemoteDocumentStore::new(client(&server));
    let documents = store
        .list_documents(&Collection::new("taskboard", "tasks"), &[])
        .await
        .unwrap();

    assert_eq!(documents.len(), PAGE_SIZE + 1);
    assert_eq!(documents[PAGE_SIZE].id, "extra");
}

#[tokio::test]
async fn test_create_document_wraps_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/databases/taskboard/collections/tasks/documents"))
        .and(body_partial_json(json!({
            "documentId": "unique()",
            "data": {"title": "Write docs", "status": "done", "order": 0}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(document(
            "new1",
            json!({"title": "Write docs", "status": "done", "order": 0, "userId": "u1"}),
        )))
        .mount(&server)
        .await;

    let store = RemoteDocumentStore::new(client(&server));
    let data = json!({"title": "Write docs", "status": "done", "order": 0, "userId": "u1"});
    let created = store
        .create_document(
            &Collection::new("taskboard", "tasks"),
            data.as_object().cloned().unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.id, "new1");
}

#[tokio::test]
async fn test_update_failure_becomes_remote_sync() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/databases/taskboard/collections/tasks/documents/t1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "database unavailable"})),
        )
        .mount(&server)
        .await;

    let store = RemoteDocumentStore::new(client(&server));
    let err = store
        .update_document(
            &Collection::new("taskboard", "tasks"),
            "t1",
            json!({"order": 2}).as_object().cloned().unwrap(),
        )
        .await
        .unwrap_err();

    match err {
        KanbanError::RemoteSync { operation, message } => {
            assert_eq!(operation, "update");
            assert!(message.contains("database unavailable"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_missing_document_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/databases/taskboard/collections/tasks/documents/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = RemoteDocumentStore::new(client(&server));
    let err = store
        .delete_document(&Collection::new("taskboard", "tasks"), "gone")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_upload_blob_returns_image_ref() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/buckets/images/files"))
        .and(header("X-Appwrite-Project", "board-project"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"$id": "file9", "bucketId": "images", "name": "cat.png"})),
        )
        .mount(&server)
        .await;

    let storage = RemoteBlobStorage::new(client(&server));
    let image = storage
        .upload_blob(
            "images",
            ImageUpload::new("cat.png", "image/png", vec![1, 2, 3]),
            &UserId::from("u1"),
        )
        .await
        .unwrap();
    assert_eq!(image, ImageRef::new("images", "file9"));

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("unique()"));
    assert!(body.contains(r#"delete("user:u1")"#));
}

#[tokio::test]
async fn test_delete_missing_blob_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/buckets/images/files/f1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "missing"})))
        .mount(&server)
        .await;

    let storage = RemoteBlobStorage::new(client(&server));
    let err = storage
        .delete_blob(&ImageRef::new("images", "f1"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "$id": "u1",
            "name": "Ada",
            "email": "ada@example.com"
        })))
        .mount(&server)
        .await;

    let auth = RemoteAuthenticator::new(client(&server));
    let user = auth.current_user().await.unwrap();
    assert_eq!(user.id, UserId::from("u1"));
    assert_eq!(user.email, "ada@example.com");
}

#[tokio::test]
async fn test_current_user_without_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "missing scope (account)"})),
        )
        .mount(&server)
        .await;

    let auth = RemoteAuthenticator::new(client(&server));
    let err = auth.current_user().await.unwrap_err();
    assert!(matches!(err, KanbanError::Unauthenticated { .. }));
}

fn summary_config(server: &MockServer) -> SummaryConfig {
    SummaryConfig {
        endpoint: server.uri(),
        api_key: Some("sk-test".to_string()),
        ..Default::default()
    }
}

fn summary_request() -> SummaryRequest {
    SummaryRequest {
        todos: ColumnCounts {
            todo: 3,
            inprogress: 1,
            done: 2,
        },
        instructions: "Summarize".to_string(),
    }
}

#[tokio::test]
async fn test_generate_reads_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"n": 1, "model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Three to do."}}]
        })))
        .mount(&server)
        .await;

    let generator = ChatCompletionsClient::new(&summary_config(&server));
    let reply = generator.generate(&summary_request()).await.unwrap();
    assert_eq!(reply, "Three to do.");
}

#[tokio::test]
async fn test_generate_without_choices_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let generator = ChatCompletionsClient::new(&summary_config(&server));
    let err = generator.generate(&summary_request()).await.unwrap_err();
    match err {
        KanbanError::RemoteSync { operation, message } => {
            assert_eq!(operation, "summary");
            assert!(message.contains("no choices"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_services_load_board() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/databases/taskboard/collections/tasks/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "documents": [
                document("b", json!({"title": "B", "status": "todo", "order": 1, "userId": "u1"})),
                document("a", json!({"title": "A", "status": "todo", "order": 0, "userId": "u1"})),
                document("c", json!({"title": "C", "status": "inprogress", "order": 0, "userId": "u1",
                    "image": "{\"bucketId\":\"images\",\"fileId\":\"f1\"}"})),
            ]
        })))
        .mount(&server)
        .await;

    let config = TaskboardConfig {
        remote: remote_config(&server),
        store: StoreConfig::default(),
        summary: summary_config(&server),
    };
    let services = RemoteServices::connect(&config).unwrap();
    let sync = services.sync_adapter(&config);
    let board = sync.load_board(&UserId::from("u1")).await.unwrap();

    let todo: Vec<_> = board
        .column(TaskStatus::Todo)
        .tasks
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(todo, vec!["A", "B"]);
    let started = &board.column(TaskStatus::InProgress).tasks[0];
    assert_eq!(started.image_ref(), Some(&ImageRef::new("images", "f1")));
    assert_eq!(
        sync.image_url(&ImageRef::new("images", "f1")),
        format!(
            "{}/storage/buckets/images/files/f1/view?project=board-project",
            server.uri()
        )
    );
}
