// Integration tests for `ApiClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskboard_api::models::{
    ListQuery, LoginInput, ProjectInput, Role, TaskInput, TaskQuery, TaskStatus,
};
use taskboard_api::{
    ApiClient, Error, FileUpload, HttpMethod, MemoryTokenStore, Payload, RequestSpec,
    TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup_with(tokens: MemoryTokenStore) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(
        &format!("{}/api", server.uri()),
        &TransportConfig::default(),
        Arc::new(tokens),
    )
    .unwrap();
    (server, client)
}

async fn setup() -> (MockServer, ApiClient) {
    setup_with(MemoryTokenStore::new()).await
}

fn user_json(id: u64, role: &str) -> serde_json::Value {
    json!({ "id": id, "name": "Ada", "email": "ada@example.com", "role": role })
}

fn page_json(data: serde_json::Value, total: u64) -> serde_json::Value {
    json!({
        "data": data,
        "meta": { "current_page": 1, "last_page": 1, "per_page": 10, "total": total, "links": [] },
        "links": { "first": null, "last": null, "prev": null, "next": null }
    })
}

// ── Headers & credentials ───────────────────────────────────────────

#[tokio::test]
async fn test_default_headers_and_bearer() {
    let (server, client) = setup_with(MemoryTokenStore::with_token("tok-123")).await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(header("accept", "application/json"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": user_json(1, "admin") })))
        .expect(1)
        .mount(&server)
        .await;

    let user = client.current_user().await.unwrap().unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_no_bearer_without_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(client.current_user().await.unwrap().is_none());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_returns_token_and_user() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "secret" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": user_json(4, "member"), "token": "abc" })),
        )
        .mount(&server)
        .await;

    let resp = client
        .login(&LoginInput {
            email: "ada@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    assert_eq!(resp.token, "abc");
    assert_eq!(resp.user.id, 4);
    assert!(!resp.user.is_admin());
}

#[tokio::test]
async fn test_validation_failure_keeps_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The email field is required.",
            "errors": { "email": ["The email field is required."] }
        })))
        .mount(&server)
        .await;

    let err = client.login(&LoginInput::default()).await.unwrap_err();
    assert!(err.is_validation());
    let errors = taskboard_api::normalize_errors(err.body());
    assert_eq!(errors["email"].first(), Some("The email field is required."));
}

#[tokio::test]
async fn test_plain_text_error_body_becomes_string() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .mount(&server)
        .await;

    let err = client.logout().await.unwrap_err();
    match &err {
        Error::Status { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body.as_ref(), Some(&json!("Server error")));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ── Projects ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_projects_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .and(query_param("per_page", "10"))
        .and(query_param("page", "2"))
        .and(query_param("search", "alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            json!([{ "id": 9, "title": "Alpha", "description": "",
                     "start_date": "2024-01-01", "end_date": "2024-02-01" }]),
            11,
        )))
        .mount(&server)
        .await;

    let page = client
        .list_projects(&ListQuery {
            page: Some(2),
            per_page: Some(10),
            search: Some("alpha".into()),
        })
        .await
        .unwrap();
    assert_eq!(page.meta.total, 11);
    assert_eq!(page.data[0].id, 9);
}

#[tokio::test]
async fn test_create_and_delete_project() {
    let (server, client) = setup().await;

    let input = ProjectInput {
        title: "A".into(),
        description: "B".into(),
        start_date: "2024-01-01".into(),
        end_date: "2024-01-02".into(),
    };

    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .and(body_json(&input))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": 12, "title": "A", "description": "B",
                      "start_date": "2024-01-01", "end_date": "2024-01-02" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/projects/12"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let project = client.create_project(&input).await.unwrap();
    assert_eq!(project.id, 12);
    client.delete_project(project.id).await.unwrap();
}

#[tokio::test]
async fn test_get_project_unwraps_resource() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 5, "title": "Launch", "start_date": "2024-03-01", "end_date": "2024-04-01" }
        })))
        .mount(&server)
        .await;

    let project = client.get_project(5).await.unwrap();
    assert_eq!(project.title, "Launch");
    assert_eq!(project.description, "");
}

#[tokio::test]
async fn test_delete_missing_project_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/projects/77"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not found." })))
        .mount(&server)
        .await;

    let err = client.delete_project(77).await.unwrap_err();
    assert!(err.is_not_found());
}

// ── Tasks & users ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_tasks_with_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/3/tasks"))
        .and(query_param("status", "done"))
        .and(query_param("assigned_to_id", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            json!([{ "id": 1, "title": "Ship", "status": "done", "project_id": 3,
                     "assigned_to": user_json(5, "member") }]),
            1,
        )))
        .mount(&server)
        .await;

    let query = TaskQuery {
        list: ListQuery::default(),
        status: Some(TaskStatus::Done),
        assigned_to_id: Some(5),
    };
    let page = client.list_tasks(3, &query).await.unwrap();
    assert_eq!(page.data[0].status, TaskStatus::Done);
    assert_eq!(page.data[0].assigned_to.as_ref().unwrap().id, 5);
}

#[tokio::test]
async fn test_update_task_sends_null_assignee() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/projects/3/tasks/8"))
        .and(body_json(json!({ "title": "Ship", "status": "in_progress", "assigned_to_id": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 8, "title": "Ship", "status": "in_progress", "project_id": 3, "assigned_to": null }
        })))
        .mount(&server)
        .await;

    let task = client
        .update_task(
            3,
            8,
            &TaskInput {
                title: "Ship".into(),
                status: TaskStatus::InProgress,
                assigned_to_id: None,
            },
        )
        .await
        .unwrap();
    assert!(task.assigned_to.is_none());
}

#[tokio::test]
async fn test_list_users() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("per_page", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            json!([user_json(1, "admin"), user_json(2, "member")]),
            2,
        )))
        .mount(&server)
        .await;

    let page = client
        .list_users(&ListQuery {
            per_page: Some(1000),
            ..ListQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.data.len(), 2);
}

// ── Raw dispatch ────────────────────────────────────────────────────

#[tokio::test]
async fn test_multipart_upload_reports_progress() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/projects/1/attachments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&vec![b'x'; 40_000]).unwrap();
    let upload = FileUpload::new(file.path(), "text/plain");

    let value = json!({ "title": "notes", "photo": { "file": upload } });
    let payload = Payload::encode(HttpMethod::Post, &value, false);
    assert!(payload.is_multipart());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let spec = RequestSpec::new(HttpMethod::Post, "/projects/1/attachments")
        .payload(payload)
        .on_progress(Arc::new(move |p| sink.lock().unwrap().push(p)));

    let resp = client.send(spec).await.unwrap();
    assert_eq!(resp.status, 201);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"photo[file]\""));
    assert!(body.contains("name=\"title\""));
}

#[tokio::test]
async fn test_missing_upload_file_is_reported() {
    let (_server, client) = setup().await;

    let value = json!({ "doc": { "uri": "/definitely/not/here.bin", "name": "here.bin", "type": "application/octet-stream" } });
    let spec = RequestSpec::new(HttpMethod::Post, "projects")
        .payload(Payload::encode(HttpMethod::Post, &value, false));

    let err = client.send(spec).await.unwrap_err();
    assert!(matches!(err, Error::Upload { .. }));
}
