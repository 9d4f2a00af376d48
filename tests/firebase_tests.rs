use eventos::firebase::{AppRegistry, AuthProvider, DocumentStore, FirebaseOptions, User};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tempfile::tempdir;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCS: &str = "/v1/projects/demo-project/databases/(default)/documents";

fn options(server: &MockServer) -> FirebaseOptions {
    FirebaseOptions::new("test-key", "demo-project").with_base_url(&server.uri())
}

fn sign_in_body(uid: &str, email: &str) -> Value {
    json!({
        "localId": uid,
        "email": email,
        "displayName": "",
        "idToken": format!("id-{}", uid),
        "refreshToken": format!("refresh-{}", uid),
        "expiresIn": "3600"
    })
}

async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", "test-key"))
        .and(body_json(json!({
            "email": "ana@example.com",
            "password": "secreto",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sign_in_body("u1", "ana@example.com")))
        .mount(server)
        .await;
}

#[test]
fn test_initialize_app_is_idempotent() {
    let registry = AppRegistry::new();
    let options = FirebaseOptions::new("test-key", "demo-project");

    let first = registry.initialize_app(options.clone()).unwrap();
    let second = registry.initialize_app(options).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.get_apps().len(), 1);
    assert!(Arc::ptr_eq(&first.auth(), &second.auth()));
}

#[test]
fn test_reinitialize_with_other_options_keeps_first_app() {
    let registry = AppRegistry::new();
    let first = registry
        .initialize_app(FirebaseOptions::new("key-a", "project-a"))
        .unwrap();
    let second = registry
        .initialize_app(FirebaseOptions::new("key-b", "project-b"))
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.options().project_id, "project-a");
}

#[test]
fn test_named_apps_are_separate() {
    let registry = AppRegistry::new();
    let options = FirebaseOptions::new("test-key", "demo-project");

    let default = registry.initialize_app(options.clone()).unwrap();
    let admin = registry.initialize_named_app("admin", options).unwrap();

    assert!(!Arc::ptr_eq(&default, &admin));
    assert_eq!(registry.get_apps().len(), 2);
    assert!(registry.get_app("admin").is_some());
    assert!(registry.get_app("other").is_none());
}

#[tokio::test]
async fn test_get_document_decodes_typed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/events/evt-1", DOCS)))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo-project/databases/(default)/documents/events/evt-1",
            "fields": {
                "title": { "stringValue": "Feria" },
                "attendees": { "arrayValue": { "values": [{ "stringValue": "u2" }] } },
                "capacity": { "integerValue": "40" }
            },
            "createTime": "2024-05-01T10:00:00Z",
            "updateTime": "2024-05-02T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let app = AppRegistry::new().initialize_app(options(&server)).unwrap();
    let document = app
        .firestore()
        .get_document("events", "evt-1")
        .await
        .unwrap()
        .expect("document exists");

    assert_eq!(document.id, "evt-1");
    assert_eq!(document.fields["title"], json!("Feria"));
    assert_eq!(document.fields["attendees"], json!(["u2"]));
    assert_eq!(document.fields["capacity"], json!(40));
    assert_eq!(document.update_time.as_deref(), Some("2024-05-02T10:00:00Z"));
}

#[tokio::test]
async fn test_missing_document_is_none_and_errors_are_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/events/missing", DOCS)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/events/locked", DOCS)))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let app = AppRegistry::new().initialize_app(options(&server)).unwrap();
    let store = app.firestore();

    assert!(store.get_document("events", "missing").await.unwrap().is_none());

    let error = store.get_document("events", "locked").await.unwrap_err();
    assert!(error.to_string().contains("Missing or insufficient permissions."));
}

#[tokio::test]
async fn test_delete_document() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/events/evt-1", DOCS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let app = AppRegistry::new().initialize_app(options(&server)).unwrap();
    app.firestore().delete_document("events", "evt-1").await.unwrap();
}

#[tokio::test]
async fn test_add_and_update_documents() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/events", DOCS)))
        .and(body_json(json!({
            "fields": {
                "title": { "stringValue": "Feria" },
                "attendees": { "arrayValue": {} }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo-project/databases/(default)/documents/events/generated-id",
            "fields": {}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/events/evt-1", DOCS)))
        .and(query_param("updateMask.fieldPaths", "title"))
        .and(query_param("currentDocument.exists", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo-project/databases/(default)/documents/events/evt-1",
            "fields": { "title": { "stringValue": "Nueva" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = AppRegistry::new().initialize_app(options(&server)).unwrap();
    let store = app.firestore();

    let mut fields = Map::new();
    fields.insert("title".to_string(), json!("Feria"));
    fields.insert("attendees".to_string(), json!([]));
    assert_eq!(store.add_document("events", fields).await.unwrap(), "generated-id");

    let mut update = Map::new();
    update.insert("title".to_string(), json!("Nueva"));
    store.update_document("events", "evt-1", update).await.unwrap();
}

#[tokio::test]
async fn test_list_documents_follows_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/events", DOCS)))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "name": "projects/demo-project/databases/(default)/documents/events/b",
                "fields": { "title": { "stringValue": "B" } }
            }]
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/events", DOCS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "name": "projects/demo-project/databases/(default)/documents/events/a",
                "fields": { "title": { "stringValue": "A" } }
            }],
            "nextPageToken": "page-2"
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let app = AppRegistry::new().initialize_app(options(&server)).unwrap();
    let documents = app.firestore().list_documents("events").await.unwrap();

    let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_sign_in_sends_id_token_to_firestore() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("{}/events/evt-1", DOCS)))
        .and(header("authorization", "Bearer id-u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo-project/databases/(default)/documents/events/evt-1",
            "fields": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = AppRegistry::new().initialize_app(options(&server)).unwrap();
    let auth = app.auth();

    let user = auth
        .sign_in_with_email_and_password("ana@example.com", "secreto")
        .await
        .unwrap();
    assert_eq!(user, User::new("u1").with_email("ana@example.com"));
    assert_eq!(auth.current_user(), Some(user));

    assert!(app
        .firestore()
        .get_document("events", "evt-1")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_rejected_credentials_leave_session_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "INVALID_LOGIN_CREDENTIALS" }
        })))
        .mount(&server)
        .await;

    let app = AppRegistry::new().initialize_app(options(&server)).unwrap();
    let error = app
        .auth()
        .sign_in_with_email_and_password("ana@example.com", "mal")
        .await
        .unwrap_err();

    assert!(error.to_string().contains("INVALID_LOGIN_CREDENTIALS"));
    assert_eq!(app.auth().current_user(), None);
}

#[tokio::test]
async fn test_session_is_persisted_and_restored() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id_token": "id-u1-refreshed",
            "refresh_token": "refresh-u1",
            "expires_in": "3600"
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let session_file = dir.path().join("session.json");

    let first = AppRegistry::new().initialize_app(options(&server)).unwrap();
    first.auth().set_persistence(Some(session_file.clone())).await;
    first
        .auth()
        .sign_in_with_email_and_password("ana@example.com", "secreto")
        .await
        .unwrap();
    assert!(session_file.exists());

    // A fresh process restores the user from the file
    let second = AppRegistry::new().initialize_app(options(&server)).unwrap();
    second.auth().set_persistence(Some(session_file.clone())).await;
    let restored = second.auth().restore_session().await.unwrap();

    assert_eq!(restored.map(|user| user.uid), Some("u1".to_string()));
    assert_eq!(
        second.auth().id_token().await.unwrap().as_deref(),
        Some("id-u1-refreshed")
    );

    second.auth().sign_out().await.unwrap();
    assert!(!session_file.exists());
    assert_eq!(second.auth().current_user(), None);
}

#[tokio::test]
async fn test_restore_without_session_file_resolves_signed_out() {
    let dir = tempdir().unwrap();
    let app = AppRegistry::new()
        .initialize_app(FirebaseOptions::new("test-key", "demo-project"))
        .unwrap();
    app.auth()
        .set_persistence(Some(dir.path().join("none.json")))
        .await;

    assert_eq!(app.auth().restore_session().await.unwrap(), None);
    assert_eq!(app.auth().current_user(), None);
}
