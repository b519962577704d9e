//! Backend client integration tests
//!
//! Exercises `ApiClient` against a `wiremock` mock server: request shapes,
//! bearer authentication, envelope decoding and error mapping.

mod common;

use std::io::Write;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use finditback::api::{ChatApi, CredentialProvider, ItemKind, NewItem};
use finditback::error::{user_message, FinditbackError};

use common::{client_for, item_json, message_json};

// ---------------------------------------------------------------------------
// Chat endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_or_resume_posts_item_id_with_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/create"))
        .and(header("authorization", "Bearer jwt-1"))
        .and(body_json(json!({"itemId": "42"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "_id": "t1",
                "messages": [message_json("m1", "poster", "Hi, still lost?")]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _creds) = client_for(&server.uri(), Some("jwt-1"));
    let thread = client.create_or_resume("42").await.expect("create");

    assert_eq!(thread.id, "t1");
    assert_eq!(thread.messages.len(), 1);
    assert_eq!(thread.messages[0].sender.id, "poster");
}

#[tokio::test]
async fn test_fetch_thread_returns_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/chat/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "_id": "t1",
                "messages": [
                    message_json("m1", "poster", "first"),
                    message_json("m2", "me", "second")
                ]
            }
        })))
        .mount(&server)
        .await;

    let (client, _creds) = client_for(&server.uri(), Some("jwt"));
    let messages = client.fetch_thread("t1").await.expect("fetch");

    let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
}

#[tokio::test]
async fn test_fetch_thread_without_messages_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/chat/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"_id": "t1"}})))
        .mount(&server)
        .await;

    let (client, _creds) = client_for(&server.uri(), Some("jwt"));
    assert!(client.fetch_thread("t1").await.expect("fetch").is_empty());
}

#[tokio::test]
async fn test_send_message_posts_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/t1/message"))
        .and(body_json(json!({"text": "On my way"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"messages": [message_json("m1", "me", "On my way")]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _creds) = client_for(&server.uri(), Some("jwt"));
    let messages = client.send_message("t1", "On my way").await.expect("send");
    assert_eq!(messages.len(), 1);
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unauthorized_invalidates_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/chat/t1"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})),
        )
        .mount(&server)
        .await;

    let (client, creds) = client_for(&server.uri(), Some("expired"));
    let err = client.fetch_thread("t1").await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FinditbackError>(),
        Some(FinditbackError::Authentication(Some(m))) if m == "Token expired"
    ));
    assert_eq!(creds.bearer_token(), None);
}

#[tokio::test]
async fn test_backend_message_surfaces_to_user() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/create"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Item not found"})),
        )
        .mount(&server)
        .await;

    let (client, _creds) = client_for(&server.uri(), Some("jwt"));
    let err = client.create_or_resume("missing").await.unwrap_err();

    assert_eq!(user_message(&err, "Failed to initialize chat"), "Item not found");
}

#[tokio::test]
async fn test_error_without_body_uses_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/t1/message"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, _creds) = client_for(&server.uri(), Some("jwt"));
    let err = client.send_message("t1", "hello").await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FinditbackError>(),
        Some(FinditbackError::Api { status: 500, message: None })
    ));
    assert_eq!(user_message(&err, "Failed to send message"), "Failed to send message");
}

// ---------------------------------------------------------------------------
// Accounts and listings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_returns_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"username": "alice", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "fresh-token",
            "user": {"_id": "u1", "username": "alice"}
        })))
        .mount(&server)
        .await;

    let (client, _creds) = client_for(&server.uri(), None);
    let response = client.login("alice", "pw").await.expect("login");

    assert_eq!(response.access_token, "fresh-token");
    assert_eq!(response.user.map(|u| u.id), Some("u1".to_string()));
}

#[tokio::test]
async fn test_register_posts_account_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": "pw"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _creds) = client_for(&server.uri(), None);
    client
        .register("bob", "bob@example.com", "pw")
        .await
        .expect("register");
}

#[tokio::test]
async fn test_list_items_filters_by_type_and_fills_kind() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item"))
        .and(query_param("type", "found"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [item_json("42", "Keys", "u9"), item_json("43", "Scarf", "u8")]
        })))
        .mount(&server)
        .await;

    let (client, _creds) = client_for(&server.uri(), Some("jwt"));
    let items = client.list_items(ItemKind::Found).await.expect("items");

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.kind == Some(ItemKind::Found)));
    assert_eq!(items[0].posted_by.as_ref().map(|p| p.id.as_str()), Some("u9"));
}

#[tokio::test]
async fn test_upload_image_sends_multipart_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/image/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"_id": "img-7", "url": "/uploads/img-7.png"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let photo = dir.path().join("photo.png");
    std::fs::File::create(&photo)
        .and_then(|mut f| f.write_all(b"not really a png"))
        .expect("write photo");

    let (client, _creds) = client_for(&server.uri(), Some("jwt"));
    let uploaded = client.upload_image(&photo).await.expect("upload");
    assert_eq!(uploaded.id, "img-7");

    let requests = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"image\""));
    assert!(body.contains("photo.png"));
    assert!(body.contains("not really a png"));
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let (client, _creds) = client_for("http://127.0.0.1:9", Some("jwt"));
    let err = client
        .upload_image(std::path::Path::new("/definitely/not/here.png"))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FinditbackError>(),
        Some(FinditbackError::Io(_))
    ));
}

#[tokio::test]
async fn test_create_item_posts_report() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/item/create"))
        .and(body_json(json!({
            "type": "lost",
            "title": "Wallet",
            "description": "Brown leather",
            "location": "Station",
            "imageId": "img-7",
            "category": "wallet"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"_id": "99"}})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _creds) = client_for(&server.uri(), Some("jwt"));
    client
        .create_item(&NewItem {
            kind: ItemKind::Lost,
            title: "Wallet".to_string(),
            description: "Brown leather".to_string(),
            location: "Station".to_string(),
            image_id: Some("img-7".to_string()),
            category: "wallet".to_string(),
        })
        .await
        .expect("create item");
}
