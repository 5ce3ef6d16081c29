// tests/api_tests.rs

use std::sync::Arc;

use blog_api::{config::Config, routes, state::AppState, store::MemoryStore};
use serde_json::{Value, json};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // 1. Test configuration: no database, in-memory store
    let config = Config {
        database_url: None,
        port: 0,
        rust_log: "error".to_string(),
        log_dir: "logs".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
    };

    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        config,
    };

    // 2. Create the router with the app state
    let app = routes::create_router(state);

    // 3. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 4. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn create_user(client: &reqwest::Client, address: &str, username: &str) -> Value {
    let response = client
        .post(format!("{}/users", address))
        .json(&json!({
            "username": username,
            "email": format!("{}@Example.com", username),
            "firstName": "First",
            "lastName": "Last"
        }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn create_blog(client: &reqwest::Client, address: &str, author: &str, title: &str) -> Value {
    let response = client
        .post(format!("{}/blogs", address))
        .json(&json!({
            "title": title,
            "author": author,
            "content": "Some blog content that is long enough"
        }))
        .send()
        .await
        .expect("Failed to create blog");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn add_comment(
    client: &reqwest::Client,
    address: &str,
    blog: &str,
    user: &str,
    note: Option<i64>,
) -> Value {
    let response = client
        .post(format!("{}/blogs/{}/comments", address, blog))
        .json(&json!({ "user": user, "content": "Nice post", "note": note }))
        .send()
        .await
        .expect("Failed to add comment");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id missing").to_string()
}

#[tokio::test]
async fn unknown_path_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn index_returns_banner() {
    let address = spawn_app().await;
    let body: Value = reqwest::get(format!("{}/", address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Blog API - Version REST");
}

#[tokio::test]
async fn create_user_normalizes_email() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let user = create_user(&client, &address, "alice").await;

    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["firstName"], "First");
    assert!(user["createdAt"].is_string());
}

#[tokio::test]
async fn create_user_requires_username_and_email() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/users", address))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Username and email are required");
}

#[tokio::test]
async fn create_user_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(format!("{}/users", address))
        .json(&json!({ "username": "yo", "email": "yo@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Email malformed
    let response = client
        .post(format!("{}/users", address))
        .json(&json!({ "username": "valid_name", "email": "not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    create_user(&client, &address, "alice").await;

    let response = client
        .post(format!("{}/users", address))
        .json(&json!({ "username": "alice", "email": "someone.else@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Username or email already exists");

    let users: Vec<Value> = client
        .get(format!("{}/users", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn update_user_to_taken_email_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    create_user(&client, &address, "alice").await;
    let bob = create_user(&client, &address, "bobby").await;

    let response = client
        .put(format!("{}/users/{}", address, id_of(&bob)))
        .json(&json!({ "email": "ALICE@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .put(format!("{}/users/{}", address, id_of(&bob)))
        .json(&json!({ "firstName": "Robert" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["firstName"], "Robert");
    assert_eq!(updated["username"], "bobby");
}

#[tokio::test]
async fn invalid_ids_are_400_and_missing_ids_are_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    for path in ["blogs/not-an-id", "users/123", "blogs/xyz/comments", "users/abc/blogs"] {
        let response = client
            .get(format!("{}/{}", address, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "GET /{}", path);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Invalid ID format");
    }

    let missing = uuid::Uuid::new_v4();
    for path in [format!("blogs/{}", missing), format!("users/{}", missing)] {
        let response = client
            .get(format!("{}/{}", address, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404, "GET /{}", path);
    }

    let response = client
        .delete(format!("{}/blogs/{}", address, missing))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn create_blog_populates_author() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = create_user(&client, &address, "alice").await;
    let blog = create_blog(&client, &address, &id_of(&alice), "Hello, world").await;

    assert_eq!(blog["title"], "Hello, world");
    assert_eq!(blog["author"]["username"], "alice");
    assert_eq!(blog["author"]["email"], "alice@example.com");
}

#[tokio::test]
async fn create_blog_with_unknown_author_creates_nothing() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/blogs", address))
        .json(&json!({
            "title": "Orphan post",
            "author": uuid::Uuid::new_v4().to_string(),
            "content": "Content that is long enough"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let blogs: Vec<Value> = client
        .get(format!("{}/blogs", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(blogs.is_empty());
}

#[tokio::test]
async fn create_blog_requires_all_fields() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/blogs", address))
        .json(&json!({ "title": "Only a title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Title, author, and content are required");

    // Malformed JSON body
    let response = client
        .post(format!("{}/blogs", address))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn update_blog_changes_only_given_fields() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = create_user(&client, &address, "alice").await;
    let bob = create_user(&client, &address, "bobby").await;
    let blog = create_blog(&client, &address, &id_of(&alice), "Original title").await;

    let response = client
        .put(format!("{}/blogs/{}", address, id_of(&blog)))
        .json(&json!({ "title": "Renamed title", "author": id_of(&bob) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["title"], "Renamed title");
    assert_eq!(updated["author"]["username"], "bobby");
    assert_eq!(updated["content"], blog["content"]);

    let response = client
        .put(format!("{}/blogs/{}", address, id_of(&blog)))
        .json(&json!({ "author": uuid::Uuid::new_v4().to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .put(format!("{}/blogs/{}", address, uuid::Uuid::new_v4()))
        .json(&json!({ "title": "Renamed title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn comments_are_validated_and_populated() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = create_user(&client, &address, "alice").await;
    let blog = create_blog(&client, &address, &id_of(&alice), "Commented post").await;
    let blog_id = id_of(&blog);

    let comment = add_comment(&client, &address, &blog_id, &id_of(&alice), Some(4)).await;
    assert_eq!(comment["note"], 4);
    assert_eq!(comment["user"]["username"], "alice");
    assert!(comment["user"].get("email").is_none());

    for body in [
        json!({ "user": id_of(&alice), "content": "Bad note", "note": 6 }),
        json!({ "user": id_of(&alice), "content": "Bad note", "note": 0 }),
        json!({ "user": id_of(&alice), "content": "Fractional", "note": 2.5 }),
        json!({ "content": "No user" }),
        json!({ "user": uuid::Uuid::new_v4().to_string(), "content": "Ghost" }),
    ] {
        let response = client
            .post(format!("{}/blogs/{}/comments", address, blog_id))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "body {}", body);
    }

    let response = client
        .post(format!("{}/blogs/{}/comments", address, uuid::Uuid::new_v4()))
        .json(&json!({ "user": id_of(&alice), "content": "Lost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let comments: Vec<Value> = client
        .get(format!("{}/blogs/{}/comments", address, blog_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);

    let detail: Value = client
        .get(format!("{}/blogs/{}", address, blog_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["comments"].as_array().unwrap().len(), 1);
    assert_eq!(detail["comments"][0]["user"]["username"], "alice");
}

#[tokio::test]
async fn deleting_a_blog_cascades_to_comments() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = create_user(&client, &address, "alice").await;
    let blog = create_blog(&client, &address, &id_of(&alice), "Doomed post").await;
    let blog_id = id_of(&blog);
    add_comment(&client, &address, &blog_id, &id_of(&alice), None).await;
    add_comment(&client, &address, &blog_id, &id_of(&alice), Some(2)).await;

    let response = client
        .delete(format!("{}/blogs/{}", address, blog_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Blog deleted successfully");
    assert_eq!(body["blog"]["id"], blog_id.as_str());

    let response = client
        .get(format!("{}/blogs/{}/comments", address, blog_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let comments: Vec<Value> = client
        .get(format!("{}/users/{}/comments", address, id_of(&alice)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(comments.is_empty());
}

#[tokio::test]
async fn deleting_a_user_cascades_to_blogs_and_comments() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = create_user(&client, &address, "alice").await;
    let bob = create_user(&client, &address, "bobby").await;

    let b2 = create_blog(&client, &address, &id_of(&alice), "Alice's post").await;
    let b4 = create_blog(&client, &address, &id_of(&bob), "Bob's post").await;
    add_comment(&client, &address, &id_of(&b2), &id_of(&bob), Some(5)).await;
    add_comment(&client, &address, &id_of(&b4), &id_of(&alice), Some(1)).await;
    let kept = add_comment(&client, &address, &id_of(&b4), &id_of(&bob), Some(3)).await;

    let response = client
        .delete(format!("{}/users/{}", address, id_of(&alice)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User deleted successfully");
    assert_eq!(body["user"]["username"], "alice");

    let response = client
        .get(format!("{}/blogs/{}", address, id_of(&b2)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let comments: Vec<Value> = client
        .get(format!("{}/blogs/{}/comments", address, id_of(&b4)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["id"], kept["id"]);

    let bobs_comments: Vec<Value> = client
        .get(format!("{}/users/{}/comments", address, id_of(&bob)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bobs_comments.len(), 1);
}

#[tokio::test]
async fn user_reverse_listings() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = create_user(&client, &address, "alice").await;
    let bob = create_user(&client, &address, "bobby").await;
    let blog = create_blog(&client, &address, &id_of(&alice), "Alice's post").await;
    create_blog(&client, &address, &id_of(&bob), "Bob's post").await;
    add_comment(&client, &address, &id_of(&blog), &id_of(&bob), None).await;

    let blogs: Vec<Value> = client
        .get(format!("{}/users/{}/blogs", address, id_of(&alice)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(blogs.len(), 1);
    assert_eq!(blogs[0]["author"]["username"], "alice");

    let comments: Vec<Value> = client
        .get(format!("{}/users/{}/comments", address, id_of(&bob)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["blog"], blog["id"]);

    let response = client
        .get(format!("{}/users/{}/blogs", address, uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn plain_text_content_is_stored_verbatim() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = create_user(&client, &address, "alice").await;
    let response = client
        .post(format!("{}/blogs", address))
        .json(&json!({
            "title": "Cartoon notes",
            "author": id_of(&alice),
            "content": "Tom & Jerry: 1 < 2, always"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let blog: Value = response.json().await.unwrap();
    assert_eq!(blog["content"], "Tom & Jerry: 1 < 2, always");

    let response = client
        .post(format!("{}/blogs/{}/comments", address, id_of(&blog)))
        .json(&json!({ "user": id_of(&alice), "content": "Tom & Jerry" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let comment: Value = response.json().await.unwrap();
    assert_eq!(comment["content"], "Tom & Jerry");
}

#[tokio::test]
async fn comment_length_is_checked_before_escaping() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = create_user(&client, &address, "alice").await;
    let blog = create_blog(&client, &address, &id_of(&alice), "Ampersands").await;
    let ampersands = "&".repeat(101);

    let response = client
        .post(format!("{}/blogs/{}/comments", address, id_of(&blog)))
        .json(&json!({ "user": id_of(&alice), "content": ampersands }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let comment: Value = response.json().await.unwrap();
    assert_eq!(comment["content"], ampersands.as_str());

    // 501 raw characters still exceed the limit
    let response = client
        .post(format!("{}/blogs/{}/comments", address, id_of(&blog)))
        .json(&json!({ "user": id_of(&alice), "content": "x".repeat(501) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn content_that_sanitizes_to_nothing_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = create_user(&client, &address, "alice").await;
    let blog = create_blog(&client, &address, &id_of(&alice), "Script target").await;

    let response = client
        .post(format!("{}/blogs/{}/comments", address, id_of(&blog)))
        .json(&json!({ "user": id_of(&alice), "content": "<script>alert(1)</script>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Content is empty after sanitization");

    let response = client
        .put(format!("{}/blogs/{}", address, id_of(&blog)))
        .json(&json!({ "content": "<script>alert('long enough')</script>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}
