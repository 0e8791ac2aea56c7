mod common;

use plusfeed::store::UserDirectory;
use serde_json::{json, Value};

fn profile(id: &str, name: &str, avatar: &str) -> Value {
    json!({
        "id": id,
        "username": name,
        "email": format!("{}@test.com", id),
        "profile_avatar": avatar,
    })
}

#[tokio::test]
async fn first_login_creates_user() {
    let app = common::spawn_app().await;

    let (status, body) = common::login(&app, profile("g-1", "Ann", "a.png")).await;
    assert_eq!(status, 201);
    assert!(body["success"].as_bool().unwrap());
    assert_eq!(body["data"]["user"]["id"], "g-1");
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("push_token").is_none());
    assert!(body["data"]["token"].as_str().unwrap().len() > 20);
}

#[tokio::test]
async fn repeat_login_returns_ok() {
    let app = common::spawn_app().await;
    common::login(&app, profile("g-2", "Ann", "a.png")).await;

    let (status, body) = common::login(&app, profile("g-2", "Ann", "a.png")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["user"]["username"], "Ann");
}

#[tokio::test]
async fn login_rejects_bad_email() {
    let app = common::spawn_app().await;
    let (status, body) = common::login(
        &app,
        json!({ "id": "g-3", "username": "x", "email": "not-an-email" }),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn rename_on_login_updates_posts() {
    let app = common::spawn_app().await;
    let (_, body) = common::login(&app, profile("g-4", "Ann", "a.png")).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let resp: Value = app
        .client
        .post(app.url("/posts"))
        .bearer_auth(&token)
        .json(&json!({ "body": "hello" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let post_id = resp["data"]["id"].as_str().unwrap().to_string();

    common::login(&app, profile("g-4", "Anne", "b.png")).await;

    let post: Value = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(post["data"]["author_name"], "Anne");
    assert_eq!(post["data"]["author_avatar"], "b.png");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/notifications")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/notifications"))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn token_for_unknown_user_rejected() {
    let app = common::spawn_app().await;
    let token = plusfeed::utils::jwt::encode_access_token("nobody").unwrap();

    let resp = app
        .client
        .get(app.url("/posts"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn push_token_update() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "push").await;

    let resp = app
        .client
        .put(app.url("/push-token"))
        .bearer_auth(&user.token)
        .json(&json!({ "push_token": "ExponentPushToken[new]" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let stored = app.state.users.resolve_user(&user.id).await.unwrap();
    assert_eq!(stored.push_token, "ExponentPushToken[new]");

    let resp = app
        .client
        .get(app.url(&format!("/users/{}", user.id)))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], user.name);
}
