#![allow(dead_code)]

use async_trait::async_trait;
use plusfeed::config::notification::NotificationConfig;
use plusfeed::services::push::{PushError, PushPayload, PushTransport};
use plusfeed::AppState;
use reqwest::Client;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, Once, OnceLock,
};
use tokio::sync::OnceCell;

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
static RUN_TAG: OnceLock<String> = OnceLock::new();
static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Distinguishes users from earlier runs against a persistent database.
fn run_tag() -> &'static str {
    RUN_TAG.get_or_init(|| uuid::Uuid::new_v4().simple().to_string()[..8].to_string())
}

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = plusfeed::config::jwt::JwtConfig::from_env().unwrap();
        let _ = plusfeed::utils::jwt::init_jwt_config(config);
    });
}

/// Keeps every push instead of calling Expo.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, PushPayload)>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<(String, PushPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send(&self, token: &str, payload: &PushPayload) -> Result<(), PushError> {
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), payload.clone()));
        Ok(())
    }
}

pub struct TestApp {
    pub addr: String,
    pub state: AppState,
    pub push: Arc<RecordingTransport>,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub struct TestUser {
    pub id: String,
    pub name: String,
    pub token: String,
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let push = Arc::new(RecordingTransport::default());
    let state = AppState::in_memory(push.clone(), NotificationConfig::default());
    spawn_with_state(state, push).await
}

/// Connect to `TEST_DATABASE_URL`, migrating once per test binary.
/// `None` when the variable is unset.
pub async fn connect_test_db() -> Option<DatabaseConnection> {
    init_env();

    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let db = Database::connect(url.as_str())
        .await
        .expect("Failed to connect to TEST_DATABASE_URL");
    MIGRATED
        .get_or_init(|| async {
            plusfeed::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
        })
        .await;
    Some(db)
}

/// The app on the Postgres backend, or `None` without `TEST_DATABASE_URL`.
pub async fn spawn_pg_app() -> Option<TestApp> {
    let db = connect_test_db().await?;
    let push = Arc::new(RecordingTransport::default());
    let state = AppState::postgres(db, push.clone(), NotificationConfig::default());
    Some(spawn_with_state(state, push).await)
}

pub async fn spawn_with_state(state: AppState, push: Arc<RecordingTransport>) -> TestApp {
    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(plusfeed::routes::create_routes())
        .layer(axum::extract::Extension(state.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        state,
        push,
        client: Client::new(),
    }
}

/// Log in with a raw OAuth profile and return the response body.
pub async fn login(app: &TestApp, profile: serde_json::Value) -> (u16, serde_json::Value) {
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&profile)
        .send()
        .await
        .expect("Failed to log in");
    let status = resp.status().as_u16();
    let body = resp.json().await.expect("Failed to parse login response");
    (status, body)
}

/// Log in a fresh user with the given language and a device token.
pub async fn create_test_user_with_lang(app: &TestApp, name_prefix: &str, lang: &str) -> TestUser {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let name = format!("{}_{}_{}", name_prefix, run_tag(), counter);
    let id = format!("google-{}", name);

    let (status, body) = login(
        app,
        serde_json::json!({
            "id": id,
            "username": name,
            "email": format!("{}@test.com", name),
            "profile_avatar": format!("https://cdn.test/{}.png", name),
            "push_token": format!("ExponentPushToken[{}]", name),
            "user_lang": lang,
        }),
    )
    .await;

    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to log in user '{}': status={}, body={}", name, status, body);
    }

    let token = body["data"]["token"]
        .as_str()
        .unwrap_or_else(|| panic!("Response missing token for '{}': {}", name, body))
        .to_string();

    TestUser { id, name, token }
}

pub async fn create_test_user(app: &TestApp, name_prefix: &str) -> TestUser {
    create_test_user_with_lang(app, name_prefix, "en").await
}

/// Create a text post and return its id.
pub async fn create_test_post(app: &TestApp, author: &TestUser, body: &str) -> String {
    let resp = app
        .client
        .post(app.url("/posts"))
        .bearer_auth(&author.token)
        .json(&serde_json::json!({ "body": body }))
        .send()
        .await
        .expect("Failed to create post");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create post: status={}, body={}", status, body);
    }

    body["data"]["id"]
        .as_str()
        .expect("Response missing id field")
        .to_string()
}

pub async fn like(app: &TestApp, user: &TestUser, post_id: &str) -> serde_json::Value {
    app.client
        .post(app.url(&format!("/posts/{}/like", post_id)))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

pub async fn comment(
    app: &TestApp,
    user: &TestUser,
    post_id: &str,
    content: &str,
    mentioned: &[&TestUser],
) -> reqwest::Response {
    let mentioned_users: Vec<_> = mentioned
        .iter()
        .map(|u| serde_json::json!({ "user_id": u.id, "user_name": u.name }))
        .collect();

    app.client
        .post(app.url(&format!("/posts/{}/comments", post_id)))
        .bearer_auth(&user.token)
        .json(&serde_json::json!({
            "content": content,
            "mentioned_users": mentioned_users,
        }))
        .send()
        .await
        .unwrap()
}

pub async fn notifications(app: &TestApp, user: &TestUser) -> Vec<serde_json::Value> {
    let body: serde_json::Value = app
        .client
        .get(app.url("/notifications"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["data"]["items"].as_array().cloned().unwrap_or_default()
}
