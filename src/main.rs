use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use plusfeed::config::{
    self, database::StorageBackend, notification::NotificationConfig, push::PushConfig,
};
use plusfeed::{handlers, migration, routes, services, utils, AppState};
use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        handlers::auth::login,
        // User routes
        handlers::user::get_user,
        handlers::user::update_push_token,
        // Post routes
        handlers::post::list_posts,
        handlers::post::get_post,
        handlers::post::create_post,
        handlers::post::delete_post,
        handlers::like::toggle_like,
        // Comment routes
        handlers::comment::list_comments,
        handlers::comment::create_comment,
        handlers::comment::delete_comment,
        // Notification routes
        handlers::notification::list_notifications,
        handlers::notification::unread_count,
        handlers::notification::mark_read,
        handlers::notification::delete_notification,
    ),
    components(
        schemas(
            plusfeed::response::ApiResponse<serde_json::Value>,
            plusfeed::response::LimitQuery,
            plusfeed::error::AppError,
            plusfeed::models::UserModel,
            plusfeed::models::PostModel,
            plusfeed::models::CommentModel,
            plusfeed::models::comment::MentionedUser,
            plusfeed::models::notification::Actor,
            // Auth
            handlers::auth::LoginRequest,
            handlers::auth::LoginResponse,
            // User
            handlers::user::PushTokenRequest,
            // Post
            handlers::post::CreatePostRequest,
            services::post::PostView,
            services::like::LikeToggle,
            // Comment
            handlers::comment::CreateCommentRequest,
            // Notification
            services::notification::NotificationView,
            handlers::notification::UnreadCountResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "OAuth login"),
        (name = "users", description = "User profile operations"),
        (name = "posts", description = "Post feed operations"),
        (name = "likes", description = "Like operations"),
        (name = "comments", description = "Comment operations"),
        (name = "notifications", description = "Aggregated notification inbox"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    init_tracing();

    // Validate configuration before doing anything else
    let (jwt_config, backend) = validate_config()?;

    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting plusfeed v{}...", env!("CARGO_PKG_VERSION"));

    let push_config = PushConfig::from_env();
    if !push_config.enabled {
        tracing::warn!("PUSH_ENABLED is off, device pushes will be skipped");
    }
    let transport = services::push::transport_from_config(&push_config)?;
    let notification_config = NotificationConfig::from_env();

    let state = match backend {
        StorageBackend::Postgres => {
            let db = config::database::get_database().await?;
            tracing::info!("Database connected successfully");

            migration::Migrator::up(&db, None).await?;
            tracing::info!("Database migrations applied successfully");

            AppState::postgres(db, transport, notification_config)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            AppState::in_memory(transport, notification_config)
        }
    };

    let app = create_app().layer(Extension(state));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "plusfeed=debug,tower_http=debug,axum=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<(config::jwt::JwtConfig, StorageBackend)> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;
    let backend = StorageBackend::from_env()?;

    // DATABASE_URL is checked here for an early error; the connection happens later
    if backend == StorageBackend::Postgres && env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok((jwt_config, backend))
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT_LANGUAGE,
        ]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let db_ok = match &state.db {
        Some(db) => db
            .query_one(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                "SELECT 1".to_string(),
            ))
            .await
            .is_ok(),
        None => true,
    };

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "plusfeed",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": if state.db.is_some() { "postgres" } else { "memory" },
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
