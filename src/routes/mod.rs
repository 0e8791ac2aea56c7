use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use crate::websocket;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        // WebSocket route (auth handled inside the handler via query token)
        .route("/ws", routing::get(websocket::notification::ws_handler))
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(protected)
}

fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new().route("/auth/login", routing::post(handlers::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Everything behind a bearer token.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Users
        .route("/users/{id}", routing::get(handlers::user::get_user))
        .route(
            "/push-token",
            routing::put(handlers::user::update_push_token),
        )
        // Posts
        .route(
            "/posts",
            routing::get(handlers::post::list_posts).post(handlers::post::create_post),
        )
        .route(
            "/posts/{id}",
            routing::get(handlers::post::get_post).delete(handlers::post::delete_post),
        )
        .route("/posts/{id}/like", routing::post(handlers::like::toggle_like))
        // Comments
        .route(
            "/posts/{id}/comments",
            routing::get(handlers::comment::list_comments)
                .post(handlers::comment::create_comment),
        )
        .route(
            "/comments/{id}",
            routing::delete(handlers::comment::delete_comment),
        )
        // Notifications
        .route(
            "/notifications",
            routing::get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            routing::get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/{id}/read",
            routing::put(handlers::notification::mark_read),
        )
        .route(
            "/notifications/{id}",
            routing::delete(handlers::notification::delete_notification),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::warn!(?rule, "Invalid rate limit rule, serving without a limit");
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
