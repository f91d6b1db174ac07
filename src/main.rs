use axum::{routing::get, routing::patch, routing::post, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, ACCESS_TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = crate::config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting VidTube API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("VIDTUBE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 VidTube API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (token acquisition)
        .merge(auth_public_routes())
        // Protected API behind the JWT gate
        .merge(api_routes());

    // Global middleware
    if config::config().security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    router.layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Every route in here sits behind the JWT verification middleware; handlers
/// can rely on the CurrentUser extension being present.
fn api_routes() -> Router {
    use handlers::protected::{comments, likes, playlists, subscriptions, videos};

    Router::new()
        // Videos
        .route(
            "/api/videos",
            get(videos::videos_list).post(videos::videos_create),
        )
        .route(
            "/api/videos/:video_id",
            get(videos::videos_get)
                .patch(videos::videos_update)
                .delete(videos::videos_delete),
        )
        .route(
            "/api/videos/:video_id/toggle-publish",
            patch(videos::videos_toggle_publish),
        )
        // Comments
        .route(
            "/api/videos/:video_id/comments",
            get(comments::comments_list).post(comments::comments_create),
        )
        .route(
            "/api/comments/:comment_id",
            patch(comments::comments_update).delete(comments::comments_delete),
        )
        // Likes
        .route("/api/likes/toggle/video/:video_id", post(likes::toggle_video_like))
        .route(
            "/api/likes/toggle/comment/:comment_id",
            post(likes::toggle_comment_like),
        )
        .route("/api/likes/videos", get(likes::liked_videos))
        // Playlists
        .route("/api/playlists", post(playlists::playlists_create))
        .route("/api/playlists/user/:user_id", get(playlists::playlists_for_user))
        .route(
            "/api/playlists/:playlist_id",
            get(playlists::playlists_get)
                .patch(playlists::playlists_update)
                .delete(playlists::playlists_delete),
        )
        .route(
            "/api/playlists/:playlist_id/videos/:video_id",
            patch(playlists::playlists_add_video).delete(playlists::playlists_remove_video),
        )
        // Subscriptions
        .route(
            "/api/subscriptions/channel/:channel_id",
            get(subscriptions::channel_subscribers).post(subscriptions::toggle_subscription),
        )
        .route(
            "/api/subscriptions/user/:subscriber_id",
            get(subscriptions::subscribed_channels),
        )
        .layer(axum::middleware::from_fn(middleware::auth::jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "VidTube API",
            "version": version,
            "description": "Video sharing platform backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/register, /auth/login (public - token acquisition)",
                "videos": "/api/videos[/:video_id] (protected)",
                "comments": "/api/videos/:video_id/comments, /api/comments/:comment_id (protected)",
                "likes": "/api/likes/* (protected)",
                "playlists": "/api/playlists[/:playlist_id] (protected)",
                "subscriptions": "/api/subscriptions/* (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
