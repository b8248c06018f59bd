use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "focus_journal_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database
    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let state = AppState {
        db,
        config: config.clone(),
    };

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/:provider/callback",
            get(handlers::oauth::callback),
        );

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        // Check-ins
        .route(
            "/api/checkins",
            get(handlers::checkins::list_checkins).post(handlers::checkins::create_checkin),
        )
        .route("/api/checkins/today", get(handlers::checkins::checked_in_today))
        .route("/api/checkins/stats", get(handlers::checkins::checkin_stats))
        .route("/api/checkins/history", get(handlers::checkins::checkin_history))
        .route("/api/checkins/streak", get(handlers::checkins::get_streak))
        .route(
            "/api/checkins/:id",
            get(handlers::checkins::get_checkin)
                .put(handlers::checkins::update_checkin)
                .delete(handlers::checkins::delete_checkin),
        )
        // Analytics
        .route(
            "/api/analytics/weekly-summary",
            get(handlers::analytics::weekly_summary),
        )
        .route(
            "/api/analytics/monthly-summary",
            get(handlers::analytics::monthly_summary),
        )
        .route(
            "/api/analytics/tag-summary",
            get(handlers::analytics::tag_summary),
        )
        .route(
            "/api/analytics/compare",
            post(handlers::analytics::compare_periods),
        )
        // Journal
        .route(
            "/api/journal",
            get(handlers::journal::list_entries).post(handlers::journal::create_entry),
        )
        .route("/api/journal/stats", get(handlers::journal::journal_stats))
        .route(
            "/api/journal/sentiment",
            get(handlers::journal::sentiment_trend),
        )
        .route(
            "/api/journal/summary/weekly",
            get(handlers::journal::weekly_overview),
        )
        .route("/api/journal/insights", get(handlers::insights::get_insights))
        .route("/api/journal/tags", get(handlers::insights::journal_tags))
        .route("/api/journal/search", get(handlers::journal::search))
        .route("/api/journal/calendar", get(handlers::journal::calendar))
        .route(
            "/api/journal/:id",
            get(handlers::journal::get_entry)
                .put(handlers::journal::update_entry)
                .delete(handlers::journal::delete_entry),
        )
        // Goals
        .route(
            "/api/goal",
            get(handlers::goals::get_goal).post(handlers::goals::create_or_update_goal),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_url
                .parse::<axum::http::HeaderValue>()
                .expect("FRONTEND_URL must be a valid origin"),
        )
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app)
        .await
        .expect("Server exited with an error");
}
