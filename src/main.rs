use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use sereno_api::db::StoreGateway;
use sereno_api::handlers::{protected, public};
use sereno_api::middleware::{jwt_auth_middleware, rate_limit_middleware, RateLimiter};
use sereno_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up MONGO_URI, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = sereno_api::config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting Sereno API in {:?} mode", config.environment);

    let gateway = StoreGateway::connect(&config.store)
        .await
        .unwrap_or_else(|e| panic!("failed to initialize document store handle: {}", e));

    let state = AppState::new(gateway);
    let limiter = RateLimiter::from_config();
    let app = app(state, limiter);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Sereno API server listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .expect("server");
}

fn app(state: AppState, limiter: RateLimiter) -> Router {
    Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/stats", get(public::system::stats))
        // Public auth routes
        .route("/auth/register", post(public::auth::register))
        .route("/auth/login", post(public::auth::login))
        .route("/auth/refresh", post(public::auth::refresh))
        // Public catalog
        .route("/meditations", get(public::meditations::list))
        .route("/meditations/:id", get(public::meditations::detail))
        // Protected API
        .merge(protected_routes())
        // Global middleware
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn protected_routes() -> Router<AppState> {
    use protected::{account, assessments, history, mood};

    Router::new()
        .route(
            "/profile",
            get(account::profile_get).put(account::profile_update),
        )
        .route(
            "/users/:id",
            get(account::user_get).delete(account::user_delete),
        )
        .route("/mood", post(mood::create))
        .route("/mood/weekly-report", get(mood::weekly_report))
        .route("/meditations/history", post(history::create))
        .route("/assessments", post(assessments::create))
        .route("/assessments/history", get(assessments::history))
        .route_layer(axum::middleware::from_fn(jwt_auth_middleware))
}
