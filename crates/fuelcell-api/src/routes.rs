use crate::{handlers, AppState};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origin);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))

        // Analysis
        .route("/api/curve-analysis", post(handlers::curve_analysis))
        .route("/api/ai-analysis", post(handlers::ai_analysis))
        .route("/api/report/segment", post(handlers::segment_report))

        // Predictions
        .route("/api/predict", post(handlers::predict))
        .route(
            "/api/predictions",
            get(handlers::list_predictions).post(handlers::create_prediction),
        )
        .route("/api/predictions/{id}", get(handlers::get_prediction))

        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match HeaderValue::from_str(allowed_origin) {
        Ok(origin) => layer.allow_origin(AllowOrigin::exact(origin)),
        Err(_) => {
            warn!(origin = %allowed_origin, "Ignoring invalid CORS origin");
            layer
        }
    }
}
