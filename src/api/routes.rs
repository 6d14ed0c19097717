//! API route definitions.

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.cors_origin);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let api_routes = Router::new()
        .route(
            "/messages",
            get(handlers::list_messages)
                .post(handlers::send_message)
                .delete(handlers::clear_messages)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/sessions",
            get(handlers::list_sessions)
                .post(handlers::create_session)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/sessions/:id",
            get(handlers::get_session)
                .put(handlers::update_session)
                .delete(handlers::delete_session)
                .fallback(handlers::method_not_allowed),
        );

    Router::new()
        .route(
            "/health",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        .nest("/api", api_routes)
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(cors)
        .layer(trace_layer)
}

/// Build the CORS layer for the single configured browser origin.
fn build_cors_layer(origin: &str) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    match origin.parse::<HeaderValue>() {
        Ok(value) => {
            tracing::info!("CORS: Allowing origin {}", origin);
            CorsLayer::new()
                .allow_origin(AllowOrigin::exact(value))
                .allow_methods(methods)
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true)
        }
        Err(_) => {
            tracing::error!("CORS: Invalid origin in config: {}", origin);
            CorsLayer::new().allow_origin(AllowOrigin::exact(HeaderValue::from_static("null")))
        }
    }
}
