// routes.rs
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::{header::CONTENT_TYPE, Method};
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/users", get(handlers::get_users).post(handlers::create_user))
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/topics", get(handlers::get_topics).post(handlers::create_topic))
        .route("/polls", get(handlers::get_polls).post(handlers::create_poll))
        .route("/polls/{id}/status", get(handlers::get_poll_status))
        .route("/polls/{id}/result", get(handlers::get_poll_result))
        .route("/votes", post(handlers::create_vote));

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .with_state(state)
}
