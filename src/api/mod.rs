mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Events
        .route("/events", get(handlers::list_events))
        .route("/events", post(handlers::create_event))
        .route("/events/{id}", get(handlers::get_event))
        .route("/events/{id}/athletes", get(handlers::list_event_athletes))
        .route("/events/{id}/athletes", post(handlers::enroll_athlete))
        .route("/events/{id}/rounds", get(handlers::list_event_rounds))
        .route("/events/{id}/rounds", post(handlers::create_round))
        // Athletes
        .route("/athletes", post(handlers::create_athlete))
        .route("/athletes/{id}", get(handlers::get_athlete))
        // Rounds
        .route("/rounds/{id}", get(handlers::get_round))
        .route("/rounds/{id}/complete", post(handlers::complete_round))
        .route("/rounds/{id}/heats", get(handlers::list_round_heats))
        .route("/rounds/{id}/results", get(handlers::get_round_results))
        .route("/rounds/{id}/heats/qualifier", post(handlers::generate_qualifier_heats))
        .route("/rounds/{id}/heats/semifinal", post(handlers::generate_semifinal_heats))
        .route("/rounds/{id}/heats/final", post(handlers::generate_final_heat))
        // Heats
        .route("/heats/{id}", get(handlers::get_heat))
        .route(
            "/heats/{heat_id}/athletes/{athlete_id}/result",
            put(handlers::assign_result),
        )
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
