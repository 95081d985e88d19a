use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::db::Database;
use crate::error::MeetError;
use crate::heats::{FinalHeat, HeatEngine, QualifierHeats};
use crate::models::*;
use crate::results::ResultRecorder;

// ============================================================
// Error Handling
// ============================================================

/// Translate a domain error into a status code and message.
///
/// Not-found and precondition errors are returned verbatim so an operator can
/// act on them. Everything else is logged server-side and the client only
/// sees a generic message.
fn error_response(e: MeetError) -> (StatusCode, String) {
    match e {
        MeetError::NotFound(_) => {
            tracing::warn!("Not found: {}", e);
            (StatusCode::NOT_FOUND, e.to_string())
        }
        MeetError::PreconditionFailed(_) => {
            tracing::warn!("Precondition failed: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        _ => {
            tracing::error!("Internal error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

fn not_found(what: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Events
// ============================================================

pub async fn list_events(
    State(db): State<Database>,
) -> Result<Json<Vec<Event>>, (StatusCode, String)> {
    db.get_all_events().map(Json).map_err(error_response)
}

pub async fn create_event(
    State(db): State<Database>,
    Json(input): Json<CreateEventInput>,
) -> Result<(StatusCode, Json<Event>), (StatusCode, String)> {
    db.create_event(input)
        .map(|e| (StatusCode::CREATED, Json(e)))
        .map_err(error_response)
}

pub async fn get_event(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, (StatusCode, String)> {
    db.get_event(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Event"))
}

pub async fn list_event_athletes(
    State(db): State<Database>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<Athlete>>, (StatusCode, String)> {
    db.get_event_athletes(event_id)
        .map(Json)
        .map_err(error_response)
}

pub async fn enroll_athlete(
    State(db): State<Database>,
    Path(event_id): Path<Uuid>,
    Json(input): Json<EnrollAthleteInput>,
) -> Result<(StatusCode, Json<EventEntry>), (StatusCode, String)> {
    db.enroll_athlete(event_id, input)
        .map(|e| (StatusCode::CREATED, Json(e)))
        .map_err(error_response)
}

pub async fn list_event_rounds(
    State(db): State<Database>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<Round>>, (StatusCode, String)> {
    db.get_rounds_by_event(event_id)
        .map(Json)
        .map_err(error_response)
}

pub async fn create_round(
    State(db): State<Database>,
    Path(event_id): Path<Uuid>,
    Json(input): Json<CreateRoundInput>,
) -> Result<(StatusCode, Json<Round>), (StatusCode, String)> {
    db.create_round(event_id, input)
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(error_response)
}

// ============================================================
// Athletes
// ============================================================

pub async fn create_athlete(
    State(db): State<Database>,
    Json(input): Json<CreateAthleteInput>,
) -> Result<(StatusCode, Json<Athlete>), (StatusCode, String)> {
    db.create_athlete(input)
        .map(|a| (StatusCode::CREATED, Json(a)))
        .map_err(error_response)
}

pub async fn get_athlete(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Athlete>, (StatusCode, String)> {
    db.get_athlete(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Athlete"))
}

// ============================================================
// Rounds
// ============================================================

pub async fn get_round(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Round>, (StatusCode, String)> {
    db.get_round(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Round"))
}

pub async fn complete_round(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Round>, (StatusCode, String)> {
    ResultRecorder::new(db)
        .complete_round(id)
        .map(Json)
        .map_err(error_response)
}

pub async fn list_round_heats(
    State(db): State<Database>,
    Path(round_id): Path<Uuid>,
) -> Result<Json<Vec<HeatWithAthletes>>, (StatusCode, String)> {
    db.get_heats_by_round(round_id)
        .map(Json)
        .map_err(error_response)
}

pub async fn get_round_results(
    State(db): State<Database>,
    Path(round_id): Path<Uuid>,
) -> Result<Json<Vec<RoundResultRow>>, (StatusCode, String)> {
    ResultRecorder::new(db)
        .get_results_by_round(round_id)
        .map(Json)
        .map_err(error_response)
}

pub async fn generate_qualifier_heats(
    State(db): State<Database>,
    Path(round_id): Path<Uuid>,
) -> Result<(StatusCode, Json<QualifierHeats>), (StatusCode, String)> {
    HeatEngine::new(db)
        .generate_qualifier_heats(round_id)
        .map(|h| (StatusCode::CREATED, Json(h)))
        .map_err(error_response)
}

pub async fn generate_semifinal_heats(
    State(db): State<Database>,
    Path(round_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Vec<Heat>>), (StatusCode, String)> {
    HeatEngine::new(db)
        .generate_semifinal_heats(round_id)
        .map(|h| (StatusCode::CREATED, Json(h)))
        .map_err(error_response)
}

pub async fn generate_final_heat(
    State(db): State<Database>,
    Path(round_id): Path<Uuid>,
) -> Result<(StatusCode, Json<FinalHeat>), (StatusCode, String)> {
    HeatEngine::new(db)
        .generate_final_heat(round_id)
        .map(|h| (StatusCode::CREATED, Json(h)))
        .map_err(error_response)
}

// ============================================================
// Heats
// ============================================================

pub async fn get_heat(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<HeatWithAthletes>, (StatusCode, String)> {
    db.get_heat(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| not_found("Heat"))
}

pub async fn assign_result(
    State(db): State<Database>,
    Path((heat_id, athlete_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<AssignResultInput>,
) -> Result<Json<ResultView>, (StatusCode, String)> {
    ResultRecorder::new(db)
        .assign_result(athlete_id, heat_id, input)
        .map(Json)
        .map_err(error_response)
}
