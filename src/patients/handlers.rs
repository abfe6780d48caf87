use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, instrument};

use super::repo_types::Patient;
use crate::state::AppState;

/// Read-only JSON views of the stored document, used by the detail page.
pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/api/pacientes", get(list_patients))
        .route("/api/pacientes/:id", get(get_patient))
}

#[instrument(skip(state))]
pub async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<Patient>>, (StatusCode, String)> {
    let patients = state.repo.load().await.map_err(|e| {
        error!(error = %e, "list_patients failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(patients.unwrap_or_default()))
}

#[instrument(skip(state))]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, (StatusCode, String)> {
    match state.repo.find(&id).await {
        Ok(Some(patient)) => Ok(Json(patient)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Patient not found".into())),
        Err(e) => {
            error!(error = %e, %id, "get_patient failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
