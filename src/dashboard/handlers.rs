use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use tracing::instrument;

use super::page::DASHBOARD_PATH;
use super::DashboardEvent;
use crate::patients::dto::{PatientForm, SearchQuery};
use crate::state::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route(DASHBOARD_PATH, get(show_dashboard))
        .route("/formulario/nuevo", post(add_patient))
        .route("/formulario/guardar", post(save_patient))
        .route("/formulario/cerrar", post(close_modal))
        .route("/pacientes/:id/editar", post(edit_patient))
        .route("/pacientes/:id/eliminar", post(confirm_delete))
        .route("/eliminar/confirmar", post(delete_patient))
        .route("/eliminar/cancelar", post(close_delete_modal))
        .route("/escape", post(escape))
        .route("/toasts/:id/cerrar", post(dismiss_toast))
}

#[instrument(skip(state))]
pub async fn show_dashboard(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Html<String> {
    let mut dash = state.dashboard.lock().await;
    Html(dash.render(&query.q))
}

/// Runs one event to completion, then sends the browser back to the page.
async fn dispatch(state: &AppState, event: DashboardEvent) -> Redirect {
    state.dashboard.lock().await.handle(event).await;
    Redirect::to(DASHBOARD_PATH)
}

#[instrument(skip(state))]
pub async fn add_patient(State(state): State<AppState>) -> Redirect {
    dispatch(&state, DashboardEvent::AddPatient).await
}

#[instrument(skip(state, form))]
pub async fn save_patient(
    State(state): State<AppState>,
    Form(form): Form<PatientForm>,
) -> Redirect {
    dispatch(&state, DashboardEvent::SubmitForm(form)).await
}

#[instrument(skip(state))]
pub async fn close_modal(State(state): State<AppState>) -> Redirect {
    dispatch(&state, DashboardEvent::CloseModal).await
}

#[instrument(skip(state))]
pub async fn edit_patient(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    dispatch(&state, DashboardEvent::EditPatient(id)).await
}

#[instrument(skip(state))]
pub async fn confirm_delete(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    dispatch(&state, DashboardEvent::ConfirmDelete(id)).await
}

#[instrument(skip(state))]
pub async fn delete_patient(State(state): State<AppState>) -> Redirect {
    dispatch(&state, DashboardEvent::DeletePatient).await
}

#[instrument(skip(state))]
pub async fn close_delete_modal(State(state): State<AppState>) -> Redirect {
    dispatch(&state, DashboardEvent::CloseDeleteModal).await
}

#[instrument(skip(state))]
pub async fn escape(State(state): State<AppState>) -> Redirect {
    dispatch(&state, DashboardEvent::Escape).await
}

#[instrument(skip(state))]
pub async fn dismiss_toast(State(state): State<AppState>, Path(id): Path<u64>) -> Redirect {
    dispatch(&state, DashboardEvent::DismissToast(id)).await
}
