pub mod format;
pub mod handlers;
pub mod modal;
pub mod page;
pub mod toast;
pub mod view;

use std::time::Instant;

use axum::Router;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::patients::dto::PatientForm;
use crate::patients::repo::PatientRepo;
use crate::patients::repo_types::Patient;
use crate::patients::services::{generate_id, local_now};
use crate::state::AppState;
use modal::{DeleteDialog, FormMode, PatientModal};
use toast::{ToastKind, ToastQueue};

const MSG_CREATED: &str = "Paciente agregado correctamente";
const MSG_UPDATED: &str = "Paciente actualizado correctamente";
const MSG_SAVE_FAILED: &str = "No se pudieron guardar los cambios";
const MSG_LOAD_FAILED: &str = "No se pudieron cargar los pacientes guardados";
const MSG_READ_ONLY: &str = "No se guardan cambios hasta poder leer los pacientes guardados";

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::dashboard_routes())
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    AddPatient,
    EditPatient(String),
    SubmitForm(PatientForm),
    /// Close button, cancel button or a click on the overlay.
    CloseModal,
    ConfirmDelete(String),
    DeletePatient,
    CloseDeleteModal,
    /// Closes both dialogs.
    Escape,
    DismissToast(u64),
}

/// The patient dashboard controller. Owns the in-memory collection mirrored
/// to the document store, the two dialogs and the toast stack. Each
/// [`DashboardEvent`] is handled to completion before the next one.
pub struct Dashboard {
    repo: PatientRepo,
    patients: Vec<Patient>,
    /// Set when the stored document could not be read; writes are refused.
    load_failed: bool,
    modal: PatientModal,
    delete: DeleteDialog,
    toasts: ToastQueue,
}

impl Dashboard {
    /// Loads (or seeds) the collection. A document that can't be read
    /// leaves the dashboard empty and read-only so the stored document is
    /// never overwritten.
    pub async fn load(repo: PatientRepo) -> Self {
        let (patients, load_failed) = match repo.load_or_seed(OffsetDateTime::now_utc()).await {
            Ok(patients) => (patients, false),
            Err(e) => {
                error!(error = %e, "loading patients failed");
                (Vec::new(), true)
            }
        };
        Self {
            repo,
            patients,
            load_failed,
            modal: PatientModal::Closed,
            delete: DeleteDialog::Closed,
            toasts: ToastQueue::default(),
        }
    }

    /// The banner shown while the stored document is unreadable.
    pub fn load_error(&self) -> Option<&'static str> {
        self.load_failed.then_some(MSG_LOAD_FAILED)
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn modal(&self) -> &PatientModal {
        &self.modal
    }

    pub fn delete_dialog(&self) -> &DeleteDialog {
        &self.delete
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub async fn handle(&mut self, event: DashboardEvent) {
        debug!(?event, "dashboard event");
        match event {
            DashboardEvent::AddPatient => self.modal = PatientModal::create(),
            DashboardEvent::EditPatient(id) => self.open_edit(&id),
            DashboardEvent::SubmitForm(form) => self.submit(form).await,
            DashboardEvent::CloseModal => self.modal = PatientModal::Closed,
            DashboardEvent::ConfirmDelete(id) => self.open_delete(&id),
            DashboardEvent::DeletePatient => self.delete_pending().await,
            DashboardEvent::CloseDeleteModal => self.delete = DeleteDialog::Closed,
            DashboardEvent::Escape => {
                self.modal = PatientModal::Closed;
                self.delete = DeleteDialog::Closed;
            }
            DashboardEvent::DismissToast(id) => {
                self.toasts.dismiss(id);
            }
        }
    }

    /// Renders the page for `filter`, dropping toasts that finished fading.
    pub fn render(&mut self, filter: &str) -> String {
        self.render_at(filter, Instant::now())
    }

    fn render_at(&mut self, filter: &str, now: Instant) -> String {
        self.toasts.prune(now);
        page::render(self, filter, now, local_now())
    }

    fn open_edit(&mut self, id: &str) {
        let Some(patient) = self.patients.iter().find(|p| p.id == id) else {
            debug!(%id, "edit of unknown patient ignored");
            return;
        };
        self.modal = PatientModal::edit(PatientForm::from_patient(patient));
    }

    fn open_delete(&mut self, id: &str) {
        let Some(patient) = self.patients.iter().find(|p| p.id == id) else {
            debug!(%id, "delete of unknown patient ignored");
            return;
        };
        self.delete = DeleteDialog::Confirming {
            id: patient.id.clone(),
            name: patient.name.clone(),
        };
    }

    async fn submit(&mut self, form: PatientForm) {
        let fields = match form.to_fields() {
            Ok(fields) => fields,
            Err(e) => {
                warn!(reason = e.message(), "patient form rejected");
                self.toast(e.message(), ToastKind::Error);
                let mode = match form.target_id() {
                    Some(id) => FormMode::Edit(id.to_string()),
                    None => FormMode::Create,
                };
                self.modal = PatientModal::Open { mode, form };
                return;
            }
        };

        let mut next = self.patients.clone();
        let message = match form.target_id() {
            Some(id) => {
                let Some(existing) = next.iter_mut().find(|p| p.id == id) else {
                    debug!(%id, "save for unknown patient ignored");
                    self.modal = PatientModal::Closed;
                    return;
                };
                existing.apply(fields);
                MSG_UPDATED
            }
            None => {
                let now = OffsetDateTime::now_utc();
                let id = generate_id(&next, now);
                next.push(Patient::new(id, fields, now));
                MSG_CREATED
            }
        };

        if self.commit(next).await {
            info!(message, total = self.patients.len(), "patient saved");
            self.toast(message, ToastKind::Success);
            self.modal = PatientModal::Closed;
        }
    }

    async fn delete_pending(&mut self) {
        let DeleteDialog::Confirming { id, name } = std::mem::take(&mut self.delete) else {
            return;
        };
        if !self.patients.iter().any(|p| p.id == id) {
            warn!(%id, "patient vanished before delete was confirmed");
            return;
        }
        let next: Vec<Patient> = self
            .patients
            .iter()
            .filter(|p| p.id != id)
            .cloned()
            .collect();
        if self.commit(next).await {
            info!(%id, "patient deleted");
            self.toast(format!("{name} ha sido eliminado"), ToastKind::Success);
        }
    }

    /// Writes `next` as the whole document; memory only follows a
    /// successful write.
    async fn commit(&mut self, next: Vec<Patient>) -> bool {
        if self.load_failed {
            warn!("write refused, stored patients were never read");
            self.toast(MSG_READ_ONLY, ToastKind::Error);
            return false;
        }
        match self.repo.save(&next).await {
            Ok(()) => {
                self.patients = next;
                true
            }
            Err(e) => {
                error!(error = %e, "saving patients failed");
                self.toast(MSG_SAVE_FAILED, ToastKind::Error);
                false
            }
        }
    }

    fn toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toasts.push(message, kind, Instant::now());
    }
}
