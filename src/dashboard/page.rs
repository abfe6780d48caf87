use std::time::Instant;

use time::OffsetDateTime;

use super::format::{format_date, initials};
use super::modal::{DeleteDialog, PatientModal};
use super::toast::{Toast, ToastKind, ToastPhase};
use super::view::{document, el, text, Element, Node};
use super::Dashboard;
use crate::patients::dto::PatientForm;
use crate::patients::repo_types::Patient;
use crate::patients::services::{filter_patients, Stats};

pub const DASHBOARD_PATH: &str = "/pacientes.html";

const ICON_PLUS: &str = r#"<svg viewBox="0 0 24 24" width="16" height="16"><line x1="12" y1="5" x2="12" y2="19"></line><line x1="5" y1="12" x2="19" y2="12"></line></svg>"#;
const ICON_VIEW: &str = r#"<svg viewBox="0 0 24 24" width="16" height="16"><path d="M1 12s4-8 11-8 11 8 11 8-4 8-11 8-11-8-11-8z"></path><circle cx="12" cy="12" r="3"></circle></svg>"#;
const ICON_EDIT: &str = r#"<svg viewBox="0 0 24 24" width="16" height="16"><path d="M11 4H4a2 2 0 0 0-2 2v14a2 2 0 0 0 2 2h14a2 2 0 0 0 2-2v-7"></path><path d="M18.5 2.5a2.121 2.121 0 0 1 3 3L12 15l-4 1 1-4 9.5-9.5z"></path></svg>"#;
const ICON_DELETE: &str = r#"<svg viewBox="0 0 24 24" width="16" height="16" style="stroke: var(--destructive);"><polyline points="3 6 5 6 21 6"></polyline><path d="M19 6v14a2 2 0 0 1-2 2H7a2 2 0 0 1-2-2V6m3 0V4a2 2 0 0 1 2-2h4a2 2 0 0 1 2 2v2"></path></svg>"#;
const ICON_SUCCESS: &str = r#"<svg viewBox="0 0 24 24" width="20" height="20" style="stroke: hsl(142 76% 36%); fill: none; stroke-width: 2;"><path d="M22 11.08V12a10 10 0 1 1-5.93-9.14"></path><polyline points="22 4 12 14.01 9 11.01"></polyline></svg>"#;
const ICON_ERROR: &str = r#"<svg viewBox="0 0 24 24" width="20" height="20" style="stroke: var(--destructive); fill: none; stroke-width: 2;"><circle cx="12" cy="12" r="10"></circle><line x1="15" y1="9" x2="9" y2="15"></line><line x1="9" y1="9" x2="15" y2="15"></line></svg>"#;
const ICON_CLOSE: &str = r#"<svg viewBox="0 0 24 24" width="18" height="18"><line x1="18" y1="6" x2="6" y2="18"></line><line x1="6" y1="6" x2="18" y2="18"></line></svg>"#;

pub fn render(dash: &Dashboard, filter: &str, now: Instant, local_now: OffsetDateTime) -> String {
    let stats = Stats::compute(dash.patients(), local_now);
    let body = el("body")
        .flag("data-modal-open", dash.modal().is_open() || dash.delete_dialog().is_open())
        .child(
            el("main")
                .class("container")
                .child(header())
                .child(stats_cards(stats))
                .child(search(filter))
                .children(match dash.load_error() {
                    Some(message) => vec![load_error(message)],
                    None => patients_section(dash.patients(), filter),
                }),
        )
        .child(patient_modal(dash.modal()))
        .child(delete_modal(dash.delete_dialog()))
        .child(toast_container(dash.toasts().active(now), now))
        .child(
            el("form")
                .id("escapeForm")
                .attr("method", "post")
                .attr("action", "/escape")
                .attr("hidden", "hidden"),
        )
        .child(el("script").attr("src", "/js/pacientes.js"));

    document(
        el("html")
            .attr("lang", "es")
            .child(
                el("head")
                    .child(el("meta").attr("charset", "utf-8"))
                    .child(
                        el("meta")
                            .attr("name", "viewport")
                            .attr("content", "width=device-width, initial-scale=1"),
                    )
                    .child(el("title").text("Pacientes"))
                    .child(
                        el("link")
                            .attr("rel", "stylesheet")
                            .attr("href", "/css/pacientes.css"),
                    ),
            )
            .child(body),
    )
}

fn post_button(action: String, class: &str, title: &str, icon: &'static str) -> Element {
    el("form")
        .class("inline-form")
        .attr("method", "post")
        .attr("action", action)
        .child(
            el("button")
                .attr("type", "submit")
                .class(class)
                .attr("title", title)
                .child(Node::Icon(icon)),
        )
}

fn add_button(id: &'static str, label: &str) -> Element {
    el("form")
        .class("inline-form")
        .attr("method", "post")
        .attr("action", "/formulario/nuevo")
        .child(
            el("button")
                .id(id)
                .attr("type", "submit")
                .class("btn btn-primary")
                .child(Node::Icon(ICON_PLUS))
                .child(text(label)),
        )
}

fn header() -> Element {
    el("header")
        .class("page-header")
        .child(
            el("div")
                .child(el("h1").text("Pacientes"))
                .child(el("p").class("muted").text("Gestión de fichas de pacientes")),
        )
        .child(add_button("addPatientBtn", "Agregar Paciente"))
}

fn stats_cards(stats: Stats) -> Element {
    let card = |id: &'static str, label: &str, value: usize| {
        el("div")
            .class("stat-card")
            .child(el("span").class("stat-label").text(label))
            .child(el("span").id(id).class("stat-value").text(value.to_string()))
    };
    el("section")
        .class("stats")
        .child(card("totalPatients", "Total de pacientes", stats.total))
        .child(card("activePatients", "Pacientes activos", stats.active))
        .child(card("newPatients", "Nuevos este mes", stats.this_month))
}

fn search(filter: &str) -> Element {
    el("form")
        .id("searchForm")
        .class("search")
        .attr("method", "get")
        .attr("action", DASHBOARD_PATH)
        .attr("role", "search")
        .child(
            el("input")
                .id("searchInput")
                .attr("type", "search")
                .attr("name", "q")
                .attr("placeholder", "Buscar por nombre, teléfono o email...")
                .attr("autocomplete", "off")
                .attr("value", filter),
        )
}

/// Either the table or the empty state, never both.
fn patients_section(patients: &[Patient], filter: &str) -> Vec<Element> {
    let visible = filter_patients(patients, filter);
    if visible.is_empty() {
        return vec![empty_state(patients.is_empty())];
    }
    let rows = visible.iter().enumerate().map(|(i, p)| patient_row(i, p));
    vec![el("div").class("table-container").child(
        el("table")
            .child(
                el("thead").child(
                    el("tr")
                        .child(el("th").text("Paciente"))
                        .child(el("th").text("Teléfono"))
                        .child(el("th").text("Email"))
                        .child(el("th").text("Acciones")),
                ),
            )
            .child(el("tbody").id("patientsTableBody").children(rows)),
    )]
}

fn empty_state(collection_empty: bool) -> Element {
    let state = el("div").id("emptyState").class("empty-state");
    if collection_empty {
        state
            .child(el("h3").text("No hay pacientes registrados"))
            .child(el("p").text("Comenzá agregando tu primer paciente."))
            .child(add_button("addPatientEmptyBtn", "Agregar primer paciente"))
    } else {
        state
            .child(el("h3").text("Sin resultados"))
            .child(el("p").text("Ningún paciente coincide con la búsqueda."))
    }
}

/// Shown instead of the table for as long as the stored patients can't be read.
fn load_error(message: &str) -> Element {
    el("div")
        .id("loadError")
        .class("empty-state load-error")
        .attr("role", "alert")
        .child(Node::Icon(ICON_ERROR))
        .child(el("h3").text(message))
        .child(el("p").text("Los cambios están deshabilitados para no perder datos."))
}

/// Percent-encodes an id for a path segment or a query value.
fn encode_id(id: &str) -> String {
    form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn patient_row(index: usize, p: &Patient) -> Element {
    let id = encode_id(&p.id);
    let mut who = el("div").child(el("div").class("patient-name").text(&p.name));
    if let Some(birth) = p.birth_date {
        who = who.child(el("div").class("patient-birth").text(format_date(birth)));
    }
    let email: Node = if p.email.is_empty() {
        el("span").class("muted").text("—").into()
    } else {
        text(&p.email)
    };

    el("tr")
        .attr("style", format!("animation-delay: {:.2}s", index as f64 * 0.05))
        .child(
            el("td").child(
                el("div")
                    .class("patient-cell")
                    .child(el("div").class("avatar avatar-sm").text(initials(&p.name)))
                    .child(who),
            ),
        )
        .child(el("td").text(&p.phone))
        .child(el("td").child(email))
        .child(
            el("td").child(
                el("div")
                    .class("action-buttons")
                    .child(
                        el("a")
                            .class("btn btn-ghost btn-icon btn-sm")
                            .attr("href", format!("ficha.html?id={id}"))
                            .attr("title", "Ver ficha")
                            .child(Node::Icon(ICON_VIEW)),
                    )
                    .child(post_button(
                        format!("/pacientes/{id}/editar"),
                        "btn btn-ghost btn-icon btn-sm",
                        "Editar",
                        ICON_EDIT,
                    ))
                    .child(post_button(
                        format!("/pacientes/{id}/eliminar"),
                        "btn btn-ghost btn-icon btn-sm",
                        "Eliminar",
                        ICON_DELETE,
                    )),
            ),
        )
}

fn overlay(id: &'static str, open: bool, close_action: &'static str) -> Element {
    el("div")
        .id(id)
        .class(if open { "modal-overlay active" } else { "modal-overlay" })
        .attr("data-close-action", close_action)
}

fn field(label: &str, input: Element) -> Element {
    el("label").class("form-field").child(el("span").text(label)).child(input)
}

fn input(name: &'static str, kind: &str, value: &str) -> Element {
    el("input")
        .id(name)
        .attr("name", name)
        .attr("type", kind)
        .attr("value", value)
}

fn patient_modal(modal: &PatientModal) -> Element {
    let empty = PatientForm::default();
    let form = modal.form().unwrap_or(&empty);
    let close = "/formulario/cerrar";

    overlay("patientModal", modal.is_open(), close).child(
        el("div")
            .class("modal")
            .child(
                el("div")
                    .class("modal-header")
                    .child(el("h2").id("modalTitle").text(modal.title()))
                    .child(
                        el("button")
                            .id("closeModal")
                            .class("btn btn-ghost btn-icon")
                            .attr("type", "submit")
                            .attr("form", "patientForm")
                            .attr("formaction", close)
                            .flag("formnovalidate", true)
                            .child(Node::Icon(ICON_CLOSE)),
                    ),
            )
            .child(
                el("form")
                    .id("patientForm")
                    .attr("method", "post")
                    .attr("action", "/formulario/guardar")
                    .child(
                        el("input")
                            .id("patientId")
                            .attr("type", "hidden")
                            .attr("name", "id")
                            .attr("value", form.id.as_str()),
                    )
                    .child(field(
                        "Nombre completo *",
                        input("nombre", "text", &form.name).flag("required", true),
                    ))
                    .child(field(
                        "Teléfono *",
                        input("telefono", "tel", &form.phone).flag("required", true),
                    ))
                    .child(field("Email", input("email", "email", &form.email)))
                    .child(field(
                        "Fecha de nacimiento",
                        input("fechaNacimiento", "date", &form.birth_date),
                    ))
                    .child(field("Dirección", input("direccion", "text", &form.address)))
                    .child(field(
                        "Notas",
                        el("textarea")
                            .id("notas")
                            .attr("name", "notas")
                            .attr("rows", "3")
                            .text(form.notes.as_str()),
                    ))
                    .child(
                        el("div")
                            .class("modal-footer")
                            .child(
                                el("button")
                                    .id("cancelBtn")
                                    .class("btn btn-outline")
                                    .attr("type", "submit")
                                    .attr("formaction", close)
                                    .flag("formnovalidate", true)
                                    .text("Cancelar"),
                            )
                            .child(
                                el("button")
                                    .class("btn btn-primary")
                                    .attr("type", "submit")
                                    .text("Guardar"),
                            ),
                    ),
            ),
    )
}

fn delete_modal(dialog: &DeleteDialog) -> Element {
    let name = match dialog {
        DeleteDialog::Confirming { name, .. } => name.as_str(),
        DeleteDialog::Closed => "",
    };
    let cancel = "/eliminar/cancelar";

    overlay("deleteModal", dialog.is_open(), cancel).child(
        el("div")
            .class("modal modal-sm")
            .child(
                el("div")
                    .class("modal-header")
                    .child(el("h2").text("Eliminar paciente"))
                    .child(post_button(
                        cancel.to_string(),
                        "btn btn-ghost btn-icon",
                        "Cerrar",
                        ICON_CLOSE,
                    )),
            )
            .child(
                el("p")
                    .text("¿Seguro que querés eliminar a ")
                    .child(el("strong").id("deletePatientName").text(name))
                    .text("? Esta acción no se puede deshacer."),
            )
            .child(
                el("form")
                    .class("modal-footer")
                    .attr("method", "post")
                    .attr("action", "/eliminar/confirmar")
                    .child(
                        el("button")
                            .id("cancelDeleteBtn")
                            .class("btn btn-outline")
                            .attr("type", "submit")
                            .attr("formaction", cancel)
                            .text("Cancelar"),
                    )
                    .child(
                        el("button")
                            .id("confirmDeleteBtn")
                            .class("btn btn-destructive")
                            .attr("type", "submit")
                            .text("Eliminar"),
                    ),
            ),
    )
}

fn toast_container<'a>(
    toasts: impl Iterator<Item = (&'a Toast, ToastPhase)>,
    now: Instant,
) -> Element {
    el("div")
        .id("toastContainer")
        .class("toast-container")
        .children(toasts.map(|(t, phase)| toast(t, phase, now)))
}

fn toast(t: &Toast, phase: ToastPhase, now: Instant) -> Element {
    let mut class = format!("toast {}", t.kind.css_class());
    if phase == ToastPhase::Removing {
        class.push_str(" removing");
    }
    let icon = match t.kind {
        ToastKind::Success => ICON_SUCCESS,
        ToastKind::Error => ICON_ERROR,
    };
    el("div")
        .class(class)
        .attr("role", "status")
        .attr("data-remaining-ms", t.remaining(now).as_millis().to_string())
        .child(Node::Icon(icon))
        .child(el("span").class("toast-message").text(t.message.as_str()))
        .child(post_button(
            format!("/toasts/{}/cerrar", t.id),
            "toast-close",
            "Cerrar",
            ICON_CLOSE,
        ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::*;
    use crate::dashboard::DashboardEvent;
    use crate::patients::repo::{PatientRepo, PATIENTS_KEY};
    use crate::storage::{DocumentStore, MemoryStore};

    async fn dashboard_with(doc: &str) -> Dashboard {
        let store = Arc::new(MemoryStore::new());
        store.set_item(PATIENTS_KEY, doc).await.unwrap();
        Dashboard::load(PatientRepo::new(store)).await
    }

    fn html(dash: &Dashboard, filter: &str) -> String {
        render(dash, filter, Instant::now(), datetime!(2024-05-20 12:00 UTC))
    }

    const TWO: &str = r#"[
        {"id":"pat_a","nombre":"<img src=x onerror=alert(1)>","telefono":"111","email":"a@b.c",
         "fechaNacimiento":"1985-03-15","direccion":"","notas":"","fechaRegistro":"2024-05-02T10:00:00Z","estado":"activo"},
        {"id":"pat_b","nombre":"Carlos Rodríguez","telefono":"222","email":"",
         "fechaNacimiento":"","direccion":"","notas":"","fechaRegistro":"2023-01-02T10:00:00Z"}
    ]"#;

    #[tokio::test]
    async fn stored_markup_renders_inert() {
        let dash = dashboard_with(TWO).await;
        let page = html(&dash, "");
        assert!(!page.contains("<img src=x"));
        assert!(page.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(page.contains("15 mar 1985"));
    }

    #[tokio::test]
    async fn stats_are_rendered() {
        let dash = dashboard_with(TWO).await;
        let page = html(&dash, "");
        assert!(page.contains(r#"<span id="totalPatients" class="stat-value">2</span>"#));
        assert!(page.contains(r#"<span id="activePatients" class="stat-value">1</span>"#));
        assert!(page.contains(r#"<span id="newPatients" class="stat-value">1</span>"#));
    }

    #[tokio::test]
    async fn filter_hides_non_matching_rows() {
        let dash = dashboard_with(TWO).await;
        let page = html(&dash, "carlos");
        assert!(page.contains("Carlos Rodríguez"));
        assert!(!page.contains("pat_a"));
        assert!(page.contains(r#"value="carlos""#));
    }

    #[tokio::test]
    async fn empty_states_differ() {
        let dash = dashboard_with(TWO).await;
        let page = html(&dash, "nadie");
        assert!(page.contains("Sin resultados"));
        assert!(!page.contains("table-container"));
        assert!(!page.contains("addPatientEmptyBtn"));

        let empty = dashboard_with("[]").await;
        let page = html(&empty, "");
        assert!(page.contains("addPatientEmptyBtn"));
        assert!(!page.contains("patientsTableBody"));
    }

    #[tokio::test]
    async fn edit_modal_is_prefilled_and_active() {
        let mut dash = dashboard_with(TWO).await;
        dash.handle(DashboardEvent::EditPatient("pat_b".into())).await;
        let page = html(&dash, "");
        assert!(page.contains(r#"<div id="patientModal" class="modal-overlay active""#));
        assert!(page.contains(r#"<h2 id="modalTitle">Editar Paciente</h2>"#));
        assert!(page.contains(r#"name="id" value="pat_b""#));
        assert!(page.contains(r#"<div id="deleteModal" class="modal-overlay""#));
    }

    #[tokio::test]
    async fn delete_dialog_names_patient() {
        let mut dash = dashboard_with(TWO).await;
        dash.handle(DashboardEvent::ConfirmDelete("pat_b".into())).await;
        let page = html(&dash, "");
        assert!(page.contains(r#"<strong id="deletePatientName">Carlos Rodríguez</strong>"#));
        assert!(page.contains(r#"<div id="deleteModal" class="modal-overlay active""#));
    }

    #[tokio::test]
    async fn rows_are_staggered() {
        let dash = dashboard_with(TWO).await;
        let page = html(&dash, "");
        assert!(page.contains(r#"style="animation-delay: 0.00s""#));
        assert!(page.contains(r#"style="animation-delay: 0.05s""#));
        assert!(page.contains("ficha.html?id=pat_b"));
    }

    #[tokio::test]
    async fn links_encode_the_id() {
        let dash = dashboard_with(
            r#"[{"id":"pat_1&x=2#f y","nombre":"A","telefono":"1","fechaRegistro":"2024-05-02T10:00:00Z"}]"#,
        )
        .await;
        let page = html(&dash, "");
        assert!(page.contains(r#"href="ficha.html?id=pat_1%26x%3D2%23f%20y""#));
        assert!(page.contains(r#"action="/pacientes/pat_1%26x%3D2%23f%20y/editar""#));
    }

    #[tokio::test]
    async fn unreadable_document_shows_banner_instead_of_table() {
        let dash = dashboard_with("{not json").await;
        let page = html(&dash, "");
        assert!(page.contains(r#"<div id="loadError" class="empty-state load-error" role="alert">"#));
        assert!(!page.contains("addPatientEmptyBtn"));
        assert!(!page.contains("patientsTableBody"));
    }
}
