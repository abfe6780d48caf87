use serde::Deserialize;

use super::repo_types::{birth_date, Patient, PatientFields};

/// The patient form, field names as posted by the dashboard page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PatientForm {
    /// Hidden field; empty for a new patient.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "telefono", default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "fechaNacimiento", default)]
    pub birth_date: String,
    #[serde(rename = "direccion", default)]
    pub address: String,
    #[serde(rename = "notas", default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    MissingRequired,
    InvalidBirthDate,
}

impl FormError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingRequired => "El nombre y el teléfono son obligatorios",
            Self::InvalidBirthDate => "La fecha de nacimiento no es válida",
        }
    }
}

impl PatientForm {
    pub fn from_patient(p: &Patient) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            phone: p.phone.clone(),
            email: p.email.clone(),
            birth_date: birth_date::format(p.birth_date),
            address: p.address.clone(),
            notes: p.notes.clone(),
        }
    }

    /// The hidden id, `None` when creating.
    pub fn target_id(&self) -> Option<&str> {
        let id = self.id.trim();
        (!id.is_empty()).then_some(id)
    }

    /// Trims every string field and checks the two required ones.
    pub fn to_fields(&self) -> Result<PatientFields, FormError> {
        let fields = PatientFields {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            birth_date: birth_date::parse(&self.birth_date)
                .map_err(|_| FormError::InvalidBirthDate)?,
            address: self.address.trim().to_string(),
            notes: self.notes.trim().to_string(),
        };
        if fields.name.is_empty() || fields.phone.is_empty() {
            return Err(FormError::MissingRequired);
        }
        Ok(fields)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn trims_and_parses() {
        let form = PatientForm {
            name: "  Test User ".into(),
            phone: " +1 555-0100".into(),
            birth_date: "1990-01-31".into(),
            notes: "\tcontrol anual\n".into(),
            ..Default::default()
        };
        let fields = form.to_fields().unwrap();
        assert_eq!(fields.name, "Test User");
        assert_eq!(fields.phone, "+1 555-0100");
        assert_eq!(fields.birth_date, Some(date!(1990 - 01 - 31)));
        assert_eq!(fields.notes, "control anual");
        assert!(form.target_id().is_none());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let form = PatientForm {
            name: "   ".into(),
            phone: "123".into(),
            ..Default::default()
        };
        assert_eq!(form.to_fields(), Err(FormError::MissingRequired));
    }

    #[test]
    fn bad_birth_date_is_rejected() {
        let form = PatientForm {
            name: "A".into(),
            phone: "1".into(),
            birth_date: "31/01/1990".into(),
            ..Default::default()
        };
        assert_eq!(form.to_fields(), Err(FormError::InvalidBirthDate));
    }

    #[tokio::test]
    async fn decodes_urlencoded_body() {
        use axum::extract::{Form, FromRequest};
        use axum::http::Request;

        let body = "id=pat_x&nombre=Ana&telefono=%2B54+11&email=&fechaNacimiento=&direccion=&notas=";
        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(axum::body::Body::from(body))
            .unwrap();
        let Form(form) = Form::<PatientForm>::from_request(req, &()).await.unwrap();
        assert_eq!(form.target_id(), Some("pat_x"));
        assert_eq!(form.phone, "+54 11");
        assert!(form.email.is_empty());
    }
}
