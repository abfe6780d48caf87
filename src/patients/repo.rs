use std::sync::Arc;

use serde_json::{Map, Value};
use time::{macros::date, Duration, OffsetDateTime};
use tracing::{debug, info};

use super::repo_types::{Patient, PatientFields};
use super::services::generate_id;
use crate::error::{RegistryError, RegistryResult};
use crate::storage::DocumentStore;

pub const PATIENTS_KEY: &str = "patients";

/// Whole-document persistence of the patient collection under one key.
#[derive(Clone)]
pub struct PatientRepo {
    store: Arc<dyn DocumentStore>,
    key: String,
}

impl PatientRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            key: PATIENTS_KEY.to_string(),
        }
    }

    /// Reads the stored document, or `None` when nothing was ever saved.
    pub async fn load(&self) -> RegistryResult<Option<Vec<Patient>>> {
        let Some(raw) = self.store.get_item(&self.key).await? else {
            return Ok(None);
        };
        let corrupt = |source: serde_json::Error| RegistryError::CorruptDocument {
            key: self.key.clone(),
            source,
        };
        let records: Vec<Map<String, Value>> = serde_json::from_str(&raw).map_err(corrupt)?;
        let patients = records
            .into_iter()
            .map(Patient::from_document)
            .collect::<Result<Vec<_>, _>>()
            .map_err(corrupt)?;
        Ok(Some(patients))
    }

    /// Loads the collection, seeding and persisting the sample patients on
    /// first run.
    pub async fn load_or_seed(&self, now: OffsetDateTime) -> RegistryResult<Vec<Patient>> {
        if let Some(patients) = self.load().await? {
            debug!(count = patients.len(), "patients loaded");
            return Ok(patients);
        }
        let patients = sample_patients(now);
        self.save(&patients).await?;
        info!(count = patients.len(), "empty store seeded with sample patients");
        Ok(patients)
    }

    pub async fn save(&self, patients: &[Patient]) -> RegistryResult<()> {
        let records = patients
            .iter()
            .map(Patient::to_document)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RegistryError::Serialize)?;
        let doc = serde_json::to_string(&records).map_err(RegistryError::Serialize)?;
        self.store.set_item(&self.key, &doc).await
    }

    pub async fn find(&self, id: &str) -> RegistryResult<Option<Patient>> {
        Ok(self
            .load()
            .await?
            .and_then(|patients| patients.into_iter().find(|p| p.id == id)))
    }
}

pub fn sample_patients(now: OffsetDateTime) -> Vec<Patient> {
    let seeds = [
        (
            "María García López",
            "+54 9 11 4567-8901",
            "maria.garcia@email.com",
            date!(1985 - 03 - 15),
            "Av. Corrientes 1234, CABA",
            "Alergia a penicilina",
            30,
        ),
        (
            "Carlos Rodríguez",
            "+54 9 11 2345-6789",
            "carlos.rodriguez@email.com",
            date!(1978 - 07 - 22),
            "Calle Florida 567, CABA",
            "",
            15,
        ),
        (
            "Ana Martínez",
            "+54 9 11 9876-5432",
            "ana.martinez@email.com",
            date!(1992 - 11 - 08),
            "San Martín 890, Palermo",
            "Paciente diabética tipo 2",
            0,
        ),
        (
            "Roberto Fernández",
            "+54 9 11 5555-1234",
            "",
            date!(1965 - 02 - 28),
            "Lavalle 456, Recoleta",
            "Tratamiento de ortodoncia en curso",
            0,
        ),
    ];

    let mut patients: Vec<Patient> = Vec::with_capacity(seeds.len());
    for (name, phone, email, birth, address, notes, days_ago) in seeds {
        let fields = PatientFields {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
            birth_date: Some(birth),
            address: address.into(),
            notes: notes.into(),
        };
        let mut patient = Patient::new(
            generate_id(&patients, now),
            fields,
            now - Duration::days(days_ago),
        );
        // seeded records were never saved through the form
        patient.status = None;
        patients.push(patient);
    }
    patients
}

#[cfg(test)]
mod repo_tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn repo() -> (Arc<MemoryStore>, PatientRepo) {
        let store = Arc::new(MemoryStore::new());
        let repo = PatientRepo::new(store.clone());
        (store, repo)
    }

    #[tokio::test]
    async fn first_load_seeds_four_and_persists() {
        let (store, repo) = repo();
        let now = OffsetDateTime::now_utc();

        let first = repo.load_or_seed(now).await.unwrap();
        assert_eq!(first.len(), 4);
        assert!(store.get_item(PATIENTS_KEY).await.unwrap().is_some());

        let second = repo.load_or_seed(OffsetDateTime::now_utc()).await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn stored_empty_collection_is_not_reseeded() {
        let (store, repo) = repo();
        store.set_item(PATIENTS_KEY, "[]").await.unwrap();
        let patients = repo.load_or_seed(OffsetDateTime::now_utc()).await.unwrap();
        assert!(patients.is_empty());
    }

    #[tokio::test]
    async fn corrupt_document_is_reported() {
        let (store, repo) = repo();
        store.set_item(PATIENTS_KEY, "{not json").await.unwrap();
        let err = repo.load_or_seed(OffsetDateTime::now_utc()).await.unwrap_err();
        assert!(matches!(err, RegistryError::CorruptDocument { .. }));
        assert_eq!(
            store.get_item(PATIENTS_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn record_with_null_text_fields_loads() {
        let (store, repo) = repo();
        store
            .set_item(
                PATIENTS_KEY,
                r#"[{"id":"pat_a","nombre":"A","telefono":"1","email":null,"fechaRegistro":"2024-05-02T10:00:00.000Z"}]"#,
            )
            .await
            .unwrap();
        let patients = repo.load_or_seed(OffsetDateTime::now_utc()).await.unwrap();
        assert_eq!(patients.len(), 1);
        assert!(patients[0].email.is_empty());
    }

    #[tokio::test]
    async fn save_keeps_stored_records_verbatim() {
        let (store, repo) = repo();
        let doc = r#"[{"id":"pat_a","nombre":"A","telefono":"1","email":null,"fechaNacimiento":"","direccion":"","notas":"","estado":"activo","fechaRegistro":"2024-05-02T10:00:00.000Z"}]"#;
        store.set_item(PATIENTS_KEY, doc).await.unwrap();
        let patients = repo.load_or_seed(OffsetDateTime::now_utc()).await.unwrap();
        repo.save(&patients).await.unwrap();
        assert_eq!(store.get_item(PATIENTS_KEY).await.unwrap().as_deref(), Some(doc));
    }

    #[tokio::test]
    async fn find_by_id() {
        let (_, repo) = repo();
        let patients = repo.load_or_seed(OffsetDateTime::now_utc()).await.unwrap();
        let found = repo.find(&patients[2].id).await.unwrap().unwrap();
        assert_eq!(found.name, "Ana Martínez");
        assert!(repo.find("pat_missing").await.unwrap().is_none());
    }

    #[test]
    fn samples_have_unique_ids_and_spread_registration() {
        let now = OffsetDateTime::now_utc();
        let samples = sample_patients(now);
        let mut ids: Vec<_> = samples.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(samples[0].registered_at, now - Duration::days(30));
        assert_eq!(samples[3].registered_at, now);
        assert!(samples[3].email.is_empty());
    }
}
