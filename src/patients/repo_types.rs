use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime};

pub const ACTIVE_STATUS: &str = "activo";

/// One patient record, stored under the original document's field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    #[serde(rename = "nombre", deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "telefono", deserialize_with = "nullable")]
    pub phone: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(rename = "fechaNacimiento", default, with = "birth_date")]
    pub birth_date: Option<Date>,
    #[serde(rename = "direccion", default, deserialize_with = "nullable")]
    pub address: String,
    #[serde(rename = "notas", default, deserialize_with = "nullable")]
    pub notes: String,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "fechaRegistro", with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
    /// Keys written by other clients, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// The record exactly as it was read from the document.
    #[serde(skip)]
    stored: Option<Map<String, Value>>,
}

/// The editable part of a patient, as submitted by the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientFields {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub birth_date: Option<Date>,
    pub address: String,
    pub notes: String,
}

impl Patient {
    pub fn new(id: String, fields: PatientFields, registered_at: OffsetDateTime) -> Self {
        let mut patient = Self {
            id,
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            birth_date: None,
            address: String::new(),
            notes: String::new(),
            status: None,
            registered_at,
            extra: Map::new(),
            stored: None,
        };
        patient.apply(fields);
        patient
    }

    /// Reads one element of the stored array, remembering its raw form.
    pub fn from_document(record: Map<String, Value>) -> serde_json::Result<Self> {
        let mut patient: Patient = serde_json::from_value(Value::Object(record.clone()))?;
        patient.stored = Some(record);
        Ok(patient)
    }

    /// The value written back to the document. A record read from the
    /// document keeps its keys, their order and their text; only fields whose
    /// meaning changed are replaced, and keys it lacked are appended.
    pub fn to_document(&self) -> serde_json::Result<Value> {
        let fresh = serde_json::to_value(self)?;
        if let (Some(stored), Value::Object(fields)) = (&self.stored, &fresh) {
            let mut out = stored.clone();
            for (key, value) in fields {
                if !self.same_as_stored(key, out.get(key), value) {
                    out.insert(key.clone(), value.clone());
                }
            }
            return Ok(Value::Object(out));
        }
        Ok(fresh)
    }

    fn same_as_stored(&self, key: &str, old: Option<&Value>, new: &Value) -> bool {
        match old {
            Some(old) if old == new => true,
            Some(Value::String(raw)) if key == "fechaRegistro" => {
                OffsetDateTime::parse(raw, &Rfc3339).is_ok_and(|at| at == self.registered_at)
            }
            None | Some(Value::Null) => new.as_str() == Some(""),
            Some(_) => false,
        }
    }

    /// Overwrites every editable field; id and registration are kept.
    /// The status is reset to active on every save.
    pub fn apply(&mut self, fields: PatientFields) {
        self.name = fields.name;
        self.phone = fields.phone;
        self.email = fields.email;
        self.birth_date = fields.birth_date;
        self.address = fields.address;
        self.notes = fields.notes;
        self.status = Some(ACTIVE_STATUS.to_string());
    }

    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some(ACTIVE_STATUS)
    }
}

impl PartialEq for Patient {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.phone == other.phone
            && self.email == other.email
            && self.birth_date == other.birth_date
            && self.address == other.address
            && self.notes == other.notes
            && self.status == other.status
            && self.registered_at == other.registered_at
            && self.extra == other.extra
    }
}

fn nullable<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

/// `YYYY-MM-DD`, with the empty string standing for "not given".
pub mod birth_date {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    pub const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn parse(s: &str) -> Result<Option<Date>, time::error::Parse> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }
        Date::parse(s, FORMAT).map(Some)
    }

    pub fn format(date: Option<Date>) -> String {
        date.and_then(|d| d.format(FORMAT).ok()).unwrap_or_default()
    }

    pub fn serialize<S: Serializer>(date: &Option<Date>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&format(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Date>, D::Error> {
        let raw = Option::<String>::deserialize(de)?.unwrap_or_default();
        parse(&raw).map_err(D::Error::custom)
    }
}
