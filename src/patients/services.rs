use rand::{distributions::Uniform, Rng};
use time::{OffsetDateTime, UtcOffset};

use super::repo_types::Patient;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u128) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// `pat_` + creation millis in base36 + 9 random base36 chars, never one
/// already present in `existing`.
pub fn generate_id(existing: &[Patient], now: OffsetDateTime) -> String {
    let millis = (now.unix_timestamp_nanos() / 1_000_000).max(0) as u128;
    let stamp = to_base36(millis);
    let mut rng = rand::thread_rng();
    let alphabet = Uniform::from(0..BASE36.len());
    loop {
        let suffix: String = (0..9)
            .map(|_| BASE36[rng.sample(&alphabet)] as char)
            .collect();
        let id = format!("pat_{stamp}{suffix}");
        if !existing.iter().any(|p| p.id == id) {
            return id;
        }
    }
}

/// Case-insensitive on name and email, raw substring on phone.
pub fn matches_filter(patient: &Patient, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let needle = filter.to_lowercase();
    patient.name.to_lowercase().contains(&needle)
        || patient.phone.contains(filter)
        || (!patient.email.is_empty() && patient.email.to_lowercase().contains(&needle))
}

pub fn filter_patients<'a>(patients: &'a [Patient], filter: &str) -> Vec<&'a Patient> {
    patients
        .iter()
        .filter(|p| matches_filter(p, filter))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub this_month: usize,
}

impl Stats {
    /// `this_month` counts registrations in the month and year of `now`,
    /// both read in `now`'s offset.
    pub fn compute(patients: &[Patient], now: OffsetDateTime) -> Self {
        let offset = now.offset();
        let this_month = patients
            .iter()
            .filter(|p| {
                let reg = p.registered_at.to_offset(offset);
                reg.month() == now.month() && reg.year() == now.year()
            })
            .count();
        Self {
            total: patients.len(),
            active: patients.iter().filter(|p| p.is_active()).count(),
            this_month,
        }
    }
}

/// Current time in the device's local offset, UTC when it can't be read.
pub fn local_now() -> OffsetDateTime {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patients::repo_types::PatientFields;
    use time::macros::{datetime, offset};

    fn patient(name: &str, phone: &str, email: &str, at: OffsetDateTime) -> Patient {
        Patient::new(
            format!("pat_{name}"),
            PatientFields {
                name: name.into(),
                phone: phone.into(),
                email: email.into(),
                ..Default::default()
            },
            at,
        )
    }

    fn roster() -> Vec<Patient> {
        let at = datetime!(2024-05-10 12:00 UTC);
        vec![
            patient("María García", "+54 9 11 4567-8901", "maria@Email.com", at),
            patient("Carlos Rodríguez", "+54 9 11 2345-6789", "", at),
            patient("Ana Martínez", "555-0100", "ana@clinic.org", at),
        ]
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let all = roster();
        let names: Vec<_> = filter_patients(&all, "")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["María García", "Carlos Rodríguez", "Ana Martínez"]);
    }

    #[test]
    fn name_and_email_match_ignoring_case() {
        let all = roster();
        assert_eq!(filter_patients(&all, "MARÍA").len(), 1);
        assert_eq!(filter_patients(&all, "email.COM")[0].name, "María García");
        assert_eq!(filter_patients(&all, "clinic")[0].name, "Ana Martínez");
    }

    #[test]
    fn phone_matches_raw_substring() {
        let all = roster();
        assert_eq!(filter_patients(&all, "2345")[0].name, "Carlos Rodríguez");
        assert_eq!(filter_patients(&all, "+54").len(), 2);
        assert!(filter_patients(&all, "zzz").is_empty());
    }

    #[test]
    fn every_filtered_record_satisfies_predicate() {
        let all = roster();
        for filter in ["a", "ar", "55", "@", "org", "x"] {
            for p in filter_patients(&all, filter) {
                assert!(matches_filter(p, filter), "{filter} vs {}", p.name);
            }
        }
    }

    #[test]
    fn stats_count_current_month_in_local_offset() {
        let mut all = roster();
        // 2024-05-31 23:30 at UTC-3 is already June in UTC
        all.push(patient(
            "Late",
            "1",
            "",
            datetime!(2024-06-01 02:30 UTC),
        ));
        all.push(patient("Old", "2", "", datetime!(2023-05-15 12:00 UTC)));
        all[0].status = None;

        let now = datetime!(2024-05-20 09:00 -03:00);
        let stats = Stats::compute(&all, now);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.this_month, 4);
        assert_eq!(stats.active, 4);

        let stats_utc = Stats::compute(&all, now.to_offset(offset!(UTC)));
        assert_eq!(stats_utc.this_month, 3);
    }

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let now = datetime!(2024-05-10 12:00 UTC);
        let mut all = roster();
        for _ in 0..50 {
            let id = generate_id(&all, now);
            assert!(id.starts_with("pat_"));
            assert_eq!(id.len(), 4 + to_base36(1_715_342_400_000).len() + 9);
            assert!(all.iter().all(|p| p.id != id));
            all.push(patient(&id, "0", "", now));
            all.last_mut().unwrap().id = id;
        }
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
