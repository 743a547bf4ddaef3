//! Least-loaded doctor assignment.
//!
//! Every patient ends up with at most one doctor. The store's UNIQUE
//! constraint on `doctor_patient_assignment.patient_id` is what guarantees
//! that; the lookups before the insert only narrow the race window. A caller
//! that loses the race gets the winner's doctor back instead of an error, so
//! `assign` is safe to call repeatedly and concurrently for the same patient.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::{DbResult, PortalStore};
use crate::models::{Assignment, Doctor};

/// Result of an assignment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentOutcome {
    /// This call created the assignment.
    Assigned(i64),
    /// The patient already had a doctor, possibly set by a concurrent call.
    AlreadyAssigned(i64),
    /// No doctor with a non-null id exists. The patient stays unassigned.
    NoDoctorAvailable,
    /// The patient id does not exist; nothing was inserted.
    PatientNotFound,
}

impl AssignmentOutcome {
    /// The doctor responsible for the patient after this call, if any.
    pub fn doctor_id(&self) -> Option<i64> {
        match self {
            AssignmentOutcome::Assigned(id) | AssignmentOutcome::AlreadyAssigned(id) => Some(*id),
            AssignmentOutcome::NoDoctorAvailable | AssignmentOutcome::PatientNotFound => None,
        }
    }
}

/// Pick the eligible doctor with the fewest assignments.
///
/// Doctors are considered in ascending `doctor_id` order and the first one at
/// the minimum wins, so ties resolve deterministically.
pub fn select_least_loaded(doctors: &[Doctor], assignments: &[Assignment]) -> Option<i64> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for assignment in assignments {
        *counts.entry(assignment.doctor_id).or_insert(0) += 1;
    }

    let mut eligible: Vec<i64> = doctors.iter().filter_map(|d| d.doctor_id).collect();
    eligible.sort_unstable();
    eligible.dedup();

    eligible
        .into_iter()
        .min_by_key(|id| counts.get(id).copied().unwrap_or(0))
}

/// Assigns patients to doctors.
pub struct DoctorAssignor<'a, S: PortalStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PortalStore + ?Sized> DoctorAssignor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Ensure `patient_id` has a doctor, choosing the least-loaded one if not.
    pub fn assign(&self, patient_id: &str) -> DbResult<AssignmentOutcome> {
        if let Some(existing) = self.store.get_assignment(patient_id)? {
            tracing::debug!(
                patient_id = %patient_id,
                doctor_id = existing.doctor_id,
                "Patient already assigned"
            );
            return Ok(AssignmentOutcome::AlreadyAssigned(existing.doctor_id));
        }

        let doctors = self.store.list_doctors()?;
        if !doctors.iter().any(Doctor::is_eligible) {
            tracing::warn!(
                patient_id = %patient_id,
                doctors = doctors.len(),
                "No doctors available for assignment"
            );
            return Ok(AssignmentOutcome::NoDoctorAvailable);
        }

        let assignments = self.store.list_assignments()?;
        let Some(doctor_id) = select_least_loaded(&doctors, &assignments) else {
            return Ok(AssignmentOutcome::NoDoctorAvailable);
        };

        if !self.store.patient_exists(patient_id)? {
            tracing::error!(
                patient_id = %patient_id,
                "Cannot assign doctor, patient does not exist"
            );
            return Ok(AssignmentOutcome::PatientNotFound);
        }

        // Second look right before the write
        if let Some(existing) = self.store.get_assignment(patient_id)? {
            tracing::info!(
                patient_id = %patient_id,
                doctor_id = existing.doctor_id,
                "Patient assigned concurrently before insert"
            );
            return Ok(AssignmentOutcome::AlreadyAssigned(existing.doctor_id));
        }

        match self
            .store
            .insert_assignment(&Assignment::new(doctor_id, patient_id))
        {
            Ok(()) => {
                tracing::info!(patient_id = %patient_id, doctor_id, "Assigned doctor to patient");
                Ok(AssignmentOutcome::Assigned(doctor_id))
            }
            Err(e) if e.is_unique_violation() => {
                tracing::info!(
                    patient_id = %patient_id,
                    error = %e,
                    "Lost assignment race, reading winner"
                );
                match self.store.get_assignment(patient_id)? {
                    Some(winner) => Ok(AssignmentOutcome::AlreadyAssigned(winner.doctor_id)),
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DbError};
    use crate::models::{NewDoctor, NewPatient, Patient};

    fn doctor(doctor_id: Option<i64>) -> Doctor {
        Doctor {
            id: doctor_id.unwrap_or(0),
            doctor_id,
            first_name: "Doc".into(),
            last_name: format!("{:?}", doctor_id),
            specialty: None,
        }
    }

    fn setup_db(doctor_ids: &[Option<i64>], patient_ids: &[&str]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for id in doctor_ids {
            db.insert_doctor(&NewDoctor::new(*id, "Doc".into(), "Tor".into()))
                .unwrap();
        }
        for id in patient_ids {
            let patient = NewPatient::new("Asha".into(), "Rai".into(), "Nepal".into())
                .into_patient(id.to_string());
            db.insert_patient(&patient).unwrap();
        }
        db
    }

    #[test]
    fn test_select_least_loaded() {
        let doctors = vec![doctor(Some(1)), doctor(Some(2)), doctor(Some(3))];
        let mut assignments = Vec::new();
        for i in 0..3 {
            assignments.push(Assignment::new(1, format!("p1-{i}")));
        }
        assignments.push(Assignment::new(2, "p2"));
        assignments.push(Assignment::new(3, "p3"));

        // D2 and D3 tie at one patient; the lower id wins
        assert_eq!(select_least_loaded(&doctors, &assignments), Some(2));
    }

    #[test]
    fn test_select_ignores_fetch_order() {
        let doctors = vec![doctor(Some(3)), doctor(Some(2)), doctor(Some(1))];
        assert_eq!(select_least_loaded(&doctors, &[]), Some(1));
    }

    #[test]
    fn test_select_skips_null_ids() {
        let doctors = vec![doctor(None), doctor(Some(5))];
        assert_eq!(select_least_loaded(&doctors, &[]), Some(5));
        assert_eq!(select_least_loaded(&[doctor(None)], &[]), None);
        assert_eq!(select_least_loaded(&[], &[]), None);
    }

    #[test]
    fn test_select_counts_unknown_doctors_as_zero() {
        let doctors = vec![doctor(Some(1)), doctor(Some(2))];
        let assignments = vec![Assignment::new(1, "a"), Assignment::new(99, "b")];
        assert_eq!(select_least_loaded(&doctors, &assignments), Some(2));
    }

    #[test]
    fn test_assign_and_idempotent() {
        let db = setup_db(&[Some(1), Some(2)], &["25NP00001"]);
        let assignor = DoctorAssignor::new(&db);

        let first = assignor.assign("25NP00001").unwrap();
        assert_eq!(first, AssignmentOutcome::Assigned(1));

        let second = assignor.assign("25NP00001").unwrap();
        assert_eq!(second, AssignmentOutcome::AlreadyAssigned(1));
        assert_eq!(db.list_assignments().unwrap().len(), 1);
    }

    #[test]
    fn test_assign_balances_load() {
        let db = setup_db(&[Some(1), Some(2), Some(3)], &["a", "b", "c", "d", "e"]);
        let assignor = DoctorAssignor::new(&db);

        let chosen: Vec<Option<i64>> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|p| assignor.assign(p).unwrap().doctor_id())
            .collect();
        assert_eq!(chosen, vec![Some(1), Some(2), Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn test_assign_no_doctors() {
        let db = setup_db(&[None, None], &["25NP00001"]);
        let outcome = DoctorAssignor::new(&db).assign("25NP00001").unwrap();

        assert_eq!(outcome, AssignmentOutcome::NoDoctorAvailable);
        assert_eq!(outcome.doctor_id(), None);
        assert!(db.list_assignments().unwrap().is_empty());
    }

    #[test]
    fn test_assign_missing_patient() {
        let db = setup_db(&[Some(1)], &[]);
        let outcome = DoctorAssignor::new(&db).assign("25NP00404").unwrap();

        assert_eq!(outcome, AssignmentOutcome::PatientNotFound);
        assert!(db.list_assignments().unwrap().is_empty());
    }

    /// Store whose insert is always beaten by a competing writer.
    struct RacingStore {
        inner: Database,
        competitor_doctor: i64,
    }

    impl PortalStore for RacingStore {
        fn latest_patient_id_with_prefix(&self, prefix: &str) -> DbResult<Option<String>> {
            self.inner.latest_patient_id_with_prefix(prefix)
        }

        fn patient_exists(&self, patient_id: &str) -> DbResult<bool> {
            self.inner.patient_exists(patient_id)
        }

        fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
            self.inner.insert_patient(patient)
        }

        fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
            self.inner.list_doctors()
        }

        fn get_assignment(&self, patient_id: &str) -> DbResult<Option<Assignment>> {
            self.inner.get_assignment(patient_id)
        }

        fn list_assignments(&self) -> DbResult<Vec<Assignment>> {
            self.inner.list_assignments()
        }

        fn insert_assignment(&self, assignment: &Assignment) -> DbResult<()> {
            let rival = Assignment::new(self.competitor_doctor, assignment.patient_id.clone());
            if self.inner.get_assignment(&assignment.patient_id)?.is_none() {
                self.inner.insert_assignment(&rival)?;
            }
            self.inner.insert_assignment(assignment)
        }
    }

    #[test]
    fn test_assign_recovers_from_lost_race() {
        let store = RacingStore {
            inner: setup_db(&[Some(1), Some(2)], &["25NP00001"]),
            competitor_doctor: 2,
        };

        let outcome = DoctorAssignor::new(&store).assign("25NP00001").unwrap();
        assert_eq!(outcome, AssignmentOutcome::AlreadyAssigned(2));
        assert_eq!(store.list_assignments().unwrap().len(), 1);
    }

    /// Store that reports a conflict but never shows the winning row.
    struct PhantomConflictStore(Database);

    impl PortalStore for PhantomConflictStore {
        fn latest_patient_id_with_prefix(&self, prefix: &str) -> DbResult<Option<String>> {
            self.0.latest_patient_id_with_prefix(prefix)
        }

        fn patient_exists(&self, patient_id: &str) -> DbResult<bool> {
            self.0.patient_exists(patient_id)
        }

        fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
            self.0.insert_patient(patient)
        }

        fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
            self.0.list_doctors()
        }

        fn get_assignment(&self, patient_id: &str) -> DbResult<Option<Assignment>> {
            self.0.get_assignment(patient_id)
        }

        fn list_assignments(&self) -> DbResult<Vec<Assignment>> {
            self.0.list_assignments()
        }

        fn insert_assignment(&self, _assignment: &Assignment) -> DbResult<()> {
            Err(DbError::UniqueViolation("phantom".into()))
        }
    }

    #[test]
    fn test_unresolved_conflict_is_surfaced() {
        let store = PhantomConflictStore(setup_db(&[Some(1)], &["25NP00001"]));
        let err = DoctorAssignor::new(&store).assign("25NP00001").unwrap_err();
        assert!(err.is_unique_violation());
    }
}
