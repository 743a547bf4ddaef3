//! Patient signup: allocate an identifier, store the patient, assign a doctor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assignment::{AssignmentOutcome, DoctorAssignor};
use crate::db::{DbError, PortalStore};
use crate::models::{NewPatient, Patient};
use crate::patient_id::{CountryCodes, PatientIdAllocator};

/// Attempts made when a concurrent signup takes the allocated identifier first.
const MAX_ALLOCATION_ATTEMPTS: usize = 3;

/// Registration errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not allocate a free patient id after {0} attempts")]
    IdExhausted(usize),
}

pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Outcome of a successful signup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Registration {
    pub patient: Patient,
    /// `None` when the assignment step hit a store error. The patient is
    /// registered either way and can be assigned later.
    pub assignment: Option<AssignmentOutcome>,
}

impl Registration {
    pub fn doctor_id(&self) -> Option<i64> {
        self.assignment.and_then(|outcome| outcome.doctor_id())
    }
}

/// Runs the signup flow against a store.
pub struct PatientRegistry<'a, S: PortalStore + ?Sized> {
    store: &'a S,
    allocator: PatientIdAllocator<'a, S>,
}

impl<'a, S: PortalStore + ?Sized> PatientRegistry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_country_codes(store, CountryCodes::builtin())
    }

    pub fn with_country_codes(store: &'a S, countries: CountryCodes) -> Self {
        Self {
            store,
            allocator: PatientIdAllocator::with_country_codes(store, countries),
        }
    }

    /// Register a patient in the current year.
    pub fn register(&self, input: NewPatient) -> RegistrationResult<Registration> {
        use chrono::Datelike;
        self.register_in_year(input, chrono::Utc::now().year())
    }

    /// Register a patient with an explicit allocation year.
    pub fn register_in_year(&self, input: NewPatient, year: i32) -> RegistrationResult<Registration> {
        validate(&input)?;

        let patient = self.insert_with_fresh_id(input, year)?;

        let assignment = match DoctorAssignor::new(self.store).assign(&patient.patient_id) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(
                    patient_id = %patient.patient_id,
                    error = %e,
                    "Doctor assignment failed after registration"
                );
                None
            }
        };

        tracing::info!(
            patient_id = %patient.patient_id,
            assignment = ?assignment,
            "Registered patient"
        );
        Ok(Registration { patient, assignment })
    }

    fn insert_with_fresh_id(&self, input: NewPatient, year: i32) -> RegistrationResult<Patient> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let patient_id = self.allocator.allocate_for_year(&input.country, year)?;
            let patient = input.clone().into_patient(patient_id);

            match self.store.insert_patient(&patient) {
                Ok(()) => return Ok(patient),
                Err(e) if e.is_unique_violation() => {
                    tracing::warn!(
                        patient_id = %patient.patient_id,
                        attempt,
                        "Patient id taken by a concurrent signup, reallocating"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(RegistrationError::IdExhausted(MAX_ALLOCATION_ATTEMPTS))
    }
}

fn validate(input: &NewPatient) -> RegistrationResult<()> {
    let required = [
        ("first_name", &input.first_name),
        ("last_name", &input.last_name),
        ("country", &input.country),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(RegistrationError::InvalidInput(format!("{field} is required")));
        }
    }
    Ok(())
}
