//! Care Portal Core Library
//!
//! Patient registration backend for the health portal: identifier
//! allocation, doctor load balancing and prediction cache bookkeeping.
//!
//! # Architecture
//!
//! ```text
//!   Signup form ──► PatientRegistry
//!                        │
//!          ┌─────────────┼──────────────────┐
//!          ▼             ▼                  ▼
//!  PatientIdAllocator  insert patient   DoctorAssignor
//!   YY + CC + suffix       │            least-loaded doctor,
//!          │               │            insert-then-recheck
//!          └───────────────┼──────────────────┘
//!                          ▼
//!                    PortalStore (SQLite)
//!                          ▲
//!   Sensor uploads ────────┤
//!                          │
//!              prediction cache freshness
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer and the [`db::PortalStore`] contract
//! - [`models`]: Domain types (Patient, Doctor, Assignment, readings, cache)
//! - [`patient_id`]: Identifier allocator (prefix, suffix rollover, country codes)
//! - [`assignment`]: Least-loaded doctor assignment
//! - [`registration`]: Signup flow tying allocation and assignment together
//! - [`prediction`]: Prediction cache freshness policy
//! - [`config`]: JSON/env configuration

pub mod assignment;
pub mod config;
pub mod db;
pub mod models;
pub mod patient_id;
pub mod prediction;
pub mod registration;

// Re-export commonly used types
pub use assignment::{AssignmentOutcome, DoctorAssignor};
pub use config::PortalConfig;
pub use db::{Database, PortalStore};
pub use models::{
    Assignment, BreathReading, Doctor, NewDoctor, NewPatient, Patient, PredictionCacheEntry,
    VitalReading,
};
pub use patient_id::{CountryCodes, PatientIdAllocator};
pub use registration::{PatientRegistry, Registration};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

/// Log filter used when neither `RUST_LOG` nor an explicit filter is given.
pub const DEFAULT_LOG_FILTER: &str = "care_portal_core=info,care_portal_insights=info";

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CarePortalError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for CarePortalError {
    fn from(e: db::DbError) -> Self {
        CarePortalError::DatabaseError(e.to_string())
    }
}

impl From<registration::RegistrationError> for CarePortalError {
    fn from(e: registration::RegistrationError) -> Self {
        match e {
            registration::RegistrationError::InvalidInput(msg) => CarePortalError::InvalidInput(msg),
            other => CarePortalError::DatabaseError(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for CarePortalError {
    fn from(e: config::ConfigError) -> Self {
        CarePortalError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for CarePortalError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CarePortalError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install a `tracing` subscriber. `RUST_LOG` wins over `filter`.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> Result<(), CarePortalError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
            .map_err(|e| CarePortalError::InvalidInput(e.to_string()))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| CarePortalError::ConfigError(e.to_string()))
}

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_portal(path: String) -> Result<Arc<CarePortal>, CarePortalError> {
    let db = Database::open(&path)?;
    Ok(CarePortal::wrap(db, CountryCodes::builtin()))
}

/// Open the database named by a JSON config (environment overrides applied).
#[uniffi::export]
pub fn open_portal_with_config(config_json: String) -> Result<Arc<CarePortal>, CarePortalError> {
    let config = PortalConfig::from_json(&config_json)?.with_env_overrides();
    let db = Database::open(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "Opened care portal database");
    Ok(CarePortal::wrap(db, config.country_table()))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_portal_in_memory() -> Result<Arc<CarePortal>, CarePortalError> {
    let db = Database::open_in_memory()?;
    Ok(CarePortal::wrap(db, CountryCodes::builtin()))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct CarePortal {
    db: Arc<Mutex<Database>>,
    countries: CountryCodes,
}

impl CarePortal {
    fn wrap(db: Database, countries: CountryCodes) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            countries,
        })
    }
}

#[uniffi::export]
impl CarePortal {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a patient: allocate an id, store the record, assign a doctor.
    pub fn register_patient(&self, patient: FfiNewPatient) -> Result<FfiRegistration, CarePortalError> {
        let registry = PatientRegistry::with_country_codes(&*self.db, self.countries.clone());
        let registration = registry.register(patient.into())?;
        Ok(registration.into())
    }

    /// Preview the next identifier for a country without reserving it.
    pub fn preview_patient_id(&self, country: String) -> Result<String, CarePortalError> {
        let allocator = PatientIdAllocator::with_country_codes(&*self.db, self.countries.clone());
        Ok(allocator.allocate(&country)?)
    }

    /// Get a patient by identifier.
    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, CarePortalError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&patient_id)?;
        Ok(patient.map(|p| p.into()))
    }

    // =========================================================================
    // Doctor Operations
    // =========================================================================

    /// Add a doctor.
    pub fn add_doctor(&self, doctor: FfiNewDoctor) -> Result<FfiDoctor, CarePortalError> {
        let db = self.db.lock()?;
        let stored = db.insert_doctor(&doctor.into())?;
        Ok(stored.into())
    }

    /// Assign the least-loaded doctor to a patient (idempotent).
    pub fn assign_doctor(&self, patient_id: String) -> Result<FfiAssignmentOutcome, CarePortalError> {
        let outcome = DoctorAssignor::new(&*self.db).assign(&patient_id)?;
        Ok(outcome.into())
    }

    /// The doctor currently responsible for a patient.
    pub fn get_assigned_doctor(&self, patient_id: String) -> Result<Option<FfiDoctor>, CarePortalError> {
        let db = self.db.lock()?;
        let doctor = db.doctor_for_patient(&patient_id)?;
        Ok(doctor.map(|d| d.into()))
    }

    // =========================================================================
    // Prediction Cache
    // =========================================================================

    /// Cached prediction for a patient, if no newer readings arrived since.
    pub fn get_cached_prediction(
        &self,
        patient_id: String,
    ) -> Result<Option<FfiPrediction>, CarePortalError> {
        let db = self.db.lock()?;
        let entry = db.cached_prediction_if_fresh(&patient_id)?;
        Ok(entry.map(|e| e.into()))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe signup input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub auth_user_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub country: String,
    pub user_contact: Option<String>,
    pub emergency_contact: Option<String>,
    /// Comma-separated, as typed in the signup form
    pub medical_history: String,
    pub address: Option<String>,
}

impl From<FfiNewPatient> for NewPatient {
    fn from(p: FfiNewPatient) -> Self {
        NewPatient {
            auth_user_id: p.auth_user_id,
            first_name: p.first_name,
            middle_name: p.middle_name,
            last_name: p.last_name,
            gender: p.gender,
            date_of_birth: p.date_of_birth,
            country: p.country,
            user_contact: p.user_contact,
            emergency_contact: p.emergency_contact,
            medical_history: models::parse_medical_history(&p.medical_history),
            address: p.address,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub medical_history: Vec<String>,
    pub created_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            patient_id: patient.patient_id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            country: patient.country,
            medical_history: patient.medical_history,
            created_at: patient.created_at,
        }
    }
}

/// FFI-safe doctor input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewDoctor {
    pub doctor_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
}

impl From<FfiNewDoctor> for NewDoctor {
    fn from(d: FfiNewDoctor) -> Self {
        NewDoctor {
            doctor_id: d.doctor_id,
            first_name: d.first_name,
            last_name: d.last_name,
            specialty: d.specialty,
        }
    }
}

/// FFI-safe doctor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub doctor_id: Option<i64>,
    pub display_name: String,
    pub specialty: Option<String>,
}

impl From<Doctor> for FfiDoctor {
    fn from(doctor: Doctor) -> Self {
        Self {
            doctor_id: doctor.doctor_id,
            display_name: doctor.display_name(),
            specialty: doctor.specialty,
        }
    }
}

/// FFI-safe assignment outcome.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiAssignmentOutcome {
    Assigned { doctor_id: i64 },
    AlreadyAssigned { doctor_id: i64 },
    NoDoctorAvailable,
    PatientNotFound,
}

impl From<AssignmentOutcome> for FfiAssignmentOutcome {
    fn from(outcome: AssignmentOutcome) -> Self {
        match outcome {
            AssignmentOutcome::Assigned(doctor_id) => FfiAssignmentOutcome::Assigned { doctor_id },
            AssignmentOutcome::AlreadyAssigned(doctor_id) => {
                FfiAssignmentOutcome::AlreadyAssigned { doctor_id }
            }
            AssignmentOutcome::NoDoctorAvailable => FfiAssignmentOutcome::NoDoctorAvailable,
            AssignmentOutcome::PatientNotFound => FfiAssignmentOutcome::PatientNotFound,
        }
    }
}

/// FFI-safe registration result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRegistration {
    pub patient: FfiPatient,
    /// `None` when the assignment step failed and should be retried later
    pub assignment: Option<FfiAssignmentOutcome>,
}

impl From<Registration> for FfiRegistration {
    fn from(registration: Registration) -> Self {
        Self {
            patient: registration.patient.into(),
            assignment: registration.assignment.map(Into::into),
        }
    }
}

/// FFI-safe cached prediction.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrediction {
    pub summary: String,
    pub risk_assessment: String,
    pub model_used: String,
    pub created_at: String,
}

impl From<PredictionCacheEntry> for FfiPrediction {
    fn from(entry: PredictionCacheEntry) -> Self {
        Self {
            summary: entry.summary,
            risk_assessment: entry.risk_assessment,
            model_used: entry.model_used,
            created_at: entry.created_at,
        }
    }
}
