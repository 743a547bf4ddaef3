//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::Patient;

const PATIENT_COLUMNS: &str = r#"
    patient_id, auth_user_id, first_name, middle_name, last_name, gender,
    date_of_birth, country, user_contact, emergency_contact, medical_history,
    address, created_at
"#;

impl Database {
    /// Insert a new patient. A duplicate `patient_id` yields `DbError::UniqueViolation`.
    pub(crate) fn insert_patient_row(&self, patient: &Patient) -> DbResult<()> {
        let history_json = serde_json::to_string(&patient.medical_history)?;

        self.conn
            .execute(
                r#"
                INSERT INTO users (
                    patient_id, auth_user_id, first_name, middle_name, last_name, gender,
                    date_of_birth, country, user_contact, emergency_contact, medical_history,
                    address, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
                params![
                    patient.patient_id,
                    patient.auth_user_id,
                    patient.first_name,
                    patient.middle_name,
                    patient.last_name,
                    patient.gender,
                    patient.date_of_birth,
                    patient.country,
                    patient.user_contact,
                    patient.emergency_contact,
                    history_json,
                    patient.address,
                    patient.created_at,
                ],
            )
            .map_err(DbError::from_insert)?;
        Ok(())
    }

    /// Get a patient by identifier.
    pub fn get_patient(&self, patient_id: &str) -> DbResult<Option<Patient>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM users WHERE patient_id = ?"),
                [patient_id],
                PatientRow::from_row,
            )
            .optional()?;

        row.map(Patient::try_from).transpose()
    }

    /// Get a patient by the identity issued by the auth provider.
    pub fn get_patient_by_auth_user(&self, auth_user_id: &str) -> DbResult<Option<Patient>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM users WHERE auth_user_id = ?"),
                [auth_user_id],
                PatientRow::from_row,
            )
            .optional()?;

        row.map(Patient::try_from).transpose()
    }

    /// List all patients in identifier order.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATIENT_COLUMNS} FROM users ORDER BY length(patient_id), patient_id"
        ))?;

        let rows = stmt.query_map([], PatientRow::from_row)?;

        rows.map(|row| row.map_err(DbError::from).and_then(Patient::try_from))
            .collect()
    }
}

/// Raw row with `medical_history` still JSON-encoded.
struct PatientRow {
    patient_id: String,
    auth_user_id: Option<String>,
    first_name: String,
    middle_name: Option<String>,
    last_name: String,
    gender: Option<String>,
    date_of_birth: Option<String>,
    country: String,
    user_contact: Option<String>,
    emergency_contact: Option<String>,
    medical_history: String,
    address: Option<String>,
    created_at: String,
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            patient_id: row.get(0)?,
            auth_user_id: row.get(1)?,
            first_name: row.get(2)?,
            middle_name: row.get(3)?,
            last_name: row.get(4)?,
            gender: row.get(5)?,
            date_of_birth: row.get(6)?,
            country: row.get(7)?,
            user_contact: row.get(8)?,
            emergency_contact: row.get(9)?,
            medical_history: row.get(10)?,
            address: row.get(11)?,
            created_at: row.get(12)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        Ok(Patient {
            patient_id: row.patient_id,
            auth_user_id: row.auth_user_id,
            first_name: row.first_name,
            middle_name: row.middle_name,
            last_name: row.last_name,
            gender: row.gender,
            date_of_birth: row.date_of_birth,
            country: row.country,
            user_contact: row.user_contact,
            emergency_contact: row.emergency_contact,
            medical_history: serde_json::from_str(&row.medical_history)?,
            address: row.address,
            created_at: row.created_at,
        })
    }
}
