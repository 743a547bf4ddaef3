//! Table-store contract consumed by the allocator and the assignor.
//!
//! The allocator and assignor only ever need these few queries, so they are
//! written against this trait rather than against SQLite directly. `Database`
//! is the production implementation; `Mutex<S>` lets several threads share a
//! store while still interleaving individual calls.

use std::sync::Mutex;

use rusqlite::{params, OptionalExtension};

use super::doctors::{assignment_from_row, doctor_from_row};
use super::{Database, DbError, DbResult};
use crate::models::{Assignment, Doctor, Patient};

/// Store operations used by identifier allocation and doctor assignment.
pub trait PortalStore {
    /// Greatest patient identifier starting with `prefix`, in sequence order
    /// (shorter identifiers first, then plain string order).
    fn latest_patient_id_with_prefix(&self, prefix: &str) -> DbResult<Option<String>>;

    /// Point lookup on `users.patient_id`.
    fn patient_exists(&self, patient_id: &str) -> DbResult<bool>;

    /// Insert a patient row. Duplicate identifiers yield `DbError::UniqueViolation`.
    fn insert_patient(&self, patient: &Patient) -> DbResult<()>;

    /// All doctors, ordered by `doctor_id` ascending (NULL ids first).
    fn list_doctors(&self) -> DbResult<Vec<Doctor>>;

    /// The assignment for a patient, if one exists.
    fn get_assignment(&self, patient_id: &str) -> DbResult<Option<Assignment>>;

    /// Every assignment in the store.
    fn list_assignments(&self) -> DbResult<Vec<Assignment>>;

    /// Insert an assignment. A second assignment for the same patient yields
    /// `DbError::UniqueViolation`.
    fn insert_assignment(&self, assignment: &Assignment) -> DbResult<()>;
}

impl PortalStore for Database {
    fn latest_patient_id_with_prefix(&self, prefix: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                r#"
                SELECT patient_id FROM users
                WHERE substr(patient_id, 1, ?2) = ?1
                ORDER BY length(patient_id) DESC, patient_id DESC
                LIMIT 1
                "#,
                params![prefix, prefix.chars().count() as i64],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    fn patient_exists(&self, patient_id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE patient_id = ?",
            [patient_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.insert_patient_row(patient)
    }

    fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, doctor_id, first_name, last_name, specialty FROM doctor ORDER BY doctor_id, id",
        )?;
        let rows = stmt.query_map([], doctor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn get_assignment(&self, patient_id: &str) -> DbResult<Option<Assignment>> {
        self.conn
            .query_row(
                "SELECT doctor_id, patient_id FROM doctor_patient_assignment WHERE patient_id = ?",
                [patient_id],
                assignment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    fn list_assignments(&self) -> DbResult<Vec<Assignment>> {
        let mut stmt = self
            .conn
            .prepare("SELECT doctor_id, patient_id FROM doctor_patient_assignment ORDER BY id")?;
        let rows = stmt.query_map([], assignment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn insert_assignment(&self, assignment: &Assignment) -> DbResult<()> {
        self.conn
            .execute(
                "INSERT INTO doctor_patient_assignment (doctor_id, patient_id) VALUES (?1, ?2)",
                params![assignment.doctor_id, assignment.patient_id],
            )
            .map_err(DbError::from_insert)?;
        Ok(())
    }
}

impl<S: PortalStore> PortalStore for Mutex<S> {
    fn latest_patient_id_with_prefix(&self, prefix: &str) -> DbResult<Option<String>> {
        self.lock()?.latest_patient_id_with_prefix(prefix)
    }

    fn patient_exists(&self, patient_id: &str) -> DbResult<bool> {
        self.lock()?.patient_exists(patient_id)
    }

    fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.lock()?.insert_patient(patient)
    }

    fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        self.lock()?.list_doctors()
    }

    fn get_assignment(&self, patient_id: &str) -> DbResult<Option<Assignment>> {
        self.lock()?.get_assignment(patient_id)
    }

    fn list_assignments(&self) -> DbResult<Vec<Assignment>> {
        self.lock()?.list_assignments()
    }

    fn insert_assignment(&self, assignment: &Assignment) -> DbResult<()> {
        self.lock()?.insert_assignment(assignment)
    }
}
