//! Doctor and assignment database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Assignment, Doctor, NewDoctor};

pub(crate) fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        specialty: row.get(4)?,
    })
}

pub(crate) fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        doctor_id: row.get(0)?,
        patient_id: row.get(1)?,
    })
}

impl Database {
    /// Insert a doctor and return the stored record.
    pub fn insert_doctor(&self, doctor: &NewDoctor) -> DbResult<Doctor> {
        self.conn
            .execute(
                "INSERT INTO doctor (doctor_id, first_name, last_name, specialty) VALUES (?1, ?2, ?3, ?4)",
                params![
                    doctor.doctor_id,
                    doctor.first_name,
                    doctor.last_name,
                    doctor.specialty,
                ],
            )
            .map_err(DbError::from_insert)?;

        Ok(Doctor {
            id: self.conn.last_insert_rowid(),
            doctor_id: doctor.doctor_id,
            first_name: doctor.first_name.clone(),
            last_name: doctor.last_name.clone(),
            specialty: doctor.specialty.clone(),
        })
    }

    /// Get a doctor by business identifier.
    pub fn get_doctor(&self, doctor_id: i64) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                "SELECT id, doctor_id, first_name, last_name, specialty FROM doctor WHERE doctor_id = ?",
                [doctor_id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// The doctor currently responsible for a patient, if any.
    pub fn doctor_for_patient(&self, patient_id: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                r#"
                SELECT d.id, d.doctor_id, d.first_name, d.last_name, d.specialty
                FROM doctor_patient_assignment a
                JOIN doctor d ON d.doctor_id = a.doctor_id
                WHERE a.patient_id = ?
                "#,
                [patient_id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Patients assigned to a doctor, in assignment order.
    pub fn patients_for_doctor(&self, doctor_id: i64) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT patient_id FROM doctor_patient_assignment WHERE doctor_id = ? ORDER BY id",
        )?;
        let rows = stmt.query_map([doctor_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PortalStore;
    use crate::models::NewPatient;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        let patient =
            NewPatient::new("Asha".into(), "Rai".into(), "Nepal".into()).into_patient("25NP00001".into());
        db.insert_patient(&patient).unwrap();
        db
    }

    #[test]
    fn test_insert_and_get_doctor() {
        let db = setup_db();
        let mut input = NewDoctor::new(Some(7), "Mira".into(), "Shah".into());
        input.specialty = Some("Pulmonology".into());

        let stored = db.insert_doctor(&input).unwrap();
        assert!(stored.id > 0);

        let fetched = db.get_doctor(7).unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert!(db.get_doctor(8).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_doctor_id_rejected() {
        let db = setup_db();
        db.insert_doctor(&NewDoctor::new(Some(7), "Mira".into(), "Shah".into()))
            .unwrap();
        let err = db
            .insert_doctor(&NewDoctor::new(Some(7), "Ravi".into(), "Kumar".into()))
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_doctor_for_patient() {
        let db = setup_db();
        db.insert_doctor(&NewDoctor::new(Some(7), "Mira".into(), "Shah".into()))
            .unwrap();
        assert!(db.doctor_for_patient("25NP00001").unwrap().is_none());

        db.insert_assignment(&Assignment::new(7, "25NP00001")).unwrap();

        let doctor = db.doctor_for_patient("25NP00001").unwrap().unwrap();
        assert_eq!(doctor.doctor_id, Some(7));
        assert_eq!(db.patients_for_doctor(7).unwrap(), vec!["25NP00001"]);
    }
}
