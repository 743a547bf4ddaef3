//! Vitals, breath analysis and prediction cache operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{BreathReading, PredictionCacheEntry, VitalReading};
use crate::prediction::normalize_timestamp;

/// Timestamps are stored normalized so `ORDER BY` and `MAX` follow time order.
fn stored_timestamp(value: &str) -> DbResult<String> {
    normalize_timestamp(value).ok_or_else(|| DbError::InvalidTimestamp(value.to_string()))
}

fn vital_from_row(row: &Row<'_>) -> rusqlite::Result<VitalReading> {
    Ok(VitalReading {
        patient_id: row.get(0)?,
        heart_rate_bpm: row.get(1)?,
        pulse_bpm: row.get(2)?,
        spo2_percent: row.get(3)?,
        body_temp_c: row.get(4)?,
        systolic_bp: row.get(5)?,
        diastolic_bp: row.get(6)?,
        mean_bp: row.get(7)?,
        ecg_signal_raw: row.get(8)?,
        ecg_rhythm_type: row.get(9)?,
        recorded_at: row.get(10)?,
    })
}

fn breath_from_row(row: &Row<'_>) -> rusqlite::Result<BreathReading> {
    Ok(BreathReading {
        patient_id: row.get(0)?,
        ammonia_ppm: row.get(1)?,
        co2_ppm_mq: row.get(2)?,
        benzene_ppm: row.get(3)?,
        co2_ppm_mhz19: row.get(4)?,
        ethanol_ppm: row.get(5)?,
        vocs_ppm_mics: row.get(6)?,
        acetone_ppm_qcm: row.get(7)?,
        voc_type_chemo: row.get(8)?,
        voc_value_ppm_chemo: row.get(9)?,
        recorded_at: row.get(10)?,
    })
}

fn prediction_from_row(row: &Row<'_>) -> rusqlite::Result<PredictionCacheEntry> {
    Ok(PredictionCacheEntry {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        summary: row.get(2)?,
        risk_assessment: row.get(3)?,
        model_used: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Database {
    // =========================================================================
    // Vitals
    // =========================================================================

    /// Insert a vitals reading.
    pub fn insert_vital(&self, reading: &VitalReading) -> DbResult<()> {
        let recorded_at = stored_timestamp(&reading.recorded_at)?;
        self.conn.execute(
            r#"
            INSERT INTO vitals_monitoring (
                patient_id, heart_rate_bpm, pulse_bpm, spo2_percent, body_temp_c,
                systolic_bp, diastolic_bp, mean_bp, ecg_signal_raw, ecg_rhythm_type, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                reading.patient_id,
                reading.heart_rate_bpm,
                reading.pulse_bpm,
                reading.spo2_percent,
                reading.body_temp_c,
                reading.systolic_bp,
                reading.diastolic_bp,
                reading.mean_bp,
                reading.ecg_signal_raw,
                reading.ecg_rhythm_type,
                recorded_at,
            ],
        )?;
        Ok(())
    }

    /// Newest vitals readings first, at most `limit`.
    pub fn recent_vitals(&self, patient_id: &str, limit: usize) -> DbResult<Vec<VitalReading>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT patient_id, heart_rate_bpm, pulse_bpm, spo2_percent, body_temp_c,
                   systolic_bp, diastolic_bp, mean_bp, ecg_signal_raw, ecg_rhythm_type, recorded_at
            FROM vitals_monitoring
            WHERE patient_id = ?
            ORDER BY recorded_at DESC
            LIMIT ?
            "#,
        )?;
        let rows = stmt.query_map(params![patient_id, limit as i64], vital_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Timestamp of the newest vitals reading.
    pub fn latest_vital_time(&self, patient_id: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT MAX(recorded_at) FROM vitals_monitoring WHERE patient_id = ?",
                [patient_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    // =========================================================================
    // Breath analysis
    // =========================================================================

    /// Insert a breath analysis reading.
    pub fn insert_breath(&self, reading: &BreathReading) -> DbResult<()> {
        let recorded_at = stored_timestamp(&reading.recorded_at)?;
        self.conn.execute(
            r#"
            INSERT INTO breath_analysis (
                patient_id, ammonia_ppm, co2_ppm_mq, benzene_ppm, co2_ppm_mhz19, ethanol_ppm,
                vocs_ppm_mics, acetone_ppm_qcm, voc_type_chemo, voc_value_ppm_chemo, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                reading.patient_id,
                reading.ammonia_ppm,
                reading.co2_ppm_mq,
                reading.benzene_ppm,
                reading.co2_ppm_mhz19,
                reading.ethanol_ppm,
                reading.vocs_ppm_mics,
                reading.acetone_ppm_qcm,
                reading.voc_type_chemo,
                reading.voc_value_ppm_chemo,
                recorded_at,
            ],
        )?;
        Ok(())
    }

    /// Newest breath readings first, at most `limit`.
    pub fn recent_breaths(&self, patient_id: &str, limit: usize) -> DbResult<Vec<BreathReading>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT patient_id, ammonia_ppm, co2_ppm_mq, benzene_ppm, co2_ppm_mhz19, ethanol_ppm,
                   vocs_ppm_mics, acetone_ppm_qcm, voc_type_chemo, voc_value_ppm_chemo, recorded_at
            FROM breath_analysis
            WHERE patient_id = ?
            ORDER BY recorded_at DESC
            LIMIT ?
            "#,
        )?;
        let rows = stmt.query_map(params![patient_id, limit as i64], breath_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Timestamp of the newest breath reading.
    pub fn latest_breath_time(&self, patient_id: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT MAX(recorded_at) FROM breath_analysis WHERE patient_id = ?",
                [patient_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    // =========================================================================
    // Prediction cache
    // =========================================================================

    /// Append a prediction to the cache.
    pub fn insert_prediction(&self, entry: &PredictionCacheEntry) -> DbResult<()> {
        let created_at = stored_timestamp(&entry.created_at)?;
        self.conn.execute(
            r#"
            INSERT INTO patient_predictions_cache (
                id, patient_id, summary, risk_assessment, model_used, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.id,
                entry.patient_id,
                entry.summary,
                entry.risk_assessment,
                entry.model_used,
                created_at,
            ],
        )?;
        Ok(())
    }

    /// Newest cached prediction for a patient.
    pub fn latest_prediction(&self, patient_id: &str) -> DbResult<Option<PredictionCacheEntry>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, summary, risk_assessment, model_used, created_at
                FROM patient_predictions_cache
                WHERE patient_id = ?
                ORDER BY created_at DESC
                LIMIT 1
                "#,
                [patient_id],
                prediction_from_row,
            )
            .optional()
            .map_err(Into::into)
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
    fn test_vitals_newest_first() {
        let db = setup_db();
        for (i, ts) in ["2025-01-01T08:00:00Z", "2025-01-03T08:00:00Z", "2025-01-02T08:00:00Z"]
            .iter()
            .enumerate()
        {
            let mut reading = VitalReading::new("25NP00001", *ts);
            reading.heart_rate_bpm = Some(70.0 + i as f64);
            db.insert_vital(&reading).unwrap();
        }

        let recent = db.recent_vitals("25NP00001", 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].recorded_at, "2025-01-03T08:00:00.000000Z");
        assert_eq!(recent[0].heart_rate_bpm, Some(71.0));
        assert_eq!(
            db.latest_vital_time("25NP00001").unwrap().as_deref(),
            Some("2025-01-03T08:00:00.000000Z")
        );
    }

    #[test]
    fn test_latest_time_without_data() {
        let db = setup_db();
        assert!(db.latest_vital_time("25NP00001").unwrap().is_none());
        assert!(db.latest_breath_time("25NP00001").unwrap().is_none());
    }

    #[test]
    fn test_breath_roundtrip() {
        let db = setup_db();
        let mut reading = BreathReading::new("25NP00001", "2025-01-01T08:00:00.000000Z");
        reading.acetone_ppm_qcm = Some(1.8);
        reading.voc_type_chemo = Some("Toluene".into());
        reading.voc_value_ppm_chemo = Some(0.4);
        db.insert_breath(&reading).unwrap();

        let recent = db.recent_breaths("25NP00001", 500).unwrap();
        assert_eq!(recent, vec![reading]);
    }

    #[test]
    fn test_latest_prediction() {
        let db = setup_db();
        let mut older = PredictionCacheEntry::new("25NP00001", "old".into(), "old risk".into(), "m");
        older.created_at = "2025-01-01T00:00:00Z".into();
        let mut newer = PredictionCacheEntry::new("25NP00001", "new".into(), "new risk".into(), "m");
        newer.created_at = "2025-02-01T00:00:00Z".into();

        db.insert_prediction(&newer).unwrap();
        db.insert_prediction(&older).unwrap();

        let latest = db.latest_prediction("25NP00001").unwrap().unwrap();
        assert_eq!(latest.summary, "new");
        assert!(db.latest_prediction("25NP00002").unwrap().is_none());
    }

    #[test]
    fn test_mixed_offsets_order_by_instant() {
        let db = setup_db();
        // 00:00 UTC written with a Nepal offset sorts above 03:00Z as raw text
        db.insert_vital(&VitalReading::new("25NP00001", "2025-01-02T05:45:00+05:45"))
            .unwrap();
        db.insert_vital(&VitalReading::new("25NP00001", "2025-01-02T03:00:00Z"))
            .unwrap();

        assert_eq!(
            db.latest_vital_time("25NP00001").unwrap().as_deref(),
            Some("2025-01-02T03:00:00.000000Z")
        );
        let recent = db.recent_vitals("25NP00001", 1).unwrap();
        assert_eq!(recent[0].recorded_at, "2025-01-02T03:00:00.000000Z");
    }

    #[test]
    fn test_fractional_seconds_order_by_instant() {
        let db = setup_db();
        db.insert_breath(&BreathReading::new("25NP00001", "2025-01-02T03:00:00Z"))
            .unwrap();
        db.insert_breath(&BreathReading::new("25NP00001", "2025-01-02T03:00:00.500Z"))
            .unwrap();

        assert_eq!(
            db.latest_breath_time("25NP00001").unwrap().as_deref(),
            Some("2025-01-02T03:00:00.500000Z")
        );
        let recent = db.recent_breaths("25NP00001", 2).unwrap();
        assert_eq!(recent[0].recorded_at, "2025-01-02T03:00:00.500000Z");
        assert_eq!(recent[1].recorded_at, "2025-01-02T03:00:00.000000Z");
    }

    #[test]
    fn test_invalid_timestamp_rejected() {
        let db = setup_db();
        let err = db
            .insert_vital(&VitalReading::new("25NP00001", "yesterday"))
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidTimestamp(ref v) if v == "yesterday"));

        let err = db
            .insert_breath(&BreathReading::new("25NP00001", "2025-13-01T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidTimestamp(_)));
        assert!(db.latest_vital_time("25NP00001").unwrap().is_none());
    }
}
