//! SQLite schema definition.

/// Complete database schema for the care portal.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    patient_id TEXT PRIMARY KEY,                 -- YYCC + suffix, see patient_id module
    auth_user_id TEXT,                           -- opaque id from the auth provider
    first_name TEXT NOT NULL,
    middle_name TEXT,
    last_name TEXT NOT NULL,
    gender TEXT,
    date_of_birth TEXT,
    country TEXT NOT NULL,
    user_contact TEXT,
    emergency_contact TEXT,
    medical_history TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    address TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_users_auth_user_id ON users(auth_user_id);

-- ============================================================================
-- Doctors
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctor (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doctor_id INTEGER UNIQUE,                    -- NULL rows are never assigned patients
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    specialty TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Doctor/Patient Assignment (insert-only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctor_patient_assignment (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doctor_id INTEGER NOT NULL REFERENCES doctor(doctor_id),
    patient_id TEXT NOT NULL UNIQUE REFERENCES users(patient_id),
    assigned_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_assignment_doctor ON doctor_patient_assignment(doctor_id);

-- ============================================================================
-- Raw Health Data
-- ============================================================================

CREATE TABLE IF NOT EXISTS vitals_monitoring (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id TEXT NOT NULL REFERENCES users(patient_id),
    heart_rate_bpm REAL,
    pulse_bpm REAL,
    spo2_percent REAL,
    body_temp_c REAL,
    systolic_bp REAL,
    diastolic_bp REAL,
    mean_bp REAL,
    ecg_signal_raw TEXT,
    ecg_rhythm_type TEXT,
    recorded_at TEXT NOT NULL                    -- RFC 3339
);

CREATE INDEX IF NOT EXISTS idx_vitals_patient_time ON vitals_monitoring(patient_id, recorded_at);

CREATE TABLE IF NOT EXISTS breath_analysis (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id TEXT NOT NULL REFERENCES users(patient_id),
    ammonia_ppm REAL,
    co2_ppm_mq REAL,
    benzene_ppm REAL,
    co2_ppm_mhz19 REAL,
    ethanol_ppm REAL,
    vocs_ppm_mics REAL,
    acetone_ppm_qcm REAL,
    voc_type_chemo TEXT,
    voc_value_ppm_chemo REAL,
    recorded_at TEXT NOT NULL                    -- RFC 3339
);

CREATE INDEX IF NOT EXISTS idx_breath_patient_time ON breath_analysis(patient_id, recorded_at);

-- ============================================================================
-- Prediction Cache (append-only, newest row wins)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patient_predictions_cache (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES users(patient_id),
    summary TEXT NOT NULL,
    risk_assessment TEXT NOT NULL,
    model_used TEXT NOT NULL,
    created_at TEXT NOT NULL                     -- RFC 3339
);

CREATE INDEX IF NOT EXISTS idx_predictions_patient_time ON patient_predictions_cache(patient_id, created_at);
"#;
