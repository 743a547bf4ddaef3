//! Doctor and assignment models.

use serde::{Deserialize, Serialize};

/// A doctor record. Read-only from the assignor's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    /// Surrogate row id
    pub id: i64,
    /// Business identifier; `None` makes the doctor ineligible for assignment
    pub doctor_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
}

impl Doctor {
    /// Whether this doctor can receive new patients.
    pub fn is_eligible(&self) -> bool {
        self.doctor_id.is_some()
    }

    pub fn display_name(&self) -> String {
        format!("Dr. {} {}", self.first_name, self.last_name)
    }
}

/// Input for creating a doctor row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDoctor {
    pub doctor_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
}

impl NewDoctor {
    pub fn new(doctor_id: Option<i64>, first_name: String, last_name: String) -> Self {
        Self {
            doctor_id,
            first_name,
            last_name,
            specialty: None,
        }
    }
}

/// "Doctor treats patient". At most one per patient, insert-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub doctor_id: i64,
    pub patient_id: String,
}

impl Assignment {
    pub fn new(doctor_id: i64, patient_id: impl Into<String>) -> Self {
        Self {
            doctor_id,
            patient_id: patient_id.into(),
        }
    }
}
