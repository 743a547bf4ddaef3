//! Patient models.

use serde::{Deserialize, Serialize};

/// A registered patient.
///
/// `patient_id` is allocated once at signup and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Human-readable identifier (`YYCC` prefix + sequence suffix)
    pub patient_id: String,
    /// Identity issued by the external auth provider, if any
    pub auth_user_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub gender: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
    /// Country name as entered at signup
    pub country: String,
    pub user_contact: Option<String>,
    pub emergency_contact: Option<String>,
    /// Free-text conditions, one entry per item
    pub medical_history: Vec<String>,
    pub address: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

impl Patient {
    /// Full display name, skipping an empty middle name.
    pub fn display_name(&self) -> String {
        match self.middle_name.as_deref().map(str::trim) {
            Some(middle) if !middle.is_empty() => {
                format!("{} {} {}", self.first_name, middle, self.last_name)
            }
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// Signup input for a patient that has no identifier yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub auth_user_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub country: String,
    pub user_contact: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_history: Vec<String>,
    pub address: Option<String>,
}

impl NewPatient {
    /// Create signup input with the required fields.
    pub fn new(first_name: String, last_name: String, country: String) -> Self {
        Self {
            first_name,
            last_name,
            country,
            ..Default::default()
        }
    }

    /// Attach the allocated identifier, producing a storable record.
    pub fn into_patient(self, patient_id: String) -> Patient {
        Patient {
            patient_id,
            auth_user_id: self.auth_user_id,
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            country: self.country,
            user_contact: self.user_contact,
            emergency_contact: self.emergency_contact,
            medical_history: self.medical_history,
            address: self.address,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Split a comma-separated medical history field into trimmed, non-empty items.
///
/// Empty entries (`"a,,b"`, trailing commas) are dropped; the web signup form
/// kept them as empty strings.
pub fn parse_medical_history(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
