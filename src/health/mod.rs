/// Health records
///
/// Each family member accumulates dated health records: a diagnosis, the
/// treating clinician, medications and optional vitals.

mod manager;

pub use manager::HealthRecordManager;

use crate::{
    db::models::HealthRecordRow,
    error::{ApiError, ApiResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Blood pressure reading in mmHg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BloodPressure {
    #[validate(range(min = 60, max = 250))]
    pub systolic: Option<i64>,
    #[validate(range(min = 40, max = 150))]
    pub diastolic: Option<i64>,
}

/// Full health record, visible to the member's owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: String,
    pub family_member_id: String,
    pub diagnosis: String,
    pub doctor_name: Option<String>,
    pub doctor_notes: Option<String>,
    pub medications: String,
    pub blood_pressure: Option<BloodPressure>,
    pub heart_rate: Option<i64>,
    pub visit_date: DateTime<Utc>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<HealthRecordRow> for HealthRecord {
    type Error = ApiError;

    fn try_from(row: HealthRecordRow) -> ApiResult<Self> {
        let images: Vec<String> = serde_json::from_str(&row.images).map_err(|e| {
            ApiError::Internal(format!("Corrupt image list on record {}: {}", row.id, e))
        })?;

        let blood_pressure = match (row.systolic, row.diastolic) {
            (None, None) => None,
            (systolic, diastolic) => Some(BloodPressure {
                systolic,
                diastolic,
            }),
        };

        Ok(Self {
            id: row.id,
            family_member_id: row.family_member_id,
            diagnosis: row.diagnosis,
            doctor_name: row.doctor_name,
            doctor_notes: row.doctor_notes,
            medications: row.medications,
            blood_pressure,
            heart_rate: row.heart_rate,
            visit_date: row.visit_date,
            follow_up_date: row.follow_up_date,
            images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Create health record request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateHealthRecordRequest {
    #[validate(length(min = 1, message = "Diagnosis is required"))]
    pub diagnosis: String,
    pub doctor_name: Option<String>,
    pub doctor_notes: Option<String>,
    pub medications: Option<String>,
    #[validate(nested)]
    pub blood_pressure: Option<BloodPressure>,
    #[validate(range(min = 40, max = 200))]
    pub heart_rate: Option<i64>,
    pub visit_date: DateTime<Utc>,
    pub follow_up_date: Option<DateTime<Utc>>,
    /// URLs of already-uploaded attachments
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial update of a health record; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateHealthRecordRequest {
    #[validate(length(min = 1, message = "Diagnosis cannot be empty"))]
    pub diagnosis: Option<String>,
    pub doctor_name: Option<String>,
    pub doctor_notes: Option<String>,
    pub medications: Option<String>,
    #[validate(nested)]
    pub blood_pressure: Option<BloodPressure>,
    #[validate(range(min = 40, max = 200))]
    pub heart_rate: Option<i64>,
    pub visit_date: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub images: Option<Vec<String>>,
}

impl UpdateHealthRecordRequest {
    /// Apply the supplied fields onto an existing record
    pub fn apply_to(self, record: &mut HealthRecord) {
        if let Some(diagnosis) = self.diagnosis {
            record.diagnosis = diagnosis;
        }
        if self.doctor_name.is_some() {
            record.doctor_name = self.doctor_name;
        }
        if self.doctor_notes.is_some() {
            record.doctor_notes = self.doctor_notes;
        }
        if let Some(medications) = self.medications {
            record.medications = medications;
        }
        if self.blood_pressure.is_some() {
            record.blood_pressure = self.blood_pressure;
        }
        if self.heart_rate.is_some() {
            record.heart_rate = self.heart_rate;
        }
        if let Some(visit_date) = self.visit_date {
            record.visit_date = visit_date;
        }
        if self.follow_up_date.is_some() {
            record.follow_up_date = self.follow_up_date;
        }
        if let Some(images) = self.images {
            record.images = images;
        }
    }
}

/// List health records response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListHealthRecordsResponse {
    pub health_records: Vec<HealthRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateHealthRecordRequest {
        CreateHealthRecordRequest {
            diagnosis: "Asthma".to_string(),
            doctor_name: Some("Dr. Okafor".to_string()),
            doctor_notes: None,
            medications: Some("Salbutamol".to_string()),
            blood_pressure: Some(BloodPressure {
                systolic: Some(120),
                diastolic: Some(80),
            }),
            heart_rate: Some(72),
            visit_date: Utc::now(),
            follow_up_date: None,
            images: vec![],
        }
    }

    #[test]
    fn test_vitals_ranges() {
        assert!(request().validate().is_ok());

        let mut req = request();
        req.heart_rate = Some(20);
        assert!(req.validate().is_err());

        let mut req = request();
        req.blood_pressure = Some(BloodPressure {
            systolic: Some(300),
            diastolic: Some(80),
        });
        assert!(req.validate().is_err());

        let mut req = request();
        req.diagnosis = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_ranges() {
        assert!(UpdateHealthRecordRequest::default().validate().is_ok());

        let req = UpdateHealthRecordRequest {
            heart_rate: Some(250),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateHealthRecordRequest {
            diagnosis: Some(String::new()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_row_conversion_rejects_corrupt_images() {
        let now = Utc::now();
        let row = HealthRecordRow {
            id: "rec".to_string(),
            family_member_id: "member".to_string(),
            diagnosis: "Flu".to_string(),
            doctor_name: None,
            doctor_notes: None,
            medications: String::new(),
            systolic: None,
            diastolic: None,
            heart_rate: None,
            visit_date: now,
            follow_up_date: None,
            images: "not json".to_string(),
            created_at: now,
            updated_at: now,
        };

        assert!(matches!(
            HealthRecord::try_from(row),
            Err(ApiError::Internal(_))
        ));
    }
}
