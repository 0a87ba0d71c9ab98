/// Database row models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Family member record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FamilyMemberRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub relation: String,
    pub birth_date: Option<DateTime<Utc>>,
    pub gender: Option<String>,
    pub contact_info: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Health record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HealthRecordRow {
    pub id: String,
    pub family_member_id: String,
    pub diagnosis: String,
    pub doctor_name: Option<String>,
    pub doctor_notes: Option<String>,
    pub medications: String,
    pub systolic: Option<i64>,
    pub diastolic: Option<i64>,
    pub heart_rate: Option<i64>,
    pub visit_date: DateTime<Utc>,
    pub follow_up_date: Option<DateTime<Utc>>,
    /// JSON array of image URLs
    pub images: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Emergency access token record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EmergencyAccessRow {
    pub id: String,
    pub subject_id: String,
    pub secret: String,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
