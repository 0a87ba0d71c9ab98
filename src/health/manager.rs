/// Health record manager backed by SQLite runtime queries
use crate::{
    db::models::HealthRecordRow,
    error::{ApiError, ApiResult},
    health::{CreateHealthRecordRequest, HealthRecord, UpdateHealthRecordRequest},
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

const RECORD_COLUMNS: &str = "id, family_member_id, diagnosis, doctor_name, doctor_notes, medications, systolic, diastolic, heart_rate, visit_date, follow_up_date, images, created_at, updated_at";

/// Health record manager service
#[derive(Clone)]
pub struct HealthRecordManager {
    db: SqlitePool,
}

impl HealthRecordManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Add a health record to a family member
    ///
    /// Callers are responsible for checking that the member exists and that
    /// the requester owns it.
    pub async fn create_record(
        &self,
        member_id: &str,
        req: CreateHealthRecordRequest,
    ) -> ApiResult<HealthRecord> {
        req.validate()?;

        let now = Utc::now();
        let images = serde_json::to_string(&req.images)
            .map_err(|e| ApiError::Internal(format!("Failed to encode image list: {}", e)))?;

        let row = HealthRecordRow {
            id: Uuid::new_v4().to_string(),
            family_member_id: member_id.to_string(),
            diagnosis: req.diagnosis,
            doctor_name: req.doctor_name,
            doctor_notes: req.doctor_notes,
            medications: req.medications.unwrap_or_default(),
            systolic: req.blood_pressure.and_then(|bp| bp.systolic),
            diastolic: req.blood_pressure.and_then(|bp| bp.diastolic),
            heart_rate: req.heart_rate,
            visit_date: req.visit_date,
            follow_up_date: req.follow_up_date,
            images,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO health_record (id, family_member_id, diagnosis, doctor_name, doctor_notes, medications,
                                        systolic, diastolic, heart_rate, visit_date, follow_up_date, images, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&row.id)
        .bind(&row.family_member_id)
        .bind(&row.diagnosis)
        .bind(&row.doctor_name)
        .bind(&row.doctor_notes)
        .bind(&row.medications)
        .bind(row.systolic)
        .bind(row.diastolic)
        .bind(row.heart_rate)
        .bind(row.visit_date)
        .bind(row.follow_up_date)
        .bind(&row.images)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.db)
        .await?;

        tracing::info!(record_id = %row.id, member_id = %member_id, "Health record created");

        HealthRecord::try_from(row)
    }

    /// All health records of one family member, oldest visit first
    pub async fn list_for_member(&self, member_id: &str) -> ApiResult<Vec<HealthRecord>> {
        let rows: Vec<HealthRecordRow> = sqlx::query_as(&format!(
            "SELECT {} FROM health_record WHERE family_member_id = ?1 ORDER BY visit_date ASC, rowid ASC",
            RECORD_COLUMNS
        ))
        .bind(member_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(HealthRecord::try_from).collect()
    }

    /// Fetch a single record belonging to a family member
    pub async fn get_record(&self, member_id: &str, record_id: &str) -> ApiResult<HealthRecord> {
        let row: Option<HealthRecordRow> = sqlx::query_as(&format!(
            "SELECT {} FROM health_record WHERE id = ?1 AND family_member_id = ?2",
            RECORD_COLUMNS
        ))
        .bind(record_id)
        .bind(member_id)
        .fetch_optional(&self.db)
        .await?;

        row.ok_or_else(|| ApiError::NotFound("Health record not found".to_string()))
            .and_then(HealthRecord::try_from)
    }

    /// Update the supplied fields of a record belonging to a family member
    pub async fn update_record(
        &self,
        member_id: &str,
        record_id: &str,
        req: UpdateHealthRecordRequest,
    ) -> ApiResult<HealthRecord> {
        req.validate()?;

        let mut record = self.get_record(member_id, record_id).await?;
        req.apply_to(&mut record);
        record.updated_at = Utc::now();

        let images = serde_json::to_string(&record.images)
            .map_err(|e| ApiError::Internal(format!("Failed to encode image list: {}", e)))?;

        sqlx::query(
            "UPDATE health_record
             SET diagnosis = ?1, doctor_name = ?2, doctor_notes = ?3, medications = ?4, systolic = ?5, diastolic = ?6,
                 heart_rate = ?7, visit_date = ?8, follow_up_date = ?9, images = ?10, updated_at = ?11
             WHERE id = ?12 AND family_member_id = ?13",
        )
        .bind(&record.diagnosis)
        .bind(&record.doctor_name)
        .bind(&record.doctor_notes)
        .bind(&record.medications)
        .bind(record.blood_pressure.and_then(|bp| bp.systolic))
        .bind(record.blood_pressure.and_then(|bp| bp.diastolic))
        .bind(record.heart_rate)
        .bind(record.visit_date)
        .bind(record.follow_up_date)
        .bind(&images)
        .bind(record.updated_at)
        .bind(&record.id)
        .bind(member_id)
        .execute(&self.db)
        .await?;

        tracing::info!(record_id = %record.id, member_id = %member_id, "Health record updated");

        Ok(record)
    }

    /// Delete a record belonging to a family member
    pub async fn delete_record(&self, member_id: &str, record_id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM health_record WHERE id = ?1 AND family_member_id = ?2")
            .bind(record_id)
            .bind(member_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Health record not found".to_string()));
        }

        tracing::info!(record_id = %record_id, member_id = %member_id, "Health record deleted");

        Ok(())
    }
}
