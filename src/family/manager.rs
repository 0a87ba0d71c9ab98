/// Family member manager backed by SQLite runtime queries
use crate::{
    db::models::FamilyMemberRow,
    error::{ApiError, ApiResult},
    family::{CreateFamilyMemberRequest, FamilyMember, UpdateFamilyMemberRequest},
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

const MEMBER_COLUMNS: &str = "id, user_id, name, relation, birth_date, gender, contact_info, address, created_at, updated_at";

/// Family member manager service
#[derive(Clone)]
pub struct FamilyManager {
    db: SqlitePool,
}

impl FamilyManager {
    /// Create a new family manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Register a new family member for an owner
    pub async fn create_member(
        &self,
        owner_id: &str,
        req: CreateFamilyMemberRequest,
    ) -> ApiResult<FamilyMember> {
        req.validate()?;

        let now = Utc::now();
        let row = FamilyMemberRow {
            id: Uuid::new_v4().to_string(),
            user_id: owner_id.to_string(),
            name: req.name.trim().to_string(),
            relation: req.relation.trim().to_string(),
            birth_date: req.birth_date,
            gender: req.gender,
            contact_info: req.contact_info,
            address: req.address,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO family_member (id, user_id, name, relation, birth_date, gender, contact_info, address, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&row.id)
        .bind(&row.user_id)
        .bind(&row.name)
        .bind(&row.relation)
        .bind(row.birth_date)
        .bind(&row.gender)
        .bind(&row.contact_info)
        .bind(&row.address)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.db)
        .await?;

        tracing::info!(member_id = %row.id, owner = %owner_id, "Family member created");

        Ok(row.into())
    }

    /// List all family members registered by an owner
    pub async fn list_members(&self, owner_id: &str) -> ApiResult<Vec<FamilyMember>> {
        let rows: Vec<FamilyMemberRow> = sqlx::query_as(&format!(
            "SELECT {} FROM family_member WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC",
            MEMBER_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(FamilyMember::from).collect())
    }

    /// Look up a family member by canonical id, regardless of owner
    pub async fn find_member(&self, member_id: &str) -> ApiResult<Option<FamilyMember>> {
        let row: Option<FamilyMemberRow> = sqlx::query_as(&format!(
            "SELECT {} FROM family_member WHERE id = ?1",
            MEMBER_COLUMNS
        ))
        .bind(member_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(FamilyMember::from))
    }

    /// Fetch a family member that belongs to `owner_id`
    ///
    /// Members owned by someone else are reported as missing so callers cannot
    /// discover other accounts' member ids.
    pub async fn get_owned_member(&self, owner_id: &str, member_id: &str) -> ApiResult<FamilyMember> {
        match self.find_member(member_id).await? {
            Some(member) if member.user_id == owner_id => Ok(member),
            Some(_) => {
                tracing::warn!(member_id = %member_id, owner = %owner_id, "Family member access by non-owner");
                Err(ApiError::NotFound("Family member not found".to_string()))
            }
            None => Err(ApiError::NotFound("Family member not found".to_string())),
        }
    }

    /// Update the supplied fields of an owned family member
    pub async fn update_member(
        &self,
        owner_id: &str,
        member_id: &str,
        req: UpdateFamilyMemberRequest,
    ) -> ApiResult<FamilyMember> {
        req.validate()?;

        let mut member = self.get_owned_member(owner_id, member_id).await?;
        req.apply_to(&mut member);
        member.updated_at = Utc::now();

        sqlx::query(
            "UPDATE family_member
             SET name = ?1, relation = ?2, birth_date = ?3, gender = ?4, contact_info = ?5, address = ?6, updated_at = ?7
             WHERE id = ?8 AND user_id = ?9",
        )
        .bind(&member.name)
        .bind(&member.relation)
        .bind(member.birth_date)
        .bind(&member.gender)
        .bind(&member.contact_info)
        .bind(&member.address)
        .bind(member.updated_at)
        .bind(&member.id)
        .bind(owner_id)
        .execute(&self.db)
        .await?;

        tracing::info!(member_id = %member.id, owner = %owner_id, "Family member updated");

        Ok(member)
    }

    /// Delete an owned family member along with its records and access tokens
    pub async fn delete_member(&self, owner_id: &str, member_id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM family_member WHERE id = ?1 AND user_id = ?2")
            .bind(member_id)
            .bind(owner_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Family member not found".to_string()));
        }

        tracing::info!(member_id = %member_id, owner = %owner_id, "Family member deleted");

        Ok(())
    }
}
