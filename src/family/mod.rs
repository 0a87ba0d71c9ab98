/// Family member registry
///
/// Owners (authenticated accounts) register the people whose health data
/// they manage. Every other per-person resource hangs off a family member id.

mod manager;

pub use manager::FamilyManager;

use crate::{
    db::models::FamilyMemberRow,
    error::{ApiError, ApiResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Family member as returned to its owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
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

impl From<FamilyMemberRow> for FamilyMember {
    fn from(row: FamilyMemberRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            relation: row.relation,
            birth_date: row.birth_date,
            gender: row.gender,
            contact_info: row.contact_info,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Add family member request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFamilyMemberRequest {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = "not_blank", message = "Relation is required"))]
    pub relation: String,
    pub birth_date: Option<DateTime<Utc>>,
    #[validate(custom(function = "validate_gender"))]
    pub gender: Option<String>,
    pub contact_info: Option<String>,
    pub address: Option<String>,
}

/// Partial update of a family member; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateFamilyMemberRequest {
    #[validate(custom(function = "not_blank", message = "Name cannot be blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "not_blank", message = "Relation cannot be blank"))]
    pub relation: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    #[validate(custom(function = "validate_gender"))]
    pub gender: Option<String>,
    pub contact_info: Option<String>,
    pub address: Option<String>,
}

impl UpdateFamilyMemberRequest {
    /// Apply the supplied fields onto an existing member
    pub fn apply_to(self, member: &mut FamilyMember) {
        if let Some(name) = self.name {
            member.name = name.trim().to_string();
        }
        if let Some(relation) = self.relation {
            member.relation = relation.trim().to_string();
        }
        if self.birth_date.is_some() {
            member.birth_date = self.birth_date;
        }
        if self.gender.is_some() {
            member.gender = self.gender;
        }
        if self.contact_info.is_some() {
            member.contact_info = self.contact_info;
        }
        if self.address.is_some() {
            member.address = self.address;
        }
    }
}

/// List family members response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFamilyMembersResponse {
    pub members: Vec<FamilyMember>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_gender(gender: &str) -> Result<(), ValidationError> {
    match gender {
        "male" | "female" | "other" => Ok(()),
        _ => Err(ValidationError::new("invalid_gender")
            .with_message("Gender must be one of male, female, other".into())),
    }
}

/// Parse a family member identifier supplied by a client
///
/// Returns the canonical (lowercase, hyphenated) form used as the storage key.
pub fn parse_member_id(raw: &str) -> ApiResult<String> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| ApiError::Validation("Invalid family member ID format".to_string()))
}
