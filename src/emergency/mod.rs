/// Emergency access
///
/// An owner can mint a time-bounded bearer capability for one family member.
/// Anyone holding the resulting link can read a reduced view of that member's
/// health records until the token expires 24 hours after issuance. Tokens are
/// never consumed or revoked; they simply stop working once expired.
///
/// ```text
/// ISSUED --(redeemable any number of times)--> EXPIRED
/// ```

mod manager;
mod store;

pub use manager::EmergencyAccessManager;
pub use store::SqliteTokenStore;

use crate::{
    db::models::EmergencyAccessRow,
    error::ApiResult,
    health::HealthRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

/// Lifetime of an emergency access token
pub const ACCESS_TOKEN_TTL_HOURS: i64 = 24;

/// Bytes of OS randomness in each secret (hex encoded to twice as many chars)
pub const SECRET_BYTES: usize = 32;

/// Time-to-live applied at issuance
pub fn access_token_ttl() -> Duration {
    Duration::hours(ACCESS_TOKEN_TTL_HOURS)
}

/// Generate a fresh access secret from the operating system CSPRNG
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Persisted emergency access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyAccessToken {
    pub id: String,
    pub subject_id: String,
    pub secret: String,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl EmergencyAccessToken {
    /// Whether the token is past its expiry at `now`
    ///
    /// The expiry instant itself is still inside the validity window.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

impl From<EmergencyAccessRow> for EmergencyAccessToken {
    fn from(row: EmergencyAccessRow) -> Self {
        Self {
            id: row.id,
            subject_id: row.subject_id,
            secret: row.secret,
            issued_by: row.issued_by,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
        }
    }
}

/// Persistence for emergency access tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store a newly issued token
    async fn insert(&self, token: &EmergencyAccessToken) -> ApiResult<()>;

    /// Find the token matching both subject and secret exactly
    async fn find_by_subject_and_secret(
        &self,
        subject_id: &str,
        secret: &str,
    ) -> ApiResult<Option<EmergencyAccessToken>>;

    /// Remove tokens whose expiry is before `now`, returning how many were deleted
    async fn delete_expired(&self, now: DateTime<Utc>) -> ApiResult<u64>;
}

/// Response to a successful link issuance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLink {
    pub link: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity of the subject exposed through an emergency link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMember {
    pub id: String,
    pub name: String,
    pub relation: String,
}

/// Medically relevant projection of a health record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: String,
    pub diagnosis: String,
    pub medications: String,
    pub doctor_name: Option<String>,
    pub doctor_notes: Option<String>,
    pub visit_date: DateTime<Utc>,
    pub follow_up_date: Option<DateTime<Utc>>,
}

impl From<HealthRecord> for SnapshotRecord {
    fn from(record: HealthRecord) -> Self {
        Self {
            id: record.id,
            diagnosis: record.diagnosis,
            medications: record.medications,
            doctor_name: record.doctor_name,
            doctor_notes: record.doctor_notes,
            visit_date: record.visit_date,
            follow_up_date: record.follow_up_date,
        }
    }
}

/// Read-only view returned to an emergency link holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub family_member: SnapshotMember,
    pub health_records: Vec<SnapshotRecord>,
}
