/// Emergency access token issuance and redemption
use crate::{
    clock::Clock,
    emergency::{
        access_token_ttl, generate_secret, AccessLink, EmergencyAccessToken, HealthSnapshot,
        SnapshotMember, SnapshotRecord, TokenStore,
    },
    error::{ApiError, ApiResult},
    family::{parse_member_id, FamilyManager},
    health::HealthRecordManager,
    metrics::{self, RedemptionOutcome},
};
use std::sync::Arc;
use uuid::Uuid;

/// Emergency access manager service
#[derive(Clone)]
pub struct EmergencyAccessManager {
    store: Arc<dyn TokenStore>,
    family: Arc<FamilyManager>,
    health: Arc<HealthRecordManager>,
    clock: Arc<dyn Clock>,
    public_url: String,
}

impl EmergencyAccessManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        family: Arc<FamilyManager>,
        health: Arc<HealthRecordManager>,
        clock: Arc<dyn Clock>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            family,
            health,
            clock,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Issue a 24-hour emergency access link for a family member
    ///
    /// The member must exist and belong to `owner_id`. A member owned by
    /// another account is reported as not found.
    pub async fn issue_access_link(&self, subject_id: &str, owner_id: &str) -> ApiResult<AccessLink> {
        let subject_id = parse_member_id(subject_id)?;
        let subject = self.family.get_owned_member(owner_id, &subject_id).await?;

        let issued_at = self.clock.now();
        let token = EmergencyAccessToken {
            id: Uuid::new_v4().to_string(),
            subject_id: subject.id,
            secret: generate_secret(),
            issued_by: owner_id.to_string(),
            issued_at,
            expires_at: issued_at + access_token_ttl(),
        };

        self.store.insert(&token).await?;
        metrics::record_link_issued();

        tracing::info!(
            token_id = %token.id,
            subject_id = %token.subject_id,
            issued_by = %owner_id,
            expires_at = %token.expires_at,
            "Emergency access link issued"
        );

        Ok(AccessLink {
            link: self.link_for(&token),
            expires_at: token.expires_at,
        })
    }

    /// Redeem an emergency access link
    ///
    /// `subject_id` and `secret` are matched verbatim. A missing token and a
    /// token for a different subject are indistinguishable; expiry is only
    /// reported once a matching token has been found.
    pub async fn redeem(&self, subject_id: &str, secret: &str) -> ApiResult<HealthSnapshot> {
        let token = match self.store.find_by_subject_and_secret(subject_id, secret).await? {
            Some(token) => token,
            None => {
                metrics::record_redemption(RedemptionOutcome::NotFound);
                tracing::debug!(subject_id = %subject_id, "Emergency access token not found");
                return Err(ApiError::NotFound(
                    "Invalid or expired access token".to_string(),
                ));
            }
        };

        if token.is_expired_at(self.clock.now()) {
            metrics::record_redemption(RedemptionOutcome::Expired);
            tracing::info!(token_id = %token.id, "Expired emergency access token presented");
            return Err(ApiError::Forbidden("Access token has expired".to_string()));
        }

        let member = self
            .family
            .find_member(&token.subject_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Family member not found".to_string()))?;

        let health_records = self
            .health
            .list_for_member(&member.id)
            .await?
            .into_iter()
            .map(SnapshotRecord::from)
            .collect();

        metrics::record_redemption(RedemptionOutcome::Success);
        tracing::info!(token_id = %token.id, subject_id = %member.id, "Emergency access token redeemed");

        Ok(HealthSnapshot {
            family_member: SnapshotMember {
                id: member.id,
                name: member.name,
                relation: member.relation,
            },
            health_records,
        })
    }

    /// Delete tokens that expired before now
    pub async fn cleanup_expired(&self) -> ApiResult<u64> {
        let deleted = self.store.delete_expired(self.clock.now()).await?;

        if deleted > 0 {
            metrics::record_tokens_purged(deleted);
            tracing::info!(deleted, "Purged expired emergency access tokens");
        } else {
            tracing::debug!("Token cleanup: no expired emergency access tokens");
        }

        Ok(deleted)
    }

    fn link_for(&self, token: &EmergencyAccessToken) -> String {
        format!(
            "{}/family/{}/emergency-access/{}",
            self.public_url, token.subject_id, token.secret
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        db,
        emergency::{SqliteTokenStore, ACCESS_TOKEN_TTL_HOURS},
        family::{CreateFamilyMemberRequest, FamilyMember},
        health::CreateHealthRecordRequest,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use sqlx::SqlitePool;
    use std::collections::HashSet;

    struct Fixture {
        pool: SqlitePool,
        clock: ManualClock,
        family: Arc<FamilyManager>,
        health: Arc<HealthRecordManager>,
        manager: EmergencyAccessManager,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 14, 10, 0, 0).unwrap()
    }

    async fn fixture() -> Fixture {
        let pool = db::create_memory_pool().await.unwrap();
        let clock = ManualClock::new(t0());
        let family = Arc::new(FamilyManager::new(pool.clone()));
        let health = Arc::new(HealthRecordManager::new(pool.clone()));
        let manager = EmergencyAccessManager::new(
            Arc::new(SqliteTokenStore::new(pool.clone())),
            Arc::clone(&family),
            Arc::clone(&health),
            Arc::new(clock.clone()),
            "https://health.example.org/",
        );

        Fixture {
            pool,
            clock,
            family,
            health,
            manager,
        }
    }

    async fn add_member(fx: &Fixture, owner: &str, name: &str) -> FamilyMember {
        fx.family
            .create_member(
                owner,
                CreateFamilyMemberRequest {
                    name: name.to_string(),
                    relation: "father".to_string(),
                    birth_date: None,
                    gender: Some("male".to_string()),
                    contact_info: Some("+1 555 0100".to_string()),
                    address: Some("12 Elm St".to_string()),
                },
            )
            .await
            .unwrap()
    }

    async fn add_record(fx: &Fixture, member_id: &str, diagnosis: &str) {
        fx.health
            .create_record(
                member_id,
                CreateHealthRecordRequest {
                    diagnosis: diagnosis.to_string(),
                    doctor_name: Some("Dr. Moreau".to_string()),
                    doctor_notes: Some("Monitor closely".to_string()),
                    medications: Some("Metformin".to_string()),
                    blood_pressure: None,
                    heart_rate: Some(64),
                    visit_date: t0() - Duration::days(10),
                    follow_up_date: Some(t0() + Duration::days(20)),
                    images: vec!["https://cdn.example.org/ecg.png".to_string()],
                },
            )
            .await
            .unwrap();
    }

    fn secret_of(link: &str) -> &str {
        link.rsplit('/').next().unwrap()
    }

    async fn token_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM emergency_access")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_issue_builds_link_and_fixed_expiry() {
        let fx = fixture().await;
        let member = add_member(&fx, "owner-1", "Karl").await;

        let link = fx.manager.issue_access_link(&member.id, "owner-1").await.unwrap();

        let prefix = format!("https://health.example.org/family/{}/emergency-access/", member.id);
        assert!(link.link.starts_with(&prefix));
        assert_eq!(secret_of(&link.link).len(), 64);
        assert_eq!(link.expires_at, t0() + Duration::hours(ACCESS_TOKEN_TTL_HOURS));

        let (issued_at, expires_at): (DateTime<Utc>, DateTime<Utc>) =
            sqlx::query_as("SELECT issued_at, expires_at FROM emergency_access")
                .fetch_one(&fx.pool)
                .await
                .unwrap();
        assert_eq!(expires_at - issued_at, Duration::hours(24));
    }

    #[tokio::test]
    async fn test_issue_rejects_malformed_subject() {
        let fx = fixture().await;

        let result = fx.manager.issue_access_link("not-an-id", "owner-1").await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(token_count(&fx.pool).await, 0);
    }

    #[tokio::test]
    async fn test_issue_for_missing_subject_persists_nothing() {
        let fx = fixture().await;

        let result = fx
            .manager
            .issue_access_link(&Uuid::new_v4().to_string(), "owner-1")
            .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(token_count(&fx.pool).await, 0);
    }

    #[tokio::test]
    async fn test_issue_requires_ownership() {
        let fx = fixture().await;
        let member = add_member(&fx, "owner-1", "Karl").await;

        let result = fx.manager.issue_access_link(&member.id, "intruder").await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(token_count(&fx.pool).await, 0);
    }

    #[tokio::test]
    async fn test_redeem_returns_only_subject_data() {
        let fx = fixture().await;
        let karl = add_member(&fx, "owner-1", "Karl").await;
        let lena = add_member(&fx, "owner-1", "Lena").await;
        add_record(&fx, &karl.id, "Hypertension").await;
        add_record(&fx, &lena.id, "Eczema").await;

        let link = fx.manager.issue_access_link(&karl.id, "owner-1").await.unwrap();
        fx.clock.advance(Duration::hours(1));

        let snapshot = fx.manager.redeem(&karl.id, secret_of(&link.link)).await.unwrap();

        assert_eq!(
            snapshot.family_member,
            SnapshotMember {
                id: karl.id.clone(),
                name: "Karl".to_string(),
                relation: "father".to_string(),
            }
        );
        assert_eq!(snapshot.health_records.len(), 1);
        let record = &snapshot.health_records[0];
        assert_eq!(record.diagnosis, "Hypertension");
        assert_eq!(record.medications, "Metformin");
        assert_eq!(record.doctor_name.as_deref(), Some("Dr. Moreau"));
        assert_eq!(record.follow_up_date, Some(t0() + Duration::days(20)));
    }

    #[tokio::test]
    async fn test_redeem_with_wrong_subject_is_not_found() {
        let fx = fixture().await;
        let karl = add_member(&fx, "owner-1", "Karl").await;
        let lena = add_member(&fx, "owner-1", "Lena").await;

        let link = fx.manager.issue_access_link(&karl.id, "owner-1").await.unwrap();

        let result = fx.manager.redeem(&lena.id, secret_of(&link.link)).await;
        match result {
            Err(ApiError::NotFound(message)) => {
                assert_eq!(message, "Invalid or expired access token")
            }
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_redeem_with_unknown_secret_is_not_found() {
        let fx = fixture().await;
        let karl = add_member(&fx, "owner-1", "Karl").await;
        fx.manager.issue_access_link(&karl.id, "owner-1").await.unwrap();

        let result = fx.manager.redeem(&karl.id, &generate_secret()).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_redeem_after_expiry_is_forbidden_but_record_remains() {
        let fx = fixture().await;
        let karl = add_member(&fx, "owner-1", "Karl").await;
        let link = fx.manager.issue_access_link(&karl.id, "owner-1").await.unwrap();

        fx.clock.set(link.expires_at);
        assert!(fx.manager.redeem(&karl.id, secret_of(&link.link)).await.is_ok());

        fx.clock.advance(Duration::seconds(1));
        let result = fx.manager.redeem(&karl.id, secret_of(&link.link)).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
        assert_eq!(token_count(&fx.pool).await, 1);
    }

    #[tokio::test]
    async fn test_redeem_is_repeatable() {
        let fx = fixture().await;
        let karl = add_member(&fx, "owner-1", "Karl").await;
        add_record(&fx, &karl.id, "Hypertension").await;
        let link = fx.manager.issue_access_link(&karl.id, "owner-1").await.unwrap();

        let first = fx.manager.redeem(&karl.id, secret_of(&link.link)).await.unwrap();
        let second = fx.manager.redeem(&karl.id, secret_of(&link.link)).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_repeated_issuance_yields_independent_tokens() {
        let fx = fixture().await;
        let karl = add_member(&fx, "owner-1", "Karl").await;

        let mut secrets = HashSet::new();
        for _ in 0..10_000 {
            let link = fx.manager.issue_access_link(&karl.id, "owner-1").await.unwrap();
            secrets.insert(secret_of(&link.link).to_string());
        }

        assert_eq!(secrets.len(), 10_000);
        assert_eq!(token_count(&fx.pool).await, 10_000);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired_tokens() {
        let fx = fixture().await;
        let karl = add_member(&fx, "owner-1", "Karl").await;

        let old = fx.manager.issue_access_link(&karl.id, "owner-1").await.unwrap();
        fx.clock.advance(Duration::hours(20));
        let fresh = fx.manager.issue_access_link(&karl.id, "owner-1").await.unwrap();
        fx.clock.advance(Duration::hours(5));

        assert_eq!(fx.manager.cleanup_expired().await.unwrap(), 1);
        assert!(matches!(
            fx.manager.redeem(&karl.id, secret_of(&old.link)).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(fx.manager.redeem(&karl.id, secret_of(&fresh.link)).await.is_ok());
    }
}
