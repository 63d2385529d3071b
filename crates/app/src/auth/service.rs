//! Auth service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::{
        ApiTokenHasher, ApiTokenVersion, AuthServiceError, IssuedApiToken,
        Principal, build_verifier_input, format_api_token, generate_api_token_secret,
        models::NewApiToken, parse_api_token, repository::PgAuthRepository,
    },
    domain::users::records::UserUuid,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    repository: PgAuthRepository,
    hasher: ApiTokenHasher,
}

impl PgAuthService {
    #[must_use]
    pub fn new(pool: PgPool, hasher: ApiTokenHasher) -> Self {
        Self {
            repository: PgAuthRepository::new(pool),
            hasher,
        }
    }

    /// Issue a new API token for the given user.
    ///
    /// The raw token is only ever returned here; storage keeps the verifier.
    pub async fn issue_api_token(
        &self,
        user_uuid: UserUuid,
    ) -> Result<IssuedApiToken, AuthServiceError> {
        let token_uuid = Uuid::now_v7();
        let version = ApiTokenVersion::V1;
        let secret = generate_api_token_secret();
        let token = format_api_token(token_uuid, version, &secret);

        let verifier_input = build_verifier_input(&token_uuid, version, &user_uuid, &secret);

        let metadata = self
            .repository
            .create_api_token(&NewApiToken {
                uuid: token_uuid,
                user_uuid,
                version,
                token_hash: self.hasher.hmac(&verifier_input),
            })
            .await?;

        Ok(IssuedApiToken { token, metadata })
    }

    /// Revoke a token by UUID. Returns `true` if the token was active.
    pub async fn revoke_api_token(&self, token_uuid: Uuid) -> Result<bool, AuthServiceError> {
        self.repository
            .revoke_api_token(token_uuid)
            .await
            .map(|record| record.is_some())
            .map_err(AuthServiceError::from)
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError> {
        let parsed_token = parse_api_token(bearer_token).map_err(|_ignored| AuthServiceError::NotFound)?;

        let token = self
            .repository
            .find_active_api_token_by_uuid(parsed_token.token_uuid, parsed_token.version)
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        let verifier_input = build_verifier_input(
            &parsed_token.token_uuid,
            parsed_token.version,
            &token.user_uuid,
            &parsed_token.secret,
        );

        if !self.hasher.verify(&verifier_input, &token.token_hash) {
            return Err(AuthServiceError::NotFound);
        }

        // Best-effort metadata update; auth success should not depend on this write.
        if let Err(error) = self
            .repository
            .touch_api_token_last_used(parsed_token.token_uuid)
            .await
        {
            debug!(%error, "failed to record api token use");
        }

        Ok(Principal {
            user: token.user_uuid,
            is_admin: token.is_admin,
        })
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a raw bearer token into the calling principal.
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::{TestContext, helpers::create_user};

    use super::*;

    fn lazy_service() -> TestResult<PgAuthService> {
        let pool = PgPool::connect_lazy("postgres://localhost/unused")?;

        Ok(PgAuthService::new(pool, ApiTokenHasher::new("key")?))
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_without_lookup() -> TestResult {
        let service = lazy_service()?;

        let result = service.authenticate_bearer("not-a-token").await;

        assert!(
            matches!(result, Err(AuthServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn issued_token_authenticates_as_its_owner() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "owner@example.com", true).await;

        let issued = ctx.auth.issue_api_token(user.uuid).await?;
        let principal = ctx.auth.authenticate_bearer(&issued.token).await?;

        assert_eq!(principal.user, user.uuid);
        assert!(principal.is_admin);
        assert!(!issued.metadata.is_revoked());

        Ok(())
    }

    #[tokio::test]
    async fn tampered_secret_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "tamper@example.com", false).await;

        let issued = ctx.auth.issue_api_token(user.uuid).await?;

        let (id, secret) = issued.token.split_once('.').ok_or("token has no secret")?;
        let flipped = if secret.starts_with('0') { "1" } else { "0" };
        let tampered = format!("{id}.{flipped}{}", &secret[1..]);

        let result = ctx.auth.authenticate_bearer(&tampered).await;

        assert!(
            matches!(result, Err(AuthServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "revoked@example.com", false).await;

        let issued = ctx.auth.issue_api_token(user.uuid).await?;

        assert!(ctx.auth.revoke_api_token(issued.metadata.uuid).await?);
        assert!(!ctx.auth.revoke_api_token(issued.metadata.uuid).await?);

        let result = ctx.auth.authenticate_bearer(&issued.token).await;

        assert!(
            matches!(result, Err(AuthServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn issuing_for_unknown_user_fails() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx.auth.issue_api_token(UserUuid::new()).await;

        assert!(
            matches!(result, Err(AuthServiceError::UnknownUser)),
            "expected UnknownUser, got {result:?}"
        );

        Ok(())
    }
}
