use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::HostedConfig;
use crate::database::{DatabaseManager, Profile};

use super::{ProfileError, ProfileRoleSource};

/// Profile roles read straight from the `profiles` table
pub struct PgProfileRoles {
    database: Arc<DatabaseManager>,
}

impl PgProfileRoles {
    pub fn new(database: Arc<DatabaseManager>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl ProfileRoleSource for PgProfileRoles {
    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>, ProfileError> {
        // Local fallback ids ("local-<role>") never have a profile row
        let Ok(id) = Uuid::parse_str(user_id) else {
            return Ok(None);
        };

        let pool = self.database.pool().await?;
        let profile = Profile::find_by_id(&pool, id).await?;
        Ok(profile.and_then(|p| p.role))
    }
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    role: Option<String>,
}

/// Profile roles fetched through the hosted database's REST interface,
/// authorised as the signed-in user.
pub struct RestProfileRoles {
    url: String,
    anon_key: String,
    access_token: Option<String>,
    http: reqwest::Client,
}

impl RestProfileRoles {
    pub fn new(config: &HostedConfig, access_token: Option<String>) -> Result<Self, ProfileError> {
        Ok(Self {
            url: format!("{}/rest/v1/profiles", config.require_url()?.trim_end_matches('/')),
            anon_key: config.require_anon_key()?.to_string(),
            access_token,
            http: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl ProfileRoleSource for RestProfileRoles {
    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>, ProfileError> {
        let filter = format!("eq.{}", user_id);
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);

        let response = self
            .http
            .get(&self.url)
            .query(&[("id", filter.as_str()), ("select", "role")])
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProfileError::Status(response.status().as_u16()));
        }

        let rows: Vec<RoleRow> = response.json().await?;
        Ok(rows.into_iter().next().and_then(|row| row.role))
    }
}

/// Source with no stored profiles, for clients without a hosted database
pub struct NoProfiles;

#[async_trait]
impl ProfileRoleSource for NoProfiles {
    async fn fetch_role(&self, _user_id: &str) -> Result<Option<String>, ProfileError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::testing::provider;

    #[tokio::test]
    async fn local_ids_skip_the_database() {
        // Unconfigured database would error if it were touched
        let source = PgProfileRoles::new(Arc::new(DatabaseManager::new(DatabaseConfig::default())));
        assert_eq!(source.fetch_role("local-hr-manager").await.unwrap(), None);

        let err = source
            .fetch_role("5b0c1f0e-8f2a-4a55-9d4e-3b8b6c8f9a10")
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::Database(_)));
    }

    #[test]
    fn rest_source_requires_hosted_config() {
        assert!(matches!(
            RestProfileRoles::new(&HostedConfig::default(), None),
            Err(ProfileError::Config(_))
        ));
    }

    #[tokio::test]
    async fn rest_source_reads_first_row_role() {
        let url = provider::serve().await;
        let source = RestProfileRoles::new(&provider::config(&url), Some("fresh-access".to_string())).unwrap();

        assert_eq!(
            source.fetch_role("profile-hr").await.unwrap().as_deref(),
            Some("HR Manager")
        );
        assert_eq!(source.fetch_role("profile-unset").await.unwrap(), None);
        assert_eq!(source.fetch_role("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rest_source_surfaces_error_status() {
        let url = provider::serve().await;
        let source = RestProfileRoles::new(&provider::config(&url), None).unwrap();

        let err = source.fetch_role("profile-broken").await.unwrap_err();
        assert!(matches!(err, ProfileError::Status(503)), "got {:?}", err);
    }
}
