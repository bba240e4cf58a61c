use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::DatabaseError;

/// Row of the `profiles` table: one per hosted-auth user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub role: Option<String>,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, email, role, full_name, created_at, updated_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Profile>, DatabaseError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, email, role, full_name, created_at, updated_at FROM profiles WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Insert or update the role of a user's profile
    pub async fn upsert_role(pool: &PgPool, id: Uuid, email: &str, role: &str) -> Result<Profile, DatabaseError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, email, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
                SET email = EXCLUDED.email,
                    role = EXCLUDED.role,
                    updated_at = now()
            RETURNING id, email, role, full_name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }
}
