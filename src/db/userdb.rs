// src/db/userdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{User, UserRole};

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error>;

    /// Customer ids bound to the given company. This set is the tenant
    /// boundary: every admin-side read intersects against it.
    async fn company_user_ids(&self, company_id: Uuid) -> Result<Vec<Uuid>, Error>;

    async fn user_has_role(&self, user_id: Uuid, role: UserRole) -> Result<bool, Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT * FROM users WHERE id = $1
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT * FROM users WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn company_user_ids(&self, company_id: Uuid) -> Result<Vec<Uuid>, Error> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM users
            WHERE assigned_company = $1 AND role = 'user'
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn user_has_role(&self, user_id: Uuid, role: UserRole) -> Result<bool, Error> {
        let found: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM users WHERE id = $1 AND role = $2
            "#,
        )
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }
}
