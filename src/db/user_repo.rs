// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserDirectory,
    models::auth::RegisteredUser,
};

// O repositório de moradores, responsável por todas as interações com a tabela 'registered_users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn insert(&self, user: &RegisteredUser) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO registered_users
                (id, first_name, last_name, whatsapp, whatsapp_last4, email, registered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.whatsapp)
        .bind(&user.whatsapp_last4)
        .bind(user.email.as_deref())
        .bind(user.registered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Converte erro de violação de chave única em um erro mais amigável
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateUser;
                }
            }
            AppError::DatabaseError(e)
        })?;

        Ok(())
    }

    async fn conflicts_with(&self, whatsapp: &str, first_name: &str, whatsapp_last4: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM registered_users
                WHERE whatsapp = $1
                   OR (LOWER(first_name) = LOWER($2) AND whatsapp_last4 = $3)
            )
            "#,
        )
        .bind(whatsapp)
        .bind(first_name)
        .bind(whatsapp_last4)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_by_login(&self, first_name: &str, whatsapp_last4: &str) -> Result<Option<RegisteredUser>, AppError> {
        let user = sqlx::query_as::<_, RegisteredUser>(
            r#"
            SELECT id, first_name, last_name, whatsapp, whatsapp_last4, email, registered_at
            FROM registered_users
            WHERE LOWER(first_name) = LOWER($1) AND whatsapp_last4 = $2
            ORDER BY registered_at ASC
            LIMIT 1
            "#,
        )
        .bind(first_name)
        .bind(whatsapp_last4)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
