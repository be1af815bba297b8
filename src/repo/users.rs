use secrecy::Secret;

use sqlx::PgExecutor;

use uuid::Uuid;

use crate::domain::EmailAddress;
use crate::model::{NewUser, User};

#[derive(Debug)]
pub struct UserCredentials {
    pub id: Uuid,
    pub password_hash: Secret<String>,
}

/// Repository for the `users` table
pub struct UsersRepo;

impl UsersRepo {
    #[tracing::instrument("Insert a new user record", skip(executor))]
    pub async fn insert<'conn>(
        executor: impl PgExecutor<'conn>,
        new_user: &NewUser,
    ) -> sqlx::Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "insert into users(id, email, full_name, password_hash) values ($1, $2, $3, $4) returning id",
        )
        .bind(Uuid::new_v4())
        .bind(new_user.email.as_ref())
        .bind(&new_user.full_name)
        .bind(&new_user.password_hash)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    #[tracing::instrument("Fetch a user by id", skip(executor))]
    pub async fn fetch_by_id<'conn>(
        executor: impl PgExecutor<'conn>,
        id: Uuid,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as("select id, email, full_name from users where id=$1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument("Fetch user credentials by email", skip(executor))]
    pub async fn fetch_credentials_by_email<'conn>(
        executor: impl PgExecutor<'conn>,
        email: &EmailAddress,
    ) -> sqlx::Result<Option<UserCredentials>> {
        let row: Option<(Uuid, String)> =
            sqlx::query_as("select id, password_hash from users where email=$1")
                .bind(email.as_ref())
                .fetch_optional(executor)
                .await?;

        Ok(row.map(|(id, password_hash)| UserCredentials {
            id,
            password_hash: Secret::new(password_hash),
        }))
    }
}
