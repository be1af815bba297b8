use uuid::Uuid;

use crate::domain::EmailAddress;

/// Registered user as seen by the subscription service
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug)]
pub struct NewUser {
    pub email: EmailAddress,
    pub full_name: String,
    pub password_hash: String,
}
