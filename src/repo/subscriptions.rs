use sqlx::{PgConnection, PgExecutor};

use uuid::Uuid;

use crate::domain::VerificationToken;
use crate::error::{Error, InvalidReason, Result};
use crate::model::{Identity, NewSubscription, Subscription};

/// Columns selected into a `Subscription`, shared by every query returning one
macro_rules! subscription_columns {
    () => {
        "id, newsletter_id, user_id, email, name, created_at, verification_token, verified_at, active"
    };
}

/// Database-level twins of the duplicate check, see `migrations/`
const UNIQUE_USER_INDEX: &str = "subscriptions_newsletter_user_unique";
const UNIQUE_EMAIL_INDEX: &str = "subscriptions_newsletter_email_unique";
const IDENTITY_PRESENT_CHECK: &str = "subscriptions_identity_present";
const IDENTITY_EXCLUSIVE_CHECK: &str = "subscriptions_identity_exclusive";

/// Repository for the `subscriptions` table
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Validate and insert a new, inactive subscription with a fresh verification token.
    ///
    /// Fails with `DuplicateSubscription` if the identity is already subscribed,
    /// either from the pre-check or from the unique indexes when a concurrent
    /// insert wins the race.
    #[tracing::instrument(name = "Insert subscription", skip(conn))]
    pub async fn insert(conn: &mut PgConnection, new: &NewSubscription) -> Result<Subscription> {
        let existing =
            Self::fetch_by_identity(&mut *conn, new.newsletter_id, &new.identity).await?;
        if existing.is_some() {
            return Err(InvalidReason::DuplicateSubscription.into());
        }

        let token = VerificationToken::generate();

        sqlx::query_as(concat!(
            "insert into subscriptions(id, newsletter_id, user_id, email, name, verification_token) ",
            "values ($1, $2, $3, $4, $5, $6) returning ",
            subscription_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(new.newsletter_id)
        .bind(new.identity.user_id())
        .bind(new.identity.email().map(|email| email.as_ref()))
        .bind(new.name.as_ref().map(|name| name.as_ref()))
        .bind(token.as_ref())
        .fetch_one(&mut *conn)
        .await
        .map_err(constraint_error)
    }

    /// Write back the mutable state of an existing subscription
    #[tracing::instrument(name = "Save subscription", skip(executor, subscription), fields(id = %subscription.id))]
    pub async fn save<'con>(
        executor: impl PgExecutor<'con>,
        subscription: &Subscription,
    ) -> Result<()> {
        subscription.validate()?;

        let result =
            sqlx::query("update subscriptions set name=$2, verified_at=$3, active=$4 where id=$1")
                .bind(subscription.id)
                .bind(&subscription.name)
                .bind(subscription.verified_at)
                .bind(subscription.active)
                .execute(executor)
                .await
                .map_err(constraint_error)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Subscription"));
        }
        Ok(())
    }

    #[tracing::instrument(name = "Fetch subscription by identity", skip(executor))]
    pub async fn fetch_by_identity<'con>(
        executor: impl PgExecutor<'con>,
        newsletter_id: Uuid,
        identity: &Identity,
    ) -> sqlx::Result<Option<Subscription>> {
        match identity {
            Identity::User(user_id) => {
                sqlx::query_as(concat!(
                    "select ",
                    subscription_columns!(),
                    " from subscriptions where newsletter_id=$1 and user_id=$2"
                ))
                .bind(newsletter_id)
                .bind(user_id)
                .fetch_optional(executor)
                .await
            }
            Identity::Email(email) => {
                sqlx::query_as(concat!(
                    "select ",
                    subscription_columns!(),
                    " from subscriptions where newsletter_id=$1 and email=$2"
                ))
                .bind(newsletter_id)
                .bind(email.as_ref())
                .fetch_optional(executor)
                .await
            }
        }
    }

    /// Locks the row until the surrounding transaction ends, serializing verifications
    #[tracing::instrument(name = "Fetch subscription by token", skip(executor, token))]
    pub async fn fetch_by_token<'con>(
        executor: impl PgExecutor<'con>,
        newsletter_id: Uuid,
        token: &VerificationToken,
    ) -> sqlx::Result<Option<Subscription>> {
        sqlx::query_as(concat!(
            "select ",
            subscription_columns!(),
            " from subscriptions where newsletter_id=$1 and verification_token=$2 for update"
        ))
        .bind(newsletter_id)
        .bind(token.as_ref())
        .fetch_optional(executor)
        .await
    }
}

/// Map constraint violations back onto the validation taxonomy
fn constraint_error(error: sqlx::Error) -> Error {
    let constraint = match &error {
        sqlx::Error::Database(db_error) => db_error.constraint().map(str::to_owned),
        _ => None,
    };

    match constraint.as_deref() {
        Some(UNIQUE_USER_INDEX) | Some(UNIQUE_EMAIL_INDEX) => {
            tracing::warn!("Duplicate subscription rejected by the database");
            InvalidReason::DuplicateSubscription.into()
        }
        Some(IDENTITY_PRESENT_CHECK) => InvalidReason::IdentityMissing.into(),
        Some(IDENTITY_EXCLUSIVE_CHECK) => InvalidReason::IdentityConflict.into(),
        _ => Error::DatabaseError(error),
    }
}
