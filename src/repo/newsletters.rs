use sqlx::PgExecutor;

use uuid::Uuid;

use crate::model::{NewNewsletter, Newsletter};

macro_rules! newsletter_columns {
    () => {
        "id, title, slug, email, sender, subject_template, text_template, html_template"
    };
}

/// Repository for the `newsletters` table
pub struct NewsletterRepo;

impl NewsletterRepo {
    #[tracing::instrument(name = "Insert newsletter", skip(executor))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        new_newsletter: &NewNewsletter,
    ) -> sqlx::Result<Newsletter> {
        sqlx::query_as(concat!(
            "insert into newsletters(id, title, slug, email, sender) values ($1, $2, $3, $4, $5) returning ",
            newsletter_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(&new_newsletter.title)
        .bind(new_newsletter.slug.as_ref())
        .bind(new_newsletter.email.as_ref())
        .bind(&new_newsletter.sender)
        .fetch_one(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch newsletter by slug", skip(executor))]
    pub async fn fetch_by_slug<'con>(
        executor: impl PgExecutor<'con>,
        slug: &str,
    ) -> sqlx::Result<Option<Newsletter>> {
        sqlx::query_as(concat!(
            "select ",
            newsletter_columns!(),
            " from newsletters where slug=$1"
        ))
        .bind(slug)
        .fetch_optional(executor)
        .await
    }

    /// Override the confirmation email templates of a newsletter, `None` restores the default
    #[tracing::instrument(name = "Set newsletter templates", skip(executor, subject, text, html))]
    pub async fn set_templates<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        subject: Option<&str>,
        text: Option<&str>,
        html: Option<&str>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "update newsletters set subject_template=$2, text_template=$3, html_template=$4 where id=$1",
        )
        .bind(id)
        .bind(subject)
        .bind(text)
        .bind(html)
        .execute(executor)
        .await?;
        Ok(())
    }
}
