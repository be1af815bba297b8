use std::net::TcpListener;

use anyhow::Context;

use sqlx::PgPool;

use newsletter::app;
use newsletter::settings::Settings;
use newsletter::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    let subscriber = telemetry::create_subscriber(settings.app.log_filter(), std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let pool = PgPool::connect_with(settings.database.with_db())
        .await
        .context("Failed to connect to the database")?;
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let email_client = settings.email.client()?;
    let config = settings.subscription_config()?;

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    app::run(listener, pool, email_client, config)?
        .await
        .context("Failed to run app")
}
