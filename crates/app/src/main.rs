use migration::{Migrator, MigratorTrait};
use server::{NotificationSettings, ServerState, TokenSigner};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "slots_tracker={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::info!("No server settings, nothing to run");
        return Ok(());
    };
    let Some(auth) = settings.auth else {
        return Err("missing [auth] settings, a token secret is required".into());
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    let ttl = auth.token_ttl()?;
    let mut state = ServerState::new(engine, TokenSigner::new(auth.secret, ttl));
    if let Some(notifications) = settings.notifications {
        state = state.notifications(NotificationSettings {
            collection: notifications.collection,
            dry_run: notifications.dry_run,
        });
    }

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind, server.port)).await?;
    server::run_with_listener(state, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
