use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use server::metrics::{MetricsSink, NoopMetrics, PrometheusMetrics};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "splitledger={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let member_inclusion = settings.balances.member_inclusion;
    match settings.server {
        Some(server) => {
            tasks.spawn(async move {
                tracing::info!("Found server settings...");
                let db = match parse_database(&server.database).await {
                    Ok(db) => db,
                    Err(err) => {
                        tracing::error!("failed to initialize database: {err}");
                        return;
                    }
                };

                let engine = match engine::Engine::builder()
                    .database(db)
                    .member_inclusion(member_inclusion)
                    .build()
                    .await
                {
                    Ok(engine) => engine,
                    Err(err) => {
                        tracing::error!("failed to build engine from database: {err}");
                        return;
                    }
                };
                let state = server::ServerState::new(engine, metrics_sink(server.metrics));

                let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
                let addr = format!("{}:{}", bind, server.port);
                let listener = match tokio::net::TcpListener::bind(addr).await {
                    Ok(listener) => listener,
                    Err(err) => {
                        tracing::error!("failed to bind server listener: {err}");
                        return;
                    }
                };
                if let Err(err) = server::run_with_listener(state, listener).await {
                    tracing::error!("server failed: {err}");
                }
            });
        }
        None => tracing::warn!("no [server] settings found, nothing to run"),
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

fn metrics_sink(enabled: bool) -> Arc<dyn MetricsSink> {
    if !enabled {
        return Arc::new(NoopMetrics);
    }
    match PrometheusMetrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(err) => {
            tracing::warn!("failed to register metrics, continuing without them: {err}");
            Arc::new(NoopMetrics)
        }
    }
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
