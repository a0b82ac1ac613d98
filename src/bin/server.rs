use std::{net::SocketAddr, sync::Arc};

use axum::routing::get;
use familypaw_server::{config::Config, migrator, routes};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    familypaw_server::telemetry::init_telemetry("familypaw-server");

    let config = Arc::new(Config::load()?);
    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let db = Database::connect(&config.database_url).await?;
    migrator::Migrator::up(&db, None).await?;
    familypaw_server::metrics::init_metrics(&db).await;

    let app = routes::app(db, config.clone())
        .layer(prometheus_layer)
        .route("/metrics", get(|| async move { metric_handle.render() }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
