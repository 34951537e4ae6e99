use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quotebuilder::config::{Config, LogFormat};
use quotebuilder::middleware::{
    configure_extractors, BearerAuth, MySqlIdentityResolver, RequestId, SharedIdentityResolver,
};
use quotebuilder::modules::catalog::repositories::{MySqlClientDirectory, MySqlProductCatalog};
use quotebuilder::modules::health;
use quotebuilder::modules::quotes::controllers as quote_controllers;
use quotebuilder::modules::quotes::repositories::{MySqlQuoteRepository, MySqlRevisionRepository};
use quotebuilder::modules::quotes::services::{QuoteNumberGenerator, QuoteService};

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("quotebuilder={},actix_web=info", config.app.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match config.app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn cors(config: &Config) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(3600);

    match &config.app.cors_allowed_origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors,
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config);

    tracing::info!(
        env = %config.app.env,
        bind = %config.server.bind_address(),
        workers = config.server.workers,
        "Starting quote builder"
    );

    if config.is_production() && config.app.cors_allowed_origin.is_none() {
        tracing::warn!("CORS_ALLOWED_ORIGIN is unset; browser clients will be refused");
    }

    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
    }

    let quote_service = Arc::new(QuoteService::new(
        Arc::new(MySqlQuoteRepository::new(db_pool.clone())),
        Arc::new(MySqlRevisionRepository::new(db_pool.clone())),
        Arc::new(MySqlProductCatalog::new(db_pool.clone())),
        Arc::new(MySqlClientDirectory::new(db_pool.clone())),
        QuoteNumberGenerator::new(config.app.quote_number_prefix.clone()),
    ));
    let resolver: SharedIdentityResolver = Arc::new(MySqlIdentityResolver::new(db_pool.clone()));

    let bind_address = config.server.bind_address();
    let server_config = config.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(quote_service.clone()))
            .wrap(BearerAuth::new(resolver.clone()))
            .wrap(cors(&server_config))
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .configure(configure_extractors)
            .configure(health::configure)
            .configure(quote_controllers::configure)
    })
    .workers(config.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await.context("Server terminated with an error")?;
    Ok(())
}
