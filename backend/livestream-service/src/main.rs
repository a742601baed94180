use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use livestream_service::{
    config::Config,
    metrics,
    store::{postgres, EntityStore, PgEntityStore},
    CacheLayer, Services,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

struct OpsState {
    store: Arc<dyn EntityStore>,
    services: Services,
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

async fn ready() -> HttpResponse {
    HttpResponse::Ok().body("READY")
}

async fn warm_up(state: web::Data<OpsState>) -> HttpResponse {
    match state.services.caches.warm_up_all(state.store.as_ref()).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => {
            tracing::error!(error = %e, "Manual cache warm-up failed");
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("livestream_service=info,actix_web=info")),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting Livestream Service...");

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        http_port = config.http_port,
        "Configuration loaded"
    );

    let pool = Arc::new(postgres::create_pool(&config).await?);
    tracing::info!("Running database migrations...");
    postgres::run_migrations(&pool).await?;
    tracing::info!("Migrations completed successfully");

    let store: Arc<dyn EntityStore> = Arc::new(PgEntityStore::new(pool));
    let caches = Arc::new(CacheLayer::new());
    let services = Services::new(&config, store.clone(), caches.clone());

    // Traffic must not be accepted before the caches hold a snapshot.
    if config.warmup_on_start {
        let report = caches
            .warm_up_all(store.as_ref())
            .await
            .context("initial cache warm-up failed")?;
        tracing::info!(
            users = report.users,
            livestreams = report.livestreams,
            ng_words = report.ng_words,
            "Caches ready"
        );
    } else {
        tracing::warn!("Cache warm-up on start disabled; caches start empty");
    }

    let state = web::Data::new(OpsState {
        store,
        services,
    });

    let addr = format!("0.0.0.0:{}", config.http_port);
    tracing::info!("Ops server listening on {}", addr);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(health))
            .route("/ready", web::get().to(ready))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/admin/cache/warmup", web::post().to(warm_up))
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {addr}"))?
    .run();

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("HTTP server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
