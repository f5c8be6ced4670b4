use std::{process, sync::Arc, time::Duration};

use catalog::{
    application::{
        error::AppError,
        products::ProductService,
        repos::{ProductsRepo, StockMovementsRepo},
    },
    cache::{CacheBackend, CacheClient, CachePolicy, MemoryCache, RedisCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let cache = build_cache_policy(&settings.cache).await;

    let products_repo: Arc<dyn ProductsRepo> = repositories.clone();
    let movements_repo: Arc<dyn StockMovementsRepo> = repositories.clone();
    let products = Arc::new(ProductService::new(
        products_repo,
        movements_repo,
        cache,
        settings.product_service(),
    ));

    let state = ApiState {
        products,
        health: repositories,
    };

    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = database_url(&settings)?;
    let pool = PostgresRepositories::connect(database_url, 1)
        .await
        .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    info!(target = "catalog::migrate", "migrations applied");
    Ok(())
}

fn database_url(settings: &config::Settings) -> Result<&str, AppError> {
    settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = database_url(settings)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

/// Pick the cache backend. A Redis server that cannot be reached at startup
/// leaves the service running uncached rather than refusing to boot.
async fn build_cache_policy(cache: &catalog::cache::CacheConfig) -> CachePolicy {
    if !cache.enabled {
        info!(target = "catalog::cache", "product cache disabled by configuration");
        return CachePolicy::disabled();
    }

    let client: Arc<dyn CacheClient> = match cache.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new(cache)),
        CacheBackend::Redis => match connect_redis(&cache.redis_url).await {
            Ok(redis) => Arc::new(redis),
            Err(err) => {
                warn!(
                    target = "catalog::cache",
                    error = %err,
                    "redis unavailable, serving without cache"
                );
                return CachePolicy::disabled();
            }
        },
    };

    info!(
        target = "catalog::cache",
        backend = cache.backend.as_str(),
        entity_ttl_secs = cache.entity_ttl.as_secs(),
        list_ttl_secs = cache.list_ttl.as_secs(),
        "product cache enabled"
    );
    CachePolicy::new(client, cache)
}

async fn connect_redis(url: &str) -> Result<RedisCache, catalog::cache::CacheError> {
    let redis = RedisCache::connect(url).await?;
    redis.ping().await?;
    Ok(redis)
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "catalog::http",
        addr = %settings.server.addr,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "catalog::http", "server stopped");
    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target = "catalog::http", error = %err, "failed to listen for shutdown signal");
        return;
    }

    info!(
        target = "catalog::http",
        grace_secs = grace.as_secs(),
        "shutdown requested, draining connections"
    );

    // Hard stop if in-flight requests outlive the grace period.
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target = "catalog::http", "graceful shutdown timed out");
        process::exit(1);
    });
}
