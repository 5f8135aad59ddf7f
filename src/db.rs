use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use metrics::{counter, gauge, histogram};
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::migrator::Migrator;

/// Alias kept so call sites stay agnostic about the pooling implementation.
pub type DbPool = DatabaseConnection;

/// Pool tuning knobs.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
    /// Not forwarded yet, sea-orm's ConnectOptions has no setter for it.
    pub statement_timeout: Option<Duration>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
            statement_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
            statement_timeout: cfg.db_statement_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Connects with default pool tuning. Suits tests and one-off tools.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    establish_connection_with_config(&DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    })
    .await
}

/// Connects using explicit pool tuning.
///
/// # Errors
/// Fails with `ServiceError::DatabaseError` when the pool cannot be brought up.
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!("Database settings: {:?}", config);

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(true);

    if config.statement_timeout.is_some() {
        warn!("statement_timeout is configured but ConnectOptions does not expose it yet");
    }

    gauge!("supplierhub_db.max_connections", config.max_connections as f64);
    info!(
        "Connecting to database, max_connections={}",
        config.max_connections
    );

    let pool = Database::connect(options).await.map_err(|e| {
        error!("Could not establish a database connection: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    info!("Database connection pool ready");
    Ok(pool)
}

/// Connects using the pool tuning carried in the application config.
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    establish_connection_with_config(&DbConfig::from(cfg)).await
}

/// Shared handle that wraps pool access with timing metrics and logs.
#[derive(Debug, Clone)]
pub struct DatabaseAccess {
    pool: Arc<DbPool>,
}

impl DatabaseAccess {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub fn get_pool(&self) -> &DbPool {
        &self.pool
    }

    /// Runs `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    pub async fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(&'a DatabaseTransaction) -> BoxFuture<'a, Result<T, E>> + Send,
        T: Send + 'static,
        E: From<DbErr> + Send + 'static + std::error::Error,
    {
        let transaction_id = Uuid::new_v4();
        let started = Instant::now();

        debug!(transaction_id = %transaction_id, "Opening transaction");
        counter!("supplierhub_db.transaction.started", 1);

        let result = self
            .pool
            .transaction(move |txn| {
                let work = f(txn);
                Box::pin(async move {
                    let outcome = work.await;
                    debug!(transaction_id = %transaction_id, "Transaction body finished");
                    outcome
                })
            })
            .await;

        let elapsed = started.elapsed();
        histogram!("supplierhub_db.transaction.duration", elapsed);

        match &result {
            Ok(_) => {
                counter!("supplierhub_db.transaction.committed", 1);
                debug!(transaction_id = %transaction_id, "Committed in {:?}", elapsed);
            }
            Err(_) => {
                counter!("supplierhub_db.transaction.rolled_back", 1);
                warn!(transaction_id = %transaction_id, "Rolled back after {:?}", elapsed);
            }
        }

        result.map_err(|e| match e {
            sea_orm::TransactionError::Connection(e) => E::from(e),
            sea_orm::TransactionError::Transaction(e) => e,
        })
    }

    /// Runs one named read or write, recording its duration and any failure.
    pub async fn execute<F, T>(&self, operation: &str, f: F) -> Result<T, ServiceError>
    where
        F: for<'a> FnOnce(&'a DbPool) -> BoxFuture<'a, Result<T, DbErr>> + Send,
        T: Send + 'static,
    {
        let started = Instant::now();
        debug!(operation = %operation, "Running database operation");

        let result = f(self.pool.as_ref()).await.map_err(|e| {
            error!(operation = %operation, error = %e, "Database operation errored");
            counter!("supplierhub_db.operation.error", 1, "operation" => operation.to_string());
            ServiceError::DatabaseError(e)
        });

        let elapsed = started.elapsed();
        histogram!("supplierhub_db.operation.duration", elapsed, "operation" => operation.to_string());

        if result.is_ok() {
            debug!(operation = %operation, duration = ?elapsed, "Database operation finished");
        }

        result
    }
}

/// Applies every pending migration.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Applying database migrations");
    let started = Instant::now();

    match Migrator::up(pool, None).await {
        Ok(()) => {
            info!("Migrations applied in {:?}", started.elapsed());
            Ok(())
        }
        Err(e) => {
            error!("Migrations failed after {:?}: {}", started.elapsed(), e);
            Err(ServiceError::MigrationError(e.to_string()))
        }
    }
}

/// Pings the database, recording round-trip latency.
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let started = Instant::now();

    match pool.ping().await {
        Ok(()) => {
            let elapsed = started.elapsed();
            debug!("Database ping succeeded in {:?}", elapsed);
            gauge!(
                "supplierhub_db.connection_latency",
                elapsed.as_millis() as f64
            );
            Ok(())
        }
        Err(e) => {
            error!("Database ping failed after {:?}: {}", started.elapsed(), e);
            counter!("supplierhub_db.connection_failures", 1);
            Err(ServiceError::DatabaseError(e))
        }
    }
}

/// Closes the pool. Call once the server has drained.
pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    info!("Draining and closing the database pool");
    pool.close().await.map_err(ServiceError::DatabaseError)
}
