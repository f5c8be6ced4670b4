use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Startup and runtime failures of the adapters the binary wires together.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
    #[error("database unavailable: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("schema migration failed: {0}")]
    Migrate(#[from] MigrateError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
