use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const KNOWN_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Runtime settings, layered from TOML files and `APP__*` environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (SQLite or Postgres)
    pub database_url: String,

    /// Listen address
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment name (development, staging, production)
    #[validate(length(min = 1))]
    pub environment: String,

    /// Minimum log level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Run pending migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Comma-separated CORS origin allowlist
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Opt-in to permissive CORS outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// Send Access-Control-Allow-Credentials on CORS responses
    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// Connection pool ceiling
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Connections the pool keeps warm
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Statement timeout in seconds; unset or 0 disables it
    #[serde(default)]
    pub db_statement_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            db_statement_timeout_secs: None,
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// True when the allowlist holds at least one non-blank origin.
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_deref()
            .is_some_and(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
    }

    /// Permissive CORS is acceptable in development or under an explicit override.
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        if self.should_allow_permissive_cors() || self.has_cors_allowed_origins() {
            return Ok(());
        }

        let mut err = ValidationError::new("cors_allowed_origins_required");
        err.message = Some(
            "Non-development environments need APP__CORS_ALLOWED_ORIGINS, or APP__CORS_ALLOW_ANY_ORIGIN=true to opt out".into(),
        );
        let mut errors = ValidationErrors::new();
        errors.add("cors_allowed_origins", err);
        Err(errors)
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration rejected: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    16
}

fn default_db_min_connections() -> u32 {
    2
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if KNOWN_LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        return Ok(());
    }
    let mut err = ValidationError::new("log_level");
    err.message = Some(format!("Expected one of: {}", KNOWN_LOG_LEVELS.join(", ")).into());
    Err(err)
}

/// Installs the global tracing subscriber. With `APP__OTEL_ENABLED` or an
/// `OTEL_EXPORTER_OTLP_ENDPOINT` set, spans are additionally exported over OTLP.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // RUST_LOG wins over the configured level
    let filter = match env::var("RUST_LOG") {
        Ok(spec) if !spec.trim().is_empty() => spec,
        _ => format!("supplierhub_api={},tower_http=debug", level),
    };

    let local_only = |directive: String| {
        if json {
            let _ = fmt().with_env_filter(directive).json().try_init();
        } else {
            let _ = fmt().with_env_filter(directive).try_init();
        }
    };

    let otel_flag =
        env::var("APP__OTEL_ENABLED").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    let otel_enabled = otel_flag || env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok();

    if !otel_enabled {
        local_only(filter);
        return;
    }

    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());
    let service_name =
        env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "supplierhub-api".to_string());

    let pipeline = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(
            sdktrace::config()
                .with_resource(Resource::new(vec![KeyValue::new(
                    "service.name",
                    service_name,
                )])),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio);

    let tracer = match pipeline {
        Ok(tracer) => tracer,
        Err(err) => {
            error!("OTLP pipeline install failed, logging locally only: {}", err);
            local_only(filter);
            return;
        }
    };

    let registry = tracing_subscriber::registry()
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(EnvFilter::new(filter));
    if json {
        let _ = registry.with(fmt::layer().json()).try_init();
    } else {
        let _ = registry.with(fmt::layer()).try_init();
    }
}

/// Loads the application configuration.
///
/// Precedence, lowest to highest: built-in defaults, `config/default.toml`,
/// `config/{RUN_ENV}.toml`, `config/docker.toml` (when `DOCKER` is set), then
/// `APP__*` environment variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // RUN_ENV and APP_ENV both select the profile, in that order
    let profile = ["RUN_ENV", "APP_ENV"]
        .iter()
        .find_map(|key| env::var(key).ok())
        .unwrap_or_else(|| DEFAULT_ENV.to_string());
    info!("Loading configuration profile: {}", profile);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "No '{}' directory; using built-in defaults and environment variables only",
            CONFIG_DIR
        );
    }

    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://supplierhub.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("auto_migrate", true)?
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{profile}")).required(false));

    if env::var("DOCKER").is_ok() {
        info!("DOCKER set; layering {}/docker.toml", CONFIG_DIR);
        builder =
            builder.add_source(File::with_name(&format!("{CONFIG_DIR}/docker")).required(false));
    }

    let raw = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;
    let app_config: AppConfig = raw.try_deserialize()?;

    app_config
        .validate()
        .and_then(|_| app_config.validate_additional_constraints())
        .map_err(|e| {
            error!("Configuration rejected: {:?}", e);
            AppConfigError::Validation(e)
        })?;

    info!("Configuration loaded");
    Ok(app_config)
}

#[cfg(test)]
mod settings_tests {
    use super::*;

    fn production_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            "production".into(),
        )
    }

    #[test]
    fn production_without_an_allowlist_is_rejected() {
        assert!(production_config()
            .validate_additional_constraints()
            .is_err());
    }

    #[test]
    fn the_any_origin_flag_lifts_the_allowlist_requirement() {
        let mut cfg = production_config();
        cfg.cors_allow_any_origin = true;

        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn an_explicit_allowlist_satisfies_production() {
        let mut cfg = production_config();
        cfg.cors_allowed_origins = Some("https://example.com".into());

        assert!(cfg.validate_additional_constraints().is_ok());
        assert!(cfg.has_cors_allowed_origins());
    }

    #[test]
    fn a_blank_allowlist_does_not_count() {
        let mut cfg = production_config();
        cfg.cors_allowed_origins = Some(" , ,".into());

        assert!(!cfg.has_cors_allowed_origins());
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn development_needs_no_allowlist() {
        let mut cfg = production_config();
        cfg.environment = "development".into();

        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn log_levels_outside_the_known_set_are_rejected() {
        assert!(validate_log_level("info").is_ok());
        assert!(validate_log_level("WARN").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }
}
