use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use brigada_core::AppError;
use tracing_subscriber::EnvFilter;

const MIN_GATEWAY_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_url: String,
    pub gateway_shared_secret: String,
    pub api_host: String,
    pub api_port: u16,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(env::args().nth(1).as_deref() == Some("migrate"), |name| {
            env::var(name).ok()
        })
    }

    fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let database_url = required_non_empty(&lookup, "DATABASE_URL")?;
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());

        let gateway_shared_secret = required_non_empty(&lookup, "GATEWAY_SHARED_SECRET")?;
        if gateway_shared_secret.len() < MIN_GATEWAY_SECRET_LENGTH {
            return Err(AppError::Validation(format!(
                "GATEWAY_SHARED_SECRET must be at least {MIN_GATEWAY_SECRET_LENGTH} characters"
            )));
        }

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "DATABASE_MAX_CONNECTIONS must be a positive integer, got '{value}'"
                    ))
                })?,
            None => 10,
        };

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        Ok(Self {
            migrate_only,
            database_url,
            database_max_connections,
            frontend_url,
            gateway_shared_secret,
            api_host,
            api_port,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
