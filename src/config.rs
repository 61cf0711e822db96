// src/config.rs

use crate::errors::ServerError;
use std::net::SocketAddr;

/// Which record store the server talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Rest { url: String, api_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub workers: usize,
    pub db_path: String,
    pub schema_path: String,
    pub blob_dir: String,
    pub backend: Backend,
}

impl AppConfig {
    /// Reads `OFERTAS_*` variables, loading a `.env` file first if there is one.
    pub fn from_env() -> Result<Self, ServerError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ServerError::BadRequest(format!("Unreadable .env file: {e}")));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_raw = var("OFERTAS_BIND", "127.0.0.1:3000");
        let bind = bind_raw
            .parse()
            .map_err(|e| invalid("OFERTAS_BIND", &bind_raw, e))?;

        let workers_raw = var("OFERTAS_WORKERS", "8");
        let workers = match workers_raw.parse::<usize>() {
            Ok(0) => return Err(invalid("OFERTAS_WORKERS", &workers_raw, "must be positive")),
            Ok(n) => n,
            Err(e) => return Err(invalid("OFERTAS_WORKERS", &workers_raw, e)),
        };

        let backend = match var("OFERTAS_BACKEND", "sqlite").to_lowercase().as_str() {
            "sqlite" => Backend::Sqlite,
            "rest" => {
                let url = var("OFERTAS_REST_URL", "");
                if url.is_empty() {
                    return Err(invalid("OFERTAS_REST_URL", "", "required by the rest backend"));
                }
                Backend::Rest {
                    url,
                    api_key: var("OFERTAS_REST_KEY", ""),
                }
            }
            other => return Err(invalid("OFERTAS_BACKEND", other, "expected sqlite or rest")),
        };

        Ok(Self {
            bind,
            workers,
            db_path: var("OFERTAS_DB", "ofertas.sqlite3"),
            schema_path: var("OFERTAS_SCHEMA", "sql/schema.sql"),
            blob_dir: var("OFERTAS_BLOB_DIR", "documents"),
            backend,
        })
    }
}

fn invalid(key: &str, value: &str, reason: impl std::fmt::Display) -> ServerError {
    ServerError::BadRequest(format!("{key}={value:?}: {reason}"))
}
