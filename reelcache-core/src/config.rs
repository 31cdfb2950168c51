//! Runtime configuration, read from a dotenv file and the process environment.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_REDIS_USERNAME: &str = "default";
const DEFAULT_POSTER_DIR: &str = "Posters";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("required setting {0} is not set")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub redis: Option<RedisConfig>,
    pub posters: PosterConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Endpoint prefix, e.g. `http://www.omdbapi.com/?apikey=`.
    pub base_endpoint: String,
    /// Appended verbatim after the endpoint, e.g. `abcd1234&`.
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisConfig {
    Url(String),
    Parts {
        host: String,
        port: u16,
        username: String,
        password: Option<String>,
    },
}

impl RedisConfig {
    pub fn connection_url(&self) -> Result<String, ConfigLoadError> {
        match self {
            RedisConfig::Url(url) => Ok(url.clone()),
            RedisConfig::Parts {
                host,
                port,
                username,
                password,
            } => {
                let invalid = |reason: String| ConfigLoadError::InvalidVar {
                    name: "REDIS_HOST",
                    reason,
                };
                let mut url = Url::parse(&format!("redis://{host}:{port}"))
                    .map_err(|e| invalid(e.to_string()))?;
                if password.is_some() {
                    url.set_username(username)
                        .map_err(|_| invalid("host cannot carry credentials".into()))?;
                    url.set_password(password.as_deref())
                        .map_err(|_| invalid("host cannot carry credentials".into()))?;
                }
                Ok(url.to_string())
            }
        }
    }

    /// Connection target without credentials, for logging.
    pub fn redacted(&self) -> String {
        match self {
            RedisConfig::Url(url) => Url::parse(url)
                .map(|u| {
                    format!(
                        "{}:{}",
                        u.host_str().unwrap_or("?"),
                        u.port().unwrap_or(DEFAULT_REDIS_PORT)
                    )
                })
                .unwrap_or_else(|_| "<invalid url>".to_string()),
            RedisConfig::Parts { host, port, .. } => format!("{host}:{port}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PosterConfig {
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct FetchConfig {
    /// Fan-out limit per stage; `None` dispatches every key at once.
    pub concurrency: Option<NonZeroUsize>,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Config {
    /// Load `env_file` when it exists, then read the process environment.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigLoadError> {
        match env_file {
            Some(path) if path.exists() => {
                dotenvy::from_path(path)?;
                debug!(path = %path.display(), "loaded env file");
            }
            Some(path) => {
                debug!(path = %path.display(), "env file not found, using process environment");
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api = ApiConfig {
            base_endpoint: get("API").ok_or(ConfigLoadError::MissingVar("API"))?,
            api_key: get("API_KEY").ok_or(ConfigLoadError::MissingVar("API_KEY"))?,
        };

        let redis = match (get("REDIS_URL"), get("REDIS_HOST")) {
            (Some(url), _) => Some(RedisConfig::Url(url)),
            (None, Some(host)) => {
                let port = match get("REDIS_PORT") {
                    Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                        ConfigLoadError::InvalidVar {
                            name: "REDIS_PORT",
                            reason: e.to_string(),
                        }
                    })?,
                    None => DEFAULT_REDIS_PORT,
                };
                Some(RedisConfig::Parts {
                    host,
                    port,
                    username: get("REDIS_USERNAME")
                        .unwrap_or_else(|| DEFAULT_REDIS_USERNAME.to_string()),
                    password: get("REDIS_PASSWORD"),
                })
            }
            (None, None) => None,
        };

        let posters = PosterConfig {
            output_dir: get("POSTER_DIR")
                .unwrap_or_else(|| DEFAULT_POSTER_DIR.to_string())
                .into(),
        };

        let concurrency = match get("FETCH_CONCURRENCY") {
            Some(raw) => Some(raw.trim().parse::<NonZeroUsize>().map_err(|e| {
                ConfigLoadError::InvalidVar {
                    name: "FETCH_CONCURRENCY",
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        let timeout = match get("HTTP_TIMEOUT") {
            Some(raw) => Some(humantime::parse_duration(raw.trim()).map_err(|e| {
                ConfigLoadError::InvalidVar {
                    name: "HTTP_TIMEOUT",
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            api,
            redis,
            posters,
            fetch: FetchConfig {
                concurrency,
                timeout,
            },
        })
    }
}
