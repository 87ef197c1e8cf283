use std::{fs, path::PathBuf, time::Duration};

use artframe_core::AssetConfig;
use thiserror::Error;

use super::{
    models::{
        Config, ConfigMetadata, DEFAULT_CACHE_ROOT, DEFAULT_HOST, DEFAULT_PORT,
        ServerConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["artframe.toml", "config/artframe.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env` (if any), then resolve against the process environment.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Resolve against an explicit environment snapshot. Precedence is
    /// environment, then file, then built-in defaults.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, warnings) = compose_config(file_config, env, config_path)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                path
            }
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if config_path.is_none() {
        warnings.push_with_hint(
            "No artframe.toml detected; using environment variables and defaults",
            "Create artframe.toml or pass --config to customise the daemon",
        );
    }

    let FileConfig {
        server: file_server,
        catalog: file_catalog,
        cache: file_cache,
        prefetch: file_prefetch,
        http: file_http,
    } = file_config.unwrap_or_default();
    let defaults = AssetConfig::default();

    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
    };

    let asset = AssetConfig {
        catalog_url: env
            .catalog_url
            .or(file_catalog.url)
            .unwrap_or(defaults.catalog_url),
        base_url: env
            .base_url
            .or(file_catalog.base_url)
            .unwrap_or(defaults.base_url),
        image_size_suffix: env
            .image_size_suffix
            .or(file_catalog.image_size_suffix)
            .unwrap_or(defaults.image_size_suffix),
        metadata_expiry: resolve_duration(
            ("ARTFRAME_METADATA_EXPIRY", env.metadata_expiry),
            ("catalog.expiry", file_catalog.expiry),
            defaults.metadata_expiry,
        )?,
        prefetch_window: env
            .prefetch_window
            .or(file_prefetch.window)
            .unwrap_or(defaults.prefetch_window),
        memory_cache_capacity: env
            .memory_cache_capacity
            .or(file_cache.memory_capacity)
            .unwrap_or(defaults.memory_cache_capacity),
        request_timeout: resolve_duration(
            ("ARTFRAME_REQUEST_TIMEOUT", env.request_timeout),
            ("http.request_timeout", file_http.request_timeout),
            defaults.request_timeout,
        )?,
        http_timeout: resolve_duration(
            ("ARTFRAME_HTTP_TIMEOUT", env.http_timeout),
            ("http.client_timeout", file_http.client_timeout),
            defaults.http_timeout,
        )?,
    };

    let config = Config {
        server,
        cache_root: env
            .cache_root
            .or(file_cache.root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_ROOT)),
        warm_up: env.warm_up.or(file_prefetch.warm_up).unwrap_or(true),
        asset,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    };

    warnings.extend(validation::apply_guard_rails(&config)?);
    Ok((config, warnings))
}

/// Pick the environment value, then the file value, then the default, and
/// parse whichever won.
fn resolve_duration(
    env: (&'static str, Option<String>),
    file: (&'static str, Option<String>),
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    let (key, raw) = match (env, file) {
        ((key, Some(raw)), _) | (_, (key, Some(raw))) => (key, raw),
        _ => return Ok(default),
    };

    humantime::parse_duration(raw.trim()).map_err(|source| {
        ConfigLoadError::InvalidDuration {
            key,
            value: raw,
            source,
        }
    })
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid duration for {key}: '{value}'")]
    InvalidDuration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
