use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use color_eyre::{eyre::WrapErr, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::{cli::ServeArgs, storage};

/// Address the browser client expects by default.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";

pub const LISTEN_ENV: &str = "SIGNBOOK_LISTEN";
pub const DATA_FILE_ENV: &str = "SIGNBOOK_DATA_FILE";

/// Service configuration loaded from `~/.config/signbook/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP server binds.
    pub listen: Option<SocketAddr>,
    /// Override for the CSV user table location.
    pub data_file: Option<PathBuf>,
    /// Single origin allowed by CORS; any origin when unset.
    pub cors_origin: Option<String>,
}

/// Effective settings after layering defaults, config file, environment and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub listen: SocketAddr,
    pub data_file: PathBuf,
    pub cors_origin: Option<String>,
}

impl Settings {
    pub fn resolve(config: &Config, args: &ServeArgs) -> Result<Self> {
        Self::resolve_with(config, args, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        config: &Config,
        args: &ServeArgs,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env_listen = env(LISTEN_ENV)
            .map(|raw| {
                raw.parse::<SocketAddr>()
                    .wrap_err_with(|| format!("invalid {LISTEN_ENV}: {raw}"))
            })
            .transpose()?;

        let listen = match args.listen.or(env_listen).or(config.listen) {
            Some(addr) => addr,
            None => DEFAULT_LISTEN.parse()?,
        };

        let data_file = match args
            .data_file
            .clone()
            .or_else(|| env(DATA_FILE_ENV).map(PathBuf::from))
            .or_else(|| config.data_file.clone())
        {
            Some(path) => path,
            None => storage::default_data_file()?,
        };

        Ok(Self {
            listen,
            data_file,
            cors_origin: config.cors_origin.clone(),
        })
    }
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("signbook").join("config.toml"))
}

/// Write the given config to the default path unless a file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_to_path_if_missing(config, &default_path()?)
}

fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}
