use anyhow::{Context, Result, bail};
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use crate::cli::Cli;
use crate::engine::context::Environment;

pub const DEFAULT_CONFIG: &str = "microshell.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MicroshellConfig {
    pub search_path: Option<bool>,
    pub env_file: Option<PathBuf>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Everything a run needs, after CLI flags, config file and env file are merged.
#[derive(Debug)]
pub struct Settings {
    pub search_path: bool,
    pub env: Environment,
}

/// Loads `path`, or `./microshell.toml` if it exists. Returns the config and
/// the directory relative paths inside it resolve against.
pub fn load_config(path: Option<&Path>, cwd: &Path) -> Result<(MicroshellConfig, PathBuf)> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                bail!("Config file not found: {:?}", p);
            }
            p.to_path_buf()
        }
        None => {
            let default = cwd.join(DEFAULT_CONFIG);
            if !default.exists() {
                return Ok((MicroshellConfig::default(), cwd.to_path_buf()));
            }
            default
        }
    };

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {:?}", config_path))?;
    let config: MicroshellConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {:?}", config_path))?;

    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.to_path_buf());
    info!("Loaded config from {:?}", config_path);
    Ok((config, base))
}

/// Picks the dotenv file: `--env-file`, then `env_file` from the config, then
/// `.env.$MICROSHELL_ENV` / `.env` next to the config if it exists.
fn env_file_path(cli_env_file: Option<&Path>, config: &MicroshellConfig, base: &Path) -> Option<PathBuf> {
    if let Some(p) = cli_env_file {
        return Some(p.to_path_buf());
    }
    if let Some(p) = &config.env_file {
        return Some(if p.is_absolute() { p.clone() } else { base.join(p) });
    }
    let filename = env::var("MICROSHELL_ENV")
        .map(|v| format!(".env.{}", v))
        .unwrap_or_else(|_| ".env".to_string());
    let implicit = base.join(filename);
    implicit.exists().then_some(implicit)
}

/// Layers the child environment: process env, then `[env]`, then the env file.
pub fn build_settings(
    cli_env_file: Option<&Path>,
    cli_search_path: bool,
    config: &MicroshellConfig,
    base: &Path,
    mut env: Environment,
) -> Result<Settings> {
    env.extend(config.env.iter().map(|(k, v)| (k.clone(), v.clone())));

    if let Some(env_path) = env_file_path(cli_env_file, config, base) {
        info!("Loading environment from: {:?}", env_path);
        let entries = dotenvy::from_path_iter(&env_path)
            .with_context(|| format!("Failed to open env file {:?}", env_path))?;
        for item in entries {
            let (key, val) = item.with_context(|| format!("Failed to parse env file {:?}", env_path))?;
            env.set(key, val);
        }
    }
    info!("Child environment has {} entries", env.len());

    Ok(Settings {
        search_path: cli_search_path || config.search_path.unwrap_or(false),
        env,
    })
}

pub fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let cwd = env::current_dir().context("Failed to read the current directory")?;
    let (config, base) = load_config(cli.config.as_deref(), &cwd)?;
    build_settings(cli.env_file.as_deref(), cli.search_path, &config, &base, Environment::inherit())
}
