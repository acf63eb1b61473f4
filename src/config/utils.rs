#[cfg(test)]
#[path = "utils_test.rs"]
mod tests;

use chrono::Local;
use eyre::{Context, Result};
use log::LevelFilter;
use regex::{Captures, Regex};
use std::{io::Write, str::FromStr};

use super::{Configuration, LogConfig};

pub fn load_configuration(config_path: &str) -> Result<Configuration> {
    let config =
        std::fs::read_to_string(config_path).wrap_err(format!("reading {}", config_path))?;
    let mut config: Configuration = toml::from_str(&config).wrap_err("parsing configuration")?;

    if let Some(api_key) = config.backend.api_key.as_deref() {
        let api_key = expand_env(api_key).wrap_err("expanding backend api key")?;
        config.backend.api_key = if api_key.is_empty() {
            None
        } else {
            Some(api_key)
        };
    }
    Ok(config)
}

pub fn init_logger(config: &LogConfig) -> Result<()> {
    let target: Box<dyn std::io::Write + Send + 'static> = match config.file.as_ref() {
        Some(file) => {
            let path = resolve_path(&file.path)
                .wrap_err(format!("resolving log file path {}", file.path))?;
            init_parent_dir(&path)?;
            Box::new(
                std::fs::OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(file.append)
                    .truncate(!file.append)
                    .open(&path)
                    .wrap_err(format!("opening log file {}", path))?,
            )
        }
        None => Box::new(std::io::stderr()),
    };

    let raw_level = config.level.as_deref().unwrap_or("warn");
    let log_level = LevelFilter::from_str(raw_level)?;

    let mut builder = env_logger::Builder::new();

    for filter in config.filters.as_deref().unwrap_or_default() {
        let module_level = LevelFilter::from_str(filter.level.as_deref().unwrap_or(raw_level))
            .unwrap_or(log_level);
        builder.filter(filter.module.as_deref(), module_level);
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{}/{}:{} {} [{}] - {}",
                record.module_path().unwrap_or("unknown"),
                basename(record.file().unwrap_or("unknown")),
                record.line().unwrap_or(0),
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(target))
        .filter(None, log_level)
        .try_init()?;
    Ok(())
}

pub fn basename(path: &str) -> String {
    path.split('/').last().unwrap_or(path).to_string()
}

/// expand_env replaces `$VAR` and `${VAR}` references with the values of
/// the corresponding environment variables. Unset variables expand to an
/// empty string.
pub fn expand_env(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?").wrap_err("compiling regex")?;
    let ret = re.replace_all(input, |caps: &Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    });
    Ok(ret.into_owned())
}

/// resolve_path resolves the input path to an absolute path. If the
/// input path contains environment variables, it will expand them to their
/// values.
pub fn resolve_path(path: &str) -> Result<String> {
    let expanded = expand_env(path)?;
    let path =
        std::path::absolute(expanded.as_str()).wrap_err(format!("resolving path {}", expanded))?;
    Ok(path.to_string_lossy().to_string())
}

/// lookup_config_path trys to look up the config path at:
/// * $XDG_CONFIG_HOME/empathy/config.toml
/// * $HOME/.config/empathy/config.toml
/// * $HOME/.empathy.toml
pub fn lookup_config_path() -> Option<String> {
    let paths = &[
        format!(
            "{}/empathy/config.toml",
            env_or_current("XDG_CONFIG_HOME")
        ),
        format!("{}/.config/empathy/config.toml", env_or_current("HOME")),
        format!("{}/.empathy.toml", env_or_current("HOME")),
    ];

    for path in paths {
        if std::path::Path::new(path).exists() {
            return Some(path.to_string());
        }
    }
    None
}

fn env_or_current(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| ".".to_string())
}

pub(crate) fn init_parent_dir(path: &str) -> Result<()> {
    let dir = std::path::Path::new(path)
        .parent()
        .unwrap_or(std::path::Path::new("."));
    std::fs::create_dir_all(dir).wrap_err(format!("creating directory {}", dir.display()))?;
    Ok(())
}
