use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::email::Keywords;
use crate::error::Error;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Root directory of the default mailbox.
    pub mail_root: Option<String>,
    pub keywords: Keywords,
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("imaging_mail"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config, Error> {
    toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
}

/// Loads `explicit` if given (it must exist), else the default config file
/// when there is one, else built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, Error> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Ok(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };
    let s = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    parse_config(&s).map_err(|e| match e {
        Error::Config(reason) => Error::Config(format!("{}: {reason}", path.display())),
        other => other,
    })
}

fn expand_home(p: &str) -> PathBuf {
    if let Some(rest) = p.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(p)
}

/// Command line (or environment) first, then the config file, then `~/Maildir`.
pub fn resolve_mail_root(cli: Option<&Path>, cfg: &Config) -> Result<PathBuf, Error> {
    if let Some(p) = cli {
        return Ok(p.to_path_buf());
    }
    if let Some(p) = &cfg.mail_root {
        return Ok(expand_home(p));
    }
    dirs::home_dir()
        .map(|home| home.join("Maildir"))
        .ok_or_else(|| Error::Config("no mail_root configured and no home directory".into()))
}

/// Keyword flags given on the command line override the config file.
pub fn resolve_keywords(
    cfg: &Config,
    serial: Option<String>,
    time: Option<String>,
    failed: Option<String>,
) -> Keywords {
    Keywords {
        serial: serial.unwrap_or_else(|| cfg.keywords.serial.clone()),
        time: time.unwrap_or_else(|| cfg.keywords.time.clone()),
        failed: failed.unwrap_or_else(|| cfg.keywords.failed.clone()),
    }
}
