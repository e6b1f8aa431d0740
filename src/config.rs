use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst, TryFromInto};
use std::env;
use std::fs;
use std::io;
use std::iter::FromIterator;
use std::path::{Path, PathBuf};

use crate::error::{Error, ErrorKind, Result};
use crate::notes::DEFAULT_STORAGE_KEY;
use crate::schedule::ScheduleType;

const CONFIG_PATH_ENV_VAR: &str = "ESCALA_CONFIG_FILE";

pub(crate) fn find_configfile_locations() -> io::Result<Vec<PathBuf>> {
    let config_env = env::var(CONFIG_PATH_ENV_VAR).ok().map(PathBuf::from);

    let home = if let Ok(dir) = env::var("HOME") {
        PathBuf::from(dir)
    } else {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            "Unable to find home directory",
        ));
    };

    let home_config = PathBuf::from_iter([&home, &PathBuf::from(".escala.toml")].iter());

    let config_xdg = if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from_iter([dir, "escala".to_string(), "config.toml".to_string()].iter())
    } else {
        PathBuf::from_iter(
            [
                home.as_path(),
                Path::new(".config"),
                Path::new("escala"),
                Path::new("config.toml"),
            ]
            .iter(),
        )
    };

    let mut locations = vec![config_xdg, home_config];

    if let Some(path) = config_env {
        locations.insert(0, path);
    }

    Ok(locations)
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Schedule shown at startup, by name or number, quoted or not.
    #[serde_as(as = "PickFirst<(TryFromInto<u8>, DisplayFromStr)>")]
    pub schedule: ScheduleType,
    /// 1-based rotation label index shown at startup.
    pub rotation: usize,
    pub data_dir: Option<PathBuf>,
    pub storage_key: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            schedule: ScheduleType::default(),
            rotation: 1,
            data_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)?;

        if config.storage_key.is_empty() {
            return Err(Error::new(ErrorKind::ConfigParse, "storage_key is empty"));
        }

        Ok(config)
    }

    /// Directory of the file-backed note store.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("escala"))
                .unwrap_or_else(|| PathBuf::from(".escala"))
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Config::from_toml(&content).map_err(|e| {
        let msg = format!("{}: {}", path.display(), e.message.as_deref().unwrap_or(""));
        e.with_msg(&msg)
    })
}

/// Loads `path` if given, otherwise the first existing default location.
/// Falls back to defaults if no file exists.
pub fn load_suitable_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return load_config(path);
    }

    let locations = find_configfile_locations().unwrap_or_else(|e| {
        log::warn!("{}", e);
        Vec::new()
    });

    match locations.iter().find(|p| p.is_file()) {
        Some(path) => {
            log::info!("Using config file {}", path.display());
            load_config(path)
        }
        None => {
            log::info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
