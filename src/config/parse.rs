//! Task file and configuration file discovery and parsing

use crate::config::store::ConfigStore;
use crate::config::types::TaskFile;
use crate::error::{ConfigError, ConfigResult, DotrunError};
use crate::runner::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default task file names to search for
const TASK_FILE_NAMES: &[&str] = &["dotrun.yml", "dotrun.yaml"];

/// Configuration file names looked up beside the task file
const CONFIG_FILE_NAMES: &[&str] = &["dotrun.config.yml", "dotrun.config.yaml"];

/// Find the task file by searching current and parent directories
pub fn find_task_file() -> ConfigResult<PathBuf> {
    find_task_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the task file starting from a specific directory
pub fn find_task_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in TASK_FILE_NAMES {
            let path = current_dir.join(file_name);
            searched_paths.push(path.display().to_string());

            if path.is_file() {
                return Ok(path);
            }
        }

        // Try parent directory
        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                // Reached root without finding a task file
                return Err(ConfigError::NotFound(searched_paths.join(", ")));
            }
        }
    }
}

/// Parse a task file from a path
pub fn read_task_file(path: &Path) -> Result<TaskFile, DotrunError> {
    let contents = read_to_string(path)?;
    parse_task_file(&contents)
}

/// Parse a task file from a string
pub fn parse_task_file(yaml: &str) -> Result<TaskFile, DotrunError> {
    let file: TaskFile = serde_yaml::from_str(yaml)?;
    Ok(file)
}

/// Parse the task file with automatic discovery
pub fn parse_task_file_auto() -> Result<(TaskFile, PathBuf), DotrunError> {
    let path = find_task_file()?;
    let file = read_task_file(&path)?;
    Ok((file, path))
}

/// The configuration file beside a task file, if there is one
pub fn default_config_file(task_file: &Path) -> Option<PathBuf> {
    let dir = task_file.parent().unwrap_or_else(|| Path::new("."));
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Path of the environment overlay for a configuration file:
/// `dotrun.config.yml` with env `prod` becomes `dotrun.config.prod.yml`
pub fn environment_overlay(config_file: &Path, env: &str) -> PathBuf {
    let stem = config_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match config_file.extension() {
        Some(ext) => format!("{}.{}.{}", stem, env, ext.to_string_lossy()),
        None => format!("{}.{}", stem, env),
    };
    config_file.with_file_name(file_name)
}

/// Parse a configuration document
pub fn parse_config_document(yaml: &str) -> Result<Value, DotrunError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    match Value::from_yaml(doc) {
        Some(value @ Value::Object(_)) => Ok(value),
        None => Ok(Value::object()),
        Some(other) => Err(ConfigError::Invalid(format!(
            "configuration must be a mapping, found {}",
            other.kind()
        ))
        .into()),
    }
}

/// Load the configuration store.
///
/// When `env` is non-empty and an overlay for it exists beside `config_file`, the overlay is
/// deep-merged over the base configuration.
pub fn load_config_store(
    config_file: Option<&Path>,
    env: &str,
    flags: Vec<(String, String)>,
) -> Result<ConfigStore, DotrunError> {
    let mut values = Value::object();

    if let Some(path) = config_file {
        values = parse_config_document(&read_to_string(path)?)?;

        if !env.is_empty() {
            let overlay_path = environment_overlay(path, env);
            if overlay_path.is_file() {
                let mut overlay = parse_config_document(&read_to_string(&overlay_path)?)?;
                overlay.merge_missing(values);
                values = overlay;
            }
        }
    }

    let mut store = ConfigStore::new(values);
    for (key, value) in flags {
        store.set_flag(&key, Value::String(value));
    }
    Ok(store)
}

fn read_to_string(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}
