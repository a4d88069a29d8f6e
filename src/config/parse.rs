//! Duties file parsing and discovery

use crate::config::schema::validate_duties;
use crate::config::types::DutiesFile;
use crate::error::{ConfigError, ConfigResult, DutyError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Duties file names to search for, in order
pub const DUTIES_FILE_NAMES: &[&str] = &["duties.yml", "duties.yaml"];

/// Find the duties file by searching current and parent directories
pub fn find_duties_file() -> ConfigResult<PathBuf> {
    find_duties_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the duties file starting from a specific directory
pub fn find_duties_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in DUTIES_FILE_NAMES {
            let path = current_dir.join(file_name);
            searched_paths.push(path.display().to_string());

            if path.is_file() {
                log::debug!("Found duties file {}", path.display());
                return Ok(path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse and validate a duties file from a path
pub fn parse_duties_file(path: &Path) -> Result<DutiesFile, DutyError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    parse_duties(&contents)
}

/// Parse and validate duties from a string
pub fn parse_duties(yaml: &str) -> Result<DutiesFile, DutyError> {
    let file: DutiesFile = serde_yaml::from_str(yaml)?;
    validate_duties(&file)?;
    Ok(file)
}
