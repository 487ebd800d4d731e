use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One state transport operator whose landing page lists bus routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Display name, e.g. `"Kerala RTC"`.
    pub name: String,
    /// Short state label, e.g. `"Kerala"`.
    pub state: String,
    /// Landing page listing the operator's routes.
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct StatesFile {
    pub states: Vec<StateConfig>,
}

impl StatesFile {
    /// Finds a configured state by display name or state label, case-insensitively.
    #[must_use]
    pub fn find(&self, needle: &str) -> Option<&StateConfig> {
        let needle = needle.trim().to_lowercase();
        self.states
            .iter()
            .find(|s| s.name.to_lowercase() == needle || s.state.to_lowercase() == needle)
    }
}

/// Load and validate the states configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_states(path: &Path) -> Result<StatesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StatesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_states(&content)
}

fn parse_states(content: &str) -> Result<StatesFile, ConfigError> {
    let states_file: StatesFile =
        serde_yaml::from_str(content).map_err(ConfigError::StatesFileParse)?;

    validate_states(&states_file)?;

    Ok(states_file)
}

fn validate_states(states_file: &StatesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for state in &states_file.states {
        if state.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "state name must be non-empty".to_string(),
            ));
        }

        if !(state.url.starts_with("https://") || state.url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "state '{}' has invalid url '{}'; must be http(s)",
                state.name, state.url
            )));
        }

        if !seen_names.insert(state.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate state name: '{}'",
                state.name
            )));
        }
    }

    Ok(())
}
