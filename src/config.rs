//! Machine configuration.

use crate::builder::BuildError;
use serde::{Deserialize, Serialize};

/// Options for a machine, loadable from JSON.
///
/// ```rust
/// use flowgate::MachineConfig;
///
/// let config = MachineConfig::from_json(r#"{ "debug": true }"#).unwrap();
/// assert!(config.debug);
/// assert_eq!(config.label, None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Trace gate and statement transitions at `debug` level
    pub debug: bool,
    /// Attached to diagnostic output and snapshots
    pub label: Option<String>,
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, BuildError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = MachineConfig::from_json("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = MachineConfig {
            debug: true,
            label: Some("checkout".to_string()),
        };
        let json = config.to_json().unwrap();
        assert_eq!(MachineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let result = MachineConfig::from_json("{ debug: yes }");
        assert!(matches!(result, Err(BuildError::Config(_))));
    }
}
