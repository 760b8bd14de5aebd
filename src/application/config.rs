use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Rupees;

use super::AppError;

/// Starting cash in the lending vault when no config file says otherwise.
pub const DEFAULT_INITIAL_CAPITAL: Rupees = 100_000;

/// Ledger settings, read from a TOML file.
///
/// ```toml
/// initial_capital = 250000
///
/// [verifier]
/// command = "face-match"
/// args = ["--model", "fast"]
/// min_confidence = 0.7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub initial_capital: Rupees,
    pub verifier: Option<VerifierConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Program that reads a verification request on stdin and prints the
    /// outcome on stdout, both as JSON.
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub min_confidence: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            verifier: None,
        }
    }
}

impl LedgerConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, AppError> {
        let config: LedgerConfig =
            toml::from_str(input).map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.initial_capital < 0 {
            return Err(AppError::Config(
                "initial_capital must not be negative".to_string(),
            ));
        }
        if let Some(verifier) = &self.verifier {
            if verifier.command.trim().is_empty() {
                return Err(AppError::Config("verifier.command is empty".to_string()));
            }
            if !(0.0..=1.0).contains(&verifier.min_confidence) {
                return Err(AppError::Config(
                    "verifier.min_confidence must be between 0 and 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.initial_capital, 100_000);
        assert!(config.verifier.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = LedgerConfig::from_toml_str(
            r#"
            initial_capital = 250000

            [verifier]
            command = "face-match"
            args = ["--fast"]
            min_confidence = 0.7
            "#,
        )
        .unwrap();

        assert_eq!(config.initial_capital, 250_000);
        let verifier = config.verifier.unwrap();
        assert_eq!(verifier.command, "face-match");
        assert_eq!(verifier.args, vec!["--fast".to_string()]);
        assert_eq!(verifier.min_confidence, 0.7);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let result = LedgerConfig::from_toml_str(
            r#"
            [verifier]
            command = "face-match"
            min_confidence = 1.5
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_negative_capital() {
        let result = LedgerConfig::from_toml_str("initial_capital = -1");
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
