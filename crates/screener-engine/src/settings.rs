use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Deployment stage of the host serving questionnaires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStage {
    Development,
    Staging,
    Production,
}

impl FromStr for DeploymentStage {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "stage" | "staging" => Ok(Self::Staging),
            "prod" | "production" => Ok(Self::Production),
            _ => Err(SettingsError::InvalidStage(value.to_string())),
        }
    }
}

/// Explicit settings handed to whatever constructs sessions. The engine
/// never reads process environment on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub stage: DeploymentStage,
    /// Share of sessions (0-100) served the candidate questionnaire version.
    pub rollout_percent: u8,
    /// Salt mixed into subject references handed to analytics.
    pub analytics_salt: String,
}

impl EngineSettings {
    pub const DEVELOPMENT_SALT: &'static str = "screener-development";

    pub fn development() -> Self {
        Self {
            stage: DeploymentStage::Development,
            rollout_percent: 100,
            analytics_salt: Self::DEVELOPMENT_SALT.to_string(),
        }
    }

    /// Read `SCREENER_STAGE`, `SCREENER_ROLLOUT_PERCENT` and
    /// `SCREENER_ANALYTICS_SALT`, loading a `.env` file first if present.
    /// Meant for binaries; library code takes an `EngineSettings` value.
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        // Only an unset stage means development; a typo is an error.
        let stage = match env::var("SCREENER_STAGE") {
            Ok(value) => value.parse::<DeploymentStage>()?,
            Err(_) => DeploymentStage::Development,
        };
        let rollout = env::var("SCREENER_ROLLOUT_PERCENT").unwrap_or_else(|_| "0".to_string());
        let rollout_percent = parse_rollout(&rollout)?;

        let analytics_salt = match (env::var("SCREENER_ANALYTICS_SALT"), stage) {
            (Ok(salt), _) if !salt.is_empty() => salt,
            (_, DeploymentStage::Development) => Self::DEVELOPMENT_SALT.to_string(),
            _ => return Err(SettingsError::MissingSalt),
        };

        Ok(Self {
            stage,
            rollout_percent,
            analytics_salt,
        })
    }
}

fn parse_rollout(value: &str) -> Result<u8, SettingsError> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| SettingsError::InvalidRollout(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_ignore_case_and_whitespace() {
        assert_eq!(" PROD ".parse::<DeploymentStage>().unwrap(), DeploymentStage::Production);
        assert_eq!("staging".parse::<DeploymentStage>().unwrap(), DeploymentStage::Staging);
        assert_eq!("dev".parse::<DeploymentStage>().unwrap(), DeploymentStage::Development);
    }

    #[test]
    fn unknown_stage_is_rejected() {
        for typo in ["prd", "prodution", "anything", ""] {
            assert!(matches!(
                typo.parse::<DeploymentStage>(),
                Err(SettingsError::InvalidStage(value)) if value == typo
            ));
        }
    }

    #[test]
    fn rollout_must_be_a_percentage() {
        assert_eq!(parse_rollout("25").unwrap(), 25);
        assert_eq!(parse_rollout("100").unwrap(), 100);
        assert!(parse_rollout("101").is_err());
        assert!(parse_rollout("-1").is_err());
        assert!(parse_rollout("half").is_err());
    }
}
