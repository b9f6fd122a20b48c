// ABOUTME: Configuration types and parsing for rollcall.yml.
// ABOUTME: Handles YAML parsing, env var indirection, and destination merging.

mod deserialize;
mod env_value;
mod init;

pub use env_value::EnvValue;
pub use init::init_config;

use crate::engine::{
    DEFAULT_DESIRED_STATE, DEFAULT_FORCE_RESTART_WAIT, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_INTERVAL, RevisionCheck, RolloutPlan,
};
use crate::error::{Error, Result};
use crate::types::{EnvironmentId, ServiceName, StackName};
use deserialize::{
    deserialize_services, deserialize_services_option, deserialize_stack_name,
    deserialize_stack_name_option,
};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "rollcall.yml";
pub const CONFIG_FILENAME_ALT: &str = "rollcall.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".rollcall/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub portainer: PortainerConfig,

    pub environment: EnvironmentId,

    #[serde(deserialize_with = "deserialize_stack_name")]
    pub stack: StackName,

    #[serde(deserialize_with = "deserialize_services")]
    pub services: NonEmpty<ServiceName>,

    #[serde(default)]
    pub check: CheckConfig,

    #[serde(default)]
    pub rollout: RolloutConfig,

    #[serde(default)]
    pub destinations: HashMap<String, Destination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortainerConfig {
    pub url: String,

    pub api_key: EnvValue,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckConfig {
    #[serde(default = "default_desired_state")]
    pub desired_state: String,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Wait before the first check.
    #[serde(default, with = "humantime_serde")]
    pub wait: Duration,

    /// Wait between attempts.
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            desired_state: default_desired_state(),
            max_retries: default_max_retries(),
            wait: Duration::ZERO,
            interval: default_interval(),
        }
    }
}

fn default_desired_state() -> String {
    DEFAULT_DESIRED_STATE.to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_interval() -> Duration {
    DEFAULT_RETRY_INTERVAL
}

impl CheckConfig {
    /// Check for `revision` using these settings.
    pub fn to_check(&self, revision: &str) -> Result<RevisionCheck> {
        Ok(
            RevisionCheck::new(revision, &self.desired_state, self.max_retries)?
                .wait_before_first(self.wait)
                .wait_between_retries(self.interval),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RolloutConfig {
    #[serde(default)]
    pub stack_env_var: Option<String>,

    #[serde(default)]
    pub update_stack_env: bool,

    #[serde(default)]
    pub force_restart: bool,

    #[serde(default = "default_force_restart_wait", with = "humantime_serde")]
    pub force_restart_wait: Duration,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            stack_env_var: None,
            update_stack_env: false,
            force_restart: false,
            force_restart_wait: default_force_restart_wait(),
        }
    }
}

fn default_force_restart_wait() -> Duration {
    DEFAULT_FORCE_RESTART_WAIT
}

impl RolloutConfig {
    /// Plan for `revision` using these settings.
    pub fn to_plan(&self, revision: &str) -> Result<RolloutPlan> {
        let mut plan = RolloutPlan::new(revision)?;
        if self.update_stack_env {
            let var = self.stack_env_var.as_deref().ok_or_else(|| {
                Error::InvalidConfig(
                    "rollout.update_stack_env requires rollout.stack_env_var".to_string(),
                )
            })?;
            plan = plan.update_stack_env(var)?;
        }
        if self.force_restart {
            plan = plan.force_restart(self.force_restart_wait);
        }
        Ok(plan)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Destination {
    #[serde(default)]
    pub environment: Option<EnvironmentId>,

    #[serde(default, deserialize_with = "deserialize_stack_name_option")]
    pub stack: Option<StackName>,

    #[serde(default, deserialize_with = "deserialize_services_option")]
    pub services: Option<NonEmpty<ServiceName>>,

    #[serde(default)]
    pub portainer: Option<PortainerConfig>,

    #[serde(default)]
    pub check: Option<CheckConfig>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        if self.portainer.url.trim().is_empty() {
            return Err(Error::InvalidConfig("portainer.url cannot be empty".to_string()));
        }
        if self.check.max_retries == 0 {
            return Err(Error::InvalidConfig(
                "check.max_retries must be at least 1".to_string(),
            ));
        }
        if self.rollout.update_stack_env && self.rollout.stack_env_var.is_none() {
            return Err(Error::InvalidConfig(
                "rollout.update_stack_env requires rollout.stack_env_var".to_string(),
            ));
        }
        Ok(())
    }

    pub fn for_destination(&self, name: &str) -> Result<Config> {
        let dest = self
            .destinations
            .get(name)
            .ok_or_else(|| Error::UnknownDestination(name.to_string()))?;

        let mut merged = self.clone();

        if let Some(environment) = dest.environment {
            merged.environment = environment;
        }

        if let Some(ref stack) = dest.stack {
            merged.stack = stack.clone();
        }

        // Replace services if destination specifies them
        if let Some(ref services) = dest.services {
            merged.services = services.clone();
        }

        if let Some(ref portainer) = dest.portainer {
            merged.portainer = portainer.clone();
        }

        if let Some(ref check) = dest.check {
            merged.check = check.clone();
        }

        merged.validate()?;
        Ok(merged)
    }

    /// Configured services, or the given subset if every name is configured.
    pub fn select_services(&self, names: &[String]) -> Result<Vec<ServiceName>> {
        if names.is_empty() {
            return Ok(self.services.iter().cloned().collect());
        }

        names
            .iter()
            .map(|name| {
                self.services
                    .iter()
                    .find(|s| s.as_str() == name.trim())
                    .cloned()
                    .ok_or_else(|| {
                        Error::InvalidConfig(format!(
                            "service '{}' is not listed in the configuration",
                            name
                        ))
                    })
            })
            .collect()
    }

    pub fn template() -> Result<Self> {
        let name_error = |e: crate::types::NameError| Error::InvalidConfig(e.to_string());
        Ok(Config {
            portainer: PortainerConfig {
                url: "http://portainer.example.com:9000".to_string(),
                api_key: EnvValue::from_env("PORTAINER_API_KEY"),
                timeout: default_timeout(),
            },
            environment: EnvironmentId::new(1),
            stack: StackName::new("my-stack").map_err(name_error)?,
            services: NonEmpty::new(ServiceName::new("web").map_err(name_error)?),
            check: CheckConfig::default(),
            rollout: RolloutConfig::default(),
            destinations: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_yaml_parses_back() {
        let yaml = init::generate_template_yaml(&Config::template().unwrap());
        let config = Config::from_yaml(&yaml).unwrap();

        assert_eq!(config.stack.as_str(), "my-stack");
        assert_eq!(config.environment, EnvironmentId::new(1));
        assert_eq!(config.check.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.check.interval, DEFAULT_RETRY_INTERVAL);
        assert_eq!(
            config.portainer.api_key,
            EnvValue::from_env("PORTAINER_API_KEY")
        );
    }
}
