// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates rollcall.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::StackName;

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, stack: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template()?;

    if let Some(s) = stack {
        config.stack = StackName::new(s).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

pub(super) fn generate_template_yaml(config: &Config) -> String {
    let services: Vec<String> = config
        .services
        .iter()
        .map(|s| format!("  - {}", s))
        .collect();
    format!(
        r#"portainer:
  url: {}
  api_key: {}
  timeout: {}s
environment: {}
stack: {}
services:
{}
check:
  desired_state: {}
  max_retries: {}
  wait: {}s
  interval: {}s
# rollout:
#   stack_env_var: APP_VERSION
#   update_stack_env: true
#   force_restart: false
#   force_restart_wait: 5s
"#,
        config.portainer.url,
        config.portainer.api_key,
        config.portainer.timeout.as_secs(),
        config.environment,
        config.stack,
        services.join("\n"),
        config.check.desired_state,
        config.check.max_retries,
        config.check.wait.as_secs(),
        config.check.interval.as_secs(),
    )
}
