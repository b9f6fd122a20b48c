// ABOUTME: Config values that may be read from environment variables.
// ABOUTME: Keeps secrets such as the Portainer API key out of the config file.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn from_env(var: &str) -> Self {
        EnvValue::FromEnv {
            var: var.to_string(),
            default: None,
        }
    }

    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }
}

/// YAML form of the value, as written by `rollcall init`. Literals are
/// masked so secrets never reach logs.
impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(_) => write!(f, "\"***\""),
            EnvValue::FromEnv { var, default: None } => write!(f, "{{ env: {} }}", var),
            EnvValue::FromEnv {
                var,
                default: Some(default),
            } => write!(f, "{{ env: {}, default: {} }}", var, default),
        }
    }
}
