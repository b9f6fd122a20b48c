// ABOUTME: Validated stack and service names plus the qualified-name convention.
// ABOUTME: Stack deployments name services "{stack}_{service}" in both Swarm and Compose.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NameError {
    #[error("{0} name cannot be empty")]
    Empty(&'static str),

    #[error("{0} name exceeds maximum length of 63 characters")]
    TooLong(&'static str),

    #[error("{0} name must start with a letter or digit")]
    InvalidStart(&'static str),

    #[error("invalid character in {0} name: '{1}'")]
    InvalidChar(&'static str, char),
}

fn validate(kind: &'static str, value: &str) -> Result<String, NameError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(NameError::Empty(kind));
    }

    if value.len() > 63 {
        return Err(NameError::TooLong(kind));
    }

    if !value.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(NameError::InvalidStart(kind));
    }

    for c in value.chars() {
        if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
            return Err(NameError::InvalidChar(kind, c));
        }
    }

    Ok(value.to_string())
}

/// Name of a Portainer stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackName(String);

impl StackName {
    pub fn new(value: &str) -> Result<Self, NameError> {
        validate("stack", value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short service name as written in the stack file (e.g. `web`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(value: &str) -> Result<Self, NameError> {
        validate("service", value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A logical service inside a stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceSpec {
    short_name: ServiceName,
    stack: StackName,
}

impl ServiceSpec {
    pub fn new(stack: StackName, short_name: ServiceName) -> Self {
        Self { short_name, stack }
    }

    pub fn short_name(&self) -> &ServiceName {
        &self.short_name
    }

    pub fn stack(&self) -> &StackName {
        &self.stack
    }

    /// `{stack}_{service}`, the name Swarm gives the service.
    pub fn qualified(&self) -> String {
        format!("{}_{}", self.stack, self.short_name)
    }

    /// Qualified name with `-` folded into `_`, for matching Compose container
    /// names regardless of which separator the Compose version used.
    pub fn normalized(&self) -> String {
        normalize_name(&self.qualified())
    }
}

impl fmt::Display for ServiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// Strip the leading `/` Docker puts on container names and fold `-` into `_`.
pub fn normalize_name(name: &str) -> String {
    name.trim_start_matches('/').replace('-', "_")
}
