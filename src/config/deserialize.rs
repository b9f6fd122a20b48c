// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates stack and service names and rejects empty service lists.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::{ServiceName, StackName};

pub fn deserialize_stack_name<'de, D>(deserializer: D) -> Result<StackName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    StackName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_stack_name_option<'de, D>(
    deserializer: D,
) -> Result<Option<StackName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| StackName::new(&s).map_err(serde::de::Error::custom))
        .transpose()
}

fn parse_services<E: serde::de::Error>(values: Vec<String>) -> Result<Vec<ServiceName>, E> {
    values
        .iter()
        .map(|s| ServiceName::new(s).map_err(E::custom))
        .collect()
}

pub fn deserialize_services<'de, D>(deserializer: D) -> Result<NonEmpty<ServiceName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    let services = parse_services(values)?;

    NonEmpty::from_vec(services)
        .ok_or_else(|| serde::de::Error::custom("at least one service is required"))
}

pub fn deserialize_services_option<'de, D>(
    deserializer: D,
) -> Result<Option<NonEmpty<ServiceName>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<Vec<String>> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(values) => {
            let services = parse_services(values)?;
            let nonempty = NonEmpty::from_vec(services).ok_or_else(|| {
                serde::de::Error::custom("destination services list cannot be empty")
            })?;
            Ok(Some(nonempty))
        }
    }
}
