// ABOUTME: Stack environment upsert and stack redeploy.
// ABOUTME: Updates a variable in place or appends it, keeping every other entry as is.

use super::{Clock, Engine, EngineError, StackEnvAction};
use crate::api::StackOps;
use crate::api::models::{EnvVar, StackUpdate};
use crate::transcript::Transcript;
use crate::types::{EnvironmentId, StackName};

/// Set `name` to `value`. Other entries keep their names, values, and order.
pub fn upsert_env(env: &mut Vec<EnvVar>, name: &str, value: &str) -> StackEnvAction {
    match env.iter_mut().find(|var| var.name == name) {
        Some(var) if var.value == value => StackEnvAction::Unchanged,
        Some(var) => StackEnvAction::Updated {
            previous: std::mem::replace(&mut var.value, value.to_string()),
        },
        None => {
            env.push(EnvVar::new(name, value));
            StackEnvAction::Appended
        }
    }
}

impl<R: StackOps, C: Clock> Engine<R, C> {
    /// Upsert `var = value` into the stack's environment and redeploy it with
    /// pruning and image pulls. An already-equal value sends nothing.
    pub(crate) async fn update_stack_env(
        &self,
        environment: EnvironmentId,
        stack: &StackName,
        var: &str,
        value: &str,
        transcript: &mut Transcript,
    ) -> Result<StackEnvAction, EngineError> {
        self.checkpoint()?;
        let stacks = self
            .api
            .list_stacks(environment)
            .await
            .map_err(|source| EngineError::Api {
                operation: format!("listing stacks of environment {}", environment),
                source,
            })?;
        let found = stacks
            .into_iter()
            .find(|s| s.name == stack.as_str())
            .ok_or_else(|| EngineError::StackNotFound {
                stack: stack.to_string(),
                environment,
            })?;

        let mut env = found.env;
        let action = upsert_env(&mut env, var, value);
        if action == StackEnvAction::Unchanged {
            transcript.record(format!("stack {}: {} already set to {}", stack, var, value));
            return Ok(action);
        }

        self.checkpoint()?;
        let file = self
            .api
            .stack_file(found.id)
            .await
            .map_err(|source| EngineError::Api {
                operation: format!("reading stack file of {}", stack),
                source,
            })?;

        transcript.record(format!(
            "stack {}: setting {}={} and redeploying",
            stack, var, value
        ));
        let update = StackUpdate {
            stack_file_content: file.content,
            env,
            prune: true,
            pull_image: true,
        };
        self.checkpoint()?;
        self.api
            .update_stack(found.id, environment, &update)
            .await
            .map_err(|source| EngineError::Api {
                operation: format!("redeploying stack {}", stack),
                source,
            })?;
        transcript.record(format!("stack {}: redeployed", stack));

        Ok(action)
    }
}
