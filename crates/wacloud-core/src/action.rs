//! Action - Host-discoverable operations and their registry
//!
//! An action is what the host dispatcher sees of an adapter: a name, a
//! description, trigger-phrase similes, example exchanges, a synchronous
//! `validate` gate that narrows untyped JSON into the adapter's parameter
//! type, and an async `handle`.

use crate::error::{Error, Result};
use crate::plugin::Runtime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One turn of an example exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionExample {
    /// Speaker placeholder (e.g. `{{user1}}`)
    pub user: String,
    /// What the speaker says
    pub text: String,
    /// Action the turn triggers, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl ActionExample {
    /// A turn that does not trigger an action
    #[must_use]
    pub fn says(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            action: None,
        }
    }

    /// A turn that answers by running `action`
    #[must_use]
    pub fn answers(
        user: impl Into<String>,
        text: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            action: Some(action.into()),
        }
    }
}

/// Action metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Unique action name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Trigger phrases, without duplicates
    #[serde(default)]
    pub similes: Vec<String>,
    /// Example exchanges, each an ordered list of turns
    #[serde(default)]
    pub examples: Vec<Vec<ActionExample>>,
}

impl ActionDefinition {
    /// Create a new action definition
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            similes: Vec::new(),
            examples: Vec::new(),
        }
    }

    /// Add a simile; repeated similes are ignored
    #[must_use]
    pub fn with_simile(mut self, simile: impl Into<String>) -> Self {
        let simile = simile.into();
        if !self.similes.contains(&simile) {
            self.similes.push(simile);
        }
        self
    }

    /// Add several similes
    #[must_use]
    pub fn with_similes<I, S>(self, similes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        similes
            .into_iter()
            .fold(self, |def, simile| def.with_simile(simile))
    }

    /// Add an example exchange
    #[must_use]
    pub fn with_example(mut self, exchange: Vec<ActionExample>) -> Self {
        self.examples.push(exchange);
        self
    }
}

/// Outcome of an action's validate gate
#[derive(Debug, Clone, PartialEq)]
pub enum Validation<P> {
    /// Parameters have the shape the action expects
    Valid(P),
    /// Parameters were rejected
    Invalid(String),
}

impl<P> Validation<P> {
    /// Reject with a reason
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }

    /// Whether the gate passed
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Convert into a result, mapping rejection to [`Error::InvalidInput`]
    pub fn into_result(self) -> Result<P> {
        match self {
            Self::Valid(params) => Ok(params),
            Self::Invalid(reason) => Err(Error::InvalidInput(reason)),
        }
    }
}

/// Trait for action implementations
///
/// `P` is the adapter's tagged union of parameter shapes.
#[async_trait::async_trait]
pub trait Action<P>: Send + Sync {
    /// Get the action definition
    fn definition(&self) -> &ActionDefinition;

    /// Narrow untyped host parameters; pure and synchronous
    fn validate(&self, params: &serde_json::Value) -> Validation<P>;

    /// Run the action with validated parameters
    async fn handle(&self, runtime: &dyn Runtime, params: P) -> Result<serde_json::Value>;
}

/// Ordered collection of actions published to the host
pub struct ActionRegistry<P> {
    actions: Vec<Arc<dyn Action<P>>>,
}

impl<P> Default for ActionRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ActionRegistry<P> {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Register an action; a later action with the same name replaces the earlier one in place
    pub fn register(&mut self, action: Arc<dyn Action<P>>) {
        let name = action.definition().name.clone();
        debug!(action = %name, "Registering action");
        match self
            .actions
            .iter()
            .position(|a| a.definition().name == name)
        {
            Some(index) => self.actions[index] = action,
            None => self.actions.push(action),
        }
    }

    /// Get an action by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Action<P>>> {
        self.actions
            .iter()
            .find(|a| a.definition().name == name)
            .cloned()
    }

    /// Action names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.actions
            .iter()
            .map(|a| a.definition().name.as_str())
            .collect()
    }

    /// Definitions in registration order
    #[must_use]
    pub fn definitions(&self) -> Vec<&ActionDefinition> {
        self.actions.iter().map(|a| a.definition()).collect()
    }

    /// Number of registered actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no action is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Validate `params` against the named action, then run it
    pub async fn dispatch(
        &self,
        name: &str,
        runtime: &dyn Runtime,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let action = self
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        let params = action.validate(params).into_result()?;
        debug!(action = %name, agent = %runtime.agent_id(), "Dispatching action");

        action.handle(runtime, params).await
    }
}
