//! Plugin - Handles exchanged between the host runtime and an adapter

/// The host agent runtime, as seen by an action handler
pub trait Runtime: Send + Sync {
    /// Identifier of the agent the action runs on behalf of
    fn agent_id(&self) -> &str;
}

/// Minimal runtime for hosts that only need to name the agent
#[derive(Debug, Clone)]
pub struct StaticRuntime {
    agent_id: String,
}

impl StaticRuntime {
    /// Create a runtime for the given agent
    #[must_use]
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
        }
    }
}

impl Runtime for StaticRuntime {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }
}

/// An adapter registered with the host
pub trait Plugin: Send + Sync {
    /// Human-readable plugin name
    fn name(&self) -> &str;

    /// What the plugin integrates
    fn description(&self) -> &str;
}
