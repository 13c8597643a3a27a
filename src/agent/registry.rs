//! Agents addressable by id

use std::{collections::BTreeMap, sync::Arc};

use super::Agent;

/// Immutable id → agent map shared with the server
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `agent` under its own id
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.insert(agent.id().to_string(), Arc::new(agent));
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<Agent>> {
        self.agents.get(id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
