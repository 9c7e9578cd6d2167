use thiserror::Error;

use crate::domain::AgentRole;

/// Whatever an agent handler fails with. Nested `BusError`s convert via `?`.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum BusError {
    /// The receiving handler failed; surfaced to the `send` caller as-is.
    #[error("handler for {role} failed: {source}")]
    Handler {
        role: AgentRole,
        #[source]
        source: HandlerError,
    },

    #[error("missing agents: {0:?}. These agents were expected but not registered.")]
    MissingAgents(Vec<AgentRole>),
}

impl BusError {
    /// Role whose handler failed, if this is a handler failure.
    pub fn failed_role(&self) -> Option<AgentRole> {
        match self {
            BusError::Handler { role, .. } => Some(*role),
            BusError::MissingAgents(_) => None,
        }
    }
}
