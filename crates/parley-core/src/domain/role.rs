use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::DecodeError;
use super::wire;

/// Fixed identity of an agent, used as the routing key on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Coordinator,
    CompanyAgent,
    PersonAgent,
    WeatherAgent,
    StandardCompanyAgent,
    StandardPersonAgent,
}

impl AgentRole {
    pub const ALL: [AgentRole; 6] = [
        AgentRole::Coordinator,
        AgentRole::CompanyAgent,
        AgentRole::PersonAgent,
        AgentRole::WeatherAgent,
        AgentRole::StandardCompanyAgent,
        AgentRole::StandardPersonAgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::Coordinator => "coordinator",
            AgentRole::CompanyAgent => "company_agent",
            AgentRole::PersonAgent => "person_agent",
            AgentRole::WeatherAgent => "weather_agent",
            AgentRole::StandardCompanyAgent => "standard_company_agent",
            AgentRole::StandardPersonAgent => "standard_person_agent",
        }
    }

    /// Decode a role name read from `field`.
    pub fn parse(field: &str, value: &str) -> Result<Self, DecodeError> {
        wire::tag(field, value)
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matches_serde_names() {
        for role in AgentRole::ALL {
            assert_eq!(serde_json::to_value(role).unwrap(), role.as_str());
            assert_eq!(AgentRole::parse("receiver", role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_names_the_field() {
        let err = AgentRole::parse("receiver", "billing_agent").unwrap_err();
        assert_eq!(err, DecodeError::unknown("receiver", "billing_agent"));
    }
}
