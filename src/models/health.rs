//! Health classification for live objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse rollout health of a live object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Progressing,
    Degraded,
    Suspended,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Progressing => "Progressing",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Suspended => "Suspended",
            HealthStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Healthy" => Ok(HealthStatus::Healthy),
            "Progressing" => Ok(HealthStatus::Progressing),
            "Degraded" => Ok(HealthStatus::Degraded),
            "Suspended" => Ok(HealthStatus::Suspended),
            "Unknown" => Ok(HealthStatus::Unknown),
            _ => Err(format!("Unknown health status: {}", s)),
        }
    }
}

/// Health attached to a node in the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthInfo {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthInfo {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn with_message(status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}
