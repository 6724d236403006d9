//! Container log lines for a single pod

use serde::{Deserialize, Serialize};

/// One timestamped log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodLogEntry {
    /// RFC 3339 timestamp exactly as the kubelet wrote it
    pub timestamp: String,
    pub log: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePodLogsResponse {
    pub log_entries: Vec<PodLogEntry>,
}
