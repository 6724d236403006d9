//! Container logs for a pod of a release

use super::events::parent_namespace;
use super::release_tree::ReleaseTreeService;
use crate::error::TreeError;
use crate::kube::paths;
use crate::models::{PodLogEntry, ResourcePodLogsResponse};
use chrono::DateTime;

const KIND_POD: &str = "Pod";

impl ReleaseTreeService {
    /// Timestamped log lines of one pod running under the release
    ///
    /// The release must declare a workload that owns pods (Deployment, Job or
    /// CronJob); the pod is read from that workload's namespace. A 4xx answer
    /// from the data plane means the pod is gone and maps to
    /// `ResourceNotFound`.
    pub async fn get_resource_logs(
        &self,
        namespace: &str,
        project: &str,
        component: &str,
        environment: &str,
        pod_name: &str,
        since_seconds: Option<i64>,
    ) -> Result<ResourcePodLogsResponse, TreeError> {
        tracing::debug!(
            "Getting logs for pod {} of {}/{}/{} in {}",
            pod_name,
            namespace,
            project,
            component,
            environment
        );

        let tree = self.check_access(namespace, project, component).await?;
        let resolved = self
            .resolve_release(namespace, project, component, environment)
            .await?;

        let not_found = || TreeError::ResourceNotFound {
            kind: KIND_POD.to_string(),
            name: pod_name.to_string(),
        };
        let pod_ns =
            parent_namespace(&resolved.release.resources, KIND_POD).ok_or_else(not_found)?;

        let since = since_seconds.filter(|s| *s > 0).map(|s| s.to_string());
        let mut query = vec![("timestamps", "true")];
        if let Some(since) = since.as_deref() {
            query.push(("sinceSeconds", since));
        }

        let path = paths::pod_log_path(&pod_ns, pod_name);
        let raw = match tree.fetcher().get_text(&resolved.plane, &path, &query).await {
            Ok(raw) => raw,
            Err(e) if e.is_client_error() => {
                tracing::debug!("Pod {} logs unavailable: {}", pod_name, e);
                return Err(not_found());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(ResourcePodLogsResponse {
            log_entries: parse_log_lines(&raw),
        })
    }
}

/// Split `timestamps=true` log output into entries
///
/// Each non-blank line must start with an RFC 3339 timestamp followed by a
/// space; other lines are dropped.
pub fn parse_log_lines(raw: &str) -> Vec<PodLogEntry> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (timestamp, log) = line.split_once(' ')?;
            if DateTime::parse_from_rfc3339(timestamp).is_err() {
                return None;
            }
            Some(PodLogEntry {
                timestamp: timestamp.to_string(),
                log: log.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_lines() {
        let raw = "2024-05-01T10:00:00Z starting server\n\
                   2024-05-01T10:00:01.123456789Z listening on :8080\n";
        let entries = parse_log_lines(raw);
        assert_eq!(
            entries,
            vec![
                PodLogEntry {
                    timestamp: "2024-05-01T10:00:00Z".into(),
                    log: "starting server".into(),
                },
                PodLogEntry {
                    timestamp: "2024-05-01T10:00:01.123456789Z".into(),
                    log: "listening on :8080".into(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_log_lines_drops_untimestamped() {
        let raw = "\n   \nno timestamp here\n2024-05-01 10:00:00 split date\n\
                   2024-05-01T10:00:00+02:00 offset ok\nnotatime\n";
        let entries = parse_log_lines(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, "2024-05-01T10:00:00+02:00");
        assert_eq!(entries[0].log, "offset ok");
    }

    #[test]
    fn test_parse_log_lines_keeps_inner_spacing() {
        let entries = parse_log_lines("  2024-05-01T10:00:00Z   indented  message  \r\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].log, "  indented  message");
    }

    #[test]
    fn test_parse_empty_logs() {
        assert!(parse_log_lines("").is_empty());
    }
}
