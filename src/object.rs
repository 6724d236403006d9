//! Typed accessors over raw Kubernetes objects
//!
//! Live objects arrive as arbitrary JSON whose kind is only known at runtime.
//! They are kept as `serde_json::Value` and read through the helpers here, so
//! callers never index into nested maps by hand.

use serde_json::Value;

/// Read-only helpers for a raw Kubernetes object
pub trait ObjectExt {
    /// Walk nested object keys and return the string at the end, if any
    fn nested_str(&self, path: &[&str]) -> Option<&str>;

    /// Same as `nested_str`, but an empty string counts as absent
    fn nested_str_non_empty(&self, path: &[&str]) -> Option<&str> {
        self.nested_str(path).filter(|s| !s.is_empty())
    }

    /// API group from `apiVersion` (`"apps/v1"` -> `"apps"`, `"v1"` -> `""`)
    fn api_group(&self) -> &str;

    /// Version from `apiVersion` (`"apps/v1"` -> `"v1"`, `"v1"` -> `"v1"`)
    fn api_version(&self) -> &str;

    fn kind(&self) -> Option<&str> {
        self.nested_str_non_empty(&["kind"])
    }

    fn name(&self) -> Option<&str> {
        self.nested_str_non_empty(&["metadata", "name"])
    }

    fn namespace(&self) -> Option<&str> {
        self.nested_str_non_empty(&["metadata", "namespace"])
    }

    fn uid(&self) -> Option<&str> {
        self.nested_str_non_empty(&["metadata", "uid"])
    }

    /// UIDs listed in `metadata.ownerReferences`, skipping malformed entries
    fn owner_uids(&self) -> Vec<&str>;

    /// True when any owner reference carries `owner_uid`.
    ///
    /// Only the UID is compared. The reference's kind and apiVersion are
    /// ignored, which relies on UIDs being unique across the cluster.
    fn has_owner_uid(&self, owner_uid: &str) -> bool {
        !owner_uid.is_empty() && self.owner_uids().contains(&owner_uid)
    }
}

impl ObjectExt for Value {
    fn nested_str(&self, path: &[&str]) -> Option<&str> {
        let mut current = self;
        for key in path {
            current = current.as_object()?.get(*key)?;
        }
        current.as_str()
    }

    fn api_group(&self) -> &str {
        let api_version = self.nested_str(&["apiVersion"]).unwrap_or("");
        match api_version.split_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }

    fn api_version(&self) -> &str {
        let api_version = self.nested_str(&["apiVersion"]).unwrap_or("");
        match api_version.split_once('/') {
            Some((_, version)) => version,
            None => api_version,
        }
    }

    fn owner_uids(&self) -> Vec<&str> {
        self.get("metadata")
            .and_then(|m| m.get("ownerReferences"))
            .and_then(|refs| refs.as_array())
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| r.get("uid").and_then(|u| u.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Join a group and version back into an `apiVersion` string
pub fn join_api_version(group: &str, version: &str) -> String {
    if group.is_empty() {
        version.to_string()
    } else {
        format!("{}/{}", group, version)
    }
}
