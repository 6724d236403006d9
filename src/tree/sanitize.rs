//! Payload sanitization for tree nodes

use serde_json::Value;

/// Return a copy of `obj` fit for display
///
/// `metadata.managedFields` is always dropped. Secrets also lose `data` and
/// `stringData`. The input is never modified.
pub fn sanitize(obj: &Value, kind: &str) -> Value {
    let mut copy = obj.clone();

    if let Some(metadata) = copy.get_mut("metadata").and_then(|m| m.as_object_mut()) {
        metadata.remove("managedFields");
    }

    if kind == "Secret" {
        if let Some(map) = copy.as_object_mut() {
            map.remove("data");
            map.remove("stringData");
        }
    }

    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn secret() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {
                "name": "creds",
                "managedFields": [{"manager": "kubectl"}]
            },
            "type": "Opaque",
            "data": {"password": "aHVudGVyMg=="},
            "stringData": {"token": "plain"}
        })
    }

    #[test]
    fn test_secret_payload_removed() {
        let input = secret();
        let clean = sanitize(&input, "Secret");
        assert!(clean.get("data").is_none());
        assert!(clean.get("stringData").is_none());
        assert!(clean["metadata"].get("managedFields").is_none());
        assert_eq!(clean["type"], "Opaque");
        assert_eq!(clean["metadata"]["name"], "creds");
    }

    #[test]
    fn test_input_untouched() {
        let input = secret();
        let before = input.clone();
        let _ = sanitize(&input, "Secret");
        assert_eq!(input, before);
    }

    #[test]
    fn test_idempotent() {
        let once = sanitize(&secret(), "Secret");
        let twice = sanitize(&once, "Secret");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_secret_keeps_data() {
        let cm = json!({
            "kind": "ConfigMap",
            "metadata": {"name": "cfg", "managedFields": []},
            "data": {"key": "value"}
        });
        let clean = sanitize(&cm, "ConfigMap");
        assert_eq!(clean["data"]["key"], "value");
        assert!(clean["metadata"].get("managedFields").is_none());
    }

    #[test]
    fn test_kind_argument_decides_redaction() {
        // Only the passed kind counts, not the object's own kind field
        let clean = sanitize(&secret(), "ConfigMap");
        assert!(clean.get("data").is_some());
    }

    #[test]
    fn test_missing_metadata() {
        let obj = json!({"kind": "Secret", "data": {}});
        let clean = sanitize(&obj, "Secret");
        assert_eq!(clean, json!({"kind": "Secret"}));
    }
}
