//! Purpose: Select map records whose document carries a matching version tag.
//! Exports: `select`, `VersionMatch`, `NO_ROLE`.
//! Role: The only place that inspects document structure; malformed documents
//! degrade to the sentinel role instead of failing.
//! Invariants: Version comparison is exact string equality, case-sensitive,
//! no normalization.
//! Invariants: Output order follows input order.

use serde_json::Value;

use crate::core::record::MapRecord;

/// Sentinel role used when a document has no role node.
pub const NO_ROLE: &str = "no role";

/// One selected record with its resolved role and version string.
#[derive(Clone, Debug)]
pub struct VersionMatch<'a> {
    pub record: &'a MapRecord,
    pub role: String,
    pub version: String,
}

/// Scan `records` and keep those whose document's `version` value, coerced
/// to a string, equals `target_version` exactly.
pub fn select<'a>(records: &'a [MapRecord], target_version: &str) -> Vec<VersionMatch<'a>> {
    records
        .iter()
        .filter_map(|record| {
            let value = record.document.get("version")?;
            let version = version_string(value);
            if version != target_version {
                return None;
            }
            Some(VersionMatch {
                record,
                role: role_of(&record.document),
                version,
            })
        })
        .collect()
}

fn version_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// The `name` of the first node with type `"role"`, or the sentinel when the
/// node list is missing, empty, or carries no such node.
fn role_of(document: &Value) -> String {
    if let Some(nodes) = document.get("nodes").and_then(Value::as_array) {
        for node in nodes {
            if node.get("type").and_then(Value::as_str) == Some("role") {
                if let Some(name) = node.get("name").and_then(Value::as_str) {
                    return name.to_string();
                }
            }
        }
    }
    NO_ROLE.to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::{NO_ROLE, select};
    use crate::core::record::MapRecord;

    fn map(id: i32, document: serde_json::Value) -> MapRecord {
        MapRecord {
            id,
            owner: 10,
            document,
            created_at: datetime!(2019-06-01 09:00),
            modified_at: datetime!(2019-06-02 09:00),
            name: format!("map {id}"),
        }
    }

    #[test]
    fn matching_version_is_selected() {
        let records = vec![
            map(1, json!({"version": "2.0", "nodes": []})),
            map(2, json!({"version": "1.0"})),
            map(3, json!({"nodes": []})),
        ];
        let selected = select(&records, "2.0");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].record.id, 1);
        assert_eq!(selected[0].version, "2.0");
    }

    #[test]
    fn numeric_version_values_are_coerced_to_strings() {
        let records = vec![map(1, json!({"version": 2})), map(2, json!({"version": "2"}))];
        let selected = select(&records, "2");
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn comparison_is_case_sensitive_and_exact() {
        let records = vec![
            map(1, json!({"version": "CountyHealth"})),
            map(2, json!({"version": "countyhealth"})),
            map(3, json!({"version": "CountyHealth "})),
        ];
        let selected = select(&records, "CountyHealth");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].record.id, 1);
    }

    #[test]
    fn role_comes_from_first_role_node() {
        let document = json!({
            "version": "2.0",
            "nodes": [
                {"type": "need", "name": "transport"},
                {"type": "role", "name": "Nurse"},
                {"type": "role", "name": "Backup"},
            ],
        });
        let records = vec![map(1, document)];
        let selected = select(&records, "2.0");
        assert_eq!(selected[0].role, "Nurse");
    }

    #[test]
    fn missing_or_malformed_nodes_fall_back_to_sentinel() {
        let records = vec![
            map(1, json!({"version": "2.0"})),
            map(2, json!({"version": "2.0", "nodes": []})),
            map(3, json!({"version": "2.0", "nodes": "oops"})),
            map(4, json!({"version": "2.0", "nodes": [{"type": "role"}]})),
        ];
        for matched in select(&records, "2.0") {
            assert_eq!(matched.role, NO_ROLE);
        }
    }

    #[test]
    fn output_preserves_input_order() {
        let records = vec![
            map(5, json!({"version": "2.0"})),
            map(1, json!({"version": "2.0"})),
            map(3, json!({"version": "2.0"})),
        ];
        let ids = select(&records, "2.0")
            .iter()
            .map(|matched| matched.record.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![5, 1, 3]);
    }
}
