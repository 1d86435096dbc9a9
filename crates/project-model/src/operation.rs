//! Edit operation batches for the append-only log.
//!
//! Batches are recorded in append-only JSONL format for crash safety,
//! one JSON object per line under `oplog/{projectId}.jsonl`. Records are
//! created once and never mutated or deleted.

use serde::{Deserialize, Serialize};

/// A single edit descriptor inside a batch.
///
/// Effects are opaque to this subsystem: the media backend receives the
/// ordered `{effect, parameters}` pairs and is trusted to apply them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpDescriptor {
    /// Operation type (e.g. "apply_effect").
    #[serde(rename = "type")]
    pub op_type: String,

    /// Effect identifier (e.g. "brightness", "trim", "speed").
    pub effect: String,

    /// Effect parameters, passed through to the media backend untouched.
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl OpDescriptor {
    pub fn new(
        op_type: impl Into<String>,
        effect: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            op_type: op_type.into(),
            effect: effect.into(),
            parameters,
        }
    }
}

/// An accepted operation batch at a specific log version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditOperation {
    /// Unique operation identifier (UUID).
    pub id: String,

    /// Owning project.
    pub project_id: String,

    /// Log version this batch was accepted at. Unique per project; for a
    /// fixed project the versions present are exactly `1..=current_version`.
    pub version: u64,

    /// Ordered edit descriptors in this batch.
    pub ops: Vec<OpDescriptor>,

    /// User who appended the batch.
    pub user_id: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,
}

impl EditOperation {
    pub fn new(
        project_id: impl Into<String>,
        version: u64,
        ops: Vec<OpDescriptor>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            version,
            ops,
            user_id: user_id.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Validate an operation batch before it is accepted into the log.
///
/// A batch must be non-empty and every descriptor must name an
/// operation type and an effect.
pub fn validate_ops(ops: &[OpDescriptor]) -> Result<(), String> {
    if ops.is_empty() {
        return Err("operation batch must not be empty".to_string());
    }
    for (index, op) in ops.iter().enumerate() {
        if op.op_type.trim().is_empty() {
            return Err(format!("operation {index} has an empty type"));
        }
        if op.effect.trim().is_empty() {
            return Err(format!("operation {index} has an empty effect"));
        }
    }
    Ok(())
}

/// Parse operation batches from JSONL content (one JSON object per line).
pub fn parse_operations(jsonl: &str) -> Result<Vec<EditOperation>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize operation batches to JSONL format.
pub fn serialize_operations(operations: &[EditOperation]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for operation in operations {
        output.push_str(&serde_json::to_string(operation)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_roundtrip() {
        let op = EditOperation::new(
            "p1",
            1,
            vec![OpDescriptor::new(
                "apply_effect",
                "brightness",
                json!({"level": 0.2}),
            )],
            "alice",
        );
        let json = serde_json::to_string(&op).unwrap();
        let parsed: EditOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, parsed);
    }

    #[test]
    fn test_op_type_serializes_as_type() {
        let op = OpDescriptor::new("apply_effect", "trim", json!({"start": 1.0}));
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"type\":\"apply_effect\""));
        assert!(json.contains("\"effect\":\"trim\""));
    }

    #[test]
    fn test_validate_rejects_empty_batch() {
        assert!(validate_ops(&[]).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_effect() {
        let ops = vec![OpDescriptor::new("apply_effect", "  ", json!({}))];
        let err = validate_ops(&ops).unwrap_err();
        assert!(err.contains("empty effect"));
    }

    #[test]
    fn test_validate_accepts_well_formed_batch() {
        let ops = vec![
            OpDescriptor::new("apply_effect", "crop", json!({"w": 100})),
            OpDescriptor::new("apply_effect", "fade", json!({"secs": 0.5})),
        ];
        assert!(validate_ops(&ops).is_ok());
    }

    #[test]
    fn test_jsonl_roundtrip() {
        let operations = vec![
            EditOperation::new("p1", 1, vec![OpDescriptor::new("a", "trim", json!({}))], "u"),
            EditOperation::new("p1", 2, vec![OpDescriptor::new("a", "crop", json!({}))], "u"),
        ];
        let jsonl = serialize_operations(&operations).unwrap();
        let parsed = parse_operations(&jsonl).unwrap();
        assert_eq!(operations, parsed);
    }

    #[test]
    fn test_parse_operations_skips_comment_lines() {
        let jsonl = "# header\n\n";
        assert!(parse_operations(jsonl).unwrap().is_empty());
    }
}
