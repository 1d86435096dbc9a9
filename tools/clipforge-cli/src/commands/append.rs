//! Append an edit operation batch.

use std::path::PathBuf;

use clipforge_project_model::operation::OpDescriptor;
use clipforge_service::ClipForge;

pub fn run(
    forge: &ClipForge,
    project: String,
    user: String,
    ops_file: PathBuf,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&ops_file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", ops_file.display()))?;
    let ops: Vec<OpDescriptor> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid operation batch in {}: {e}", ops_file.display()))?;

    let outcome = forge
        .append_operations(&project, &user, ops)
        .map_err(|e| anyhow::anyhow!("Append failed: {e}"))?;

    println!("Appended batch at version {}", outcome.version);
    println!("  Operation: {}", outcome.operation_id);
    println!("  Proxy render job: {}", outcome.job_id);
    Ok(())
}
