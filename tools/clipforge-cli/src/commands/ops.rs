//! Show a project's operation log.

use clipforge_service::ClipForge;

pub fn run(forge: &ClipForge, project: String, up_to: Option<u64>) -> anyhow::Result<()> {
    let operations = forge
        .operations(&project, up_to)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if operations.is_empty() {
        println!("No operations logged for project {project}.");
        return Ok(());
    }

    for operation in operations {
        println!(
            "v{}  {}  by {}  ({} ops)",
            operation.version,
            operation.created_at,
            operation.user_id,
            operation.ops.len()
        );
        for op in &operation.ops {
            println!("    {} / {}", op.op_type, op.effect);
        }
    }
    Ok(())
}
