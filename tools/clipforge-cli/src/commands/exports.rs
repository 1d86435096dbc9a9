//! List a project's export versions.

use clipforge_service::ClipForge;

pub fn run(forge: &ClipForge, project: String) -> anyhow::Result<()> {
    let exports = forge
        .list_exports(&project)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if exports.is_empty() {
        println!("No exports for project {project}.");
        return Ok(());
    }

    for export in exports {
        let mut flags = vec![];
        if export.pinned {
            flags.push("pinned");
        }
        if export.gc_candidate {
            flags.push("gc-candidate");
        }
        if export.archived {
            flags.push("archived");
        }
        println!(
            "v{}  {}  {}  {} bytes  {:.1}s  [{}]",
            export.version,
            export.id,
            export.storage_key,
            export.size_bytes,
            export.duration_secs,
            flags.join(", ")
        );
    }
    Ok(())
}
