//! Toggle the pin on an export version.

use clipforge_service::ClipForge;

pub fn run(forge: &ClipForge, project: String, version: u64) -> anyhow::Result<()> {
    let pinned = forge
        .toggle_pin(&project, version)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if pinned {
        println!("Pinned export v{version} of project {project}.");
        println!("  Pinned exports are exempt from garbage collection.");
    } else {
        println!("Unpinned export v{version} of project {project}.");
    }
    Ok(())
}
