//! Create, list, and inspect projects.

use clipforge_service::ClipForge;

pub fn create(forge: &ClipForge, name: String, user: String, video: String) -> anyhow::Result<()> {
    let project = forge
        .create_project(&name, &user, &video)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Created project: {}", project.name);
    println!("  ID: {}", project.id);
    println!("  Owner: {}", project.owner_id);
    println!("  Source video: {}", project.video_id);
    Ok(())
}

pub fn list(forge: &ClipForge) -> anyhow::Result<()> {
    let mut projects = forge.projects();
    projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    if projects.is_empty() {
        println!("No projects in the library.");
        return Ok(());
    }
    for p in projects {
        println!("{}  v{}  {}", p.id, p.current_version, p.name);
    }
    Ok(())
}

pub fn info(forge: &ClipForge, project: String) -> anyhow::Result<()> {
    let p = forge
        .get_project(&project)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Owner: {}", p.owner_id);
    println!("  Source video: {}", p.video_id);
    println!("  Current version: {}", p.current_version);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.modified_at);
    match p.latest_proxy_key {
        Some(key) => println!("  Latest proxy: {key}"),
        None => println!("  Latest proxy: (none)"),
    }
    match p.latest_export_key {
        Some(key) => println!("  Latest export: {key}"),
        None => println!("  Latest export: (none)"),
    }
    Ok(())
}
