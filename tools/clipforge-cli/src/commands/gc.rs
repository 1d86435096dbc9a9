//! Garbage-collection phases.

use clipforge_service::ClipForge;

pub fn calculate(
    forge: &ClipForge,
    ttl_days: Option<u32>,
    keep_latest: Option<usize>,
) -> anyhow::Result<()> {
    let defaults = forge.gc_defaults();
    let ttl_days = ttl_days.unwrap_or(defaults.ttl_days);
    let keep_latest = keep_latest.unwrap_or(defaults.keep_latest_n);

    let report = forge
        .gc_calculate(ttl_days, keep_latest)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    println!(
        "GC candidate calculation (ttl: {ttl_days} days, keep latest: {keep_latest})"
    );
    println!("  Newly marked: {}", report.newly_marked);
    println!("  Already marked: {}", report.already_marked);
    println!("  Exempt (pinned): {}", report.exempt_pinned);
    println!("  Exempt (recent): {}", report.exempt_recent);
    print_candidates(&report.candidates);
    println!("No files were touched; run `clipforge gc archive` next.");
    Ok(())
}

pub fn candidates(forge: &ClipForge, older_than_days: Option<u32>) -> anyhow::Result<()> {
    let candidates = forge.gc_candidates(older_than_days);
    if candidates.is_empty() {
        println!("No GC candidates.");
        return Ok(());
    }
    print_candidates(&candidates);
    Ok(())
}

pub fn archive(forge: &ClipForge, ids: Vec<String>) -> anyhow::Result<()> {
    if ids.is_empty() {
        anyhow::bail!("No export ids given");
    }
    let report = forge.gc_archive(&ids);

    println!("Archived {} export(s).", report.archived.len());
    for id in &report.archived {
        println!("  {id}");
    }
    for item in &report.errors {
        println!("  [ERROR] {}: {}", item.export_id, item.error);
    }
    Ok(())
}

pub fn delete(forge: &ClipForge, ids: Vec<String>, confirmed: bool) -> anyhow::Result<()> {
    if ids.is_empty() {
        anyhow::bail!("No export ids given");
    }
    let report = forge
        .gc_delete(&ids, confirmed)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("Deleted {} export(s).", report.deleted.len());
    for id in &report.deleted {
        println!("  {id}");
    }
    for item in &report.errors {
        println!("  [ERROR] {}: {}", item.export_id, item.error);
    }
    println!("Space reclaimed: {} bytes", report.space_saved_bytes);
    Ok(())
}

pub fn unused(forge: &ClipForge) -> anyhow::Result<()> {
    let videos = forge.unused_videos();
    if videos.is_empty() {
        println!("All source videos are referenced.");
        return Ok(());
    }
    println!("Unreferenced source videos (not deleted):");
    for video in videos {
        println!(
            "  {}  {}  {} bytes",
            video.id,
            video.file_path.display(),
            video.size_bytes
        );
    }
    Ok(())
}

fn print_candidates(candidates: &[clipforge_service::GcCandidate]) {
    for candidate in candidates {
        println!(
            "  {}  {} v{}  {}  {} bytes  {} days old",
            candidate.export_id,
            candidate.project_id,
            candidate.version,
            candidate.storage_key,
            candidate.size_bytes,
            candidate.age_days
        );
    }
}
