//! Ingest a source video into the library.

use std::path::PathBuf;

use clipforge_service::ClipForge;

pub fn run(forge: &ClipForge, file: PathBuf) -> anyhow::Result<()> {
    let outcome = forge
        .ingest_video(&file)
        .map_err(|e| anyhow::anyhow!("Failed to ingest {}: {e}", file.display()))?;

    if outcome.existing {
        println!(
            "Duplicate content; aliased to existing video {} (ref count: {})",
            outcome.video.id, outcome.video.ref_count
        );
    } else {
        println!("Ingested video: {}", outcome.video.id);
    }
    println!("  Digest: {}", outcome.video.sha256);
    println!("  Stored at: {}", outcome.video.file_path.display());
    println!("  Size: {} bytes", outcome.video.size_bytes);

    Ok(())
}
