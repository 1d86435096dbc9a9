//! Request an export render for a project version.

use clipforge_project_model::project::{ExportFormat, RenderOptions, Resolution};
use clipforge_service::{ClipForge, ExportRequestOutcome};

pub async fn run(
    forge: &ClipForge,
    project: String,
    version: Option<u64>,
    width: Option<u32>,
    height: Option<u32>,
    format: Option<String>,
    wait: bool,
) -> anyhow::Result<()> {
    let options = build_options(width, height, format)?;

    let outcome = forge
        .request_export(&project, version, options)
        .map_err(|e| anyhow::anyhow!("Export request failed: {e}"))?;

    match outcome {
        ExportRequestOutcome::Existing { export, .. } => {
            println!("Export already exists for v{}:", export.version);
            println!("  Artifact: {}", export.storage_key);
            println!("  Size: {} bytes", export.size_bytes);
            Ok(())
        }
        ExportRequestOutcome::Pending { job_id, .. } => {
            println!("Export job enqueued: {job_id}");
            if wait {
                poll(forge, &project, &job_id).await
            } else {
                println!("  Poll with: clipforge status {job_id}");
                Ok(())
            }
        }
    }
}

/// Options only when the caller overrode something; otherwise the
/// service fills in configured defaults.
fn build_options(
    width: Option<u32>,
    height: Option<u32>,
    format: Option<String>,
) -> anyhow::Result<Option<RenderOptions>> {
    if width.is_none() && height.is_none() && format.is_none() {
        return Ok(None);
    }
    let defaults = RenderOptions::default();
    let format = match format {
        Some(name) => name
            .parse::<ExportFormat>()
            .map_err(|e| anyhow::anyhow!(e))?,
        None => defaults.format,
    };
    Ok(Some(RenderOptions {
        resolution: Resolution::new(
            width.unwrap_or(defaults.resolution.width),
            height.unwrap_or(defaults.resolution.height),
        ),
        format,
    }))
}

async fn poll(forge: &ClipForge, project: &str, job_id: &str) -> anyhow::Result<()> {
    loop {
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        let Some(job) = forge.job_status(job_id) else {
            anyhow::bail!("Job {job_id} disappeared while waiting");
        };
        if !job.state.is_terminal() {
            continue;
        }
        if let Some(error) = job.error {
            anyhow::bail!("Export failed: {error}");
        }
        let p = forge.get_project(project)?;
        match p.latest_export_key {
            Some(key) => println!("Export complete: {key}"),
            None => println!("Export complete."),
        }
        return Ok(());
    }
}
