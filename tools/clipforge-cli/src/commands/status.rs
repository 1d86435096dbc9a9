//! Show a render job's status.

use clipforge_service::ClipForge;

pub fn run(forge: &ClipForge, job: String) -> anyhow::Result<()> {
    let Some(record) = forge.job_status(&job) else {
        println!("Unknown job: {job}");
        println!("  Finished job records are reclaimed after the retention window.");
        return Ok(());
    };

    println!("Job: {}", record.id);
    println!("  State: {:?}", record.state);
    println!("  Enqueued: {}", record.enqueued_at);
    if let Some(started_at) = record.started_at {
        println!("  Started: {started_at}");
    }
    if let Some(finished_at) = record.finished_at {
        println!("  Finished: {finished_at}");
    }
    if let Some(error) = record.error {
        println!("  Error: {error}");
    }
    Ok(())
}
