//! ClipForge CLI — Command-line interface for the edit/render/export pipeline.
//!
//! Usage:
//!   clipforge ingest <FILE>            Ingest a source video into the library
//!   clipforge create <NAME>            Create a project over an ingested video
//!   clipforge append <PROJECT>         Append an edit operation batch
//!   clipforge ops <PROJECT>            Show the operation log
//!   clipforge export <PROJECT>         Request an export render
//!   clipforge exports <PROJECT>        List export versions
//!   clipforge pin <PROJECT> <VERSION>  Toggle the pin on an export
//!   clipforge status <JOB>             Show a render job's status
//!   clipforge gc <PHASE>               Run a garbage-collection phase

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "clipforge",
    about = "Versioned video editing with idempotent renders and safe garbage collection",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the library directory
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a source video into the library
    Ingest {
        /// Path to the video file
        file: PathBuf,
    },

    /// Create a new project over an ingested video
    Create {
        /// Project name
        name: String,

        /// Owning user id
        #[arg(short, long, default_value = "local")]
        user: String,

        /// Id of the ingested source video
        #[arg(long)]
        video: String,
    },

    /// List all projects
    Projects,

    /// Show one project record
    Info {
        /// Project id
        project: String,
    },

    /// Append an edit operation batch to a project
    Append {
        /// Project id
        project: String,

        /// Acting user id
        #[arg(short, long, default_value = "local")]
        user: String,

        /// Path to a JSON file holding the operation batch
        #[arg(long)]
        ops_file: PathBuf,
    },

    /// Show a project's operation log
    Ops {
        /// Project id
        project: String,

        /// Only show operations up to this version
        #[arg(long)]
        up_to: Option<u64>,
    },

    /// Request an export render for a project version
    Export {
        /// Project id
        project: String,

        /// Version to export (default: latest)
        #[arg(long)]
        version: Option<u64>,

        /// Output width
        #[arg(long)]
        width: Option<u32>,

        /// Output height
        #[arg(long)]
        height: Option<u32>,

        /// Output format: mp4-h264, mp4-h265, gif, webm
        #[arg(long)]
        format: Option<String>,

        /// Block until the render job finishes
        #[arg(long)]
        wait: bool,
    },

    /// List a project's export versions
    Exports {
        /// Project id
        project: String,
    },

    /// Toggle the pin on an export version
    Pin {
        /// Project id
        project: String,

        /// Export version
        version: u64,
    },

    /// Show a render job's status
    Status {
        /// Job id
        job: String,
    },

    /// Garbage collection over export artifacts
    #[command(subcommand)]
    Gc(GcCommands),
}

#[derive(Subcommand)]
enum GcCommands {
    /// Phase 1: mark eligible exports as GC candidates (flags only)
    Calculate {
        /// Minimum age in days before an unpinned export qualifies
        #[arg(long)]
        ttl_days: Option<u32>,

        /// Most recent exports per project to exempt
        #[arg(long)]
        keep_latest: Option<usize>,
    },

    /// List current GC candidates
    Candidates {
        /// Only candidates marked at least this many days ago
        #[arg(long)]
        older_than_days: Option<u32>,
    },

    /// Phase 2: relocate candidate artifacts under archive/
    Archive {
        /// Export ids to archive
        ids: Vec<String>,
    },

    /// Phase 3: destroy archived artifacts and their records
    Delete {
        /// Export ids to delete
        ids: Vec<String>,

        /// Acknowledge that deletion is irreversible
        #[arg(long)]
        confirmed: bool,
    },

    /// List source videos with no remaining owners (read-only)
    Unused,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    clipforge_common::logging::init_logging(&clipforge_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    let mut config = clipforge_common::config::AppConfig::load();
    if let Some(library) = cli.library {
        config.library_dir = library;
    }
    let forge = clipforge_service::ClipForge::open(config)?;

    match cli.command {
        Commands::Ingest { file } => commands::ingest::run(&forge, file),
        Commands::Create { name, user, video } => {
            commands::project::create(&forge, name, user, video)
        }
        Commands::Projects => commands::project::list(&forge),
        Commands::Info { project } => commands::project::info(&forge, project),
        Commands::Append {
            project,
            user,
            ops_file,
        } => commands::append::run(&forge, project, user, ops_file),
        Commands::Ops { project, up_to } => commands::ops::run(&forge, project, up_to),
        Commands::Export {
            project,
            version,
            width,
            height,
            format,
            wait,
        } => commands::export::run(&forge, project, version, width, height, format, wait).await,
        Commands::Exports { project } => commands::exports::run(&forge, project),
        Commands::Pin { project, version } => commands::pin::run(&forge, project, version),
        Commands::Status { job } => commands::status::run(&forge, job),
        Commands::Gc(gc) => match gc {
            GcCommands::Calculate {
                ttl_days,
                keep_latest,
            } => commands::gc::calculate(&forge, ttl_days, keep_latest),
            GcCommands::Candidates { older_than_days } => {
                commands::gc::candidates(&forge, older_than_days)
            }
            GcCommands::Archive { ids } => commands::gc::archive(&forge, ids),
            GcCommands::Delete { ids, confirmed } => commands::gc::delete(&forge, ids, confirmed),
            GcCommands::Unused => commands::gc::unused(&forge),
        },
    }
}
