//! Stencil command-line client

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stencil_client::{Action, ClientConfig, Completed, Level, Notice, Orchestrator};
use stencil_shared::{JobId, LibraryItemId, Target, UploadId};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "stencil")]
#[command(about = "Turn website screenshots into Django or Next.js starter templates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend API base URL (overrides STENCIL_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Base URL for /media references (overrides STENCIL_MEDIA_URL)
    #[arg(long, global = true)]
    media_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List uploads, conversion jobs and library items
    Status,

    /// Upload a screenshot (PNG, JPEG or WebP, at most 10 MB)
    Upload {
        /// Path to the screenshot
        file: PathBuf,

        /// Title (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Free-text notes
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Queue a conversion of a READY upload
    Convert {
        upload: UploadId,

        /// Output framework (django, nextjs)
        #[arg(short, long)]
        target: Target,

        /// Wait for the job to finish
        #[arg(short, long)]
        watch: bool,
    },

    /// Add a successful job's archive to the library
    Promote {
        job: JobId,

        /// Library item name
        #[arg(short, long)]
        name: String,
    },

    /// Delete an upload (its jobs are kept)
    DeleteUpload { id: UploadId },

    /// Delete a library item
    DeleteItem { id: LibraryItemId },

    /// Poll a job until it finishes
    Watch { job: JobId },

    /// Download the archive of a job or library item
    Download {
        /// Job or library item id
        id: Uuid,

        /// Directory to save into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging (respects RUST_LOG env var)
    let default_filter = if cli.verbose {
        "stencil_client=debug,info"
    } else {
        "stencil_client=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(url) = cli.media_url {
        config.media_url = url;
    }
    tracing::debug!(?config, "Loaded configuration");

    let orch = Orchestrator::from_config(&config)?;

    // Every command works against a fresh snapshot.
    let loaded = orch.dispatch(Action::Refresh).await;
    let loaded = match loaded {
        Ok(done) => done,
        Err(notice) => fail(&notice),
    };

    let action = match cli.command {
        Commands::Status => {
            print_status(&orch);
            report(&loaded.notice());
            return Ok(());
        }
        Commands::Upload { file, title, notes } => {
            let image = tokio::fs::read(&file).await?;
            let title = title.unwrap_or_else(|| {
                file.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let file_name = file
                .file_name()
                .map(|s| s.to_string_lossy().into_owned());
            Action::Upload {
                image,
                title,
                notes,
                file_name,
            }
        }
        Commands::Convert {
            upload,
            target,
            watch,
        } => {
            let job = run(&orch, Action::Convert { upload, target }).await;
            match job {
                Completed::Queued(job) if watch => Action::Watch(job.id),
                _ => return Ok(()),
            }
        }
        Commands::Promote { job, name } => Action::Promote { job, name },
        Commands::DeleteUpload { id } => Action::DeleteUpload(id),
        Commands::DeleteItem { id } => Action::DeleteLibraryItem(id),
        Commands::Watch { job } => Action::Watch(job),
        Commands::Download { id, out } => match orch.snapshot().locate_artifact(id) {
            Some(source) => Action::Download { source, dir: out },
            None => fail(&Notice::error(format!(
                "Download failed: no job or library item with id {id}"
            ))),
        },
    };

    run(&orch, action).await;
    Ok(())
}

/// Dispatch an action, print its notice and exit non-zero on failure.
async fn run(orch: &Orchestrator, action: Action) -> Completed {
    match orch.dispatch(action).await {
        Ok(done) => {
            let notice = done.notice();
            report(&notice);
            if notice.is_error() {
                std::process::exit(1);
            }
            done
        }
        Err(notice) => fail(&notice),
    }
}

fn report(notice: &Notice) {
    match notice.level {
        Level::Error => eprintln!("error: {notice}"),
        Level::Success | Level::Info => println!("{notice}"),
    }
}

fn fail(notice: &Notice) -> ! {
    report(notice);
    std::process::exit(1);
}

fn print_status(orch: &Orchestrator) {
    let snapshot = orch.snapshot();

    println!("Uploads");
    for upload in &snapshot.uploads {
        println!(
            "  {}  {:<7}  {}  {}",
            upload.id,
            upload.status.as_str(),
            upload.created_at.format("%Y-%m-%d %H:%M"),
            upload.title
        );
    }

    println!(
        "  {} of {} ready to convert",
        snapshot.convertible_uploads().len(),
        snapshot.uploads.len()
    );

    println!("Jobs");
    for job in &snapshot.jobs {
        let orphan = if snapshot.upload(job.upload_id).is_none() {
            "  (upload deleted)"
        } else {
            ""
        };
        println!(
            "  {}  {:<7}  {:<7}  {}{orphan}",
            job.id,
            job.status.as_str(),
            job.target.label(),
            job.upload_title
        );
    }

    println!("Library");
    for target in Target::ALL {
        for item in snapshot.library_by_target(target) {
            println!(
                "  {}  {:<7}  {}",
                item.id,
                item.target.label(),
                item.name
            );
        }
    }
}
