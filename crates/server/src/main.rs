//! InternHub - internship report lifecycle and deadline scheduler.

use std::sync::Arc;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use internhub_core::{MentorId, Report, Student, StudentId};
use internhub_scheduler::TickOutcome;
use internhub_server::config::{GlobalArgs, ServeArgs};
use internhub_server::{init_logging, router, AppConfig, AppState};
use internhub_storage::Storage;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "internhub")]
#[command(about = "Internship report lifecycle and deadline scheduler", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the REST API and run the daily scheduler
    Serve(ServeArgs),
    /// Run one scheduler tick now
    Tick {
        /// Instant to tick for (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Mark past-deadline reports overdue
    Sweep,
    /// Recompute a student's progress
    Progress {
        /// Student ID
        student_id: String,
    },
    /// List reports for a student or a mentor
    Reports {
        /// Student ID
        #[arg(long, conflicts_with = "mentor", required_unless_present = "mentor")]
        student: Option<String>,
        /// Mentor ID
        #[arg(long)]
        mentor: Option<String>,
    },
    /// Load student records from a JSON array
    ImportStudents {
        /// Path to the JSON file
        file: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let serve_args = match &cli.command {
        Commands::Serve(args) => Some(args),
        _ => None,
    };
    let config = AppConfig::from_args(&cli.global, serve_args);
    let state = AppState::open(&config)
        .await
        .with_context(|| format!("Failed to open store at {}", config.data_dir.display()))?;

    match cli.command {
        Commands::Serve(_) => serve(state, &config).await?,
        Commands::Tick { at } => {
            let now = at.unwrap_or_else(Utc::now);
            match state.scheduler(&config).tick(now).await {
                TickOutcome::Completed(report) => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                TickOutcome::Skipped => println!("Tick skipped"),
            }
        }
        Commands::Sweep => {
            let overdue = state.manager.sweep_overdue(Utc::now()).await?;
            println!("Marked {} reports overdue", overdue.len());
            for report in &overdue {
                print_report(report);
            }
        }
        Commands::Progress { student_id } => {
            let id: StudentId = student_id
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid student ID"))?;
            let progress = state.manager.recompute_progress(id).await?;
            println!("Student: {}", id);
            println!("  Completed: {}/{}", progress.completed_reports, progress.total_reports);
            println!("  Completion: {:.1}%", progress.overall_completion_percentage);
        }
        Commands::Reports { student, mentor } => {
            let reports = match (student, mentor) {
                (Some(id), _) => {
                    let id: StudentId = id.parse().map_err(|_| anyhow::anyhow!("Invalid student ID"))?;
                    state.manager.reports_for_student(id).await?
                }
                (None, Some(id)) => {
                    let id: MentorId = id.parse().map_err(|_| anyhow::anyhow!("Invalid mentor ID"))?;
                    state.manager.reports_for_mentor(id).await?.all_reports
                }
                (None, None) => anyhow::bail!("--student or --mentor is required"),
            };

            println!("Reports ({})", reports.len());
            for report in &reports {
                print_report(report);
            }
        }
        Commands::ImportStudents { file } => {
            let raw = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let students: Vec<Student> = serde_json::from_slice(&raw)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            let storage = state.manager.storage();
            for student in &students {
                storage.save_student(student).await?;
            }
            println!("Imported {} students", students.len());
        }
    }

    Ok(())
}

async fn serve(state: Arc<AppState>, config: &AppConfig) -> Result<()> {
    let scheduler = Arc::new(state.scheduler(config));
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let scheduler_task = tokio::spawn({
        let scheduler = scheduler.clone();
        async move {
            scheduler
                .run(async move {
                    let _ = stop_rx.changed().await;
                })
                .await;
        }
    });

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on {}", config.bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = stop_tx.send(true);
    if let Err(e) = scheduler_task.await {
        error!("Scheduler task failed: {}", e);
    }
    info!("Server stopped after {} scheduler ticks", scheduler.ticks());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn print_report(report: &Report) {
    println!(
        "  {} | {} | {} | due {} - {}",
        report.id,
        report.status,
        report.kind,
        report.deadline.format("%Y-%m-%d"),
        report.title,
    );
}
