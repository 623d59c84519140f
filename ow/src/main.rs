//! Objective Wizard - ABCD learning-objective authoring for courses
//!
//! CLI entry point for inspecting, editing, and exporting the wizard
//! state of a course.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::Utc;
use clap::{CommandFactory, Parser};
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use courseapi::client::CourseApiClient;
use courseapi::model::{BloomLevel, CourseSnapshot};

use objwizard::cli::{Cli, Command, ExportFormat, OutputFormat, SourceArgs, get_log_path};
use objwizard::compose::{StepKey, compose_objective_text, derive_step_status};
use objwizard::config::Config;
use objwizard::repl::WizardRepl;
use objwizard::session::{SessionEvent, SessionHandle, SessionState};
use objwizard::trace;

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
    }

    // Log level priority: CLI --log-level > default (INFO)
    let level = if let Some(s) = cli_log_level {
        match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        }
    } else {
        tracing::Level::INFO
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;

    info!("Objective wizard loaded config: api={}", config.api.base_url);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Status { source, format }) => {
            debug!(?format, "main: matched Status command");
            cmd_status(&config, &source, format).await
        }
        Some(Command::Report { source, format }) => {
            debug!(?format, "main: matched Report command");
            cmd_report(&config, &source, format).await
        }
        Some(Command::Compose { source, objective }) => {
            debug!(?objective, "main: matched Compose command");
            cmd_compose(&config, &source, objective.as_deref()).await
        }
        Some(Command::Export {
            source,
            format,
            output,
        }) => {
            debug!(?format, ?output, "main: matched Export command");
            cmd_export(&config, &source, format, output.as_deref()).await
        }
        Some(Command::Edit { source }) => {
            debug!("main: matched Edit command");
            cmd_edit(&config, &source).await
        }
        Some(Command::Seed { source }) => {
            debug!("main: matched Seed command");
            cmd_seed(&config, &source).await
        }
        Some(Command::Verbs { level }) => {
            debug!(?level, "main: matched Verbs command");
            cmd_verbs(level.as_deref())
        }
        None => {
            debug!("main: no command specified, printing help");
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn api_client(config: &Config) -> Result<CourseApiClient> {
    CourseApiClient::new(config.api.base_url.as_str(), config.api.timeout())
        .context("Failed to build API client")
}

/// Load the course snapshot from a JSON file or from the API.
async fn load_snapshot(config: &Config, source: &SourceArgs) -> Result<CourseSnapshot> {
    if let Some(path) = &source.file {
        debug!(?path, "load_snapshot: reading file");
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        return Ok(snapshot);
    }
    let Some(course_id) = source.course.as_deref() else {
        return Err(eyre::eyre!(
            "Provide a course with --course or a snapshot file with --file"
        ));
    };
    debug!(%course_id, url = %config.api.base_url, "load_snapshot: fetching from API");
    let client = api_client(config)?;
    let snapshot = client
        .fetch_snapshot(course_id)
        .await
        .with_context(|| format!("Failed to fetch course '{}'", course_id))?;
    Ok(snapshot)
}

/// Show per-step progress for a course
async fn cmd_status(config: &Config, source: &SourceArgs, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_status: called");
    let snapshot = load_snapshot(config, source).await?;
    let state = SessionState::from_snapshot(snapshot);
    let steps = derive_step_status(
        &state.gap,
        &state.triage_items,
        &state.sub_tasks,
        &state.objectives,
    );

    match format {
        OutputFormat::Json => {
            debug!("cmd_status: format is Json");
            println!("{}", serde_json::to_string_pretty(&steps)?);
        }
        OutputFormat::Text | OutputFormat::Table => {
            debug!("cmd_status: format is Text or Table");
            let title = if state.title.is_empty() {
                state.course_id.clone()
            } else {
                state.title.clone()
            };
            println!("{}", title);
            println!("Gap: {}", state.gap.label());
            println!();
            for key in StepKey::ORDERED {
                if let Some(status) = steps.get(&key) {
                    println!("  {} {}", status.symbol(), key.label());
                }
            }
        }
    }

    Ok(())
}

/// Show the coverage report for a course
async fn cmd_report(config: &Config, source: &SourceArgs, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_report: called");
    let snapshot = load_snapshot(config, source).await?;
    let state = SessionState::from_snapshot(snapshot);
    let report = trace::build_report(&state.triage_items, &state.objectives);

    match format {
        OutputFormat::Json => {
            debug!("cmd_report: format is Json");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text | OutputFormat::Table => {
            debug!("cmd_report: format is Text or Table");
            print!("{}", report.render_text());
        }
    }

    Ok(())
}

/// Print composed objective sentences, all of them or a single one by id
async fn cmd_compose(config: &Config, source: &SourceArgs, objective: Option<&str>) -> Result<()> {
    debug!(?objective, "cmd_compose: called");
    let snapshot = load_snapshot(config, source).await?;
    let state = SessionState::from_snapshot(snapshot);
    let audience = state.default_audience(&config.defaults.audience);

    if let Some(id) = objective {
        let Some(obj) = state.objective(id) else {
            return Err(eyre::eyre!("No objective with id '{}'", id));
        };
        println!("{}", compose_objective_text(obj, &audience));
        return Ok(());
    }

    if state.objectives.is_empty() {
        debug!("cmd_compose: no objectives");
        println!("No objectives yet.");
        return Ok(());
    }
    for (i, obj) in state.objectives.iter().enumerate() {
        println!("{:>3}. {}", i + 1, compose_objective_text(obj, &audience));
    }

    Ok(())
}

/// Export grouped objectives as markdown or JSON
async fn cmd_export(
    config: &Config,
    source: &SourceArgs,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    debug!(?format, ?output, "cmd_export: called");
    let snapshot = load_snapshot(config, source).await?;
    let state = SessionState::from_snapshot(snapshot);
    let audience = state.default_audience(&config.defaults.audience);
    let groups = trace::build_export(&state.triage_items, &state.objectives, &audience);

    let rendered = match format {
        ExportFormat::Markdown => {
            debug!("cmd_export: rendering markdown");
            trace::render_markdown(&groups, Utc::now())
        }
        ExportFormat::Json => {
            debug!("cmd_export: rendering JSON");
            let mut json = serde_json::to_string_pretty(&groups)?;
            json.push('\n');
            json
        }
    };

    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Open the interactive wizard on a course
async fn cmd_edit(config: &Config, source: &SourceArgs) -> Result<()> {
    debug!("cmd_edit: called");
    let Some(course_id) = source.course.as_deref() else {
        return Err(eyre::eyre!(
            "The editor saves through the API; provide --course, not --file"
        ));
    };

    let client = api_client(config)?;
    let snapshot = client
        .fetch_snapshot(course_id)
        .await
        .with_context(|| format!("Failed to fetch course '{}'", course_id))?;
    let state = SessionState::from_snapshot(snapshot);
    info!(%course_id, "cmd_edit: session starting");

    let session = SessionHandle::spawn(state, client, config.autosave.clone());
    let mut repl = WizardRepl::new(session, config.defaults.audience.clone());
    repl.run().await
}

/// Create blank linked objectives for active items that have none
async fn cmd_seed(config: &Config, source: &SourceArgs) -> Result<()> {
    debug!("cmd_seed: called");
    let Some(course_id) = source.course.as_deref() else {
        return Err(eyre::eyre!(
            "Seeding writes through the API; provide --course, not --file"
        ));
    };

    let client = api_client(config)?;
    let snapshot = client
        .fetch_snapshot(course_id)
        .await
        .with_context(|| format!("Failed to fetch course '{}'", course_id))?;
    let state = SessionState::from_snapshot(snapshot);

    let session = SessionHandle::spawn(state, client, config.autosave.clone());
    let mut events = session.subscribe_events();
    let created = session.seed_uncovered().await?;

    if created.is_empty() {
        debug!("cmd_seed: nothing to do");
        println!("Every active item already has an objective.");
        session.shutdown().await?;
        return Ok(());
    }

    println!("Creating {} objective(s)...", created.len());

    // Creates settle asynchronously. Wait for each temp id to be
    // confirmed or rejected before tearing the session down.
    let mut outstanding: HashSet<String> = created.iter().cloned().collect();
    let mut confirmed = 0usize;
    let deadline =
        tokio::time::Instant::now() + config.api.timeout() + config.autosave.request_timeout();

    while !outstanding.is_empty() {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Ok(SessionEvent::CreateConfirmed { temp_id, .. })) => {
                if outstanding.remove(&temp_id) {
                    confirmed += 1;
                }
            }
            Ok(Ok(SessionEvent::CreateRejected { temp_id, .. })) => {
                outstanding.remove(&temp_id);
            }
            Ok(Ok(_)) => {}
            Ok(Err(_)) => {
                debug!("cmd_seed: event channel closed");
                break;
            }
            Err(_) => {
                warn!(
                    outstanding = outstanding.len(),
                    "cmd_seed: timed out waiting for creates to settle"
                );
                break;
            }
        }
    }

    if confirmed == created.len() {
        println!("Created {} objective(s).", confirmed);
    } else {
        println!(
            "Created {} of {} objective(s); see the log for details.",
            confirmed,
            created.len()
        );
    }

    session.shutdown().await?;
    Ok(())
}

/// Print Bloom verb suggestions
fn cmd_verbs(level: Option<&str>) -> Result<()> {
    debug!(?level, "cmd_verbs: called");
    match level {
        Some(raw) => {
            let level: BloomLevel = raw.parse().map_err(|e: String| eyre::eyre!(e))?;
            println!("{:<13} {}", level.to_string(), level.verbs().join(", "));
        }
        None => {
            for level in BloomLevel::ALL {
                println!("{:<13} {}", level.to_string(), level.verbs().join(", "));
            }
        }
    }

    Ok(())
}
