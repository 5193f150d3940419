use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use os_event_export::cli::{handle_audit_command, handle_events_command, ExportArgs};
use os_event_export::config::{ExporterPaths, Settings};

#[derive(Parser)]
#[command(
    name = "os-event-export",
    version,
    about = "Export OpenSpecimen collection protocol events and their audit history to CSV",
    long_about = "os-event-export fetches the events of an OpenSpecimen collection \
                  protocol and writes them to CSV. The audit command additionally \
                  exports the change history of every event, pivots it into one \
                  row per audit action and merges the results into a single file."
)]
struct Cli {
    /// Log verbosity (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the events of a collection protocol
    Events(ExportArgs),

    /// Export the audit history of every event of a collection protocol
    Audit(ExportArgs),

    /// Write the default settings file
    Init,

    /// Show current configuration and paths
    Config,
}

fn init_logger(level: LevelFilter) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let paths = ExporterPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    settings.apply_env_overrides();

    match cli.command {
        Some(Commands::Events(args)) => {
            if let Err(e) = handle_events_command(&settings, &args) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Audit(args)) => {
            if let Err(e) = handle_audit_command(&settings, &args) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Init) => {
            if paths.is_initialized() {
                println!(
                    "Settings already exist at: {}",
                    paths.settings_file().display()
                );
            } else {
                Settings::default().save(&paths)?;
                println!(
                    "Default settings written to: {}",
                    paths.settings_file().display()
                );
                println!("Set login_name (and optionally password) before exporting.");
            }
        }
        Some(Commands::Config) => {
            println!("os-event-export Configuration");
            println!("=============================");
            println!("Settings file:   {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  Base URL:          {}", settings.base_url);
            println!("  Login name:        {}", settings.login_name);
            println!(
                "  Password:          {}",
                if settings.password.is_some() { "(set)" } else { "(prompted)" }
            );
            println!("  Domain:            {}", settings.domain_name);
            println!(
                "  Polling:           every {}s, up to {}s",
                settings.poll_interval_secs, settings.max_wait_secs
            );
            println!("  Audit window:      {} days", settings.audit_window_days);
            for reference in &settings.reference_fields {
                println!(
                    "  Reference field:   {} -> {} ({:?})",
                    reference.field, reference.attribute, reference.fallback
                );
            }
        }
        None => {
            println!("os-event-export - OpenSpecimen event and audit exporter");
            println!();
            println!("Run 'os-event-export --help' for usage information.");
            println!("Run 'os-event-export audit' to export audit history.");
        }
    }

    Ok(())
}
