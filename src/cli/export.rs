//! CLI commands for data export
//!
//! `events` writes the events listing of a collection protocol; `audit`
//! exports the audit history of each event and merges it into one file.

use std::path::PathBuf;

use clap::Args;

use super::session::{open_session, resolve_cp_id};
use crate::api::OpenSpecimenApi;
use crate::audit::ValueNormalizer;
use crate::config::{OutputLayout, Settings};
use crate::display::format_audit_summary;
use crate::error::ExportResult;
use crate::services::{AuditExportService, EventService, ExportOptions};

/// Arguments shared by the export commands
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Collection Protocol ID (prompted for when omitted)
    #[arg(long)]
    pub cp_id: Option<String>,

    /// Directory the CSV files are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

/// Handle the events export
pub fn handle_events_command(settings: &Settings, args: &ExportArgs) -> ExportResult<()> {
    let cp_id = resolve_cp_id(args.cp_id.as_deref())?;
    let client = open_session(settings)?;

    println!("Fetching collection protocol events for CP ID: {}...", cp_id);
    export_events(&client, &cp_id, &OutputLayout::new(&args.output_dir, &cp_id))
}

/// Write the events listing through any API implementation
pub fn export_events<A: OpenSpecimenApi + ?Sized>(
    api: &A,
    cp_id: &str,
    layout: &OutputLayout,
) -> ExportResult<()> {
    match EventService::new(api).export_csv(cp_id, layout)? {
        Some((path, count)) => {
            println!("Exported {} events. File saved as: {}", count, path.display());
        }
        None => println!("No events found for this Collection Protocol."),
    }
    Ok(())
}

/// Handle the audit export
pub fn handle_audit_command(settings: &Settings, args: &ExportArgs) -> ExportResult<()> {
    let cp_id = resolve_cp_id(args.cp_id.as_deref())?;
    let client = open_session(settings)?;

    export_audits(
        &client,
        settings,
        &cp_id,
        &OutputLayout::new(&args.output_dir, &cp_id),
    )
}

/// Run the audit export through any API implementation
pub fn export_audits<A: OpenSpecimenApi + ?Sized>(
    api: &A,
    settings: &Settings,
    cp_id: &str,
    layout: &OutputLayout,
) -> ExportResult<()> {
    let event_service = EventService::new(api);

    println!("Fetching collection protocol events for CP ID: {}...", cp_id);
    let events = event_service.list(cp_id)?;
    if events.is_empty() {
        println!("No events found for this Collection Protocol.");
        return Ok(());
    }
    println!("Found {} events.", events.len());

    println!("Loading permissible values...");
    let tables = event_service.load_permissible_values(&settings.reference_fields)?;
    let normalizer = ValueNormalizer::new(&settings.reference_fields, tables);

    let service = AuditExportService::new(api, &normalizer, ExportOptions::from_settings(settings));
    let summary = service.run(&events, layout)?;

    println!();
    print!("{}", format_audit_summary(&summary));
    println!();

    match &summary.merged {
        Some((path, merge)) => println!(
            "Merged {} files ({} rows) into: {}",
            merge.files,
            merge.rows,
            path.display()
        ),
        None => println!("No wide audit files to merge."),
    }
    println!("Per-event files are in: {}", layout.audit_dir().display());

    Ok(())
}
