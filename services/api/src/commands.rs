use crate::infra::{read_tracker, FileTrackerRepository};
use chrono::Local;
use clap::Args;
use listing_tracker::catalog::RouteCatalog;
use listing_tracker::config::{check_tracker_path, AppConfig};
use listing_tracker::error::AppError;
use listing_tracker::telemetry;
use listing_tracker::tracker::summary::UNASSIGNED;
use listing_tracker::tracker::{
    heading_text, read_csv, validate, write_csv, RowUpdateRequest, Status, TrackerDocument,
    TrackerRepository, TrackerService, TrackerServiceError, TrackerSummary, ValidationReport,
};
use std::fs::File;
use std::io::{self, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct InitArgs {
    /// Where to write the tracker (defaults to TRACKER_PATH)
    #[arg(long, value_parser = parse_tracker_path)]
    pub(crate) output: Option<PathBuf>,
    /// Heading for the new tracker (defaults to TRACKER_TITLE)
    #[arg(long, value_parser = parse_title)]
    pub(crate) title: Option<String>,
    /// Overwrite an existing tracker
    #[arg(long)]
    pub(crate) force: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Tracker document to check (defaults to TRACKER_PATH)
    #[arg(long, value_parser = parse_tracker_path)]
    pub(crate) tracker: Option<PathBuf>,
    /// Skip the comparison against the API route catalog
    #[arg(long)]
    pub(crate) no_catalog: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SummaryArgs {
    /// Tracker document to summarize (defaults to TRACKER_PATH)
    #[arg(long, value_parser = parse_tracker_path)]
    pub(crate) tracker: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SetStatusArgs {
    /// Row endpoint, e.g. "POST /api/v1/auth/login/"
    pub(crate) endpoint: String,
    /// New status from the legend (Todo, In Progress, Blocked, In Review, Done, Deferred)
    #[arg(value_parser = parse_status)]
    pub(crate) status: Status,
    /// Assign the row (empty string clears the owner)
    #[arg(long)]
    pub(crate) owner: Option<String>,
    /// Blocker notes (empty string clears them)
    #[arg(long)]
    pub(crate) blockers: Option<String>,
    /// Tracker document to edit (defaults to TRACKER_PATH)
    #[arg(long, value_parser = parse_tracker_path)]
    pub(crate) tracker: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Tracker document to export (defaults to TRACKER_PATH)
    #[arg(long, value_parser = parse_tracker_path)]
    pub(crate) tracker: Option<PathBuf>,
    /// Write CSV to this file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV file with Section,Endpoint,Screen,Status,Owner,Blockers columns
    pub(crate) csv: PathBuf,
    /// Where to write the markdown tracker (defaults to TRACKER_PATH)
    #[arg(long, value_parser = parse_tracker_path)]
    pub(crate) output: Option<PathBuf>,
    /// Heading for the tracker (defaults to TRACKER_TITLE)
    #[arg(long, value_parser = parse_title)]
    pub(crate) title: Option<String>,
    /// Overwrite an existing tracker
    #[arg(long)]
    pub(crate) force: bool,
}

pub(crate) fn parse_status(raw: &str) -> Result<Status, String> {
    raw.parse::<Status>().map_err(|err| err.to_string())
}

pub(crate) fn parse_tracker_path(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    check_tracker_path(&path).map_err(|err| err.to_string())?;
    Ok(path)
}

pub(crate) fn parse_title(raw: &str) -> Result<String, String> {
    heading_text("title", raw).map_err(|err| err.to_string())
}

pub(crate) fn run_init(args: InitArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let path = args.output.unwrap_or(config.tracker.path);
    let title = args.title.unwrap_or(config.tracker.title);
    refuse_overwrite(&path, args.force)?;

    let mut document = RouteCatalog::standard().seed_document(&title);
    document.updated_on = Some(Local::now().date_naive());
    save(&path, &document)?;

    println!(
        "Wrote {} rows across {} sections to {}",
        document.row_count(),
        document.sections.len(),
        path.display()
    );
    Ok(())
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let path = tracker_path(args.tracker)?;
    let parsed = read_tracker(&path)?;
    let catalog = (!args.no_catalog).then(RouteCatalog::standard);
    let report = validate(&parsed, catalog.as_ref());

    render_validation(&path, &report);

    if report.is_valid() {
        Ok(())
    } else {
        Err(AppError::Validation {
            errors: report.error_count,
        })
    }
}

pub(crate) fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let path = tracker_path(args.tracker)?;
    let document = load(&path)?;
    let summary = TrackerSummary::from_document(&document);
    render_summary(&document, &summary);
    Ok(())
}

pub(crate) fn run_set_status(args: SetStatusArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let path = args.tracker.unwrap_or(config.tracker.path);

    let service = TrackerService::new(Arc::new(FileTrackerRepository::new(path)));
    let row = service.update_row(
        RowUpdateRequest {
            endpoint: args.endpoint,
            status: Some(args.status),
            owner: args.owner,
            blockers: args.blockers,
        },
        Local::now().date_naive(),
    )?;

    println!(
        "{} -> {} (owner: {}, blockers: {})",
        row.endpoint,
        row.status,
        row.owner.as_deref().unwrap_or("none"),
        row.blockers.as_deref().unwrap_or("none")
    );
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let path = tracker_path(args.tracker)?;
    let document = load(&path)?;

    match args.output {
        Some(output) => {
            let file = File::create(&output)?;
            write_csv(&document, BufWriter::new(file))?;
            eprintln!("Exported {} rows to {}", document.row_count(), output.display());
        }
        None => write_csv(&document, io::stdout().lock())?,
    }
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let path = args.output.unwrap_or(config.tracker.path);
    let title = args.title.unwrap_or(config.tracker.title);
    refuse_overwrite(&path, args.force)?;

    let mut document = read_csv(File::open(&args.csv)?, &title)?;
    document.updated_on = Some(Local::now().date_naive());
    save(&path, &document)?;

    println!(
        "Imported {} rows into {} sections at {}",
        document.row_count(),
        document.sections.len(),
        path.display()
    );
    Ok(())
}

fn tracker_path(explicit: Option<PathBuf>) -> Result<PathBuf, AppError> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(AppConfig::load()?.tracker.path),
    }
}

fn refuse_overwrite(path: &Path, force: bool) -> Result<(), AppError> {
    if path.exists() && !force {
        return Err(AppError::Io(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("{} already exists; pass --force to overwrite", path.display()),
        )));
    }
    Ok(())
}

fn load(path: &Path) -> Result<TrackerDocument, AppError> {
    FileTrackerRepository::new(path)
        .load()
        .map_err(|err| TrackerServiceError::from(err).into())
}

fn save(path: &Path, document: &TrackerDocument) -> Result<(), AppError> {
    FileTrackerRepository::new(path)
        .save(document)
        .map_err(|err| TrackerServiceError::from(err).into())
}

fn render_validation(path: &Path, report: &ValidationReport) {
    println!("Validated {} ({} rows)", path.display(), report.rows_checked);

    if report.issues.is_empty() {
        println!("No issues found");
        return;
    }

    for issue in &report.issues {
        let location = match issue.line {
            Some(line) => format!("line {line}"),
            None => "catalog".to_string(),
        };
        println!(
            "- [{}] {}: {}",
            issue.severity.label(),
            location,
            issue.message
        );
    }

    println!(
        "\n{} error(s), {} warning(s)",
        report.error_count, report.warning_count
    );
}

fn render_summary(document: &TrackerDocument, summary: &TrackerSummary) {
    println!("{}", document.title);
    if let Some(updated_on) = document.updated_on {
        println!("Last updated {updated_on}");
    }
    println!(
        "{} rows, {:.1}% complete (deferred rows excluded)",
        summary.total_rows, summary.overall_completion_pct
    );

    println!("\nStatus counts");
    for entry in &summary.status_counts {
        println!("- {}: {}", entry.status_label, entry.count);
    }

    println!("\nSection progress");
    for progress in &summary.section_progress {
        println!(
            "- {}: {}/{} done, {} deferred ({:.1}%)",
            progress.section, progress.done, progress.total, progress.deferred, progress.completion_pct
        );
    }

    if summary.owner_load.is_empty() {
        println!("\nOwner load: none");
    } else {
        println!("\nOwner load");
        for load in &summary.owner_load {
            println!(
                "- {}: {} open, {} blocked",
                load.owner.as_deref().unwrap_or(UNASSIGNED),
                load.open,
                load.blocked
            );
        }
    }

    if summary.blocked.is_empty() {
        println!("\nBlocked rows: none");
    } else {
        println!("\nBlocked rows");
        for row in &summary.blocked {
            println!(
                "- {} ({}), owner {}: {}",
                row.endpoint,
                row.section,
                row.owner.as_deref().unwrap_or(UNASSIGNED),
                row.blockers.as_deref().unwrap_or("no notes")
            );
        }
    }
}
