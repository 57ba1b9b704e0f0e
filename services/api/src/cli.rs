use crate::commands::{
    parse_tracker_path, run_export, run_import, run_init, run_set_status, run_summary,
    run_validate, ExportArgs, ImportArgs, InitArgs, SetStatusArgs, SummaryArgs, ValidateArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use listing_tracker::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Listing Tracker",
    about = "Track integration status of the rental-listing API from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Write a fresh tracker seeded from the API route catalog
    Init(InitArgs),
    /// Check the tracker's structure and compare it with the route catalog
    Validate(ValidateArgs),
    /// Print status counts, section progress, owner load and blocked rows
    Summary(SummaryArgs),
    /// Update the status, owner or blockers of one row
    SetStatus(SetStatusArgs),
    /// Export the tracker as CSV
    Export(ExportArgs),
    /// Convert a CSV spreadsheet into a markdown tracker
    Import(ImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured tracker document path
    #[arg(long, value_parser = parse_tracker_path)]
    pub(crate) tracker: Option<PathBuf>,
    /// Serve a seeded tracker held in memory instead of a file
    #[arg(long)]
    pub(crate) in_memory: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Init(args) => run_init(args),
        Command::Validate(args) => run_validate(args),
        Command::Summary(args) => run_summary(args),
        Command::SetStatus(args) => run_set_status(args),
        Command::Export(args) => run_export(args),
        Command::Import(args) => run_import(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["listing-tracker-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn set_status_accepts_positional_endpoint_and_status() {
        let cli = Cli::try_parse_from([
            "listing-tracker-api",
            "set-status",
            "POST /api/v1/auth/login/",
            "in progress",
            "--owner",
            "sam",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::SetStatus(args)) => {
                assert_eq!(args.endpoint, "POST /api/v1/auth/login/");
                assert_eq!(args.owner.as_deref(), Some("sam"));
            }
            other => panic!("expected set-status, got {other:?}"),
        }
    }

    #[test]
    fn set_status_rejects_statuses_outside_the_legend() {
        let result = Cli::try_parse_from([
            "listing-tracker-api",
            "set-status",
            "POST /api/v1/auth/login/",
            "shipped",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn tracker_flags_require_markdown_paths() {
        for args in [
            ["listing-tracker-api", "serve", "--tracker", "status.csv"],
            ["listing-tracker-api", "summary", "--tracker", "status.txt"],
            ["listing-tracker-api", "init", "--output", "status"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?} should be rejected");
        }

        let cli = Cli::try_parse_from(["listing-tracker-api", "serve", "--tracker", "status.md"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.tracker, Some(PathBuf::from("status.md")))
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn titles_ending_in_hash_are_rejected() {
        let result = Cli::try_parse_from(["listing-tracker-api", "init", "--title", "Tracker #"]);
        assert!(result.is_err());
    }
}
