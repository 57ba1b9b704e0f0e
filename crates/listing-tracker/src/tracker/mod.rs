//! Endpoint integration tracker: the markdown status table, its validation rules,
//! and the service/router pair that exposes it over HTTP.

pub mod csv_io;
pub mod domain;
pub mod parser;
pub mod render;
pub mod repository;
pub mod router;
pub mod service;
pub mod summary;
pub mod validate;

pub use csv_io::{read_csv, write_csv};
pub use domain::{
    clean_text, heading_text, Endpoint, EndpointError, HttpMethod, RowUpdate, Section, Status,
    TrackerDocument, TrackerRow, UnknownStatus,
};
pub use parser::{parse_document, ParsedDocument};
pub use render::render_markdown;
pub use repository::{InMemoryTrackerRepository, RepositoryError, TrackerRepository};
pub use router::tracker_router;
pub use service::{NewRowRequest, RowUpdateRequest, TrackerService, TrackerServiceError};
pub use summary::TrackerSummary;
pub use validate::{validate, validate_document, Issue, IssueKind, Severity, ValidationReport};

/// Errors raised while editing or converting a tracker document.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("no tracker row for {0}")]
    RowNotFound(String),
    #[error("{endpoint} is already tracked in section '{section}'")]
    DuplicateEndpoint { endpoint: String, section: String },
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{field} '{value}' cannot end with '#'")]
    InvalidHeading { field: &'static str, value: String },
    #[error("update must set at least one of status, owner or blockers")]
    EmptyUpdate,
    #[error("record {record}: {reason}")]
    InvalidRecord { record: usize, reason: String },
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
