use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

use super::domain::{clean_text, Endpoint, EndpointError, RowUpdate, Status, TrackerDocument, TrackerRow};
use super::repository::{RepositoryError, TrackerRepository};
use super::summary::TrackerSummary;
use super::validate::{validate_document, ValidationReport};
use super::TrackerError;
use crate::catalog::RouteCatalog;

/// Body of `PATCH /api/v1/tracker/rows`.
#[derive(Debug, Clone, Deserialize)]
pub struct RowUpdateRequest {
    pub endpoint: String,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub blockers: Option<String>,
}

/// Body of `POST /api/v1/tracker/rows`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRowRequest {
    pub section: String,
    pub endpoint: String,
    pub screen: String,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub blockers: Option<String>,
}

/// Service composing the repository and the route catalog.
pub struct TrackerService<R> {
    repository: Arc<R>,
    catalog: Arc<RouteCatalog>,
    // Serializes load/modify/save cycles.
    write_lock: Mutex<()>,
}

impl<R> TrackerService<R>
where
    R: TrackerRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_catalog(repository, RouteCatalog::standard())
    }

    pub fn with_catalog(repository: Arc<R>, catalog: RouteCatalog) -> Self {
        Self {
            repository,
            catalog: Arc::new(catalog),
            write_lock: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &RouteCatalog {
        &self.catalog
    }

    pub fn document(&self) -> Result<TrackerDocument, TrackerServiceError> {
        Ok(self.repository.load()?)
    }

    pub fn summary(&self) -> Result<TrackerSummary, TrackerServiceError> {
        let document = self.repository.load()?;
        Ok(TrackerSummary::from_document(&document))
    }

    pub fn validate(&self) -> Result<ValidationReport, TrackerServiceError> {
        let document = self.repository.load()?;
        Ok(validate_document(&document, Some(&self.catalog)))
    }

    /// Apply a status/owner/blockers change and persist the document.
    pub fn update_row(
        &self,
        request: RowUpdateRequest,
        today: NaiveDate,
    ) -> Result<TrackerRow, TrackerServiceError> {
        let endpoint = Endpoint::parse(&request.endpoint)?;
        let update = RowUpdate {
            status: request.status,
            owner: request.owner,
            blockers: request.blockers,
        };
        if update.is_empty() {
            return Err(TrackerError::EmptyUpdate.into());
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = self.repository.load()?;
        let row = document.update_row(&endpoint, update, today)?.clone();
        self.repository.save(&document)?;

        info!(endpoint = %row.endpoint, status = row.status.label(), "tracker row updated");
        Ok(row)
    }

    /// Add a new row, creating its section when needed.
    pub fn add_row(
        &self,
        request: NewRowRequest,
        today: NaiveDate,
    ) -> Result<TrackerRow, TrackerServiceError> {
        let endpoint = Endpoint::parse(&request.endpoint)?;
        let screen = clean_text(&request.screen).ok_or(TrackerError::EmptyField("screen"))?;
        let row = TrackerRow {
            endpoint,
            screen,
            status: request.status.unwrap_or(Status::Todo),
            owner: request.owner.as_deref().and_then(clean_text),
            blockers: request.blockers.as_deref().and_then(clean_text),
        };

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = self.repository.load()?;
        let row = document.add_row(&request.section, row, today)?.clone();
        self.repository.save(&document)?;

        if !self.catalog.contains(&row.endpoint) {
            tracing::warn!(endpoint = %row.endpoint, "added row for a route outside the catalog");
        }
        info!(endpoint = %row.endpoint, section = %request.section, "tracker row added");
        Ok(row)
    }
}

/// Error raised by the tracker service.
#[derive(Debug, thiserror::Error)]
pub enum TrackerServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
