use listing_tracker::error::AppError;
use listing_tracker::tracker::{
    parse_document, render_markdown, ParsedDocument, RepositoryError, TrackerDocument,
    TrackerRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Markdown file on disk. Saves go through a sibling temp file and a rename.
#[derive(Debug, Clone)]
pub(crate) struct FileTrackerRepository {
    path: PathBuf,
}

impl FileTrackerRepository {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl TrackerRepository for FileTrackerRepository {
    fn load(&self) -> Result<TrackerDocument, RepositoryError> {
        let source = match fs::read_to_string(&self.path) {
            Ok(source) => source,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(RepositoryError::NotFound),
            Err(err) => return Err(RepositoryError::Unavailable(err.to_string())),
        };

        let parsed = parse_document(&source);
        // Rows with issues were dropped by the parser; saving would lose them.
        if let Some(first) = parsed.issues.first() {
            let line = first
                .line
                .map(|line| format!("line {line}: "))
                .unwrap_or_default();
            let more = parsed.issues.len() - 1;
            let suffix = if more > 0 {
                format!(" (+{more} more)")
            } else {
                String::new()
            };
            return Err(RepositoryError::Corrupt(format!(
                "{}: {line}{}{suffix}",
                self.path.display(),
                first.message
            )));
        }

        Ok(parsed.document)
    }

    fn save(&self, document: &TrackerDocument) -> Result<(), RepositoryError> {
        let rendered = render_markdown(document);
        let reread = parse_document(&rendered);
        if reread.has_issues() || reread.document != *document {
            return Err(RepositoryError::Corrupt(format!(
                "{}: document would not read back unchanged; refusing to write",
                self.path.display()
            )));
        }

        let unavailable = |err: std::io::Error| RepositoryError::Unavailable(err.to_string());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(unavailable)?;
        }

        let staging = self.path.with_extension("md.tmp");
        fs::write(&staging, rendered).map_err(unavailable)?;
        fs::rename(&staging, &self.path).map_err(unavailable)?;
        Ok(())
    }
}

/// Reads and parses the tracker without rejecting issues, for reporting.
pub(crate) fn read_tracker(path: &Path) -> Result<ParsedDocument, AppError> {
    let source = fs::read_to_string(path)?;
    Ok(parse_document(&source))
}

#[cfg(test)]
pub(crate) fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("listing-tracker-{}-{name}", std::process::id()))
        .join("API_INTEGRATION_STATUS.md")
}
