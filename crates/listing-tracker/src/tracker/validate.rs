use serde::Serialize;
use std::collections::HashMap;

use super::domain::{HttpMethod, Status, TrackerDocument};
use super::parser::ParsedDocument;
use crate::catalog::RouteCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MalformedTable,
    MalformedEndpoint,
    UnknownStatus,
    MissingScreen,
    RowOutsideSection,
    DuplicateEndpoint,
    DuplicateSection,
    EmptySection,
    BlockedWithoutNote,
    UnknownRoute,
    UntrackedRoute,
}

impl IssueKind {
    pub const fn severity(self) -> Severity {
        match self {
            Self::MalformedTable
            | Self::MalformedEndpoint
            | Self::UnknownStatus
            | Self::MissingScreen
            | Self::RowOutsideSection
            | Self::DuplicateEndpoint
            | Self::DuplicateSection => Severity::Error,
            Self::EmptySection
            | Self::BlockedWithoutNote
            | Self::UnknownRoute
            | Self::UntrackedRoute => Severity::Warning,
        }
    }
}

/// A single finding, tied to a 1-based line when the document came from markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    pub fn new(line: Option<usize>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            line,
            kind,
            severity: kind.severity(),
            message: message.into(),
        }
    }

    pub(crate) fn at(line: usize, kind: IssueKind, message: impl Into<String>) -> Self {
        Self::new(Some(line), kind, message)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub rows_checked: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    fn from_issues(rows_checked: usize, mut issues: Vec<Issue>) -> Self {
        issues.sort_by_key(|issue| (issue.line.unwrap_or(usize::MAX), issue.severity));
        let error_count = issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
            .count();
        let warning_count = issues.len() - error_count;

        Self {
            valid: error_count == 0,
            rows_checked,
            error_count,
            warning_count,
            issues,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }
}

/// Validates a parsed markdown tracker, keeping the parser's line-numbered findings.
pub fn validate(parsed: &ParsedDocument, catalog: Option<&RouteCatalog>) -> ValidationReport {
    let mut issues = parsed.issues.clone();
    issues.extend(structural_issues(
        &parsed.document,
        catalog,
        Some(&parsed.row_lines),
        Some(&parsed.section_lines),
    ));
    ValidationReport::from_issues(parsed.document.row_count(), issues)
}

/// Validates an in-memory document, e.g. one loaded from a repository or built from CSV.
pub fn validate_document(
    document: &TrackerDocument,
    catalog: Option<&RouteCatalog>,
) -> ValidationReport {
    let issues = structural_issues(document, catalog, None, None);
    ValidationReport::from_issues(document.row_count(), issues)
}

fn structural_issues(
    document: &TrackerDocument,
    catalog: Option<&RouteCatalog>,
    row_lines: Option<&[usize]>,
    section_lines: Option<&[usize]>,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    let row_line = |idx: usize| row_lines.and_then(|lines| lines.get(idx).copied());
    let section_line = |idx: usize| section_lines.and_then(|lines| lines.get(idx).copied());

    let mut seen_sections: HashMap<String, &str> = HashMap::new();
    for (idx, section) in document.sections.iter().enumerate() {
        let key = section.name.trim().to_lowercase();
        if let Some(first) = seen_sections.get(&key) {
            issues.push(Issue::new(
                section_line(idx),
                IssueKind::DuplicateSection,
                format!("section '{}' repeats '{}'", section.name, first),
            ));
        } else {
            seen_sections.insert(key, &section.name);
        }

        if section.rows.is_empty() {
            issues.push(Issue::new(
                section_line(idx),
                IssueKind::EmptySection,
                format!("section '{}' has no rows", section.name),
            ));
        }
    }

    let mut seen_endpoints: HashMap<(HttpMethod, String), &str> = HashMap::new();
    for (idx, (section, row)) in document.rows().enumerate() {
        match seen_endpoints.get(&row.endpoint.key()) {
            Some(first_section) => issues.push(Issue::new(
                row_line(idx),
                IssueKind::DuplicateEndpoint,
                format!(
                    "{} in '{}' is already tracked in '{}'",
                    row.endpoint, section.name, first_section
                ),
            )),
            None => {
                seen_endpoints.insert(row.endpoint.key(), &section.name);
            }
        }

        if row.status == Status::Blocked && row.blockers.is_none() {
            issues.push(Issue::new(
                row_line(idx),
                IssueKind::BlockedWithoutNote,
                format!("{} is blocked but has no blocker notes", row.endpoint),
            ));
        }

        if let Some(catalog) = catalog {
            if !catalog.contains(&row.endpoint) {
                issues.push(Issue::new(
                    row_line(idx),
                    IssueKind::UnknownRoute,
                    format!("{} is not a known API route", row.endpoint),
                ));
            }
        }
    }

    if let Some(catalog) = catalog {
        for route in catalog.routes() {
            if !seen_endpoints.contains_key(&route.endpoint.key()) {
                issues.push(Issue::new(
                    None,
                    IssueKind::UntrackedRoute,
                    format!(
                        "{} ({}) has no tracker row",
                        route.endpoint,
                        route.area.label()
                    ),
                ));
            }
        }
    }

    issues
}
