use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::TrackerError;

/// Workflow state of a tracker row. The legend is fixed and applies to every section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Todo,
    InProgress,
    Blocked,
    InReview,
    Done,
    Deferred,
}

impl Status {
    pub const fn legend() -> [Self; 6] {
        [
            Self::Todo,
            Self::InProgress,
            Self::Blocked,
            Self::InReview,
            Self::Done,
            Self::Deferred,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::InProgress => "In Progress",
            Self::Blocked => "Blocked",
            Self::InReview => "In Review",
            Self::Done => "Done",
            Self::Deferred => "Deferred",
        }
    }

    /// Rows that still need someone to act on them.
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            Self::Todo | Self::InProgress | Self::Blocked | Self::InReview
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not in the status legend")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "todo" => Ok(Self::Todo),
            "inprogress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "inreview" => Ok(Self::InReview),
            "done" => Ok(Self::Done),
            "deferred" => Ok(Self::Deferred),
            _ => Err(UnknownStatus(raw.trim().to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = EndpointError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(EndpointError::UnknownMethod(raw.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons an endpoint cell does not match `<HTTP-METHOD> <path>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("endpoint is empty")]
    Empty,
    #[error("endpoint is missing a path after the HTTP method")]
    MissingPath,
    #[error("'{0}' is not a supported HTTP method")]
    UnknownMethod(String),
    #[error("'{0}' is not a valid path template (must start with '/')")]
    InvalidPath(String),
    #[error("endpoint has text after the path")]
    TrailingInput,
}

/// HTTP method plus path template, e.g. `POST /api/v1/auth/register/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: String,
}

impl Endpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let trimmed = raw.trim().trim_matches('`').trim();
        let mut parts = trimmed.split_whitespace();

        let method = parts.next().ok_or(EndpointError::Empty)?;
        let path = parts.next().ok_or(EndpointError::MissingPath)?;
        if parts.next().is_some() {
            return Err(EndpointError::TrailingInput);
        }

        let method = method.parse::<HttpMethod>()?;
        if !path.starts_with('/') || path.contains(['`', '|']) {
            return Err(EndpointError::InvalidPath(path.to_string()));
        }

        Ok(Self::new(method, path))
    }

    /// Path with every parameter segment (`{id}`, `<int:pk>`, `:id`) collapsed to `{}`.
    pub fn normalized_path(&self) -> String {
        self.path
            .split('/')
            .map(|segment| {
                if is_parameter(segment) {
                    "{}"
                } else {
                    segment
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn key(&self) -> (HttpMethod, String) {
        (self.method, self.normalized_path())
    }

    pub fn matches(&self, other: &Endpoint) -> bool {
        self.method == other.method && self.normalized_path() == other.normalized_path()
    }
}

fn is_parameter(segment: &str) -> bool {
    (segment.starts_with('{') && segment.ends_with('}'))
        || (segment.starts_with('<') && segment.ends_with('>'))
        || (segment.starts_with(':') && segment.len() > 1)
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Endpoint::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// One line item mapping an endpoint to its integration status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerRow {
    pub endpoint: Endpoint,
    pub screen: String,
    pub status: Status,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub blockers: Option<String>,
}

impl TrackerRow {
    pub fn new(endpoint: Endpoint, screen: impl Into<String>, status: Status) -> Self {
        Self {
            endpoint,
            screen: screen.into(),
            status,
            owner: None,
            blockers: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub rows: Vec<TrackerRow>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Changes applied to a single row. An empty owner or blockers string clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RowUpdate {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub blockers: Option<String>,
}

impl RowUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.owner.is_none() && self.blockers.is_none()
    }

    fn apply(self, row: &mut TrackerRow) {
        if let Some(status) = self.status {
            row.status = status;
        }
        if let Some(owner) = self.owner {
            row.owner = clean_text(&owner);
        }
        if let Some(blockers) = self.blockers {
            row.blockers = clean_text(&blockers);
        }
    }
}

/// The whole tracker: title, free prose, and rows grouped by section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerDocument {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preamble: Vec<String>,
    #[serde(default)]
    pub updated_on: Option<NaiveDate>,
    pub sections: Vec<Section>,
}

impl TrackerDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Section, &TrackerRow)> {
        self.sections
            .iter()
            .flat_map(|section| section.rows.iter().map(move |row| (section, row)))
    }

    pub fn row_count(&self) -> usize {
        self.sections.iter().map(|section| section.rows.len()).sum()
    }

    pub fn find(&self, endpoint: &Endpoint) -> Option<(&Section, &TrackerRow)> {
        self.rows().find(|(_, row)| row.endpoint.matches(endpoint))
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn update_row(
        &mut self,
        endpoint: &Endpoint,
        update: RowUpdate,
        today: NaiveDate,
    ) -> Result<&TrackerRow, TrackerError> {
        let (section_idx, row_idx) = self
            .position(endpoint)
            .ok_or_else(|| TrackerError::RowNotFound(endpoint.to_string()))?;

        let row = &mut self.sections[section_idx].rows[row_idx];
        update.apply(row);
        self.updated_on = Some(today);

        Ok(&self.sections[section_idx].rows[row_idx])
    }

    pub fn add_row(
        &mut self,
        section: &str,
        row: TrackerRow,
        today: NaiveDate,
    ) -> Result<&TrackerRow, TrackerError> {
        let (section_idx, row_idx) = self.insert_row(section, row)?;
        self.updated_on = Some(today);
        Ok(&self.sections[section_idx].rows[row_idx])
    }

    /// Appends a row without touching `updated_on`. Endpoints stay unique across sections.
    pub(crate) fn insert_row(
        &mut self,
        section: &str,
        row: TrackerRow,
    ) -> Result<(usize, usize), TrackerError> {
        let section = heading_text("section", section)?;
        if row.screen.trim().is_empty() {
            return Err(TrackerError::EmptyField("screen"));
        }
        if let Some((existing, _)) = self.find(&row.endpoint) {
            return Err(TrackerError::DuplicateEndpoint {
                endpoint: row.endpoint.to_string(),
                section: existing.name.clone(),
            });
        }

        let section_idx = match self
            .sections
            .iter()
            .position(|candidate| candidate.name.eq_ignore_ascii_case(&section))
        {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(section));
                self.sections.len() - 1
            }
        };

        let rows = &mut self.sections[section_idx].rows;
        rows.push(row);
        Ok((section_idx, rows.len() - 1))
    }

    fn position(&self, endpoint: &Endpoint) -> Option<(usize, usize)> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(section_idx, section)| {
                section
                    .rows
                    .iter()
                    .position(|row| row.endpoint.matches(endpoint))
                    .map(|row_idx| (section_idx, row_idx))
            })
    }
}

/// Normalizes text destined for a markdown heading (title or section name).
///
/// Whitespace is collapsed so the heading stays on one line. A trailing `#` is
/// rejected because markdown reads it as a closing sequence and drops it.
pub fn heading_text(field: &'static str, raw: &str) -> Result<String, TrackerError> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return Err(TrackerError::EmptyField(field));
    }
    if text.ends_with('#') {
        return Err(TrackerError::InvalidHeading { field, value: text });
    }
    Ok(text)
}

/// Collapses whitespace (including newlines) so the value fits a single table cell.
pub fn clean_text(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || collapsed == "-" || collapsed == "—" {
        None
    } else {
        Some(collapsed)
    }
}
