use chrono::NaiveDate;

use super::domain::{clean_text, Endpoint, Section, Status, TrackerDocument, TrackerRow};
use super::validate::{Issue, IssueKind};

const HEADER: [&str; 5] = ["endpoint", "screen", "status", "owner", "blockers"];
const LEGEND_PREFIX: &str = "status legend:";
const UPDATED_PREFIX: &str = "last updated:";

/// Result of reading a markdown tracker. Rows that failed to parse are left out of
/// `document` and described in `issues`.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub document: TrackerDocument,
    pub issues: Vec<Issue>,
    /// Source line of each row, in `TrackerDocument::rows` order.
    pub row_lines: Vec<usize>,
    /// Source line of each section heading.
    pub section_lines: Vec<usize>,
}

impl ParsedDocument {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum TableState {
    #[default]
    Outside,
    /// Header seen, separator row expected next.
    Header(usize),
    Body(usize),
    /// A table whose header is not a tracker header; kept as prose.
    Foreign,
}

pub fn parse_document(source: &str) -> ParsedDocument {
    let mut parser = Parser::default();
    for (idx, line) in source.lines().enumerate() {
        parser.line(idx + 1, line);
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    parsed: ParsedDocument,
    state: TableState,
    title_seen: bool,
}

impl Parser {
    fn line(&mut self, line_no: usize, line: &str) {
        let trimmed = line.trim();

        if trimmed.starts_with('|') {
            self.table_line(line_no, line, trimmed);
            return;
        }

        self.state = TableState::Outside;

        if let Some((level, text)) = heading(trimmed) {
            if level == 1 && !self.title_seen {
                self.title_seen = true;
                self.parsed.document.title = text.to_string();
            } else {
                self.parsed.document.sections.push(Section::new(text));
                self.parsed.section_lines.push(line_no);
            }
            return;
        }

        let unwrapped = unemphasize(trimmed);
        let lowered = unwrapped.to_ascii_lowercase();
        if lowered.starts_with(LEGEND_PREFIX) {
            return;
        }
        if let Some(rest) = lowered.strip_prefix(UPDATED_PREFIX) {
            if let Ok(date) = NaiveDate::parse_from_str(rest.trim(), "%Y-%m-%d") {
                self.parsed.document.updated_on = Some(date);
                return;
            }
        }

        self.prose(line.trim_end());
    }

    fn table_line(&mut self, line_no: usize, raw: &str, trimmed: &str) {
        let cells = split_cells(trimmed);

        match self.state {
            TableState::Outside => match header_width(&cells) {
                Some(width) => self.state = TableState::Header(width),
                None => {
                    self.state = TableState::Foreign;
                    self.prose(raw.trim_end());
                }
            },
            TableState::Foreign => self.prose(raw.trim_end()),
            TableState::Header(width) => {
                if is_separator(&cells) {
                    self.state = TableState::Body(width);
                } else {
                    self.issue(
                        line_no,
                        IssueKind::MalformedTable,
                        "tracker table header must be followed by a separator row",
                    );
                    self.state = TableState::Foreign;
                }
            }
            TableState::Body(width) => self.row(line_no, width, &cells),
        }
    }

    fn row(&mut self, line_no: usize, width: usize, cells: &[String]) {
        if cells.len() != width {
            self.issue(
                line_no,
                IssueKind::MalformedTable,
                format!("expected {width} cells, found {}", cells.len()),
            );
            return;
        }

        let mut valid = true;

        let endpoint = match Endpoint::parse(&cells[0]) {
            Ok(endpoint) => Some(endpoint),
            Err(err) => {
                self.issue(line_no, IssueKind::MalformedEndpoint, err.to_string());
                valid = false;
                None
            }
        };

        let screen = cells[1].trim().to_string();
        if screen.is_empty() {
            self.issue(line_no, IssueKind::MissingScreen, "screen cell is empty");
            valid = false;
        }

        let status = match cells[2].trim() {
            "" => {
                self.issue(line_no, IssueKind::UnknownStatus, "status cell is empty");
                valid = false;
                None
            }
            raw => match raw.parse::<Status>() {
                Ok(status) => Some(status),
                Err(err) => {
                    self.issue(line_no, IssueKind::UnknownStatus, err.to_string());
                    valid = false;
                    None
                }
            },
        };

        if self.parsed.document.sections.is_empty() {
            self.issue(
                line_no,
                IssueKind::RowOutsideSection,
                "row appears before any section heading",
            );
            return;
        }

        let (Some(endpoint), Some(status), true) = (endpoint, status, valid) else {
            return;
        };

        let row = TrackerRow {
            endpoint,
            screen,
            status,
            owner: cells.get(3).and_then(|cell| clean_text(cell)),
            blockers: cells.get(4).and_then(|cell| clean_text(cell)),
        };

        if let Some(section) = self.parsed.document.sections.last_mut() {
            section.rows.push(row);
            self.parsed.row_lines.push(line_no);
        }
    }

    fn prose(&mut self, text: &str) {
        let document = &mut self.parsed.document;
        let target = match document.sections.last_mut() {
            Some(section) => &mut section.notes,
            None => &mut document.preamble,
        };
        if text.trim().is_empty() && target.is_empty() {
            return;
        }
        target.push(text.to_string());
    }

    fn issue(&mut self, line_no: usize, kind: IssueKind, message: impl Into<String>) {
        self.parsed.issues.push(Issue::at(line_no, kind, message));
    }

    fn finish(mut self) -> ParsedDocument {
        let document = &mut self.parsed.document;
        trim_trailing_blank(&mut document.preamble);
        for section in &mut document.sections {
            trim_trailing_blank(&mut section.notes);
        }
        self.parsed
    }
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|ch| *ch == '#').count();
    if level == 0 {
        return None;
    }
    let rest = &line[level..];
    if !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    if text.is_empty() {
        None
    } else {
        Some((level, text))
    }
}

fn unemphasize(line: &str) -> &str {
    line.trim_matches(|ch| ch == '_' || ch == '*').trim()
}

fn trim_trailing_blank(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
}

/// Splits a `| a | b |` line into trimmed cells, honouring `\|` escapes.
pub(crate) fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    cells.push(current);

    if line.starts_with('|') && !cells.is_empty() {
        cells.remove(0);
    }
    if cells.last().is_some_and(|cell| cell.trim().is_empty()) && ends_with_pipe(line) {
        cells.pop();
    }

    cells.into_iter().map(|cell| cell.trim().to_string()).collect()
}

fn ends_with_pipe(line: &str) -> bool {
    line.ends_with('|') && !line.ends_with("\\|")
}

fn header_width(cells: &[String]) -> Option<usize> {
    if cells.len() < 3 || cells.len() > HEADER.len() {
        return None;
    }
    let matches = cells
        .iter()
        .zip(HEADER)
        .all(|(cell, expected)| unemphasize(cell).eq_ignore_ascii_case(expected));
    matches.then_some(cells.len())
}

fn is_separator(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            cell.contains('-') && cell.chars().all(|ch| matches!(ch, '-' | ':' | ' '))
        })
}
