use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::domain::{clean_text, heading_text, Endpoint, Status, TrackerDocument, TrackerRow};
use super::TrackerError;

/// Spreadsheet-friendly flat row; one per tracker row.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Section")]
    section: String,
    #[serde(rename = "Endpoint")]
    endpoint: String,
    #[serde(rename = "Screen")]
    screen: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Owner", default)]
    owner: Option<String>,
    #[serde(rename = "Blockers", default)]
    blockers: Option<String>,
}

pub fn write_csv<W: Write>(document: &TrackerDocument, writer: W) -> Result<(), TrackerError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for (section, row) in document.rows() {
        csv_writer.serialize(CsvRow {
            section: section.name.clone(),
            endpoint: row.endpoint.to_string(),
            screen: row.screen.clone(),
            status: row.status.label().to_string(),
            owner: row.owner.clone(),
            blockers: row.blockers.clone(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Builds a document from CSV, grouping rows into sections in first-appearance order.
pub fn read_csv<R: Read>(reader: R, title: &str) -> Result<TrackerDocument, TrackerError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut document = TrackerDocument::new(heading_text("title", title)?);

    for (idx, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        // Record 1 is the header line.
        let record_no = idx + 2;
        let row = record?;
        let invalid = |reason: String| TrackerError::InvalidRecord {
            record: record_no,
            reason,
        };

        let endpoint = Endpoint::parse(&row.endpoint).map_err(|err| invalid(err.to_string()))?;
        let status = row
            .status
            .parse::<Status>()
            .map_err(|err| invalid(err.to_string()))?;
        let screen = clean_text(&row.screen).ok_or_else(|| invalid("screen is empty".to_string()))?;
        let section =
            heading_text("section", &row.section).map_err(|err| invalid(err.to_string()))?;

        let tracker_row = TrackerRow {
            endpoint,
            screen,
            status,
            owner: row.owner.as_deref().and_then(clean_text),
            blockers: row.blockers.as_deref().and_then(clean_text),
        };
        document.insert_row(&section, tracker_row)?;
    }

    Ok(document)
}
