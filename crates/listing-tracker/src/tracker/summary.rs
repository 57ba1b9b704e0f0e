use serde::Serialize;
use std::collections::BTreeMap;

use super::domain::{Status, TrackerDocument};

/// Label for rows without an owner in printed reports.
pub const UNASSIGNED: &str = "unassigned";

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: Status,
    pub status_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionProgress {
    pub section: String,
    pub done: usize,
    pub deferred: usize,
    pub total: usize,
    pub completion_pct: f32,
}

/// Open work per owner. `owner` is `None` for rows nobody has picked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerLoad {
    pub owner: Option<String>,
    pub open: usize,
    pub blocked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockedRow {
    pub section: String,
    pub endpoint: String,
    pub screen: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockers: Option<String>,
}

/// Progress roll-up across the whole tracker.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSummary {
    pub total_rows: usize,
    pub overall_completion_pct: f32,
    pub status_counts: Vec<StatusCount>,
    pub section_progress: Vec<SectionProgress>,
    pub owner_load: Vec<OwnerLoad>,
    pub blocked: Vec<BlockedRow>,
}

impl TrackerSummary {
    pub fn from_document(document: &TrackerDocument) -> Self {
        let mut counts: BTreeMap<Status, usize> = BTreeMap::new();
        let mut owners: BTreeMap<Option<String>, OwnerLoad> = BTreeMap::new();
        let mut blocked = Vec::new();

        for (section, row) in document.rows() {
            *counts.entry(row.status).or_default() += 1;

            if row.status.is_open() {
                let load = owners
                    .entry(row.owner.clone())
                    .or_insert_with(|| OwnerLoad {
                        owner: row.owner.clone(),
                        open: 0,
                        blocked: 0,
                    });
                load.open += 1;
                if row.status == Status::Blocked {
                    load.blocked += 1;
                }
            }

            if row.status == Status::Blocked {
                blocked.push(BlockedRow {
                    section: section.name.clone(),
                    endpoint: row.endpoint.to_string(),
                    screen: row.screen.clone(),
                    owner: row.owner.clone(),
                    blockers: row.blockers.clone(),
                });
            }
        }

        let status_counts = Status::legend()
            .into_iter()
            .map(|status| StatusCount {
                status,
                status_label: status.label(),
                count: counts.get(&status).copied().unwrap_or(0),
            })
            .collect();

        let section_progress = document
            .sections
            .iter()
            .map(|section| {
                let done = count_status(section.rows.iter().map(|row| row.status), Status::Done);
                let deferred =
                    count_status(section.rows.iter().map(|row| row.status), Status::Deferred);
                let total = section.rows.len();
                SectionProgress {
                    section: section.name.clone(),
                    done,
                    deferred,
                    total,
                    completion_pct: completion_pct(done, deferred, total),
                }
            })
            .collect();

        let total_rows = document.row_count();
        let overall_completion_pct = completion_pct(
            counts.get(&Status::Done).copied().unwrap_or(0),
            counts.get(&Status::Deferred).copied().unwrap_or(0),
            total_rows,
        );

        // Named owners alphabetically regardless of case, unowned rows last.
        let mut owner_load: Vec<OwnerLoad> = owners.into_values().collect();
        owner_load.sort_by_cached_key(|load| {
            (
                load.owner.is_none(),
                load.owner.as_deref().map(str::to_lowercase),
            )
        });

        Self {
            total_rows,
            overall_completion_pct,
            status_counts,
            section_progress,
            owner_load,
            blocked,
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.status_counts
            .iter()
            .find(|entry| entry.status == status)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}

fn count_status(statuses: impl Iterator<Item = Status>, wanted: Status) -> usize {
    statuses.filter(|status| *status == wanted).count()
}

/// Done share of the rows still in scope; deferred rows are out of scope.
fn completion_pct(done: usize, deferred: usize, total: usize) -> f32 {
    let active = total.saturating_sub(deferred);
    if active == 0 {
        return 100.0;
    }
    let pct = done as f32 * 100.0 / active as f32;
    (pct * 10.0).round() / 10.0
}
