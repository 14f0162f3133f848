use crate::ids::{self, next_id};
use crate::ledger::PostRecord;
use crate::records::RecordFile;
use crate::twoface::Fallible;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A user complaint about a post. Any number of reports may point at the same post.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub post_id: String,
    pub reason: String,
    pub reported_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl PostRecord for Report {
    fn post_id(&self) -> &str {
        &self.post_id
    }
}

pub struct ReportLedger {
    file: RecordFile<Report>,
}

impl ReportLedger {
    /// Ids already on disk are reserved, so a clock that stepped back across a restart can't
    /// reissue one.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let file = RecordFile::open(path);
        let newest = file.read(|reports: &[Report]| {
            reports.iter().filter_map(|r| r.id.parse::<u64>().ok()).max()
        });
        if let Some(newest) = newest {
            ids::reserve_through(newest);
        }
        Self { file }
    }

    /// Store a new report and return its id.
    pub fn file(&self, post_id: &str, reason: &str) -> Fallible<String> {
        let report = Report {
            id: next_id(),
            post_id: post_id.to_owned(),
            reason: reason.to_owned(),
            reported_at: Utc::now(),
            deleted: false,
        };
        let id = report.id.clone();
        self.file.update(move |reports| reports.push(report))?;
        Ok(id)
    }

    pub fn list_active(&self) -> Vec<Report> {
        self.file.read(|reports| {
            reports
                .iter()
                .filter(|r| !r.deleted)
                .cloned()
                .collect()
        })
    }

    /// Soft-delete the report; the post itself is untouched. False if the id is unknown.
    pub fn soft_delete(&self, report_id: &str) -> Fallible<bool> {
        if !self.file.read(|reports| reports.iter().any(|r| r.id == report_id)) {
            return Ok(false);
        }
        self.file.update(|reports| {
            guard!(let Some(report) = reports.iter_mut().find(|r| r.id == report_id) else {
                return false
            });
            report.deleted = true;
            true
        })
    }

    pub fn flush(&self) -> Fallible<()> {
        self.file.flush()
    }
}
