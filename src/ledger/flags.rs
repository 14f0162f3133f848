use crate::ledger::PostRecord;
use crate::records::RecordFile;
use crate::twoface::Fallible;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// A post hidden from the public feed pending admin review.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub post_id: String,
    pub reason: String,
    pub flagged_at: DateTime<Utc>,
    /// The admin confirmed the removal.
    #[serde(default)]
    pub deleted: bool,
    /// The admin overturned the flag.
    #[serde(default)]
    pub restored: bool,
}

impl Flag {
    /// Deleted and restored are both final.
    pub fn is_active(&self) -> bool {
        !self.deleted && !self.restored
    }
}

impl PostRecord for Flag {
    fn post_id(&self) -> &str {
        &self.post_id
    }
}

/// At most one flag record per post.
pub struct FlagLedger {
    file: RecordFile<Flag>,
}

impl FlagLedger {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            file: RecordFile::open(path),
        }
    }

    /// Flag a post. A post that already has a flag record, resolved or not, is left alone.
    /// Returns whether a new flag was recorded. The flag hides the post even if it can't be
    /// written to disk yet.
    pub fn flag(&self, post_id: &str, reason: &str) -> bool {
        self.file.apply(|flags| {
            if flags.iter().any(|f| f.post_id == post_id) {
                return false;
            }
            flags.push(Flag {
                post_id: post_id.to_owned(),
                reason: reason.to_owned(),
                flagged_at: Utc::now(),
                deleted: false,
                restored: false,
            });
            true
        })
    }

    pub fn list_active(&self) -> Vec<Flag> {
        self.file.read(|flags| {
            flags
                .iter()
                .filter(|f| f.is_active())
                .cloned()
                .collect()
        })
    }

    /// Ids of posts that must stay out of the public feed.
    pub fn active_post_ids(&self) -> HashSet<String> {
        self.file.read(|flags| {
            flags
                .iter()
                .filter(|f| f.is_active())
                .map(|f| f.post_id.clone())
                .collect()
        })
    }

    /// Mark the flag as deleted. False if the post was never flagged.
    pub fn soft_delete(&self, post_id: &str) -> Fallible<bool> {
        self.resolve(post_id, |flag| flag.deleted = true)
    }

    /// Mark the flag as restored. False if the post was never flagged.
    pub fn restore(&self, post_id: &str) -> Fallible<bool> {
        self.resolve(post_id, |flag| flag.restored = true)
    }

    fn resolve(&self, post_id: &str, mark: impl FnOnce(&mut Flag)) -> Fallible<bool> {
        if !self.file.read(|flags| flags.iter().any(|f| f.post_id == post_id)) {
            return Ok(false);
        }
        self.file.update(|flags| {
            guard!(let Some(flag) = flags.iter_mut().find(|f| f.post_id == post_id) else {
                return false
            });
            mark(flag);
            true
        })
    }

    pub fn flush(&self) -> Fallible<()> {
        self.file.flush()
    }
}
