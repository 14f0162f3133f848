//! The moderation ledger: flags and reports, each persisted in its own record file and joined
//! against posts by id only when read.
pub mod flags;
pub mod reports;

pub use flags::{Flag, FlagLedger};
pub use reports::{Report, ReportLedger};

use crate::datastore::Post;
use crate::twoface::Fallible;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::path::Path;

pub const FLAGS_FILE: &str = "flaggedPosts.json";
pub const REPORTS_FILE: &str = "reports.json";

pub struct Ledger {
    pub flags: FlagLedger,
    pub reports: ReportLedger,
}

impl Ledger {
    /// Open both record files under `data_dir`. Call once per process.
    pub fn open(data_dir: &Path) -> Self {
        Self {
            flags: FlagLedger::open(data_dir.join(FLAGS_FILE)),
            reports: ReportLedger::open(data_dir.join(REPORTS_FILE)),
        }
    }

    pub fn flush(&self) -> Fallible<()> {
        self.flags.flush()?;
        self.reports.flush()
    }
}

/// The post a moderation record points at, looked up when the record is read. Records outlive
/// their posts, so `Missing` is an ordinary outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum PostRef {
    Found(Post),
    Missing,
}

impl PostRef {
    pub fn resolve(post_id: &str, posts: &HashMap<String, Post>) -> Self {
        match posts.get(post_id) {
            Some(post) => PostRef::Found(post.clone()),
            None => PostRef::Missing,
        }
    }

    pub fn post(&self) -> Option<&Post> {
        match self {
            PostRef::Found(post) => Some(post),
            PostRef::Missing => None,
        }
    }
}

/// Serializes as the post itself, or `null`.
impl Serialize for PostRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.post().serialize(serializer)
    }
}

/// A flag or report, with the post it refers to.
#[derive(Serialize, Debug, Clone)]
pub struct WithPost<R> {
    #[serde(flatten)]
    pub record: R,
    pub post: PostRef,
}

/// Something that refers to a post by id.
pub trait PostRecord {
    fn post_id(&self) -> &str;
}

/// Join every record against the posts.
pub fn join_posts<R: PostRecord>(
    records: Vec<R>,
    posts: &HashMap<String, Post>,
) -> Vec<WithPost<R>> {
    records
        .into_iter()
        .map(|record| {
            let post = PostRef::resolve(record.post_id(), posts);
            WithPost { record, post }
        })
        .collect()
}
