//! Per-IP daily post counts. Switched off unless `rate_limit_enabled` is set.
use crate::records::RecordFile;
use crate::twoface::Fallible;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const RATE_LIMITS_FILE: &str = "rateLimits.json";
/// Posts allowed per IP per day.
pub const DAILY_POSTS: u32 = 1;
/// Entries older than this many days are dropped on every write.
pub const RETENTION_DAYS: i64 = 7;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitEntry {
    pub ip_address: String,
    pub date: NaiveDate,
    pub count: u32,
}

pub struct RateLimiter {
    entries: RecordFile<RateLimitEntry>,
    enabled: bool,
}

impl RateLimiter {
    pub fn open(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            entries: RecordFile::open(path),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Has this IP used up today's posts?
    pub fn is_limited(&self, ip: &str) -> bool {
        self.is_limited_on(ip, today())
    }

    pub fn is_limited_on(&self, ip: &str, day: NaiveDate) -> bool {
        self.entries.read(|entries| {
            entries
                .iter()
                .any(|e| e.ip_address == ip && e.date == day && e.count >= DAILY_POSTS)
        })
    }

    /// Count a post against the IP. The count holds in memory even if it can't be saved.
    pub fn record(&self, ip: &str) {
        self.record_on(ip, today())
    }

    pub fn record_on(&self, ip: &str, day: NaiveDate) {
        let cutoff = day - Duration::days(RETENTION_DAYS);
        self.entries.apply(|entries| {
            match entries
                .iter()
                .position(|e| e.ip_address == ip && e.date == day)
            {
                Some(index) => entries[index].count += 1,
                None => entries.push(RateLimitEntry {
                    ip_address: ip.to_owned(),
                    date: day,
                    count: 1,
                }),
            }
            entries.retain(|e| e.date >= cutoff);
        });
    }

    pub fn flush(&self) -> Fallible<()> {
        self.entries.flush()
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_one_post_per_day() {
        let dir = tempfile::tempdir().unwrap();
        let limiter = RateLimiter::open(dir.path().join(RATE_LIMITS_FILE), true);
        assert!(!limiter.is_limited_on("1.2.3.4", day(10)));

        limiter.record_on("1.2.3.4", day(10));
        assert!(limiter.is_limited_on("1.2.3.4", day(10)));
        assert!(!limiter.is_limited_on("5.6.7.8", day(10)));
        assert!(!limiter.is_limited_on("1.2.3.4", day(11)));
    }

    #[test]
    fn test_repeat_posts_increment_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RATE_LIMITS_FILE);
        let limiter = RateLimiter::open(&path, true);
        limiter.record_on("1.2.3.4", day(10));
        limiter.record_on("1.2.3.4", day(10));

        let entries: Vec<RateLimitEntry> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].count, 2);
        assert_eq!(entries[0].date, day(10));
    }

    #[test]
    fn test_old_entries_swept_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RATE_LIMITS_FILE);
        let limiter = RateLimiter::open(&path, true);
        limiter.record_on("old", day(1));
        limiter.record_on("edge", day(3));
        limiter.record_on("new", day(10));

        let entries: Vec<RateLimitEntry> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let ips: Vec<_> = entries.iter().map(|e| e.ip_address.as_str()).collect();
        assert_eq!(ips, vec!["edge", "new"]);
    }

    #[test]
    fn test_dates_stored_as_plain_days() {
        let entry = RateLimitEntry {
            ip_address: "1.2.3.4".to_owned(),
            date: day(5),
            count: 1,
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"ipAddress":"1.2.3.4","date":"2024-03-05","count":1}"#
        );
    }
}
