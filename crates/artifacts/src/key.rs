//! Key construction and parsing for run artifacts.
//!
//! Artifact keys follow a fixed layout:
//!
//! ```text
//! {bucket}/{project}/{category}/{...scope}/{timestamp}/{filename}
//! ```
//!
//! where `timestamp` is the run timestamp token `MM_DD_YY_HH_MM_SS_(am|pm)`
//! (12-hour clock, zero-padded). The token is the only sort/selection axis
//! recoverable from a flat key: project and scope segments are slugified
//! irreversibly before being embedded. All timestamp scraping lives here so
//! the token format can change in one place.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Local, NaiveDateTime};
use regex::Regex;

use crate::error::StoreError;

/// chrono format for the run timestamp token (12-hour, zero-padded).
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%y_%I_%M_%S_%P";

/// Regex source matching a run timestamp token inside a key.
const TIMESTAMP_PATTERN: &str = r"\d{2}_\d{2}_\d{2}_\d{2}_\d{2}_\d{2}_(?:am|pm)";

fn timestamp_regex() -> Regex {
    Regex::new(TIMESTAMP_PATTERN).expect("valid regex")
}

/// Top-level artifact category under a project prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    /// Page screenshots.
    Snaps,
    /// Visual-diff images and diff result JSON.
    Diffs,
    /// Crawl snapshots.
    Crawls,
    /// Full run result trees.
    Results,
    /// A generated report kind, e.g. "mochawesome_reports".
    Report(String),
}

impl Category {
    /// The path segment for this category.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Snaps => "snaps",
            Category::Diffs => "diffs",
            Category::Crawls => "crawls",
            Category::Results => "results",
            Category::Report(kind) => kind,
        }
    }
}

/// Slugify a segment for embedding in a key.
///
/// Path separators become `__`, any other non-alphanumeric character
/// becomes `_`, and the result is lowercased. This is irreversible.
pub fn slugify(segment: &str) -> String {
    segment
        .replace('/', "__")
        .chars()
        .map(|c: char| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// A run timestamp token paired with its resolved instant.
///
/// Ordering is numeric on the instant, never lexicographic on the token:
/// lexicographic order misplaces `12` before `01` across the 12-hour
/// rollover and breaks across year boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTimestamp {
    token: String,
    instant: NaiveDateTime,
}

impl RunTimestamp {
    /// The token for the current local time.
    pub fn now() -> Self {
        let token: String = Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::parse(&token).expect("freshly formatted token is valid")
    }

    /// Parse a complete token.
    pub fn parse(token: &str) -> Option<Self> {
        let instant: NaiveDateTime =
            NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT).ok()?;
        Some(Self {
            token: token.to_string(),
            instant,
        })
    }

    /// Extract the first run timestamp token embedded in a key, if any.
    pub fn extract(key: &str) -> Option<Self> {
        let m = timestamp_regex().find(key)?;
        Self::parse(m.as_str())
    }

    /// The raw token string.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The instant the token resolves to.
    pub fn instant(&self) -> NaiveDateTime {
        self.instant
    }
}

impl fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl Ord for RunTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant
            .cmp(&other.instant)
            .then_with(|| self.token.cmp(&other.token))
    }
}

impl PartialOrd for RunTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Build a full artifact key.
///
/// `project`, the category, and every scope segment are slugified; the
/// bucket, timestamp token, and filename are embedded verbatim so bucket
/// names survive and the trailing components stay recoverable via
/// [`RunTimestamp::extract`] and [`parse_filename`].
///
/// # Errors
/// Returns `InvalidSegment` if any segment is empty after slugification.
pub fn build_key(
    bucket: &str,
    project: &str,
    category: &Category,
    scopes: &[&str],
    timestamp: &RunTimestamp,
    filename: &str,
) -> Result<String, StoreError> {
    if bucket.is_empty() {
        return Err(StoreError::InvalidSegment {
            segment: bucket.to_string(),
        });
    }

    let mut segments: Vec<String> = Vec::with_capacity(scopes.len() + 5);
    segments.push(bucket.to_string());

    for raw in [project, category.as_str()]
        .into_iter()
        .chain(scopes.iter().copied())
    {
        let slug: String = slugify(raw);
        if slug.is_empty() {
            return Err(StoreError::InvalidSegment {
                segment: raw.to_string(),
            });
        }
        segments.push(slug);
    }

    if filename.is_empty() {
        return Err(StoreError::InvalidSegment {
            segment: filename.to_string(),
        });
    }

    segments.push(timestamp.token().to_string());
    segments.push(filename.to_string());

    Ok(segments.join("/"))
}

/// Parse the filename from a key: the final `/`-delimited segment, provided
/// it contains an interior `.`. A key with no such segment has no
/// parseable filename.
pub fn parse_filename(key: &str) -> Option<&str> {
    let (_, name) = key.rsplit_once('/')?;
    let dot: usize = name.find('.')?;
    if dot == 0 || dot + 1 == name.len() {
        return None;
    }
    Some(name)
}

/// Rewrite only the timestamp and/or filename of a key, preserving every
/// other segment byte-for-byte.
///
/// Used to map a reference result key onto the corresponding current key
/// for comparison.
///
/// # Errors
/// Returns `UnparsableKey` if a replacement is requested for a component
/// the source key does not contain.
pub fn rewrite_key(
    key: &str,
    new_filename: Option<&str>,
    new_timestamp: Option<&RunTimestamp>,
) -> Result<String, StoreError> {
    let mut rewritten: String = key.to_string();

    if let Some(timestamp) = new_timestamp {
        let m = timestamp_regex()
            .find(&rewritten)
            .ok_or(StoreError::UnparsableKey {
                key: key.to_string(),
                component: "run timestamp",
            })?;
        let range = m.range();
        rewritten.replace_range(range, timestamp.token());
    }

    if let Some(filename) = new_filename {
        let current: &str = parse_filename(&rewritten).ok_or(StoreError::UnparsableKey {
            key: key.to_string(),
            component: "filename",
        })?;
        let cut: usize = rewritten.len() - current.len();
        rewritten.truncate(cut);
        rewritten.push_str(filename);
    }

    Ok(rewritten)
}

/// The portion of a key after the run timestamp token, without the leading
/// separator. This is the path an artifact takes inside the local reference
/// area. Returns `None` when the key has no token or nothing follows it.
pub fn remainder_after_timestamp(key: &str) -> Option<&str> {
    let m = timestamp_regex().find(key)?;
    let rest: &str = key[m.end()..].strip_prefix('/')?;
    if rest.is_empty() {
        return None;
    }
    Some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(token: &str) -> RunTimestamp {
        RunTimestamp::parse(token).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Business!"), "my_business_");
        assert_eq!(slugify("www.example.com/path"), "www_example_com__path");
        assert_eq!(slugify("already_clean"), "already_clean");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_build_key_layout() {
        let timestamp: RunTimestamp = ts("06_15_24_03_22_10_pm");
        let key: String = build_key(
            "artifact-bucket",
            "My Business",
            &Category::Results,
            &["www.example.com", "QA"],
            &timestamp,
            "home.png",
        )
        .unwrap();
        assert_eq!(
            key,
            "artifact-bucket/my_business/results/www_example_com/qa/06_15_24_03_22_10_pm/home.png"
        );
    }

    #[test]
    fn test_build_key_rejects_empty_segment() {
        let timestamp: RunTimestamp = ts("06_15_24_03_22_10_pm");
        let result = build_key(
            "bucket",
            "",
            &Category::Snaps,
            &[],
            &timestamp,
            "home.png",
        );
        assert!(matches!(result, Err(StoreError::InvalidSegment { .. })));
    }

    #[test]
    fn test_timestamp_roundtrip_through_key() {
        let timestamp: RunTimestamp = ts("12_31_23_11_59_59_pm");
        let key: String = build_key(
            "bucket",
            "proj",
            &Category::Snaps,
            &["dom"],
            &timestamp,
            "a.png",
        )
        .unwrap();
        assert_eq!(RunTimestamp::extract(&key).unwrap(), timestamp);
        assert_eq!(parse_filename(&key), Some("a.png"));
    }

    #[test]
    fn test_timestamp_ordering_is_numeric_not_lexicographic() {
        // 12:30am is midnight-half-past; 01:30am is an hour later. The
        // token strings sort the other way around.
        let midnight: RunTimestamp = ts("06_15_24_12_30_00_am");
        let one_am: RunTimestamp = ts("06_15_24_01_30_00_am");
        assert!(midnight.token() > one_am.token());
        assert!(midnight < one_am);

        // Same trap at noon.
        let eleven_am: RunTimestamp = ts("06_15_24_11_00_00_am");
        let noon: RunTimestamp = ts("06_15_24_12_00_00_pm");
        let one_pm: RunTimestamp = ts("06_15_24_01_00_00_pm");
        assert!(eleven_am < noon);
        assert!(noon < one_pm);

        // Year rollover.
        let old_year: RunTimestamp = ts("12_31_23_11_59_59_pm");
        let new_year: RunTimestamp = ts("01_01_24_12_00_01_am");
        assert!(old_year < new_year);
    }

    #[test]
    fn test_extract_ignores_untimestamped_keys() {
        assert!(RunTimestamp::extract("bucket/proj/results/dom/env/readme.txt").is_none());
        assert!(RunTimestamp::parse("not_a_token").is_none());
        assert!(RunTimestamp::parse("99_99_99_99_99_99_pm").is_none());
    }

    #[test]
    fn test_parse_filename() {
        assert_eq!(parse_filename("a/b/c/report.html"), Some("report.html"));
        assert_eq!(parse_filename("a/b/archive.tar.gz"), Some("archive.tar.gz"));
        assert_eq!(parse_filename("a/b/folder"), None);
        assert_eq!(parse_filename("no_slash.png"), None);
        assert_eq!(parse_filename("a/b/.hidden"), None);
        assert_eq!(parse_filename("a/b/trailing."), None);
    }

    #[test]
    fn test_rewrite_key_filename_only_keeps_timestamp() {
        let key: &str = "bucket/proj/results/dom/qa/06_15_24_03_22_10_pm/home.png";
        let rewritten: String = rewrite_key(key, Some("about.png"), None).unwrap();
        assert_eq!(
            rewritten,
            "bucket/proj/results/dom/qa/06_15_24_03_22_10_pm/about.png"
        );
        assert_eq!(
            RunTimestamp::extract(&rewritten).unwrap().token(),
            "06_15_24_03_22_10_pm"
        );
    }

    #[test]
    fn test_rewrite_key_timestamp_only_keeps_filename() {
        let key: &str = "bucket/proj/results/dom/qa/06_15_24_03_22_10_pm/home.png";
        let newer: RunTimestamp = ts("06_16_24_09_00_00_am");
        let rewritten: String = rewrite_key(key, None, Some(&newer)).unwrap();
        assert_eq!(
            rewritten,
            "bucket/proj/results/dom/qa/06_16_24_09_00_00_am/home.png"
        );
        assert_eq!(parse_filename(&rewritten), Some("home.png"));
    }

    #[test]
    fn test_rewrite_key_missing_components() {
        let newer: RunTimestamp = ts("06_16_24_09_00_00_am");
        let no_timestamp = rewrite_key("bucket/proj/file.png", None, Some(&newer));
        assert!(matches!(
            no_timestamp,
            Err(StoreError::UnparsableKey {
                component: "run timestamp",
                ..
            })
        ));

        let no_filename = rewrite_key(
            "bucket/proj/results/06_15_24_03_22_10_pm/folder",
            Some("new.png"),
            None,
        );
        assert!(matches!(
            no_filename,
            Err(StoreError::UnparsableKey {
                component: "filename",
                ..
            })
        ));
    }

    #[test]
    fn test_remainder_after_timestamp() {
        assert_eq!(
            remainder_after_timestamp(
                "bucket/proj/results/dom/qa/06_15_24_03_22_10_pm/shots/home.png"
            ),
            Some("shots/home.png")
        );
        assert_eq!(
            remainder_after_timestamp("bucket/proj/results/dom/qa/06_15_24_03_22_10_pm"),
            None
        );
        assert_eq!(remainder_after_timestamp("bucket/proj/plain.png"), None);
    }
}
