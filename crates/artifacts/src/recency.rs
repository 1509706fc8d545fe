//! Selection of the most recent completed run from timestamped keys.
//!
//! Run artifacts land as a burst of many objects sharing one run timestamp
//! token. There is no index of runs, so the latest complete run is
//! recovered by scraping tokens out of a flat key listing, deduplicating,
//! and taking the numerically latest instant. Listing order is
//! lexicographic and misorders mixed am/pm tokens and year rollovers, so
//! the sort must go through the parsed instant.

use chrono::{Duration, Local, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::key::RunTimestamp;
use crate::list::list_all;
use crate::traits::{ObjectEntry, ObjectStore};
use crate::types::StoreLocation;

/// How far back to look for a run.
///
/// The three modes are mutually exclusive. `Back` narrows the listing to a
/// calendar window around `now - duration`; `At` narrows it to an explicit
/// date token (or token prefix) verbatim; `Latest` lists everything under
/// the prefix and selects from the whole set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecencyHint {
    /// No narrowing: list everything, pick the most recent token.
    Latest,
    /// Look near `now - duration`, at a granularity matching the duration.
    Back(Duration),
    /// Use this date token (or any prefix of one) verbatim.
    At(String),
}

impl RecencyHint {
    /// Resolve this hint to the narrowing suffix appended to the search
    /// prefix. Empty means "no narrowing".
    ///
    /// A `Back` hint of a day or more narrows to the calendar day; sub-day
    /// durations narrow progressively finer: hour, then hour+minute, then
    /// hour+minute+second.
    ///
    /// # Errors
    /// Returns `InvalidHint` for a non-positive `Back` duration or an
    /// empty `At` token.
    pub fn narrowing_suffix(&self, now: NaiveDateTime) -> Result<String, StoreError> {
        match self {
            RecencyHint::Latest => Ok(String::new()),
            RecencyHint::Back(delta) => {
                if *delta <= Duration::zero() {
                    return Err(StoreError::InvalidHint {
                        message: "duration-back hint must be positive".to_string(),
                    });
                }
                let target: NaiveDateTime = now - *delta;
                let format: &str = if *delta >= Duration::days(1) {
                    "%m_%d_%y"
                } else if *delta >= Duration::hours(1) {
                    "%m_%d_%y_%I"
                } else if *delta >= Duration::minutes(1) {
                    "%m_%d_%y_%I_%M"
                } else {
                    "%m_%d_%y_%I_%M_%S"
                };
                Ok(target.format(format).to_string())
            }
            RecencyHint::At(token) => {
                if token.is_empty() {
                    return Err(StoreError::InvalidHint {
                        message: "explicit date token is empty".to_string(),
                    });
                }
                Ok(token.clone())
            }
        }
    }
}

/// The artifacts of one completed run: every listed entry sharing the
/// selected run timestamp token. Computed per query, never cached.
#[derive(Debug, Clone)]
pub struct RunBucket {
    /// The selected run timestamp.
    pub timestamp: RunTimestamp,
    /// Entries whose key contains the selected token.
    pub entries: Vec<ObjectEntry>,
}

/// Finds the most recent run's artifacts under a results prefix.
pub struct RecencySelector<'a, C: ObjectStore> {
    /// The store to list against.
    store: &'a C,
    /// Bucket/project scoping.
    location: StoreLocation,
}

impl<'a, C: ObjectStore> RecencySelector<'a, C> {
    /// Create a selector for a project location.
    pub fn new(store: &'a C, location: StoreLocation) -> Self {
        Self { store, location }
    }

    /// Select the most recent run under
    /// `{bucket}/{project}/results/{domain}/{environment}`, narrowed by
    /// the hint.
    ///
    /// # Errors
    /// `NoTimestampedEntries` when no listed key carries a parseable run
    /// timestamp token - callers treat that as "nothing available yet".
    pub async fn latest_run(
        &self,
        domain: &str,
        environment: &str,
        hint: &RecencyHint,
    ) -> Result<RunBucket, StoreError> {
        let suffix: String = hint.narrowing_suffix(Local::now().naive_local())?;
        let base: String = self.location.results_prefix(domain, environment);
        let search_prefix: String = if suffix.is_empty() {
            base
        } else {
            format!("{}/{}", base, suffix)
        };
        self.select_latest(&search_prefix).await
    }

    /// Select the most recent run among all entries under `search_prefix`.
    pub async fn select_latest(&self, search_prefix: &str) -> Result<RunBucket, StoreError> {
        let entries: Vec<ObjectEntry> =
            list_all(self.store, &self.location.bucket, search_prefix).await?;

        // Entries without a parseable token are dropped from selection.
        let mut tokens: Vec<RunTimestamp> = entries
            .iter()
            .filter_map(|entry: &ObjectEntry| RunTimestamp::extract(&entry.key))
            .collect();
        tokens.sort();
        tokens.dedup();

        let latest: RunTimestamp = match tokens.pop() {
            Some(timestamp) => timestamp,
            None => {
                warn!(prefix = search_prefix, "no timestamped artifacts found");
                return Err(StoreError::NoTimestampedEntries {
                    prefix: search_prefix.to_string(),
                });
            }
        };

        let selected: Vec<ObjectEntry> = entries
            .into_iter()
            .filter(|entry: &ObjectEntry| entry.key.contains(latest.token()))
            .collect();

        debug!(
            prefix = search_prefix,
            timestamp = latest.token(),
            artifacts = selected.len(),
            "selected most recent run"
        );

        Ok(RunBucket {
            timestamp: latest,
            entries: selected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_latest_hint_resolves_empty() {
        assert_eq!(RecencyHint::Latest.narrowing_suffix(noon()).unwrap(), "");
    }

    #[test]
    fn test_back_hint_day_granularity() {
        let suffix: String = RecencyHint::Back(Duration::days(2))
            .narrowing_suffix(noon())
            .unwrap();
        assert_eq!(suffix, "06_13_24");
    }

    #[test]
    fn test_back_hint_progressively_finer() {
        let hour: String = RecencyHint::Back(Duration::hours(3))
            .narrowing_suffix(noon())
            .unwrap();
        assert_eq!(hour, "06_15_24_09");

        let minute: String = RecencyHint::Back(Duration::minutes(30))
            .narrowing_suffix(noon())
            .unwrap();
        assert_eq!(minute, "06_15_24_11_30");

        let second: String = RecencyHint::Back(Duration::seconds(45))
            .narrowing_suffix(noon())
            .unwrap();
        assert_eq!(second, "06_15_24_11_59_15");
    }

    #[test]
    fn test_back_hint_rejects_non_positive() {
        let result = RecencyHint::Back(Duration::zero()).narrowing_suffix(noon());
        assert!(matches!(result, Err(StoreError::InvalidHint { .. })));
    }

    #[test]
    fn test_at_hint_verbatim() {
        let suffix: String = RecencyHint::At("06_01_24".to_string())
            .narrowing_suffix(noon())
            .unwrap();
        assert_eq!(suffix, "06_01_24");

        let empty = RecencyHint::At(String::new()).narrowing_suffix(noon());
        assert!(matches!(empty, Err(StoreError::InvalidHint { .. })));
    }
}
