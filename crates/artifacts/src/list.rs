//! Paginated enumeration of objects under a key prefix.
//!
//! Pages are fetched strictly sequentially: each page's continuation
//! cursor (the last key of the page) is only known once the prior page
//! resolves, so this loop cannot be parallelized.

use futures::stream::{self, Stream, TryStreamExt};

use crate::error::StoreError;
use crate::traits::{ObjectEntry, ObjectPage, ObjectStore};

/// Fixed page size for list operations.
pub const LIST_PAGE_SIZE: i32 = 1000;

/// Lazily yield pages of entries under `prefix`.
///
/// The stream is finite and non-restartable; dropping it early skips the
/// remaining page fetches. Any page failure surfaces as
/// `StoreError::Listing` wrapping the transport error.
pub fn page_stream<'a, C: ObjectStore>(
    store: &'a C,
    bucket: &'a str,
    prefix: &'a str,
) -> impl Stream<Item = Result<Vec<ObjectEntry>, StoreError>> + 'a {
    stream::try_unfold(
        Some(None::<String>),
        move |cursor: Option<Option<String>>| async move {
            let Some(start_after) = cursor else {
                return Ok(None);
            };

            let page: ObjectPage = store
                .list_page(bucket, prefix, LIST_PAGE_SIZE, start_after.as_deref())
                .await
                .map_err(|err: StoreError| match err {
                    wrapped @ StoreError::Listing { .. } => wrapped,
                    other => StoreError::Listing {
                        prefix: prefix.to_string(),
                        message: other.to_string(),
                    },
                })?;

            let next: Option<Option<String>> = if page.is_truncated {
                // Truncated with an empty page leaves no cursor to continue from.
                page.entries.last().map(|last: &ObjectEntry| Some(last.key.clone()))
            } else {
                None
            };

            Ok(Some((page.entries, next)))
        },
    )
}

/// Collect every entry under `prefix`.
///
/// A failed listing is atomic: entries from already-fetched pages are
/// discarded and only the error is returned.
pub async fn list_all<C: ObjectStore>(
    store: &C,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<ObjectEntry>, StoreError> {
    page_stream(store, bucket, prefix)
        .try_fold(
            Vec::new(),
            |mut entries: Vec<ObjectEntry>, mut page: Vec<ObjectEntry>| async move {
                entries.append(&mut page);
                Ok(entries)
            },
        )
        .await
}
