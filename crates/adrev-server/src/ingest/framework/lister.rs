//! Paginated source listing as a lazy stream

use adrev_common::{AdrevError, Result};
use futures::stream::{self, Stream, TryStreamExt};
use tracing::debug;

use crate::storage::{ObjectStore, SourceObject};

pub const DEFAULT_PAGE_SIZE: i32 = 1000;

/// Stream every object under `prefix`, one listing page at a time
///
/// Pages are fetched only as the stream is polled. Pagination stops when the
/// store returns no continuation token. A listing error ends the stream with
/// that error. Calling this again starts over from the first page.
pub fn list_objects<'a>(
    store: &'a dyn ObjectStore,
    prefix: &'a str,
    page_size: i32,
) -> impl Stream<Item = Result<SourceObject>> + Send + 'a {
    // Outer None: listing exhausted. Inner None: first page, no token yet.
    stream::try_unfold(Some(None::<String>), move |state| async move {
        let Some(continuation) = state else {
            return Ok::<_, AdrevError>(None);
        };

        let page = store.list_page(prefix, page_size, continuation).await?;
        debug!(
            container = store.container(),
            prefix,
            objects = page.objects.len(),
            more = page.continuation.is_some(),
            "Fetched listing page"
        );

        let next = page.continuation.map(Some);
        Ok(Some((page.objects, next)))
    })
    .map_ok(|objects| stream::iter(objects.into_iter().map(Ok::<_, AdrevError>)))
    .try_flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store_with(n: usize) -> MemoryStore {
        (0..n).fold(MemoryStore::new("reports"), |store, i| {
            store.with_object(format!("daily/report_{:02}.csv", i), "x")
        })
    }

    #[tokio::test]
    async fn test_walks_every_page() {
        let store = store_with(7);

        let keys: Vec<String> = list_objects(&store, "daily/", 3)
            .map_ok(|o| o.key)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(keys.len(), 7);
        assert_eq!(keys[0], "daily/report_00.csv");
        assert_eq!(keys[6], "daily/report_06.csv");
        // 3 + 3 + 1
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let store = MemoryStore::new("reports");
        let objects: Vec<SourceObject> =
            list_objects(&store, "", DEFAULT_PAGE_SIZE).try_collect().await.unwrap();
        assert!(objects.is_empty());
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_restart_lists_from_first_page() {
        let store = store_with(4);

        let first: Vec<SourceObject> = list_objects(&store, "", 2).try_collect().await.unwrap();
        let second: Vec<SourceObject> = list_objects(&store, "", 2).try_collect().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_calls(), 4);
    }

    #[tokio::test]
    async fn test_listing_failure_surfaces_after_earlier_pages() {
        let store = store_with(5).fail_listing_after(1);

        let mut stream = std::pin::pin!(list_objects(&store, "", 2));
        let mut seen = 0;
        let err = loop {
            match stream.try_next().await {
                Ok(Some(_)) => seen += 1,
                Ok(None) => panic!("listing should have failed"),
                Err(e) => break e,
            }
        };

        assert_eq!(seen, 2);
        assert!(err.is_transport());
    }
}
