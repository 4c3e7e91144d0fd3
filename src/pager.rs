//! Offset pagination over search endpoints.

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;

use crate::error::Result;
use crate::parameters::{PaginationField, Parameter};

/// One page of results and the total the server reported.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Something that can fetch the page described by a paginated parameter.
#[async_trait]
pub trait PageSource: Send {
    type Item: Send;
    type Param: PaginationField + Send + Sync;

    async fn fetch_page(&mut self, param: &Self::Param) -> Result<Page<Self::Item>>;
}

enum State<T> {
    Fetching,
    Buffered(std::vec::IntoIter<T>),
    Exhausted,
}

/// Lazy, single-pass sequence over every item of a paginated search.
///
/// The first page is fetched when the pager is built, which also gives the
/// total. Later pages are fetched as the buffered one runs out, until
/// `ceil(total / limit)` pages have been read or a page comes back empty.
///
/// ```ignore
/// let mut pager = Publication::fetch_all(&client, project_id, param).await?;
/// while let Some(publication) = pager.next().await? {
///     println!("{}", publication.uid);
/// }
/// ```
pub struct Pager<S: PageSource> {
    source: S,
    param: S::Param,
    state: State<S::Item>,
    current_page: u64,
    total: u64,
    total_pages: u64,
}

impl<S: PageSource> Pager<S> {
    /// Build the pager and fetch the first page.
    ///
    /// A parameter without a `start` begins at offset 0.
    pub async fn new(source: S, mut param: S::Param) -> Result<Self> {
        if param.get("start").is_none() {
            param.next_page();
        }
        let mut pager = Self {
            source,
            param,
            state: State::Fetching,
            current_page: 1,
            total: 0,
            total_pages: 0,
        };
        pager.fetch().await?;
        Ok(pager)
    }

    async fn fetch(&mut self) -> Result<()> {
        self.state = State::Fetching;
        let page = self.source.fetch_page(&self.param).await?;
        let limit = self.param.limit().max(1) as u64;
        self.total = page.total;
        self.total_pages = page.total.div_ceil(limit);
        tracing::debug!(
            page = self.current_page,
            total_pages = self.total_pages,
            items = page.items.len(),
            "fetched page"
        );
        self.param.next_page();
        self.state = State::Buffered(page.items.into_iter());
        Ok(())
    }

    /// Next item, fetching the following page when needed.
    ///
    /// Returns `Ok(None)` once every page has been read, and keeps doing so.
    /// A failed fetch is retried on the next call.
    pub async fn next(&mut self) -> Result<Option<S::Item>> {
        loop {
            match &mut self.state {
                State::Buffered(items) => {
                    if let Some(item) = items.next() {
                        return Ok(Some(item));
                    }
                    if self.current_page >= self.total_pages {
                        self.state = State::Exhausted;
                        return Ok(None);
                    }
                    self.current_page += 1;
                    self.refetch().await?;
                }
                State::Fetching => self.refetch().await?,
                State::Exhausted => return Ok(None),
            }
        }
    }

    /// Fetch the following page. An empty page ends the iteration even when
    /// the reported total promises more.
    async fn refetch(&mut self) -> Result<()> {
        self.fetch().await?;
        if matches!(&self.state, State::Buffered(items) if items.as_slice().is_empty()) {
            tracing::debug!(page = self.current_page, "empty page, stopping");
            self.state = State::Exhausted;
        }
        Ok(())
    }

    /// Total number of items reported by the server.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// 1-based index of the page being read.
    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    /// The parameter of the next page to fetch.
    pub fn param(&self) -> &S::Param {
        &self.param
    }

    /// Read every remaining item.
    pub async fn collect_all(mut self) -> Result<Vec<S::Item>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Adapt into a [`Stream`]. The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<S::Item>> {
        futures::stream::unfold(self, |mut pager| async move {
            match pager.next().await {
                Ok(Some(item)) => Some((Ok(item), pager)),
                Ok(None) => None,
                Err(e) => {
                    pager.state = State::Exhausted;
                    Some((Err(e), pager))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RadarlyError;
    use crate::parameters::SearchPublicationParameter;
    use futures::StreamExt;
    use serde_json::Value;

    struct Numbers {
        total: u64,
        /// Total sent back to the pager, which may overstate `total`.
        reported_total: u64,
        fetches: usize,
        fail_on: Option<usize>,
    }

    impl Numbers {
        fn new(total: u64) -> Self {
            Self {
                total,
                reported_total: total,
                fetches: 0,
                fail_on: None,
            }
        }
    }

    #[async_trait]
    impl PageSource for Numbers {
        type Item = u64;
        type Param = SearchPublicationParameter;

        async fn fetch_page(&mut self, param: &Self::Param) -> Result<Page<u64>> {
            self.fetches += 1;
            if self.fail_on == Some(self.fetches) {
                return Err(RadarlyError::validation("start", "boom"));
            }
            let start = param.get("start").and_then(Value::as_u64).unwrap_or(0);
            let limit = param.limit() as u64;
            let end = (start + limit).min(self.total);
            Ok(Page::new((start..end).collect(), self.reported_total))
        }
    }

    fn param() -> SearchPublicationParameter {
        SearchPublicationParameter::default_search()
    }

    #[tokio::test]
    async fn test_pages_through_everything() {
        let mut pager = Pager::new(Numbers::new(101), param()).await.unwrap();
        assert_eq!(pager.total(), 101);
        assert_eq!(pager.total_pages(), 5);

        let mut seen = Vec::new();
        while let Some(n) = pager.next().await.unwrap() {
            seen.push(n);
        }
        assert_eq!(seen, (0..101).collect::<Vec<_>>());
        assert_eq!(pager.source.fetches, 5);

        // exhausted for good
        assert_eq!(pager.next().await.unwrap(), None);
        assert_eq!(pager.source.fetches, 5);
    }

    #[tokio::test]
    async fn test_empty_page_ends_iteration() {
        let mut source = Numbers::new(30);
        source.reported_total = 1000;
        let mut pager = Pager::new(source, param()).await.unwrap();
        assert_eq!(pager.total_pages(), 40);

        let mut count = 0;
        while pager.next().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 30);
        assert_eq!(pager.source.fetches, 3);

        assert_eq!(pager.next().await.unwrap(), None);
        assert_eq!(pager.source.fetches, 3);
    }

    #[tokio::test]
    async fn test_first_page_is_fetched_eagerly() {
        let pager = Pager::new(Numbers::new(30), param()).await.unwrap();
        assert_eq!(pager.source.fetches, 1);
        assert_eq!(pager.param().get("start").unwrap(), 25);
    }

    #[tokio::test]
    async fn test_missing_start_begins_at_zero() {
        let pager = Pager::new(Numbers::new(3), SearchPublicationParameter::new())
            .await
            .unwrap();
        assert_eq!(pager.collect_all().await.unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_empty_result() {
        let mut pager = Pager::new(Numbers::new(0), param()).await.unwrap();
        assert_eq!(pager.total_pages(), 0);
        assert_eq!(pager.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_retried() {
        let mut source = Numbers::new(30);
        source.fail_on = Some(2);
        let mut pager = Pager::new(source, param()).await.unwrap();
        for _ in 0..25 {
            pager.next().await.unwrap();
        }
        assert!(pager.next().await.is_err());
        assert_eq!(pager.next().await.unwrap(), Some(25));
    }

    #[tokio::test]
    async fn test_stream_adapter() {
        let pager = Pager::new(Numbers::new(60), param()).await.unwrap();
        let items: Vec<u64> = pager
            .into_stream()
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(items.len(), 60);
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], 3);
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.total, 3);
    }
}
