//! Search trait for paginated entity listings.

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::client::RadarlyClient;
use crate::error::Result;
use crate::pager::{Page, PageSource, Pager};
use crate::parameters::PaginationField;

/// Search entities of a project with offset pagination.
///
/// Implement this trait for entity types returned by a paginated search
/// endpoint. [`Search::fetch_all`] wraps [`Search::search`] in a [`Pager`].
///
/// # Example
///
/// ```ignore
/// use radarly::{Publication, RadarlyClient, Search};
/// use radarly::parameters::SearchPublicationParameter;
///
/// let client = RadarlyClient::from_env()?;
/// let param = SearchPublicationParameter::default_search();
///
/// // Fetch a single page
/// let page = Publication::search(&client, 1234, &param).await?;
///
/// // Walk every page
/// let mut pager = Publication::fetch_all(&client, 1234, param).await?;
/// while let Some(publication) = pager.next().await? {
///     println!("{}", publication.uid);
/// }
/// ```
#[async_trait]
pub trait Search: Sized + Send + 'static {
    /// Paginated parameter type accepted by the endpoint.
    type Param: PaginationField + Send + Sync;

    /// Fetch the page described by `param`.
    ///
    /// # Arguments
    ///
    /// * `client` - The Radarly API client
    /// * `project_id` - Project whose entities are searched
    /// * `param` - Search parameter, including `start` and `limit`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn search(
        client: &RadarlyClient,
        project_id: u64,
        param: &Self::Param,
    ) -> Result<Page<Self>>;

    /// Items of the page described by `param`.
    async fn fetch(
        client: &RadarlyClient,
        project_id: u64,
        param: &Self::Param,
    ) -> Result<Vec<Self>> {
        Ok(Self::search(client, project_id, param).await?.items)
    }

    /// Lazily iterate over every matching entity.
    ///
    /// The first page is fetched before this returns.
    async fn fetch_all(
        client: &RadarlyClient,
        project_id: u64,
        param: Self::Param,
    ) -> Result<Pager<SearchSource<Self>>> {
        Pager::new(SearchSource::new(client.clone(), project_id), param).await
    }
}

/// [`PageSource`] backed by a [`Search`] implementation.
pub struct SearchSource<T> {
    client: RadarlyClient,
    project_id: u64,
    _entity: PhantomData<fn() -> T>,
}

impl<T> SearchSource<T> {
    pub fn new(client: RadarlyClient, project_id: u64) -> Self {
        Self {
            client,
            project_id,
            _entity: PhantomData,
        }
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }
}

#[async_trait]
impl<T: Search> PageSource for SearchSource<T> {
    type Item = T;
    type Param = T::Param;

    async fn fetch_page(&mut self, param: &Self::Param) -> Result<Page<T>> {
        T::search(&self.client, self.project_id, param).await
    }
}
