//! Update trait for modifying entities.

use async_trait::async_trait;

use crate::client::RadarlyClient;
use crate::error::Result;

/// Update an existing entity.
///
/// Implementations verify the server-confirmed state and fail with
/// [`RadarlyError::PartialUpdate`](crate::RadarlyError::PartialUpdate) when
/// a requested field was not applied.
///
/// # Example
///
/// ```ignore
/// use radarly::{Publication, PublicationUpdate, Tone, Update};
///
/// let updated = Publication::update(
///     &client,
///     publication.key()?,
///     PublicationUpdate {
///         tone: Some(Tone::Positive),
///         favorite: Some(true),
///         ..Default::default()
///     },
/// ).await?;
/// ```
#[async_trait]
pub trait Update: Sized {
    /// The ID type for this entity.
    type Id: Send;

    /// Parameters for the update.
    type Params: Send;

    /// Update the entity and return the updated version.
    ///
    /// # Arguments
    ///
    /// * `client` - The Radarly API client
    /// * `id` - The entity identifier
    /// * `params` - Update parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or if the server did not
    /// apply every requested field.
    async fn update(client: &RadarlyClient, id: Self::Id, params: Self::Params) -> Result<Self>;
}
