//! Find trait for fetching single entities.

use async_trait::async_trait;

use crate::client::RadarlyClient;
use crate::error::Result;

/// Fetch a single entity by ID.
///
/// Implement this trait for entity types that can be fetched individually
/// by a unique identifier.
///
/// # Example
///
/// ```ignore
/// use radarly::{Find, Project, RadarlyClient};
///
/// let client = RadarlyClient::from_env()?;
/// let project = Project::find(&client, 1234).await?;
/// ```
#[async_trait]
pub trait Find: Sized {
    /// The ID type for this entity (project id, `"me"`, ...).
    type Id: Send;

    /// Fetch the entity by ID.
    ///
    /// # Arguments
    ///
    /// * `client` - The Radarly API client
    /// * `id` - The entity identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found or the request fails.
    async fn find(client: &RadarlyClient, id: Self::Id) -> Result<Self>;
}
