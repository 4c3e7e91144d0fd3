//! Fetch trait for computed insights.

use async_trait::async_trait;

use crate::client::RadarlyClient;
use crate::error::Result;
use crate::parameters::Parameter;

/// Compute an insight over the publications of a project.
///
/// The parameter selects the publications and configures the computation;
/// the implementation reshapes the response into a tabular type.
///
/// # Example
///
/// ```ignore
/// use radarly::{Distribution, Fetch, RadarlyClient};
/// use radarly::parameters::{prelude::*, DistributionParameter};
///
/// let mut param = DistributionParameter::new();
/// param.publication_date(Some("2018-01-01"), Some("2018-01-31"))?;
/// let distribution = Distribution::fetch(&client, 1234, &param).await?;
/// ```
#[async_trait]
pub trait Fetch: Sized {
    /// Parameter type accepted by the endpoint.
    type Param: Parameter + Send + Sync;

    /// Run the computation for `project_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has an
    /// unexpected shape.
    async fn fetch(client: &RadarlyClient, project_id: u64, param: &Self::Param) -> Result<Self>;
}
