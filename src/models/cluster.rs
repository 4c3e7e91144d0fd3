//! Clusters: publications grouped by strong similarity (the same story
//! relayed by several media, for instance).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::RadarlyClient;
use crate::error::Result;
use crate::models::{id, take_array, Analytics, Cloud, Labels, Publication};
use crate::pager::Page;
use crate::parameters::{
    AnalyticsParameter, ClusterField, ClusterParameter, CloudParameter,
    SearchPublicationParameter,
};
use crate::record::Queryable;
use crate::router::{self, CLUSTER_FETCH};
use crate::traits::{Fetch, Search};

/// A cluster of publications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Identifier of the story, used to restrict other requests to the
    /// cluster.
    #[serde(deserialize_with = "id::deserialize")]
    pub story: String,

    /// Number of publications in the cluster.
    #[serde(default)]
    pub size: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Project the cluster was computed on.
    #[serde(skip)]
    pub project_id: u64,
}

impl Cluster {
    /// Publications of the cluster.
    pub async fn get_publications(
        &self,
        client: &RadarlyClient,
        param: &SearchPublicationParameter,
    ) -> Result<Vec<Publication>> {
        let mut param = param.clone();
        param.clusters([&self.story])?;
        Publication::fetch(client, self.project_id, &param).await
    }

    /// Analytics over the publications of the cluster.
    pub async fn get_analytics(
        &self,
        client: &RadarlyClient,
        param: &AnalyticsParameter,
        focuses: &Labels,
    ) -> Result<Analytics> {
        let mut param = param.clone();
        param.clusters([&self.story])?;
        Analytics::fetch_translated(client, self.project_id, &param, focuses).await
    }

    /// Cloud of the publications of the cluster.
    pub async fn get_cloud(&self, client: &RadarlyClient, param: &CloudParameter) -> Result<Cloud> {
        let mut param = param.clone();
        param.clusters([&self.story])?;
        Cloud::fetch(client, self.project_id, &param).await
    }
}

#[async_trait]
impl Search for Cluster {
    type Param = ClusterParameter;

    /// When the response has no `total`, the page size stands in for it.
    #[tracing::instrument(skip(client, param))]
    async fn search(
        client: &RadarlyClient,
        project_id: u64,
        param: &Self::Param,
    ) -> Result<Page<Self>> {
        let path = router::project_route(CLUSTER_FETCH, project_id);
        let mut data = client.post_json(&path, param).await?;
        let total = data.get("total").and_then(Value::as_u64);

        let clusters = take_array(&mut data, "hits")?
            .into_iter()
            .map(|mut hit| {
                if let Some(object) = hit.as_object_mut() {
                    object.remove("stats");
                }
                let cluster: Cluster = serde_json::from_value(hit)?;
                Ok(Cluster {
                    project_id,
                    ..cluster
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let total = total.unwrap_or(clusters.len() as u64);
        Ok(Page::new(clusters, total))
    }
}

impl Queryable for Cluster {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_cluster() {
        let cluster: Cluster = serde_json::from_value(json!({
            "story": 98765,
            "size": 12,
            "title": "Launch"
        }))
        .unwrap();
        assert_eq!(cluster.story, "98765");
        assert_eq!(cluster.size, Some(12));
        assert_eq!(cluster.extra["title"], json!("Launch"));
    }
}
